//! Condenser
//!
//! A condenser decides which part of the history the model gets to see. Each
//! step it either returns a [`View`] of the history, or a condensation action
//! that the engine hands back to the controller unchanged. Once that action is
//! in the history, [`View::from_events`] hides the events it forgot.
//!
//! Strategies:
//! - `noop`: the whole history
//! - `recent`: the first `keep_first` events plus the most recent ones
//! - `amortized`: lets the view grow to `max_size`, then forgets the middle
//!   down to half of it in a single condensation

use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionKind, CondensationAction};
use crate::error::Result;
use crate::event::Event;
use crate::observation::{Observation, ObservationKind};
use crate::state::State;

mod amortized;
mod noop;
mod recent;

pub use amortized::AmortizedForgettingCondenser;
pub use noop::NoOpCondenser;
pub use recent::RecentEventsCondenser;

/// Events selected for one step, oldest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    pub events: Vec<Event>,
}

impl View {
    /// Build the view implied by a history.
    ///
    /// Events forgotten by any condensation action are dropped, as are the
    /// condensation actions themselves. The summary of the latest
    /// condensation that carries one is inserted at its offset.
    pub fn from_events(history: &[Event]) -> Self {
        let mut forgotten = std::collections::HashSet::new();
        let mut summary: Option<(&Event, &str, usize)> = None;

        for event in history {
            if let Some(condensation) = as_condensation(event) {
                forgotten.extend(condensation.forgotten_event_ids.iter().copied());
                if let (Some(text), Some(offset)) =
                    (condensation.summary.as_deref(), condensation.summary_offset)
                {
                    summary = Some((event, text, offset));
                }
            }
        }

        let mut events: Vec<Event> = history
            .iter()
            .filter(|e| as_condensation(e).is_none() && !forgotten.contains(&e.id))
            .cloned()
            .collect();

        if let Some((source, text, offset)) = summary {
            let mut summary_event = Event::observation(
                source.id.0,
                None,
                Observation::new(ObservationKind::AgentCondensation, text),
            );
            summary_event.timestamp = source.timestamp;
            events.insert(offset.min(events.len()), summary_event);
        }

        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a View {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

fn as_condensation(event: &Event) -> Option<&CondensationAction> {
    match event.as_action().map(|a| &a.kind) {
        Some(ActionKind::Condensation(condensation)) => Some(condensation),
        _ => None,
    }
}

/// What a condenser decided for this step
#[derive(Debug, Clone, PartialEq)]
pub enum CondenserResult {
    /// Continue the step with these events
    View(View),
    /// End the step with this action
    Condensation(Action),
}

/// Chooses the events the model sees
pub trait Condenser: Send + Sync {
    /// Name of the strategy (for logging)
    fn name(&self) -> &str;

    /// Produce a view of the state's history, or a condensation
    fn condensed_history(&self, state: &State) -> Result<CondenserResult>;
}

/// Condenser strategy selection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CondenserConfig {
    /// Keep the whole history
    #[default]
    #[serde(rename = "noop")]
    NoOp,

    /// Keep the first events and the most recent ones
    Recent {
        #[serde(default = "default_keep_first")]
        keep_first: usize,
        #[serde(default = "default_max_events")]
        max_events: usize,
    },

    /// Forget the middle of the history once it grows past `max_size`
    Amortized {
        #[serde(default = "default_max_size")]
        max_size: usize,
        #[serde(default = "default_keep_first")]
        keep_first: usize,
    },
}

fn default_keep_first() -> usize {
    1
}

fn default_max_events() -> usize {
    100
}

fn default_max_size() -> usize {
    100
}

/// Build a condenser from its configuration
pub fn from_config(config: &CondenserConfig) -> Result<Box<dyn Condenser>> {
    Ok(match config {
        CondenserConfig::NoOp => Box::new(NoOpCondenser),
        CondenserConfig::Recent {
            keep_first,
            max_events,
        } => Box::new(RecentEventsCondenser::new(*keep_first, *max_events)?),
        CondenserConfig::Amortized {
            max_size,
            keep_first,
        } => Box::new(AmortizedForgettingCondenser::new(*max_size, *keep_first)?),
    })
}

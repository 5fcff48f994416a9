use tracing::debug;

use super::{Condenser, CondenserResult, View};
use crate::action::{Action, ActionKind, CondensationAction};
use crate::error::{AgentError, Result};
use crate::state::State;

/// Lets the view grow to `max_size` events, then forgets the middle of it
/// down to half that size, always keeping the first `keep_first` events.
///
/// Forgetting happens through a condensation action so the decision lands in
/// the history and later views agree on it.
#[derive(Debug, Clone)]
pub struct AmortizedForgettingCondenser {
    max_size: usize,
    keep_first: usize,
}

impl AmortizedForgettingCondenser {
    pub fn new(max_size: usize, keep_first: usize) -> Result<Self> {
        if max_size < 2 {
            return Err(AgentError::config("amortized condenser needs max_size >= 2"));
        }
        if keep_first >= max_size / 2 {
            return Err(AgentError::config(format!(
                "amortized condenser keep_first ({}) must be less than half of max_size ({})",
                keep_first, max_size
            )));
        }
        Ok(Self {
            max_size,
            keep_first,
        })
    }
}

impl Condenser for AmortizedForgettingCondenser {
    fn name(&self) -> &str {
        "amortized"
    }

    fn condensed_history(&self, state: &State) -> Result<CondenserResult> {
        let view = View::from_events(&state.history);
        if view.len() <= self.max_size {
            return Ok(CondenserResult::View(view));
        }

        let target_size = self.max_size / 2;
        let keep_from_tail = target_size - self.keep_first;
        let forget_end = view.len() - keep_from_tail;

        let forgotten_event_ids = view.events[self.keep_first..forget_end]
            .iter()
            .map(|e| e.id)
            .collect::<Vec<_>>();

        debug!(
            view_size = view.len(),
            forgotten = forgotten_event_ids.len(),
            "Amortized condenser forgetting events"
        );

        Ok(CondenserResult::Condensation(Action::new(
            ActionKind::Condensation(CondensationAction {
                forgotten_event_ids,
                summary: None,
                summary_offset: None,
            }),
        )))
    }
}

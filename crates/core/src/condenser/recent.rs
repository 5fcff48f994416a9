use tracing::debug;

use super::{Condenser, CondenserResult, View};
use crate::error::{AgentError, Result};
use crate::state::State;

/// Keeps the first `keep_first` events and the most recent events, up to
/// `max_events` in total
#[derive(Debug, Clone)]
pub struct RecentEventsCondenser {
    keep_first: usize,
    max_events: usize,
}

impl RecentEventsCondenser {
    pub fn new(keep_first: usize, max_events: usize) -> Result<Self> {
        if max_events == 0 {
            return Err(AgentError::config("recent condenser needs max_events > 0"));
        }
        if keep_first > max_events {
            return Err(AgentError::config(format!(
                "recent condenser keep_first ({}) exceeds max_events ({})",
                keep_first, max_events
            )));
        }
        Ok(Self {
            keep_first,
            max_events,
        })
    }
}

impl Condenser for RecentEventsCondenser {
    fn name(&self) -> &str {
        "recent"
    }

    fn condensed_history(&self, state: &State) -> Result<CondenserResult> {
        let mut view = View::from_events(&state.history);
        if view.len() <= self.max_events {
            return Ok(CondenserResult::View(view));
        }

        let total = view.len();
        let tail_len = self.max_events - self.keep_first;
        let tail = view.events.split_off(total - tail_len);
        view.events.truncate(self.keep_first);
        view.events.extend(tail);

        debug!(
            total_events = total,
            kept_events = view.len(),
            "Recent condenser trimmed history"
        );
        Ok(CondenserResult::View(view))
    }
}

use super::{Condenser, CondenserResult, View};
use crate::error::Result;
use crate::state::State;

/// Passes the whole history through
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCondenser;

impl Condenser for NoOpCondenser {
    fn name(&self) -> &str {
        "noop"
    }

    fn condensed_history(&self, state: &State) -> Result<CondenserResult> {
        Ok(CondenserResult::View(View::from_events(&state.history)))
    }
}

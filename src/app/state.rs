use super::{ControlLoop, LoopState};
use tracing::debug;

impl ControlLoop {
    /// Move to `state`, recording the transition
    pub(super) fn set_state(&mut self, state: LoopState) {
        if self.state == state {
            return;
        }
        debug!("Control loop state {:?} -> {:?}", self.state, state);
        self.state = state;
        self.history.push(state);
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Every state entered so far, in order
    pub fn state_history(&self) -> &[LoopState] {
        &self.history
    }
}

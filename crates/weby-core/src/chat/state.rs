//! Session state types.

use serde::{Deserialize, Serialize};

/// Whether the session can accept a new user turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionState {
    /// No request in flight; `submit` is accepted.
    #[default]
    Idle,
    /// A generation call is outstanding; `submit` is ignored.
    AwaitingResponse,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }
}

/// What `submit` did with its input.
///
/// None of these is an error; rejected submissions leave the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The user turn was appended and a generation call started.
    Accepted,
    /// The text was empty after trimming.
    EmptyInput,
    /// A generation call is already in flight.
    Busy,
    /// The session has been closed.
    Closed,
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted)
    }
}

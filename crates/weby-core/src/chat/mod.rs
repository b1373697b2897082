//! Chat domain module.
//!
//! # Module Structure
//!
//! - `turn`: Conversation turn types (`Speaker`, `Turn`, `Transcript`)
//! - `state`: Session state types (`SessionState`, `SubmitOutcome`)
//! - `client`: Generation endpoint interface (`GenerationClient`, `GenerationFailure`)
//! - `session`: The conversation session manager (`ChatSession`)
//!
//! # Usage
//!
//! ```ignore
//! use weby_core::chat::{ChatSession, GenerationClient, SessionState};
//!
//! let session = ChatSession::new(client, ChatConfig::default());
//! session.submit("What services do you offer?").await;
//! session.wait_idle().await;
//! ```

mod client;
mod session;
mod state;
mod turn;

#[cfg(test)]
mod session_test;

pub use client::{GenerationClient, GenerationFailure};
pub use session::ChatSession;
pub use state::{SessionState, SubmitOutcome};
pub use turn::{Speaker, Transcript, Turn};

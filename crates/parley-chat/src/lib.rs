//! Text chat sessions for Parley.
//!
//! Each session owns its conversation history and backend selection. The
//! [`ChatRouter`] turns one user message into exactly one appended turn,
//! whatever the backend does.

pub mod error;
pub mod router;
pub mod session;
pub mod store;

pub use error::ChatError;
pub use router::{ChatRouter, TurnOutcome};
pub use session::{ChatMode, ChatSession, SessionState, SessionView};
pub use store::{SessionHandle, SessionStore};

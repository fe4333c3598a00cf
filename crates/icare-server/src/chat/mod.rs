//! Conversational endpoint support: per-session history and intent routing.

pub mod dispatch;
pub mod session;

pub use dispatch::{dispatch, Dispatch, Intent};
pub use session::{ChatMessage, Role, SessionStore};

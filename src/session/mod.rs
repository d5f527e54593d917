//! Session Management Module
//!
//! A session ties one asynchronous request to a streamed event channel, a
//! human-response channel and a cancellation token. The manager keeps the
//! id -> session mapping and enforces the lifecycle rules.

pub mod event;
pub mod session;
pub mod session_manager;

pub use event::Event;
pub use session::{Session, SessionHandle};
pub use session_manager::{Capabilities, SessionManager, StartFlags};

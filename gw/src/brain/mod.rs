//! Brain-side conversation machinery
//!
//! The accept loop owns the socket; each motion trigger births a [`Session`]
//! that drives one conversation to its end.

pub mod phrases;
mod server;
mod session;

pub use server::BrainServer;
pub use session::{Session, SessionError, SessionOutcome};

//! # Word-Chain Game
//!
//! - [`session`] - per-user round state
//! - [`commands`] - start/quit/help/status phrase recognition
//! - [`replies`] - every user-facing reply text
//! - [`engine`] - the turn state machine tying dictionary and session store together

pub mod commands;
pub mod engine;
pub mod replies;
pub mod session;

pub use commands::{CommandParser, GameCommand};
pub use engine::GameEngine;
pub use replies::Reply;
pub use session::Session;

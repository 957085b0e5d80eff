//! Chat bot shell: message routing, the run loop and reply delivery.

pub mod delivery;
pub mod server;

pub use delivery::{ConsoleSink, RecordingSink, ReplySink};
pub use server::{BotStatus, ChatBot, IncomingMessage};

//! The line-protocol server
//!
//! [`Dispatcher`] owns every table and interprets lines according to each
//! session's state. The connection layer feeds it events over a channel.

pub mod connection;
pub mod dispatcher;
mod lobby;
pub mod messages;
mod room_flow;

pub use connection::{accept_loop, read_bounded_line, spawn_connection};
pub use dispatcher::{ArenaEvent, Dispatcher, EVENT_QUEUE_CAPACITY};

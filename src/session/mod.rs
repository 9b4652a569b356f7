//! Connected clients and their protocol state
//!
//! The session table is owned by the dispatcher. Each session carries the
//! state that decides how its next line is interpreted.

pub mod command;
pub mod outbox;
pub mod state;
pub mod table;

pub use command::Command;
pub use outbox::{outbox, Outbound, Outbox, OutboxReceiver};
pub use state::{DuelRole, PromptKind, SessionState};
pub use table::{Session, SessionTable};

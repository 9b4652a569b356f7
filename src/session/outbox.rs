//! Per-connection outbound queue
//!
//! The dispatcher never touches a socket. Every push goes into the
//! connection's outbox and a writer task drains it.

use tokio::sync::mpsc;

/// Something the dispatcher wants written to one client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A block of text, written as-is with a trailing newline if missing
    Text(String),
    /// Flush what was queued, then close the socket
    Close,
}

/// Sending half of a connection's outbox
pub type Outbox = mpsc::UnboundedSender<Outbound>;

/// Receiving half drained by the connection's writer task
pub type OutboxReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Create a fresh outbox pair for a new connection
pub fn outbox() -> (Outbox, OutboxReceiver) {
    mpsc::unbounded_channel()
}

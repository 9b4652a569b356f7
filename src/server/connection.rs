//! TCP side of the arena
//!
//! Each accepted socket gets a reader task and a writer task. The reader turns
//! the byte stream into bounded lines and forwards them as [`ArenaEvent`]s;
//! the writer drains the connection's outbox. When the writer closes the
//! socket it tells the reader to stop.

use super::dispatcher::ArenaEvent;
use crate::session::{outbox, Outbound, OutboxReceiver};
use crate::types::ConnectionId;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Accept connections until `shutdown` fires
pub async fn accept_loop(
    listener: TcpListener,
    events: mpsc::Sender<ArenaEvent>,
    max_line_length: usize,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut next_id = 1u64;
    if let Ok(addr) = listener.local_addr() {
        info!("Accepting players on {}", addr);
    }

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let id = ConnectionId(next_id);
                    next_id += 1;
                    debug!("{} accepted from {}", id, peer);
                    spawn_connection(stream, id, events.clone(), max_line_length);
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                }
            },
            _ = shutdown.recv() => {
                info!("Listener closed");
                break;
            }
        }
    }
}

/// Start the reader and writer tasks of one socket
pub fn spawn_connection(
    stream: TcpStream,
    id: ConnectionId,
    events: mpsc::Sender<ArenaEvent>,
    max_line_length: usize,
) {
    let (read_half, write_half) = stream.into_split();
    let (outbox, pending) = outbox();
    let (closed_tx, closed_rx) = oneshot::channel();

    tokio::spawn(async move {
        if let Err(e) = write_outbox(write_half, pending).await {
            debug!("{} write failed: {}", id, e);
        }
        let _ = closed_tx.send(());
    });

    tokio::spawn(async move {
        read_lines(read_half, id, outbox, events, max_line_length, closed_rx).await;
    });
}

async fn read_lines(
    read_half: OwnedReadHalf,
    id: ConnectionId,
    outbox: crate::session::Outbox,
    events: mpsc::Sender<ArenaEvent>,
    max_line_length: usize,
    mut closed: oneshot::Receiver<()>,
) {
    let mut reader = BufReader::new(read_half);
    let mut outbox = Some(outbox);

    loop {
        let line = tokio::select! {
            read = read_bounded_line(&mut reader, max_line_length) => match read {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    debug!("{} read failed: {}", id, e);
                    break;
                }
            },
            _ = &mut closed => {
                debug!("{} closed by the server", id);
                break;
            }
        };

        // The first line of a connection is the player's name
        let event = match outbox.take() {
            Some(outbox) => ArenaEvent::Connected {
                id,
                name: line,
                outbox,
            },
            None => ArenaEvent::Line { id, line },
        };
        if events.send(event).await.is_err() {
            return;
        }
    }

    if outbox.is_none() && events.send(ArenaEvent::Disconnected { id }).await.is_err() {
        error!("Dispatcher gone while {} disconnected", id);
    }
}

async fn write_outbox(mut writer: OwnedWriteHalf, mut pending: OutboxReceiver) -> io::Result<()> {
    while let Some(message) = pending.recv().await {
        match message {
            Outbound::Text(mut text) => {
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                writer.write_all(text.as_bytes()).await?;
            }
            Outbound::Close => break,
        }
    }
    writer.shutdown().await
}

/// Read one `\n`-terminated line, keeping at most `max` bytes of it
///
/// Bytes past the cap are discarded up to the next newline. Returns `None` at
/// end of stream when nothing is pending.
pub async fn read_bounded_line<R>(reader: &mut R, max: usize) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let mut truncated = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok((!line.is_empty() || truncated).then(|| decode_line(&line)));
        }

        let newline = available.iter().position(|b| *b == b'\n');
        let end = newline.unwrap_or(available.len());
        let room = max.saturating_sub(line.len());
        line.extend_from_slice(&available[..end.min(room)]);
        truncated |= end > room;

        let consumed = newline.map_or(end, |i| i + 1);
        reader.consume(consumed);
        if newline.is_some() {
            return Ok(Some(decode_line(&line)));
        }
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\r')
        .to_string()
}

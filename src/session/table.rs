//! Session table: every connected client, keyed by connection id

use super::outbox::{Outbound, Outbox};
use super::state::SessionState;
use crate::error::{ArenaError, ArenaResult};
use crate::replay::ReplayCursor;
use crate::types::{ConnectionId, PlayerName, RoomPrivacy};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, trace};

/// One connected client
#[derive(Debug)]
pub struct Session {
    pub id: ConnectionId,
    pub name: PlayerName,
    pub state: SessionState,
    /// Rating read from the profile store at handshake, refreshed after games
    pub elo: i32,
    /// Privacy requested for rooms this player starts
    pub privacy: RoomPrivacy,
    /// Open replay while in [`SessionState::Replaying`]
    pub replay: Option<ReplayCursor>,
    pub connected_at: DateTime<Utc>,
    outbox: Outbox,
}

impl Session {
    pub fn new(id: ConnectionId, name: impl Into<PlayerName>, elo: i32, outbox: Outbox) -> Self {
        Self {
            id,
            name: name.into(),
            state: SessionState::Lobby,
            elo,
            privacy: RoomPrivacy::default(),
            replay: None,
            connected_at: current_timestamp(),
            outbox,
        }
    }

    /// Queue text for this client; false if its writer is gone
    pub fn send(&self, text: impl Into<String>) -> bool {
        self.outbox.send(Outbound::Text(text.into())).is_ok()
    }

    /// Ask the writer to flush and close the socket
    pub fn close(&self) -> bool {
        self.outbox.send(Outbound::Close).is_ok()
    }

    /// Leave whatever the session was doing and go back to the menu
    pub fn reset_to_lobby(&mut self) {
        self.state = SessionState::Lobby;
        self.replay = None;
    }
}

/// All sessions, bounded by the client cap
///
/// Sessions are looked up by id at use time; a removed id is simply absent,
/// so callers holding stale ids (observer sets, duel requests) skip it.
#[derive(Debug)]
pub struct SessionTable {
    sessions: HashMap<ConnectionId, Session>,
    capacity: usize,
}

impl SessionTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.sessions.len() >= self.capacity
    }

    /// Add a session after its handshake
    pub fn insert(&mut self, session: Session) -> ArenaResult<()> {
        if self.is_full() {
            return Err(ArenaError::CapacityExceeded {
                resource: "client table".to_string(),
            });
        }
        if self.find_by_name(&session.name).is_some() {
            return Err(ArenaError::protocol(format!(
                "the name {} is already taken",
                session.name
            )));
        }
        debug!("Session {} registered as {}", session.id, session.name);
        self.sessions.insert(session.id, session);
        Ok(())
    }

    pub fn remove(&mut self, id: ConnectionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn state(&self, id: ConnectionId) -> Option<SessionState> {
        self.sessions.get(&id).map(|s| s.state)
    }

    pub fn set_state(&mut self, id: ConnectionId, state: SessionState) {
        if let Some(session) = self.sessions.get_mut(&id) {
            trace!("{} {} -> {}", session.name, session.state.label(), state.label());
            session.state = state;
        }
    }

    pub fn name(&self, id: ConnectionId) -> Option<&str> {
        self.sessions.get(&id).map(|s| s.name.as_str())
    }

    pub fn find_by_name(&self, name: &str) -> Option<ConnectionId> {
        self.sessions
            .values()
            .find(|s| s.name == name)
            .map(|s| s.id)
    }

    /// Best-effort push to one client; false if it is gone
    pub fn send(&self, id: ConnectionId, text: impl Into<String>) -> bool {
        match self.sessions.get(&id) {
            Some(session) => session.send(text),
            None => false,
        }
    }

    /// Push the same text to several clients; one failure never stops the rest
    pub fn send_all<'a>(&self, ids: impl IntoIterator<Item = &'a ConnectionId>, text: &str) -> usize {
        ids.into_iter()
            .filter(|id| self.send(**id, text))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.sessions.keys().copied().collect()
    }

    /// Names of sessions sitting in the lobby, sorted, optionally excluding one
    pub fn lobby_names(&self, except: Option<ConnectionId>) -> Vec<String> {
        let mut names: Vec<String> = self
            .sessions
            .values()
            .filter(|s| s.state.is_available() && Some(s.id) != except)
            .map(|s| s.name.clone())
            .collect();
        names.sort();
        names
    }
}

//! Test fixtures for driving the dispatcher without sockets

use awale_arena::config::ArenaSettings;
use awale_arena::game::Board;
use awale_arena::profile::InMemoryProfileStore;
use awale_arena::replay::InMemoryArchive;
use awale_arena::server::{ArenaEvent, Dispatcher};
use awale_arena::session::{outbox, Outbound, OutboxReceiver, SessionState};
use awale_arena::types::{ConnectionId, RoomId, Seat};
use std::sync::Arc;

/// A fake client: its connection id and everything pushed to it
pub struct TestClient {
    pub id: ConnectionId,
    pub name: String,
    outbox: Option<OutboxReceiver>,
    closed: bool,
}

impl TestClient {
    /// Take every text pushed since the last drain
    pub fn drain(&mut self) -> Vec<String> {
        let mut texts = Vec::new();
        if let Some(rx) = self.outbox.as_mut() {
            while let Ok(message) = rx.try_recv() {
                match message {
                    Outbound::Text(text) => texts.push(text),
                    Outbound::Close => self.closed = true,
                }
            }
        }
        texts
    }

    /// Drained output joined into one string
    pub fn transcript(&mut self) -> String {
        self.drain().join("\n")
    }

    /// True once the server asked for the connection to be closed
    pub fn was_closed(&mut self) -> bool {
        self.drain();
        self.closed
    }

    /// Drop the receiving end, as a dead socket would
    pub fn hang_up(&mut self) {
        self.outbox = None;
    }
}

/// A dispatcher on in-memory stores
pub struct TestArena {
    pub dispatcher: Dispatcher,
    pub profiles: Arc<InMemoryProfileStore>,
    pub archive: Arc<InMemoryArchive>,
    next_id: u64,
}

impl TestArena {
    pub fn new() -> Self {
        Self::with_settings(ArenaSettings::default())
    }

    pub fn with_settings(settings: ArenaSettings) -> Self {
        let profiles = Arc::new(InMemoryProfileStore::new(settings.initial_elo));
        let archive = Arc::new(InMemoryArchive::new());
        let dispatcher = Dispatcher::new(settings, profiles.clone(), archive.clone());
        Self {
            dispatcher,
            profiles,
            archive,
            next_id: 1,
        }
    }

    /// Open a connection whose first line is `name`
    pub fn connect(&mut self, name: &str) -> TestClient {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        let (tx, rx) = outbox();
        self.dispatcher.handle_event(ArenaEvent::Connected {
            id,
            name: name.to_string(),
            outbox: tx,
        });
        TestClient {
            id,
            name: name.to_string(),
            outbox: Some(rx),
            closed: false,
        }
    }

    pub fn send(&mut self, client: &TestClient, line: &str) {
        self.dispatcher.handle_event(ArenaEvent::Line {
            id: client.id,
            line: line.to_string(),
        });
    }

    pub fn disconnect(&mut self, client: &TestClient) {
        self.dispatcher
            .handle_event(ArenaEvent::Disconnected { id: client.id });
    }

    pub fn state(&self, client: &TestClient) -> Option<SessionState> {
        self.dispatcher.sessions().state(client.id)
    }

    /// Challenge and accept; the challenger sits in the first seat
    pub fn start_duel(&mut self, challenger: &mut TestClient, challenged: &mut TestClient) -> RoomId {
        self.send(challenger, "3");
        self.send(challenger, &challenged.name.clone());
        self.send(challenged, "accept");
        challenger.drain();
        challenged.drain();
        match self.state(challenger) {
            Some(SessionState::InRoom { room_id, .. }) => room_id,
            other => panic!("duel did not start, challenger is in {other:?}"),
        }
    }

    /// Jump an active room to a known position
    pub fn set_position(&mut self, room_id: RoomId, board: Board, turn: Seat) {
        self.dispatcher
            .rooms_mut()
            .get_mut(room_id)
            .expect("room should exist")
            .set_position(board, turn)
            .expect("room should be active");
    }

    /// Make `a` and `b` friends through the protocol
    pub fn befriend(&mut self, a: &mut TestClient, b: &mut TestClient) {
        self.send(a, "7");
        self.send(a, &b.name.clone());
        self.send(b, "8");
        self.send(b, &a.name.clone());
        a.drain();
        b.drain();
    }
}

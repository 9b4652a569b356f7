//! Central dispatcher
//!
//! One task owns the session table, the room table and the matchmaker, and
//! handles events one at a time in arrival order, including every cascade
//! (broadcasts, room teardown) an event triggers. Connection tasks only feed
//! events in and drain outboxes, so nothing here needs a lock.

use super::messages;
use crate::config::ArenaSettings;
use crate::error::ArenaError;
use crate::metrics::MetricsCollector;
use crate::profile::ProfileStore;
use crate::replay::GameArchive;
use crate::room::{Matchmaker, RoomRegistry};
use crate::service::health::{ArenaStats, SharedStats};
use crate::session::{Command, Outbox, Outbound, Session, SessionState, SessionTable};
use crate::types::{ConnectionId, GameOutcome};
use crate::utils::{clean_line, current_timestamp, is_valid_name};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Capacity of the channel feeding the dispatcher
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Everything the I/O layer reports to the dispatcher
#[derive(Debug)]
pub enum ArenaEvent {
    /// Handshake done: the first line of the connection was `name`
    Connected {
        id: ConnectionId,
        name: String,
        outbox: Outbox,
    },
    /// One inbound line
    Line { id: ConnectionId, line: String },
    /// Socket closed or failed
    Disconnected { id: ConnectionId },
    /// Stop the server
    Shutdown,
}

/// Running totals since start
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct GameCounters {
    pub games_started: u64,
    pub games_finished: u64,
    pub moves_played: u64,
}

/// Owner of all arena state
pub struct Dispatcher {
    pub(super) settings: ArenaSettings,
    pub(super) sessions: SessionTable,
    pub(super) rooms: RoomRegistry,
    pub(super) matchmaker: Matchmaker,
    pub(super) profiles: Arc<dyn ProfileStore>,
    pub(super) archive: Arc<dyn GameArchive>,
    pub(super) metrics: Option<Arc<MetricsCollector>>,
    pub(super) counters: GameCounters,
    started_at: DateTime<Utc>,
    running: bool,
}

impl Dispatcher {
    pub fn new(
        settings: ArenaSettings,
        profiles: Arc<dyn ProfileStore>,
        archive: Arc<dyn GameArchive>,
    ) -> Self {
        Self {
            sessions: SessionTable::new(settings.max_clients),
            rooms: RoomRegistry::new(settings.max_rooms),
            matchmaker: Matchmaker::new(),
            settings,
            profiles,
            archive,
            metrics: None,
            counters: GameCounters::default(),
            started_at: current_timestamp(),
            running: true,
        }
    }

    /// Record metrics into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// Mutable room table, for setting up positions from tools and tests
    pub fn rooms_mut(&mut self) -> &mut RoomRegistry {
        &mut self.rooms
    }

    pub fn matchmaker(&self) -> &Matchmaker {
        &self.matchmaker
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Snapshot of the tables for health and stats reporting
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            running: self.running,
            started_at: self.started_at,
            sessions: self.sessions.len(),
            max_clients: self.settings.max_clients,
            active_rooms: self.rooms.active_count(),
            pending_duels: self.matchmaker.pending_count(),
            max_rooms: self.settings.max_rooms,
            observers: self.observer_count(),
            games_started: self.counters.games_started,
            games_finished: self.counters.games_finished,
            moves_played: self.counters.moves_played,
        }
    }

    fn observer_count(&self) -> usize {
        self.rooms
            .active_rooms()
            .map(|room| room.observers().len())
            .sum()
    }

    /// Consume events until shutdown or until every sender is gone
    pub async fn run(mut self, mut events: mpsc::Receiver<ArenaEvent>, stats: Option<SharedStats>) {
        info!(
            "Dispatcher started (max clients: {}, max rooms: {})",
            self.settings.max_clients, self.settings.max_rooms
        );
        if let Some(stats) = &stats {
            *stats.write().await = self.stats();
        }

        while let Some(event) = events.recv().await {
            let timer = self.metrics.as_ref().map(|m| m.start_timer());
            self.handle_event(event);

            if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
                metrics.record_line_handled(timer.stop());
                metrics.update_gauges(
                    self.sessions.len(),
                    self.rooms.active_count(),
                    self.observer_count(),
                );
            }
            if let Some(stats) = &stats {
                *stats.write().await = self.stats();
            }
            if !self.running {
                break;
            }
        }

        if self.running {
            self.shutdown();
            if let Some(stats) = &stats {
                *stats.write().await = self.stats();
            }
        }
        info!(
            "Dispatcher stopped after {} games",
            self.counters.games_finished
        );
    }

    /// Handle one event with all its consequences
    pub fn handle_event(&mut self, event: ArenaEvent) {
        if !self.running {
            debug!("Ignoring event after shutdown: {:?}", event);
            return;
        }
        match event {
            ArenaEvent::Connected { id, name, outbox } => self.connect(id, name, outbox),
            ArenaEvent::Line { id, line } => self.handle_line(id, &line),
            ArenaEvent::Disconnected { id } => self.disconnect(id),
            ArenaEvent::Shutdown => self.shutdown(),
        }
    }

    fn connect(&mut self, id: ConnectionId, name: String, outbox: Outbox) {
        let name = clean_line(&name).to_string();
        let reject = |reason: &str| {
            let _ = outbox.send(Outbound::Text(reason.to_string()));
            let _ = outbox.send(Outbound::Close);
        };

        if !is_valid_name(&name) {
            info!("Rejected {}: invalid name {:?}", id, name);
            reject(&format!("Invalid name. {}", messages::NAME_RULES));
            self.record_connection(false);
            return;
        }
        if self.sessions.is_full() {
            info!("Rejected {} ({}): client table full", id, name);
            reject(messages::SERVER_FULL);
            self.record_connection(false);
            return;
        }

        let elo = match self.profiles.get_elo(&name) {
            Ok(elo) => elo,
            Err(e) => {
                warn!("Could not load rating of {}: {}", name, e);
                self.settings.initial_elo
            }
        };

        let session = Session::new(id, name.clone(), elo, outbox.clone());
        if let Err(e) = self.sessions.insert(session) {
            info!("Rejected {} ({}): {}", id, name, e);
            reject(&e.to_string());
            self.record_connection(false);
            return;
        }

        info!("{} connected as {} (rating {})", id, name, elo);
        self.record_connection(true);
        self.send(id, messages::welcome(&name, elo));
        self.send_menu(id);
    }

    fn handle_line(&mut self, id: ConnectionId, raw: &str) {
        let Some(state) = self.sessions.state(id) else {
            debug!("Line from unknown connection {}", id);
            return;
        };
        let line = clean_line(raw);
        if line.is_empty() {
            return;
        }
        let command = Command::parse(line);
        debug!("{} [{}] {:?}", id, state.label(), command);

        match state {
            SessionState::Lobby => self.handle_lobby(id, command),
            SessionState::AwaitingOpponentName => self.handle_opponent_name(id, command, line),
            SessionState::PendingDuel { room_id, role } => {
                self.handle_pending_duel(id, room_id, role, command)
            }
            SessionState::InRoom { room_id, seat } => {
                self.handle_in_room(id, room_id, seat, command, line)
            }
            SessionState::Observing { room_id } => self.handle_observing(id, room_id, command),
            SessionState::Prompt(kind) => self.handle_prompt(id, kind, command, line),
            SessionState::Replaying => self.handle_replay(id, command),
        }
    }

    /// Remove a session, settling whatever it was part of
    pub(super) fn disconnect(&mut self, id: ConnectionId) {
        let Some(state) = self.sessions.state(id) else {
            return;
        };

        match state {
            SessionState::InRoom { room_id, seat } => {
                self.end_room(room_id, GameOutcome::Forfeit { loser: seat });
            }
            SessionState::Observing { room_id } => {
                if let Some(room) = self.rooms.get_mut(room_id) {
                    room.remove_observer(id);
                }
            }
            SessionState::PendingDuel { room_id, .. } => {
                self.abandon_duel(id, room_id, "disconnected");
            }
            _ => {}
        }

        if let Some(session) = self.sessions.remove(id) {
            info!("{} ({}) disconnected", id, session.name);
        }
    }

    /// Tell everyone, close every connection, refuse further events
    pub fn shutdown(&mut self) {
        info!(
            "Shutting down: closing {} sessions, {} active rooms",
            self.sessions.len(),
            self.rooms.active_count()
        );
        for session in self.sessions.iter() {
            session.send(messages::SHUTTING_DOWN);
            session.close();
        }
        self.running = false;
    }

    pub(super) fn send(&self, id: ConnectionId, text: impl Into<String>) {
        if !self.sessions.send(id, text) {
            debug!("Dropped output for {}", id);
        }
    }

    pub(super) fn send_menu(&self, id: ConnectionId) {
        if let Some(session) = self.sessions.get(id) {
            session.send(messages::menu(session.privacy));
        }
    }

    /// Tell the client what went wrong
    pub(super) fn report(&self, id: ConnectionId, err: &ArenaError) {
        debug!("{} -> {}", id, err);
        if let Some(metrics) = &self.metrics {
            metrics.record_client_error(err.kind());
        }
        self.send(id, err.to_string());
    }

    pub(super) fn invalid_option(&self, id: ConnectionId) {
        if let Some(metrics) = &self.metrics {
            metrics.record_client_error("invalid_option");
        }
        self.send(id, messages::INVALID_OPTION);
    }

    /// Put a session back on the main menu
    pub(super) fn return_to_lobby(&mut self, id: ConnectionId) {
        if let Some(session) = self.sessions.get_mut(id) {
            session.reset_to_lobby();
        }
        self.send_menu(id);
    }

    fn record_connection(&self, accepted: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_connection(accepted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArenaResult;
    use crate::profile::MockProfileStore;
    use crate::replay::InMemoryArchive;
    use crate::session::{outbox, OutboxReceiver};
    use crate::types::Seat;
    use mockall::predicate::eq;

    fn dispatcher_with(store: MockProfileStore) -> Dispatcher {
        Dispatcher::new(
            ArenaSettings::default(),
            Arc::new(store),
            Arc::new(InMemoryArchive::new()),
        )
    }

    fn join(dispatcher: &mut Dispatcher, id: u64, name: &str) -> OutboxReceiver {
        let (tx, rx) = outbox();
        dispatcher.handle_event(ArenaEvent::Connected {
            id: ConnectionId(id),
            name: name.to_string(),
            outbox: tx,
        });
        rx
    }

    fn line(dispatcher: &mut Dispatcher, id: u64, text: &str) {
        dispatcher.handle_event(ArenaEvent::Line {
            id: ConnectionId(id),
            line: text.to_string(),
        });
    }

    fn texts(rx: &mut OutboxReceiver) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let Outbound::Text(text) = message {
                out.push(text);
            }
        }
        out
    }

    fn unavailable<T>() -> ArenaResult<T> {
        Err(ArenaError::store("disk on fire"))
    }

    #[test]
    fn test_forfeit_adjusts_each_rating_once() {
        let mut store = MockProfileStore::new();
        store.expect_get_elo().returning(|_| Ok(1000));
        store
            .expect_adjust_elo()
            .with(eq("bob"), eq(30))
            .times(1)
            .returning(|_, _| Ok(1030));
        store
            .expect_adjust_elo()
            .with(eq("alice"), eq(-30))
            .times(1)
            .returning(|_, _| Ok(970));

        let mut dispatcher = dispatcher_with(store);
        let _alice = join(&mut dispatcher, 1, "alice");
        let _bob = join(&mut dispatcher, 2, "bob");
        line(&mut dispatcher, 1, "3");
        line(&mut dispatcher, 1, "bob");
        line(&mut dispatcher, 2, "accept");
        assert!(matches!(
            dispatcher.sessions().state(ConnectionId(1)),
            Some(SessionState::InRoom {
                seat: Seat::First,
                ..
            })
        ));

        line(&mut dispatcher, 1, "/-1");
        dispatcher.handle_event(ArenaEvent::Disconnected { id: ConnectionId(1) });
        dispatcher.handle_event(ArenaEvent::Disconnected { id: ConnectionId(2) });

        assert_eq!(dispatcher.stats().games_finished, 1);
        assert!(dispatcher.sessions().is_empty());
    }

    #[test]
    fn test_store_failures_degrade_to_defaults() {
        let mut store = MockProfileStore::new();
        store.expect_get_elo().returning(|_| unavailable());
        store.expect_adjust_elo().returning(|_, _| unavailable());
        store.expect_get_bio().returning(|_| unavailable());

        let mut dispatcher = dispatcher_with(store);
        let mut alice = join(&mut dispatcher, 1, "alice");
        let mut bob = join(&mut dispatcher, 2, "bob");
        assert!(texts(&mut alice)[0].contains("Your rating is 1000."));

        line(&mut dispatcher, 2, "5");
        line(&mut dispatcher, 2, "alice");
        assert!(texts(&mut bob).contains(&"Player not found or bio not set.".to_string()));

        line(&mut dispatcher, 1, "3");
        line(&mut dispatcher, 1, "bob");
        line(&mut dispatcher, 2, "accept");
        line(&mut dispatcher, 2, "/-1");

        assert!(texts(&mut alice).contains(&"Your rating is now 1030 (+30).".to_string()));
        assert_eq!(dispatcher.sessions().get(ConnectionId(1)).unwrap().elo, 1030);
        assert_eq!(dispatcher.sessions().get(ConnectionId(2)).unwrap().elo, 970);
    }

    #[test]
    fn test_unknown_connections_are_ignored() {
        let mut dispatcher = dispatcher_with(MockProfileStore::new());
        line(&mut dispatcher, 9, "1");
        dispatcher.handle_event(ArenaEvent::Disconnected { id: ConnectionId(9) });
        assert!(dispatcher.sessions().is_empty());
        assert!(dispatcher.is_running());
    }

    #[test]
    fn test_metrics_follow_events() {
        let mut store = MockProfileStore::new();
        store.expect_get_elo().returning(|_| Ok(1000));
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let mut dispatcher = dispatcher_with(store).with_metrics(metrics.clone());

        let _alice = join(&mut dispatcher, 1, "alice");
        let _twin = join(&mut dispatcher, 2, "alice");
        line(&mut dispatcher, 1, "nonsense");

        let stats = dispatcher.stats();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.pending_duels, 0);
        let connections = &metrics.connections().connections_total;
        assert_eq!(connections.with_label_values(&["accepted"]).get(), 1);
        assert_eq!(connections.with_label_values(&["rejected"]).get(), 1);
        assert_eq!(
            metrics
                .connections()
                .client_errors_total
                .with_label_values(&["invalid_option"])
                .get(),
            1
        );
    }
}

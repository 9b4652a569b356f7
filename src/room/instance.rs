//! Game room: one board, two seats, any number of observers

use crate::error::{ArenaError, ArenaResult};
use crate::game::{Board, MoveOutcome};
use crate::replay::GameLogWriter;
use crate::types::{ConnectionId, GameOutcome, PlayerName, RoomId, RoomPrivacy, Seat};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::warn;

/// Lifecycle of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    /// Slot reserved by a duel request, waiting for the accept
    Forming,
    /// Game in progress
    Active,
    /// Game over, slot about to be released
    Finished,
}

/// A player seated in a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ConnectionId,
    pub name: PlayerName,
}

impl Participant {
    pub fn new(id: ConnectionId, name: impl Into<PlayerName>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One game between two players
pub struct Room {
    id: RoomId,
    status: RoomStatus,
    players: [Participant; 2],
    board: Board,
    turn: Seat,
    observers: HashSet<ConnectionId>,
    privacy: RoomPrivacy,
    recorder: Option<Box<dyn GameLogWriter>>,
    started_at: Option<DateTime<Utc>>,
    moves_played: u32,
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("players", &self.players)
            .field("turn", &self.turn)
            .field("observers", &self.observers.len())
            .field("privacy", &self.privacy)
            .field("moves_played", &self.moves_played)
            .finish()
    }
}

impl Room {
    /// Reserve a room for a duel; the challenger takes the first seat
    pub fn forming(id: RoomId, challenger: Participant, challenged: Participant) -> Self {
        Self {
            id,
            status: RoomStatus::Forming,
            players: [challenger, challenged],
            board: Board::new(),
            turn: Seat::First,
            observers: HashSet::new(),
            privacy: RoomPrivacy::Public,
            recorder: None,
            started_at: None,
            moves_played: 0,
        }
    }

    /// Start play on a fresh board
    pub fn activate(&mut self, privacy: RoomPrivacy) -> ArenaResult<()> {
        if self.status != RoomStatus::Forming {
            return Err(ArenaError::RoomNotFound { room_id: self.id });
        }
        self.status = RoomStatus::Active;
        self.board = Board::new();
        self.turn = Seat::First;
        self.privacy = privacy;
        self.started_at = Some(current_timestamp());
        Ok(())
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == RoomStatus::Active
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Seat {
        self.turn
    }

    pub fn privacy(&self) -> RoomPrivacy {
        self.privacy
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn moves_played(&self) -> u32 {
        self.moves_played
    }

    pub fn player(&self, seat: Seat) -> &Participant {
        &self.players[seat.index()]
    }

    pub fn player_ids(&self) -> [ConnectionId; 2] {
        [self.players[0].id, self.players[1].id]
    }

    pub fn player_names(&self) -> [&str; 2] {
        [self.players[0].name.as_str(), self.players[1].name.as_str()]
    }

    pub fn seat_of(&self, id: ConnectionId) -> Option<Seat> {
        Seat::ALL
            .into_iter()
            .find(|seat| self.players[seat.index()].id == id)
    }

    /// Continue an active game from a given position
    pub fn set_position(&mut self, board: Board, turn: Seat) -> ArenaResult<()> {
        if !self.is_active() {
            return Err(ArenaError::RoomNotFound { room_id: self.id });
        }
        self.board = board;
        self.turn = turn;
        Ok(())
    }

    /// Play seat-relative pit `number` (1-6) for `seat`
    pub fn play(&mut self, seat: Seat, number: i64) -> ArenaResult<MoveOutcome> {
        if !self.is_active() {
            return Err(ArenaError::RoomNotFound { room_id: self.id });
        }
        if self.turn != seat {
            return Err(ArenaError::protocol("not your turn, wait for the other player"));
        }
        let pit = u8::try_from(number)
            .ok()
            .and_then(|n| Board::pit_for(seat, n))
            .ok_or_else(|| ArenaError::protocol("use /1 to /6 to move or /-1 to leave"))?;

        let outcome = self.board.apply_move(seat, pit)?;
        self.moves_played += 1;
        if !outcome.winner {
            self.turn = seat.opponent();
        }
        Ok(outcome)
    }

    /// True if the player to move has no legal move left
    pub fn is_stalemate(&self) -> bool {
        self.is_active()
            && self.board.winner().is_none()
            && self.board.legal_moves(self.turn).is_empty()
    }

    /// Credit the remaining seeds and score the game
    pub fn settle(&mut self) -> GameOutcome {
        self.board.settle()
    }

    /// Mark the game over; only the first call on an active room succeeds
    pub fn finish(&mut self) -> bool {
        if self.status == RoomStatus::Active {
            self.status = RoomStatus::Finished;
            true
        } else {
            false
        }
    }

    pub fn observers(&self) -> &HashSet<ConnectionId> {
        &self.observers
    }

    /// Add an observer, bounded by `limit`
    pub fn add_observer(&mut self, id: ConnectionId, limit: usize) -> ArenaResult<()> {
        if self.observers.contains(&id) {
            return Ok(());
        }
        if self.observers.len() >= limit {
            return Err(ArenaError::CapacityExceeded {
                resource: format!("observer list of room {}", self.id),
            });
        }
        self.observers.insert(id);
        Ok(())
    }

    pub fn remove_observer(&mut self, id: ConnectionId) -> bool {
        self.observers.remove(&id)
    }

    /// Empty the observer set, returning who was in it
    pub fn take_observers(&mut self) -> Vec<ConnectionId> {
        self.observers.drain().collect()
    }

    /// Players and observers
    pub fn audience(&self) -> Vec<ConnectionId> {
        let mut ids = self.player_ids().to_vec();
        ids.extend(self.observers.iter().copied());
        ids
    }

    pub fn attach_recorder(&mut self, recorder: Box<dyn GameLogWriter>) {
        self.recorder = Some(recorder);
    }

    pub fn log_name(&self) -> Option<&str> {
        self.recorder.as_ref().map(|r| r.file_name())
    }

    /// Append a block to the game log; a failing log is dropped, play goes on
    pub fn record(&mut self, block: &str) {
        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(e) = recorder.append_block(block) {
                warn!("Room {}: game log disabled: {}", self.id, e);
                self.recorder = None;
            }
        }
    }

    /// Write the result block and publish the log
    pub fn finish_recording(&mut self, result: &str) {
        if let Some(mut recorder) = self.recorder.take() {
            if let Err(e) = recorder.finish(result) {
                warn!("Room {}: could not complete game log: {}", self.id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MoveRejection;
    use crate::replay::{GameArchive, InMemoryArchive};

    fn active_room() -> Room {
        let mut room = Room::forming(
            0,
            Participant::new(ConnectionId(1), "alice"),
            Participant::new(ConnectionId(2), "bob"),
        );
        room.activate(RoomPrivacy::Public).unwrap();
        room
    }

    #[test]
    fn test_challenger_moves_first() {
        let mut room = active_room();
        assert_eq!(room.player(Seat::First).name, "alice");
        assert_eq!(room.seat_of(ConnectionId(2)), Some(Seat::Second));

        let outcome = room.play(Seat::First, 3).unwrap();
        assert_eq!(outcome.pit, 2);
        assert_eq!(room.turn(), Seat::Second);
        assert_eq!(room.board().seeds(2), 0);
        for pit in 3..=6 {
            assert_eq!(room.board().seeds(pit), 5);
        }
    }

    #[test]
    fn test_set_position_needs_an_active_room() {
        let mut forming = Room::forming(
            0,
            Participant::new(ConnectionId(1), "alice"),
            Participant::new(ConnectionId(2), "bob"),
        );
        let endgame = Board::from_position([0, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0], [24, 22]);
        assert!(forming.set_position(endgame.clone(), Seat::First).is_err());

        let mut room = active_room();
        room.set_position(endgame, Seat::Second).unwrap();
        assert_eq!(room.turn(), Seat::Second);
        assert_eq!(room.board().score(Seat::First), 24);
    }

    #[test]
    fn test_out_of_turn_and_out_of_range() {
        let mut room = active_room();
        assert!(matches!(
            room.play(Seat::Second, 1),
            Err(ArenaError::Protocol { .. })
        ));
        assert!(matches!(
            room.play(Seat::First, 7),
            Err(ArenaError::Protocol { .. })
        ));
        assert!(matches!(
            room.play(Seat::First, -3),
            Err(ArenaError::Protocol { .. })
        ));
        assert_eq!(room.turn(), Seat::First);
        assert_eq!(room.moves_played(), 0);
    }

    #[test]
    fn test_second_seat_plays_its_own_row() {
        let mut room = active_room();
        room.play(Seat::First, 1).unwrap();
        let outcome = room.play(Seat::Second, 1).unwrap();
        assert_eq!(outcome.pit, 6);
        assert_eq!(room.turn(), Seat::First);
    }

    #[test]
    fn test_illegal_move_keeps_turn() {
        let mut room = active_room();
        room.play(Seat::First, 3).unwrap();
        room.play(Seat::Second, 1).unwrap();
        let err = room.play(Seat::First, 3).unwrap_err();
        assert!(matches!(
            err,
            ArenaError::IllegalMove(MoveRejection::EmptyPit { pit: 2 })
        ));
        assert_eq!(room.turn(), Seat::First);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut room = active_room();
        assert!(room.finish());
        assert!(!room.finish());
        assert_eq!(room.status(), RoomStatus::Finished);
        assert!(matches!(
            room.play(Seat::First, 1),
            Err(ArenaError::RoomNotFound { .. })
        ));
    }

    #[test]
    fn test_observer_limit() {
        let mut room = active_room();
        room.add_observer(ConnectionId(10), 2).unwrap();
        room.add_observer(ConnectionId(10), 2).unwrap();
        room.add_observer(ConnectionId(11), 2).unwrap();
        assert!(matches!(
            room.add_observer(ConnectionId(12), 2),
            Err(ArenaError::CapacityExceeded { .. })
        ));
        assert_eq!(room.audience().len(), 4);
        assert_eq!(room.take_observers().len(), 2);
        assert!(room.observers().is_empty());
    }

    #[test]
    fn test_recording_publishes_log() {
        let archive = InMemoryArchive::new();
        let mut room = active_room();
        let writer = archive.create_log(room.player_names(), Utc::now()).unwrap();
        room.attach_recorder(writer);
        let name = room.log_name().unwrap().to_string();

        room.record("header");
        room.finish_recording("alice wins");

        assert_eq!(
            archive.blocks(&name),
            Some(vec!["header".to_string(), "alice wins".to_string()])
        );
        assert_eq!(room.log_name(), None);
    }
}

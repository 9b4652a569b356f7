//! In-game handlers: moves, chat, observers and room teardown

use super::dispatcher::Dispatcher;
use super::messages;
use crate::error::ArenaError;
use crate::session::{Command, SessionState};
use crate::types::{ConnectionId, GameOutcome, RoomId, RoomPrivacy, Seat};
use crate::utils::{current_timestamp, generate_game_id};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl Dispatcher {
    /// Open the game log and greet both players of a freshly activated room
    pub(super) fn start_game(&mut self, room_id: RoomId) {
        let archive = Arc::clone(&self.archive);
        let Some(room) = self.rooms.get_mut(room_id) else {
            warn!("Room {} vanished before the game started", room_id);
            return;
        };

        let names = room.player_names().map(str::to_string);
        let names = [names[0].as_str(), names[1].as_str()];
        let started_at = room.started_at().unwrap_or_else(current_timestamp);
        match archive.create_log(names, started_at) {
            Ok(recorder) => room.attach_recorder(recorder),
            Err(e) => warn!("Room {}: game will not be recorded: {}", room_id, e),
        }

        let board = messages::board_view(room.board(), names);
        room.record(&format!(
            "Game {}\n{} vs {}\nStarted: {}\nPrivacy: {}",
            generate_game_id(),
            names[0],
            names[1],
            started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            room.privacy()
        ));
        room.record(&board);

        let announcement = messages::game_started(room_id, names);
        let ids = room.player_ids();
        let first = room.player(Seat::First).id;
        for id in ids {
            self.send(id, announcement.as_str());
            self.send(id, board.as_str());
        }
        self.send(first, messages::YOUR_TURN);

        self.counters.games_started += 1;
        if let Some(metrics) = &self.metrics {
            metrics.record_game_started();
        }
    }

    pub(super) fn handle_in_room(
        &mut self,
        id: ConnectionId,
        room_id: RoomId,
        seat: Seat,
        command: Command,
        line: &str,
    ) {
        match command {
            Command::Forfeit => {
                info!("{} left room {}", id, room_id);
                self.end_room(room_id, GameOutcome::Forfeit { loser: seat });
            }
            Command::Move(number) => self.play_move(id, room_id, seat, number),
            _ => self.room_chat(id, room_id, line),
        }
    }

    fn play_move(&mut self, id: ConnectionId, room_id: RoomId, seat: Seat, number: i64) {
        let played = self
            .rooms
            .active_mut(room_id)
            .and_then(|room| room.play(seat, number));
        let outcome = match played {
            Ok(outcome) => outcome,
            Err(e) => {
                self.record_move(false);
                self.report(id, &e);
                return;
            }
        };
        self.record_move(true);
        self.counters.moves_played += 1;

        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let names = room.player_names().map(str::to_string);
        let board = messages::board_view(room.board(), [names[0].as_str(), names[1].as_str()]);
        let announcement = messages::move_played(&names[seat.index()], number, outcome.captured);
        room.record(&format!("{announcement}\n{board}"));

        let stalemate = !outcome.winner && room.is_stalemate();
        let next = room.player(room.turn()).clone();
        let audience = room.audience();

        for target in &audience {
            self.send(*target, board.as_str());
            self.send(*target, announcement.as_str());
        }

        if outcome.winner {
            self.end_room(room_id, GameOutcome::Victory { winner: seat });
        } else if stalemate {
            let Some(room) = self.rooms.get_mut(room_id) else {
                return;
            };
            debug!("Room {}: {} cannot move, settling", room_id, next.name);
            let settled = room.settle();
            self.end_room(room_id, settled);
        } else {
            let turn = messages::turn_of(&next.name);
            for target in &audience {
                self.send(*target, turn.as_str());
            }
            self.send(next.id, messages::YOUR_TURN);
        }
    }

    fn room_chat(&self, id: ConnectionId, room_id: RoomId, text: &str) {
        let Some(name) = self.sessions.name(id) else {
            return;
        };
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        let line = messages::chat(name, text);
        self.sessions.send_all(&room.audience(), &line);
    }

    /// Join a game as an observer
    pub(super) fn observe(&mut self, id: ConnectionId, room_id: RoomId) {
        let Some(viewer) = self.sessions.name(id).map(str::to_string) else {
            return;
        };
        let (names, privacy) = match self.rooms.active(room_id) {
            Ok(room) => (room.player_names().map(str::to_string), room.privacy()),
            Err(e) => {
                self.report(id, &e);
                return;
            }
        };

        if privacy == RoomPrivacy::FriendsOnly
            && !names
                .iter()
                .any(|player| *player == viewer || self.is_friend(&viewer, player))
        {
            info!("{} may not observe friends-only room {}", viewer, room_id);
            self.report(id, &ArenaError::PrivacyDenied { room_id });
            return;
        }

        let limit = self.settings.max_clients;
        let joined = self.rooms.active_mut(room_id).and_then(|room| {
            room.add_observer(id, limit)
                .map(|()| messages::board_view(room.board(), room.player_names()))
        });
        let board = match joined {
            Ok(board) => board,
            Err(e) => {
                self.report(id, &e);
                return;
            }
        };

        self.sessions
            .set_state(id, SessionState::Observing { room_id });
        self.send(
            id,
            messages::observing(room_id, [names[0].as_str(), names[1].as_str()]),
        );
        self.send(id, board);
        debug!("{} observes room {}", viewer, room_id);
    }

    fn is_friend(&self, a: &str, b: &str) -> bool {
        self.profiles.are_friends(a, b).unwrap_or_else(|e| {
            warn!("Could not check friendship of {} and {}: {}", a, b, e);
            false
        })
    }

    pub(super) fn handle_observing(&mut self, id: ConnectionId, room_id: RoomId, command: Command) {
        if command == Command::Exit {
            if let Some(room) = self.rooms.get_mut(room_id) {
                room.remove_observer(id);
            }
            self.send(id, format!("You stopped observing room {room_id}."));
            self.return_to_lobby(id);
        } else {
            self.invalid_option(id);
            self.send(id, "Type 'exit' to stop observing.");
        }
    }

    /// Close a room: announce, rate, send everyone home, free the slot
    ///
    /// Only the first call for a running game has any effect.
    pub(super) fn end_room(&mut self, room_id: RoomId, outcome: GameOutcome) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        if !room.finish() {
            debug!("Room {} already finished", room_id);
            return;
        }

        let names = room.player_names().map(str::to_string);
        let ids = room.player_ids();
        let moves = room.moves_played();
        let result = messages::game_result(
            &outcome,
            [names[0].as_str(), names[1].as_str()],
            room.board().scores(),
        );
        room.finish_recording(&result);
        let audience = room.audience();
        let observers = room.take_observers();

        for target in &audience {
            self.send(*target, result.as_str());
        }

        if let Some(winner) = outcome.winner() {
            self.apply_rating(ids, &names, winner);
        }

        for observer in observers {
            if self.sessions.state(observer) == Some(SessionState::Observing { room_id }) {
                self.return_to_lobby(observer);
            }
        }
        for id in ids {
            let seated = matches!(
                self.sessions.state(id),
                Some(SessionState::InRoom { room_id: r, .. }) if r == room_id
            );
            if seated {
                self.return_to_lobby(id);
            }
        }

        self.rooms.release(room_id);
        self.counters.games_finished += 1;
        if let Some(metrics) = &self.metrics {
            metrics.record_game_finished(&outcome, moves);
        }
        info!(
            "Room {} closed after {} moves: {} vs {} ({})",
            room_id,
            moves,
            names[0],
            names[1],
            outcome.label()
        );
    }

    fn apply_rating(&mut self, ids: [ConnectionId; 2], names: &[String; 2], winner: Seat) {
        let current = |seat: Seat| {
            let name = &names[seat.index()];
            self.profiles.get_elo(name).unwrap_or_else(|e| {
                warn!("Could not load rating of {}: {}", name, e);
                self.sessions
                    .get(ids[seat.index()])
                    .map_or(self.settings.initial_elo, |s| s.elo)
            })
        };
        let loser = winner.opponent();
        let (winner_elo, loser_elo) = (current(winner), current(loser));
        let change = self.settings.rating.rating_change(winner_elo, loser_elo);

        for (seat, before, delta) in [
            (winner, winner_elo, change.winner_delta),
            (loser, loser_elo, change.loser_delta),
        ] {
            let name = &names[seat.index()];
            let updated = self.profiles.adjust_elo(name, delta).unwrap_or_else(|e| {
                warn!("Could not store rating of {}: {}", name, e);
                before + delta
            });
            if let Some(session) = self.sessions.get_mut(ids[seat.index()]) {
                session.elo = updated;
                session.send(messages::rating_update(updated, delta));
            }
            info!("{} rating {} -> {} ({:+})", name, before, updated, delta);
        }
    }

    fn record_move(&self, accepted: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_move(accepted);
        }
    }
}

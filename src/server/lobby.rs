//! Lobby-side handlers: menu, duel setup, prompts and replays

use super::dispatcher::Dispatcher;
use super::messages;
use crate::error::ArenaError;
use crate::profile::{is_valid_bio, MAX_BIO_LENGTH};
use crate::replay::ReplayCursor;
use crate::session::{Command, DuelRole, PromptKind, SessionState};
use crate::types::{ConnectionId, RoomId};
use crate::utils::is_valid_name;
use std::sync::Arc;
use tracing::{info, warn};

impl Dispatcher {
    pub(super) fn handle_lobby(&mut self, id: ConnectionId, command: Command) {
        match command {
            Command::ListClients => self.list_clients(id),
            Command::Disconnect => {
                self.send(id, messages::DISCONNECTING);
                if let Some(session) = self.sessions.get(id) {
                    session.close();
                }
                self.disconnect(id);
            }
            Command::Join => self.offer_opponents(id),
            Command::SetBio => self.open_prompt(
                id,
                PromptKind::Bio,
                format!(
                    "Enter your bio (one line, ASCII only, at most {MAX_BIO_LENGTH} characters) \
                     or 'exit' to cancel:"
                ),
            ),
            Command::ViewBio => self.open_prompt(
                id,
                PromptKind::BioTarget,
                "Enter the name of the player whose bio you want to view:".to_string(),
            ),
            Command::ListRooms => self.list_rooms(id),
            Command::SendFriendRequest => self.open_prompt(
                id,
                PromptKind::FriendName,
                "Enter the name of the player you want to befriend:".to_string(),
            ),
            Command::PendingFriendRequests => self.show_friend_requests(id),
            Command::TogglePrivacy => {
                if let Some(session) = self.sessions.get_mut(id) {
                    session.privacy = session.privacy.toggled();
                    let text = format!("Your games are now {}.", session.privacy);
                    session.send(text);
                }
            }
            Command::ListGames => self.list_games(id),
            Command::Observe(room_id) => self.observe(id, room_id),
            Command::Replay(file) => self.start_replay(id, &file),
            _ => {
                self.invalid_option(id);
                self.send_menu(id);
            }
        }
    }

    fn list_clients(&self, id: ConnectionId) {
        let mut entries: Vec<String> = self
            .sessions
            .iter()
            .map(|s| format!("{} ({}, {})", s.name, s.elo, s.state.label()))
            .collect();
        entries.sort();
        self.send(
            id,
            messages::listing("Connected clients:", &entries, "Nobody is connected."),
        );
        self.send_menu(id);
    }

    fn offer_opponents(&mut self, id: ConnectionId) {
        let candidates = self.sessions.lobby_names(Some(id));
        self.send(
            id,
            messages::listing(
                "Available clients for a duel:",
                &candidates,
                "Nobody is available right now.",
            ),
        );
        self.send(
            id,
            "Enter the name of the client you want to challenge (or 'exit' to cancel):",
        );
        self.sessions
            .set_state(id, SessionState::AwaitingOpponentName);
    }

    fn list_rooms(&self, id: ConnectionId) {
        let entries: Vec<String> = self
            .rooms
            .active_rooms()
            .map(|room| {
                messages::room_entry(
                    room.id(),
                    room.player_names(),
                    room.observers().len(),
                    room.moves_played(),
                    room.privacy(),
                )
            })
            .collect();
        self.send(
            id,
            messages::listing("Currently ongoing games:", &entries, "No ongoing games."),
        );
    }

    fn list_games(&self, id: ConnectionId) {
        let games = match self.archive.list_completed_games() {
            Ok(games) => games,
            Err(e) => {
                warn!("Could not list recorded games: {}", e);
                Vec::new()
            }
        };
        self.send(
            id,
            messages::listing("Recorded games:", &games, "No recorded games yet."),
        );
    }

    fn open_prompt(&mut self, id: ConnectionId, kind: PromptKind, prompt: String) {
        self.sessions.set_state(id, SessionState::Prompt(kind));
        self.send(id, prompt);
    }

    fn show_friend_requests(&mut self, id: ConnectionId) {
        let Some(name) = self.sessions.name(id).map(str::to_string) else {
            return;
        };
        let friends = self.profiles.friends_of(&name).unwrap_or_else(|e| {
            warn!("Could not read friends of {}: {}", name, e);
            Vec::new()
        });
        self.send(
            id,
            messages::listing("Your friends:", &friends, "You have no friends yet."),
        );
        match self.profiles.pending_requests_for(&name) {
            Ok(requests) if !requests.is_empty() => {
                self.send(
                    id,
                    messages::listing("Pending friend requests from:", &requests, ""),
                );
                self.open_prompt(
                    id,
                    PromptKind::FriendAccept,
                    "Enter the name to accept (or 'exit' to cancel):".to_string(),
                );
            }
            Ok(_) => self.send(id, "No pending friend requests."),
            Err(e) => {
                warn!("Could not read friend requests of {}: {}", name, e);
                self.send(id, "No pending friend requests.");
            }
        }
    }

    pub(super) fn handle_opponent_name(&mut self, id: ConnectionId, command: Command, line: &str) {
        if command == Command::Exit {
            self.send(id, messages::CANCELLED);
            self.return_to_lobby(id);
            return;
        }

        match self
            .matchmaker
            .request_duel(&mut self.sessions, &mut self.rooms, id, line)
        {
            Ok(room_id) => {
                let challenger = self.sessions.name(id).unwrap_or_default().to_string();
                if let Some(target) = self.matchmaker.pending(room_id).map(|r| r.challenged) {
                    self.send(target, messages::duel_challenge(&challenger, room_id));
                }
                self.send(id, messages::duel_sent(line));
                self.record_duel("sent");
                info!("{} challenged {} (room {})", challenger, line, room_id);
            }
            Err(e) => {
                self.report(id, &e);
                self.record_duel("refused");
                self.return_to_lobby(id);
            }
        }
    }

    pub(super) fn handle_pending_duel(
        &mut self,
        id: ConnectionId,
        room_id: RoomId,
        role: DuelRole,
        command: Command,
    ) {
        match (role, command) {
            (DuelRole::Challenged, Command::Accept) => {
                match self
                    .matchmaker
                    .accept_duel(&mut self.sessions, &mut self.rooms, id)
                {
                    Ok(room_id) => {
                        self.record_duel("accepted");
                        self.start_game(room_id);
                    }
                    Err(e) => {
                        self.report(id, &e);
                        self.return_to_lobby(id);
                    }
                }
            }
            (DuelRole::Challenger, Command::Accept) => {
                self.report(
                    id,
                    &ArenaError::protocol("only the challenged player can accept"),
                );
            }
            (_, Command::Exit) => {
                self.abandon_duel(id, room_id, "cancelled the duel");
                self.send(id, messages::CANCELLED);
                self.send_menu(id);
            }
            (DuelRole::Challenged, command) if command.is_lobby_command() => {
                self.abandon_duel(id, room_id, "declined the duel");
                self.handle_lobby(id, command);
            }
            _ => {
                self.invalid_option(id);
                self.send(id, "Type 'accept' to play or 'exit' to give up the duel.");
            }
        }
    }

    /// Drop a pending duel and tell the other party why
    pub(super) fn abandon_duel(&mut self, id: ConnectionId, room_id: RoomId, reason: &str) {
        let name = self.sessions.name(id).unwrap_or_default().to_string();
        let Some(request) = self
            .matchmaker
            .abandon(&mut self.sessions, &mut self.rooms, room_id)
        else {
            return;
        };
        let other = request.counterpart(id);
        self.send(other, format!("{name} {reason}."));
        self.send_menu(other);
        self.record_duel("abandoned");
        info!("Duel in room {} abandoned: {} {}", room_id, name, reason);
    }

    pub(super) fn handle_prompt(
        &mut self,
        id: ConnectionId,
        kind: PromptKind,
        command: Command,
        line: &str,
    ) {
        if command == Command::Exit {
            self.send(id, messages::CANCELLED);
            self.return_to_lobby(id);
            return;
        }
        let Some(name) = self.sessions.name(id).map(str::to_string) else {
            return;
        };

        match kind {
            PromptKind::Bio => {
                if !is_valid_bio(line) {
                    self.report(
                        id,
                        &ArenaError::protocol(format!(
                            "a bio is one line of printable ASCII without '|', \
                             at most {MAX_BIO_LENGTH} characters"
                        )),
                    );
                    return;
                }
                match self.profiles.set_bio(&name, line) {
                    Ok(()) => self.send(id, "Bio updated successfully."),
                    Err(e) => self.report(id, &e),
                }
            }
            PromptKind::BioTarget => match self.profiles.get_bio(line) {
                Ok(Some(bio)) => self.send(id, format!("Bio of {line}:\n{bio}")),
                Ok(None) => self.send(id, "Player not found or bio not set."),
                Err(e) => {
                    warn!("Could not read bio of {}: {}", line, e);
                    self.send(id, "Player not found or bio not set.");
                }
            },
            PromptKind::FriendName => self.send_friend_request(id, &name, line),
            PromptKind::FriendAccept => self.accept_friend_request(id, &name, line),
        }
        self.return_to_lobby(id);
    }

    fn send_friend_request(&mut self, id: ConnectionId, name: &str, target: &str) {
        if !is_valid_name(target) {
            self.report(
                id,
                &ArenaError::protocol(format!("invalid name. {}", messages::NAME_RULES)),
            );
            return;
        }
        match self.profiles.send_friend_request(name, target) {
            Ok(true) => {
                self.send(id, format!("Friend request sent to {target}."));
                if let Some(other) = self.sessions.find_by_name(target) {
                    self.send(
                        other,
                        format!("{name} sent you a friend request. Use option 8 to answer."),
                    );
                }
            }
            Ok(false) => self.send(
                id,
                format!("You are already friends with {target} or a request is pending."),
            ),
            Err(e) => self.report(id, &e),
        }
    }

    fn accept_friend_request(&mut self, id: ConnectionId, name: &str, requester: &str) {
        match self.profiles.accept_friend_request(requester, name) {
            Ok(true) => {
                self.send(id, format!("You are now friends with {requester}."));
                if let Some(other) = self.sessions.find_by_name(requester) {
                    self.send(other, format!("{name} accepted your friend request."));
                }
            }
            Ok(false) => self.send(id, format!("No pending request from {requester}.")),
            Err(e) => self.report(id, &e),
        }
    }

    fn start_replay(&mut self, id: ConnectionId, file: &str) {
        let cursor = match ReplayCursor::open(self.archive.as_ref(), file) {
            Ok(cursor) => cursor,
            Err(e) => {
                self.report(id, &e);
                return;
            }
        };
        let text = messages::replay_block(file, cursor.position(), cursor.current());
        if let Some(session) = self.sessions.get_mut(id) {
            session.state = SessionState::Replaying;
            session.replay = Some(cursor);
            session.send(text);
            session.send("Type 'next', 'prev' or 'exit'.");
        }
    }

    pub(super) fn handle_replay(&mut self, id: ConnectionId, command: Command) {
        let archive = Arc::clone(&self.archive);
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        let Some(cursor) = session.replay.as_mut() else {
            session.reset_to_lobby();
            self.send_menu(id);
            return;
        };

        let step = match command {
            Command::Next => cursor.next().map(|block| block.map(str::to_string)),
            Command::Prev => cursor
                .prev(archive.as_ref())
                .map(|block| block.map(str::to_string)),
            Command::Exit => {
                session.reset_to_lobby();
                self.send_menu(id);
                return;
            }
            _ => {
                session.send(messages::INVALID_OPTION);
                session.send("Type 'next', 'prev' or 'exit'.");
                return;
            }
        };

        let reply = match step {
            Ok(Some(block)) => messages::replay_block(cursor.file_name(), cursor.position(), &block),
            Ok(None) => {
                "No more blocks in that direction. Type 'next', 'prev' or 'exit'.".to_string()
            }
            Err(e) => e.to_string(),
        };
        session.send(reply);
    }

    fn record_duel(&self, result: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_duel_request(result);
        }
    }
}

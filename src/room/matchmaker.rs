//! Duel requests: from a challenge to a populated room
//!
//! A request reserves its room slot up front, so the room id is known to both
//! parties while the challenge is pending. The request is consumed by the
//! first valid accept and dropped when either side walks away.

use super::instance::Participant;
use super::registry::RoomRegistry;
use crate::error::{ArenaError, ArenaResult};
use crate::session::{DuelRole, SessionState, SessionTable};
use crate::types::{ConnectionId, RoomId, RoomPrivacy, Seat};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

/// A challenge waiting for its answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuelRequest {
    pub room_id: RoomId,
    pub challenger: ConnectionId,
    pub challenged: ConnectionId,
    pub requested_at: DateTime<Utc>,
}

impl DuelRequest {
    /// The other party of the request
    pub fn counterpart(&self, id: ConnectionId) -> ConnectionId {
        if id == self.challenger {
            self.challenged
        } else {
            self.challenger
        }
    }
}

/// Pending duel requests keyed by their reserved room id
#[derive(Debug, Default)]
pub struct Matchmaker {
    pending: HashMap<RoomId, DuelRequest>,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self, room_id: RoomId) -> Option<&DuelRequest> {
        self.pending.get(&room_id)
    }

    /// Challenge the lobby player called `target_name`
    pub fn request_duel(
        &mut self,
        sessions: &mut SessionTable,
        rooms: &mut RoomRegistry,
        requester: ConnectionId,
        target_name: &str,
    ) -> ArenaResult<RoomId> {
        let unavailable = || ArenaError::TargetUnavailable {
            name: target_name.to_string(),
        };

        let challenger = sessions.get(requester).ok_or_else(unavailable)?;
        let challenger = Participant::new(requester, challenger.name.clone());
        let target = sessions
            .find_by_name(target_name)
            .filter(|id| *id != requester)
            .ok_or_else(unavailable)?;
        if !sessions.state(target).is_some_and(|s| s.is_available()) {
            return Err(unavailable());
        }

        let room_id = rooms.reserve(challenger, Participant::new(target, target_name))?;
        self.pending.insert(
            room_id,
            DuelRequest {
                room_id,
                challenger: requester,
                challenged: target,
                requested_at: current_timestamp(),
            },
        );
        sessions.set_state(
            requester,
            SessionState::PendingDuel {
                room_id,
                role: DuelRole::Challenger,
            },
        );
        sessions.set_state(
            target,
            SessionState::PendingDuel {
                room_id,
                role: DuelRole::Challenged,
            },
        );

        debug!("Duel request {} -> {} in room {}", requester, target, room_id);
        Ok(room_id)
    }

    /// Accept the pending challenge addressed to `acceptor`
    ///
    /// The room becomes active with the challenger in the first seat. The
    /// room is friends-only if either player asked for it.
    pub fn accept_duel(
        &mut self,
        sessions: &mut SessionTable,
        rooms: &mut RoomRegistry,
        acceptor: ConnectionId,
    ) -> ArenaResult<RoomId> {
        let acceptor_name = sessions.name(acceptor).unwrap_or_default().to_string();
        let unavailable = |name: String| ArenaError::TargetUnavailable { name };

        let room_id = match sessions.state(acceptor) {
            Some(SessionState::PendingDuel {
                room_id,
                role: DuelRole::Challenged,
            }) => room_id,
            _ => return Err(unavailable(acceptor_name)),
        };
        let request = self
            .pending
            .remove(&room_id)
            .ok_or_else(|| unavailable(acceptor_name.clone()))?;

        let challenger_waiting = sessions.state(request.challenger)
            == Some(SessionState::PendingDuel {
                room_id,
                role: DuelRole::Challenger,
            });
        if request.challenged != acceptor || !challenger_waiting {
            let challenger_name = sessions
                .name(request.challenger)
                .unwrap_or_default()
                .to_string();
            self.discard(sessions, rooms, request);
            return Err(unavailable(challenger_name));
        }

        let privacy = [request.challenger, acceptor]
            .iter()
            .filter_map(|id| sessions.get(*id))
            .fold(RoomPrivacy::Public, |acc, s| {
                if s.privacy == RoomPrivacy::FriendsOnly {
                    RoomPrivacy::FriendsOnly
                } else {
                    acc
                }
            });

        let room = rooms
            .get_mut(room_id)
            .ok_or(ArenaError::RoomNotFound { room_id })?;
        room.activate(privacy)?;

        sessions.set_state(
            request.challenger,
            SessionState::InRoom {
                room_id,
                seat: Seat::First,
            },
        );
        sessions.set_state(
            acceptor,
            SessionState::InRoom {
                room_id,
                seat: Seat::Second,
            },
        );

        info!(
            "Room {} started: {} vs {} ({})",
            room_id,
            room.player(Seat::First).name,
            room.player(Seat::Second).name,
            privacy
        );
        Ok(room_id)
    }

    /// Drop the request for `room_id`, returning both parties to the lobby
    pub fn abandon(
        &mut self,
        sessions: &mut SessionTable,
        rooms: &mut RoomRegistry,
        room_id: RoomId,
    ) -> Option<DuelRequest> {
        let request = self.pending.remove(&room_id)?;
        debug!("Duel request in room {} abandoned", room_id);
        Some(self.discard(sessions, rooms, request))
    }

    fn discard(
        &mut self,
        sessions: &mut SessionTable,
        rooms: &mut RoomRegistry,
        request: DuelRequest,
    ) -> DuelRequest {
        rooms.release(request.room_id);
        for id in [request.challenger, request.challenged] {
            if sessions
                .state(id)
                .and_then(|s| s.room_id())
                .is_some_and(|r| r == request.room_id)
            {
                if let Some(session) = sessions.get_mut(id) {
                    session.reset_to_lobby();
                }
            }
        }
        request
    }
}

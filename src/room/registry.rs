//! Fixed-capacity room table
//!
//! Room ids are slot indices. Released slots go back on a free list and the
//! lowest free id is handed out first.

use super::instance::{Participant, Room};
use crate::error::{ArenaError, ArenaResult};
use crate::types::RoomId;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug)]
pub struct RoomRegistry {
    slots: Vec<Option<Room>>,
    free: BTreeSet<RoomId>,
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            free: (0..capacity).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn free_slots(&self) -> usize {
        self.free.len()
    }

    /// Take the lowest free slot for a forming room
    pub fn reserve(&mut self, challenger: Participant, challenged: Participant) -> ArenaResult<RoomId> {
        let room_id = self
            .free
            .pop_first()
            .ok_or_else(|| ArenaError::CapacityExceeded {
                resource: "room table".to_string(),
            })?;
        self.slots[room_id] = Some(Room::forming(room_id, challenger, challenged));
        debug!("Reserved room {}", room_id);
        Ok(room_id)
    }

    pub fn get(&self, room_id: RoomId) -> Option<&Room> {
        self.slots.get(room_id).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, room_id: RoomId) -> Option<&mut Room> {
        self.slots.get_mut(room_id).and_then(Option::as_mut)
    }

    /// An active room, or `RoomNotFound`
    pub fn active(&self, room_id: RoomId) -> ArenaResult<&Room> {
        self.get(room_id)
            .filter(|room| room.is_active())
            .ok_or(ArenaError::RoomNotFound { room_id })
    }

    pub fn active_mut(&mut self, room_id: RoomId) -> ArenaResult<&mut Room> {
        self.get_mut(room_id)
            .filter(|room| room.is_active())
            .ok_or(ArenaError::RoomNotFound { room_id })
    }

    /// Empty a slot and put it back on the free list
    pub fn release(&mut self, room_id: RoomId) -> Option<Room> {
        let room = self.slots.get_mut(room_id)?.take()?;
        self.free.insert(room_id);
        debug!("Released room {}", room_id);
        Some(room)
    }

    /// Active rooms in id order
    pub fn active_rooms(&self) -> impl Iterator<Item = &Room> {
        self.slots.iter().flatten().filter(|room| room.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active_rooms().count()
    }
}

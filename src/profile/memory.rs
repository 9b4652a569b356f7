//! In-memory profile store
//!
//! [`ProfileData`] holds the tables and the rules for changing them; the
//! flat-file store wraps the same tables and persists them after each write.

use super::store::{ProfileStore, DEFAULT_ELO};
use crate::error::{ArenaError, ArenaResult};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

/// Profile tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileData {
    pub initial_elo: i32,
    pub bios: BTreeMap<String, String>,
    pub elo: BTreeMap<String, i32>,
    pub friends: BTreeMap<String, BTreeSet<String>>,
    /// Pending `(from, to)` requests in the order they were sent
    pub requests: Vec<(String, String)>,
}

impl Default for ProfileData {
    fn default() -> Self {
        Self::new(DEFAULT_ELO)
    }
}

impl ProfileData {
    pub fn new(initial_elo: i32) -> Self {
        Self {
            initial_elo,
            bios: BTreeMap::new(),
            elo: BTreeMap::new(),
            friends: BTreeMap::new(),
            requests: Vec::new(),
        }
    }

    pub fn elo_of(&self, name: &str) -> i32 {
        self.elo.get(name).copied().unwrap_or(self.initial_elo)
    }

    pub fn adjust_elo(&mut self, name: &str, delta: i32) -> i32 {
        let rating = self.elo_of(name).saturating_add(delta);
        self.elo.insert(name.to_string(), rating);
        rating
    }

    pub fn are_friends(&self, a: &str, b: &str) -> bool {
        self.friends
            .get(a)
            .is_some_and(|friends| friends.contains(b))
    }

    pub fn add_friendship(&mut self, a: &str, b: &str) {
        self.friends
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.friends
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
    }

    pub fn send_request(&mut self, from: &str, to: &str) -> ArenaResult<bool> {
        if from == to {
            return Err(ArenaError::protocol("you cannot befriend yourself"));
        }
        if self.are_friends(from, to) || self.has_request(from, to) {
            return Ok(false);
        }
        self.requests.push((from.to_string(), to.to_string()));
        Ok(true)
    }

    pub fn has_request(&self, from: &str, to: &str) -> bool {
        self.requests.iter().any(|(f, t)| f == from && t == to)
    }

    pub fn pending_for(&self, name: &str) -> Vec<String> {
        self.requests
            .iter()
            .filter(|(_, to)| to == name)
            .map(|(from, _)| from.clone())
            .collect()
    }

    pub fn accept_request(&mut self, from: &str, to: &str) -> bool {
        if !self.has_request(from, to) {
            return false;
        }
        // A crossed request in the other direction is settled by the same accept.
        self.requests
            .retain(|(f, t)| !((f == from && t == to) || (f == to && t == from)));
        self.add_friendship(from, to);
        true
    }

    pub fn friends_of(&self, name: &str) -> Vec<String> {
        self.friends
            .get(name)
            .map(|friends| friends.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Profile store that forgets everything on restart
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    data: RwLock<ProfileData>,
}

impl InMemoryProfileStore {
    pub fn new(initial_elo: i32) -> Self {
        Self {
            data: RwLock::new(ProfileData::new(initial_elo)),
        }
    }

    fn read(&self) -> ArenaResult<std::sync::RwLockReadGuard<'_, ProfileData>> {
        self.data
            .read()
            .map_err(|_| ArenaError::store("profile lock poisoned"))
    }

    fn write(&self) -> ArenaResult<std::sync::RwLockWriteGuard<'_, ProfileData>> {
        self.data
            .write()
            .map_err(|_| ArenaError::store("profile lock poisoned"))
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn get_bio(&self, name: &str) -> ArenaResult<Option<String>> {
        Ok(self.read()?.bios.get(name).cloned())
    }

    fn set_bio(&self, name: &str, bio: &str) -> ArenaResult<()> {
        self.write()?.bios.insert(name.to_string(), bio.to_string());
        Ok(())
    }

    fn get_elo(&self, name: &str) -> ArenaResult<i32> {
        Ok(self.read()?.elo_of(name))
    }

    fn adjust_elo(&self, name: &str, delta: i32) -> ArenaResult<i32> {
        Ok(self.write()?.adjust_elo(name, delta))
    }

    fn are_friends(&self, a: &str, b: &str) -> ArenaResult<bool> {
        Ok(self.read()?.are_friends(a, b))
    }

    fn send_friend_request(&self, from: &str, to: &str) -> ArenaResult<bool> {
        self.write()?.send_request(from, to)
    }

    fn pending_requests_for(&self, name: &str) -> ArenaResult<Vec<String>> {
        Ok(self.read()?.pending_for(name))
    }

    fn accept_friend_request(&self, from: &str, to: &str) -> ArenaResult<bool> {
        Ok(self.write()?.accept_request(from, to))
    }

    fn friends_of(&self, name: &str) -> ArenaResult<Vec<String>> {
        Ok(self.read()?.friends_of(name))
    }
}

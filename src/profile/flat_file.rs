//! Flat-file profile store
//!
//! Four text files under one directory, loaded at startup and rewritten in
//! full through a temporary file and a rename whenever their table changes:
//!
//! - `bios.txt`: `name|bio`
//! - `elo.txt`: `name|rating`
//! - `friends.txt`: `name|friend1,friend2`
//! - `friend_requests.txt`: `from|to`
//!
//! Concurrent writers are not coordinated: the last rewrite wins.

use super::memory::ProfileData;
use super::store::ProfileStore;
use crate::error::{ArenaError, ArenaResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

const BIOS_FILE: &str = "bios.txt";
const ELO_FILE: &str = "elo.txt";
const FRIENDS_FILE: &str = "friends.txt";
const REQUESTS_FILE: &str = "friend_requests.txt";

/// Which file a change has to be written to
#[derive(Debug, Clone, Copy)]
enum Table {
    Bios,
    Elo,
    Friends,
    Requests,
}

/// Profile store persisted as pipe-separated text files
#[derive(Debug)]
pub struct FlatFileProfileStore {
    dir: PathBuf,
    data: RwLock<ProfileData>,
}

impl FlatFileProfileStore {
    /// Open the store in `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>, initial_elo: i32) -> ArenaResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut data = ProfileData::new(initial_elo);
        for (name, bio) in read_pairs(&dir.join(BIOS_FILE))? {
            data.bios.insert(name, bio);
        }
        for (name, rating) in read_pairs(&dir.join(ELO_FILE))? {
            match rating.parse::<i32>() {
                Ok(rating) => {
                    data.elo.insert(name, rating);
                }
                Err(_) => warn!("Skipping malformed rating for {}: {}", name, rating),
            }
        }
        for (name, friends) in read_pairs(&dir.join(FRIENDS_FILE))? {
            for friend in friends.split(',').filter(|f| !f.is_empty()) {
                data.add_friendship(&name, friend);
            }
        }
        for (from, to) in read_pairs(&dir.join(REQUESTS_FILE))? {
            if !data.has_request(&from, &to) {
                data.requests.push((from, to));
            }
        }

        info!(
            "Loaded profiles from {}: {} bios, {} ratings, {} pending friend requests",
            dir.display(),
            data.bios.len(),
            data.elo.len(),
            data.requests.len()
        );

        Ok(Self {
            dir,
            data: RwLock::new(data),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self) -> ArenaResult<RwLockReadGuard<'_, ProfileData>> {
        self.data
            .read()
            .map_err(|_| ArenaError::store("profile lock poisoned"))
    }

    /// Apply a change and persist the tables it touched
    fn update<T>(
        &self,
        tables: &[Table],
        change: impl FnOnce(&mut ProfileData) -> ArenaResult<T>,
    ) -> ArenaResult<T> {
        let mut data = self
            .data
            .write()
            .map_err(|_| ArenaError::store("profile lock poisoned"))?;
        let result = change(&mut *data)?;
        for table in tables {
            self.persist(&data, *table)?;
        }
        Ok(result)
    }

    fn persist(&self, data: &ProfileData, table: Table) -> ArenaResult<()> {
        let (file, lines): (&str, Vec<String>) = match table {
            Table::Bios => (
                BIOS_FILE,
                data.bios
                    .iter()
                    .map(|(name, bio)| format!("{name}|{bio}"))
                    .collect(),
            ),
            Table::Elo => (
                ELO_FILE,
                data.elo
                    .iter()
                    .map(|(name, rating)| format!("{name}|{rating}"))
                    .collect(),
            ),
            Table::Friends => (
                FRIENDS_FILE,
                data.friends
                    .iter()
                    .filter(|(_, friends)| !friends.is_empty())
                    .map(|(name, friends)| {
                        let list: Vec<&str> = friends.iter().map(String::as_str).collect();
                        format!("{name}|{}", list.join(","))
                    })
                    .collect(),
            ),
            Table::Requests => (
                REQUESTS_FILE,
                data.requests
                    .iter()
                    .map(|(from, to)| format!("{from}|{to}"))
                    .collect(),
            ),
        };
        rewrite(&self.dir.join(file), &lines)
    }
}

/// Read `key|value` lines; a missing file is an empty table
fn read_pairs(path: &Path) -> ArenaResult<Vec<(String, String)>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut pairs = Vec::new();
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once('|') {
            Some((key, value)) if !key.is_empty() => {
                pairs.push((key.to_string(), value.to_string()));
            }
            _ => warn!("Skipping malformed line {} in {}", number + 1, path.display()),
        }
    }
    Ok(pairs)
}

/// Replace a file's contents through a temporary file and a rename
fn rewrite(path: &Path, lines: &[String]) -> ArenaResult<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        for line in lines {
            writeln!(file, "{line}")?;
        }
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    debug!("Rewrote {} ({} entries)", path.display(), lines.len());
    Ok(())
}

impl ProfileStore for FlatFileProfileStore {
    fn get_bio(&self, name: &str) -> ArenaResult<Option<String>> {
        Ok(self.read()?.bios.get(name).cloned())
    }

    fn set_bio(&self, name: &str, bio: &str) -> ArenaResult<()> {
        self.update(&[Table::Bios], |data| {
            data.bios.insert(name.to_string(), bio.to_string());
            Ok(())
        })
    }

    fn get_elo(&self, name: &str) -> ArenaResult<i32> {
        Ok(self.read()?.elo_of(name))
    }

    fn adjust_elo(&self, name: &str, delta: i32) -> ArenaResult<i32> {
        self.update(&[Table::Elo], |data| Ok(data.adjust_elo(name, delta)))
    }

    fn are_friends(&self, a: &str, b: &str) -> ArenaResult<bool> {
        Ok(self.read()?.are_friends(a, b))
    }

    fn send_friend_request(&self, from: &str, to: &str) -> ArenaResult<bool> {
        self.update(&[Table::Requests], |data| data.send_request(from, to))
    }

    fn pending_requests_for(&self, name: &str) -> ArenaResult<Vec<String>> {
        Ok(self.read()?.pending_for(name))
    }

    fn accept_friend_request(&self, from: &str, to: &str) -> ArenaResult<bool> {
        self.update(&[Table::Requests, Table::Friends], |data| {
            Ok(data.accept_request(from, to))
        })
    }

    fn friends_of(&self, name: &str) -> ArenaResult<Vec<String>> {
        Ok(self.read()?.friends_of(name))
    }
}

//! In-memory game archive, used by tests and when no games directory is set

use super::archive::{is_valid_log_name, log_file_name, GameArchive, GameLog, GameLogWriter};
use crate::error::{ArenaError, ArenaResult};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, RwLock};

/// Keeps completed logs in a shared map
#[derive(Debug, Clone, Default)]
pub struct InMemoryArchive {
    completed: Arc<RwLock<BTreeMap<String, Vec<String>>>>,
}

impl InMemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a finished log directly
    pub fn insert_game(&self, file_name: impl Into<String>, blocks: Vec<String>) -> ArenaResult<()> {
        let mut completed = self
            .completed
            .write()
            .map_err(|_| ArenaError::store("archive lock poisoned"))?;
        completed.insert(file_name.into(), blocks);
        Ok(())
    }

    /// Blocks of a completed log
    pub fn blocks(&self, file_name: &str) -> Option<Vec<String>> {
        self.completed.read().ok()?.get(file_name).cloned()
    }
}

impl GameArchive for InMemoryArchive {
    fn list_completed_games(&self) -> ArenaResult<Vec<String>> {
        let completed = self
            .completed
            .read()
            .map_err(|_| ArenaError::store("archive lock poisoned"))?;
        Ok(completed.keys().cloned().collect())
    }

    fn open_game_log(&self, file_name: &str) -> ArenaResult<Box<dyn GameLog>> {
        if !is_valid_log_name(file_name) {
            return Err(ArenaError::protocol(format!(
                "{file_name} is not a game log name"
            )));
        }
        let blocks = self
            .blocks(file_name)
            .ok_or_else(|| ArenaError::protocol(format!("no game log named {file_name}")))?;
        Ok(Box::new(MemoryGameLog {
            blocks: blocks.into(),
        }))
    }

    fn create_log(
        &self,
        players: [&str; 2],
        started_at: DateTime<Utc>,
    ) -> ArenaResult<Box<dyn GameLogWriter>> {
        let base = log_file_name(players, started_at);
        let mut file_name = base.clone();
        let mut n = 1;
        while self.blocks(&file_name).is_some() {
            n += 1;
            file_name = format!("{}-{n}.log", base.trim_end_matches(".log"));
        }
        Ok(Box::new(MemoryLogWriter {
            completed: Arc::clone(&self.completed),
            file_name,
            blocks: Vec::new(),
            finished: false,
        }))
    }
}

struct MemoryGameLog {
    blocks: VecDeque<String>,
}

impl GameLog for MemoryGameLog {
    fn next_block(&mut self) -> ArenaResult<Option<String>> {
        Ok(self.blocks.pop_front())
    }
}

struct MemoryLogWriter {
    completed: Arc<RwLock<BTreeMap<String, Vec<String>>>>,
    file_name: String,
    blocks: Vec<String>,
    finished: bool,
}

impl GameLogWriter for MemoryLogWriter {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn append_block(&mut self, block: &str) -> ArenaResult<()> {
        if self.finished {
            return Err(ArenaError::store(format!(
                "{} is already finished",
                self.file_name
            )));
        }
        self.blocks.push(block.trim_end_matches('\n').to_string());
        Ok(())
    }

    fn finish(&mut self, result: &str) -> ArenaResult<()> {
        self.append_block(result)?;
        self.finished = true;
        let mut completed = self
            .completed
            .write()
            .map_err(|_| ArenaError::store("archive lock poisoned"))?;
        completed.insert(self.file_name.clone(), std::mem::take(&mut self.blocks));
        Ok(())
    }
}

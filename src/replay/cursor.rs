//! Position within a game log being replayed

use super::archive::{GameArchive, GameLog};
use crate::error::{ArenaError, ArenaResult};

/// A client's place in a replay
///
/// Logs only read forward, so stepping back reopens the log and skips ahead
/// to the previous block.
pub struct ReplayCursor {
    file_name: String,
    log: Box<dyn GameLog>,
    position: usize,
    current: String,
}

impl std::fmt::Debug for ReplayCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayCursor")
            .field("file_name", &self.file_name)
            .field("position", &self.position)
            .finish()
    }
}

impl ReplayCursor {
    /// Open a log and position on its first block
    pub fn open(archive: &dyn GameArchive, file_name: &str) -> ArenaResult<Self> {
        let mut log = archive.open_game_log(file_name)?;
        let current = log
            .next_block()?
            .ok_or_else(|| ArenaError::protocol(format!("game log {file_name} is empty")))?;
        Ok(Self {
            file_name: file_name.to_string(),
            log,
            position: 0,
            current,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Zero-based index of the block on screen
    pub fn position(&self) -> usize {
        self.position
    }

    /// Block on screen
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Step forward; `None` at the end of the log, position unchanged
    pub fn next(&mut self) -> ArenaResult<Option<&str>> {
        match self.log.next_block()? {
            Some(block) => {
                self.current = block;
                self.position += 1;
                Ok(Some(&self.current))
            }
            None => Ok(None),
        }
    }

    /// Step back; `None` on the first block, position unchanged
    pub fn prev(&mut self, archive: &dyn GameArchive) -> ArenaResult<Option<&str>> {
        if self.position == 0 {
            return Ok(None);
        }

        let target = self.position - 1;
        let mut log = archive.open_game_log(&self.file_name)?;
        let mut block = None;
        for _ in 0..=target {
            block = log.next_block()?;
        }
        let block = block.ok_or_else(|| {
            ArenaError::store(format!("game log {} changed while replaying", self.file_name))
        })?;

        self.log = log;
        self.position = target;
        self.current = block;
        Ok(Some(&self.current))
    }
}

//! Game archive backed by a directory of log files
//!
//! A game in progress is written to `<name>.log.part` and renamed to
//! `<name>.log` when its result block lands, so listings only ever see
//! completed games.

use super::archive::{
    is_valid_log_name, log_file_name, GameArchive, GameLog, GameLogWriter, BLOCK_SEPARATOR,
    LOG_EXTENSION,
};
use crate::error::{ArenaError, ArenaResult};
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const PART_SUFFIX: &str = ".part";

/// Stores every game log as a file in one directory
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    dir: PathBuf,
}

impl DirectoryArchive {
    /// Use `dir` as the archive, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> ArenaResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        info!("Game archive at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Pick a name not taken by a finished or in-progress log
    fn unused_name(&self, players: [&str; 2], started_at: DateTime<Utc>) -> String {
        let base = log_file_name(players, started_at);
        let stem = base.trim_end_matches(LOG_EXTENSION).to_string();
        let mut candidate = base;
        let mut n = 1;
        while self.dir.join(&candidate).exists()
            || self.dir.join(format!("{candidate}{PART_SUFFIX}")).exists()
        {
            n += 1;
            candidate = format!("{stem}-{n}{LOG_EXTENSION}");
        }
        candidate
    }
}

impl GameArchive for DirectoryArchive {
    fn list_completed_games(&self) -> ArenaResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_valid_log_name(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn open_game_log(&self, file_name: &str) -> ArenaResult<Box<dyn GameLog>> {
        if !is_valid_log_name(file_name) {
            return Err(ArenaError::protocol(format!(
                "{file_name} is not a game log name"
            )));
        }
        let path = self.dir.join(file_name);
        if !path.is_file() {
            return Err(ArenaError::protocol(format!("no game log named {file_name}")));
        }
        let file = File::open(&path)?;
        debug!("Opened game log {}", path.display());
        Ok(Box::new(FileGameLog {
            reader: BufReader::new(file),
        }))
    }

    fn create_log(
        &self,
        players: [&str; 2],
        started_at: DateTime<Utc>,
    ) -> ArenaResult<Box<dyn GameLogWriter>> {
        let file_name = self.unused_name(players, started_at);
        let final_path = self.dir.join(&file_name);
        let part_path = self.dir.join(format!("{file_name}{PART_SUFFIX}"));
        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&part_path)?;

        debug!("Recording game to {}", part_path.display());
        Ok(Box::new(FileLogWriter {
            file_name,
            part_path,
            final_path,
            file: Some(file),
        }))
    }
}

struct FileGameLog {
    reader: BufReader<File>,
}

impl GameLog for FileGameLog {
    fn next_block(&mut self) -> ArenaResult<Option<String>> {
        let mut block = String::new();
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                break;
            }
            if line.trim_end() == BLOCK_SEPARATOR {
                if block.is_empty() {
                    continue;
                }
                break;
            }
            block.push_str(&line);
        }

        if block.is_empty() {
            Ok(None)
        } else {
            Ok(Some(block.trim_end_matches('\n').to_string()))
        }
    }
}

struct FileLogWriter {
    file_name: String,
    part_path: PathBuf,
    final_path: PathBuf,
    file: Option<File>,
}

impl GameLogWriter for FileLogWriter {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn append_block(&mut self, block: &str) -> ArenaResult<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| ArenaError::store(format!("{} is already finished", self.file_name)))?;
        let block = block.trim_end_matches('\n');
        writeln!(file, "{block}")?;
        writeln!(file, "{BLOCK_SEPARATOR}")?;
        file.flush()?;
        Ok(())
    }

    fn finish(&mut self, result: &str) -> ArenaResult<()> {
        self.append_block(result)?;
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        fs::rename(&self.part_path, &self.final_path)?;
        info!("Game log {} completed", self.file_name);
        Ok(())
    }
}

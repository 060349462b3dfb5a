//! Bounded log of submitted lines.

use anyhow::{Context, Result};
use log::debug;
use std::collections::VecDeque;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_CAPACITY: usize = 1000;

/// Previously entered lines, oldest first.
///
/// Consecutive duplicates collapse into one entry; once `capacity` is
/// reached the oldest entry is evicted.
#[derive(Debug)]
pub struct HistoryLog {
    entries: VecDeque<String>,
    capacity: usize,
    path: Option<PathBuf>,
}

impl HistoryLog {
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            path: None,
        }
    }

    /// Reads `path` oldest-first, keeping at most `capacity` of the newest lines.
    pub fn load(path: impl Into<PathBuf>, capacity: usize) -> Result<Self> {
        let path = path.into();
        let mut log = Self::in_memory(capacity);
        log.path = Some(path.clone());
        match fs::read_to_string(&path) {
            Ok(contents) => {
                for line in contents.lines() {
                    log.record(line);
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("cannot read history from {}", path.display()));
            }
        }
        debug!("loaded {} history entries", log.len());
        Ok(log)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Records `line`. Returns `false` if it was empty or repeats the last entry.
    pub fn push(&mut self, line: &str) -> bool {
        if line.trim().is_empty() || self.entries.back().is_some_and(|last| last == line) {
            return false;
        }
        self.record(line);
        true
    }

    /// Appends `line` as is, evicting the oldest entry when full.
    fn record(&mut self, line: &str) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// The newest `count` entries with their 1-based positions in the log.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = (usize, &str)> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(idx, line)| (idx + 1, line.as_str()))
    }

    /// Rewrites the backing file with the whole log.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut contents = String::new();
        for line in &self.entries {
            contents.push_str(line);
            contents.push('\n');
        }
        fs::write(path, contents).with_context(|| format!("cannot write history to {}", path.display()))?;
        debug!("flushed {} history entries to {}", self.len(), path.display());
        Ok(())
    }
}

use crate::alias::AliasTable;
use crate::history::{self, HistoryLog};
use anyhow::{Context, Result};
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Mutable state owned by the interpreter loop and lent to built-ins.
///
/// The environment contains:
/// - `home`: the directory `cd` without arguments switches to.
/// - `previous_dir`: the directory `cd -` returns to.
/// - `history` and `aliases`: the persisted collaborators, loaded at startup
///   and flushed at shutdown by the interpreter.
#[derive(Debug)]
pub struct Environment {
    pub home: Option<PathBuf>,
    pub previous_dir: Option<PathBuf>,
    pub history: HistoryLog,
    pub aliases: AliasTable,
}

impl Environment {
    /// Environment with in-memory history and aliases and `home` taken from
    /// `HOME` (or the platform home directory).
    pub fn new() -> Self {
        Self::with_state(
            HistoryLog::in_memory(history::DEFAULT_CAPACITY),
            AliasTable::in_memory(),
        )
    }

    pub fn with_state(history: HistoryLog, aliases: AliasTable) -> Self {
        let home = get_var("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir);
        Self {
            home,
            previous_dir: None,
            history,
            aliases,
        }
    }

    /// Changes the process working directory and remembers where it was.
    ///
    /// Returns the new working directory.
    pub fn change_dir(&mut self, target: &Path) -> Result<PathBuf> {
        let before = stdenv::current_dir().ok();
        stdenv::set_current_dir(target).with_context(|| format!("cd: {}", target.display()))?;
        if before.is_some() {
            self.previous_dir = before;
        }
        stdenv::current_dir().context("cd: cannot read the new working directory")
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the value of an environment variable, treating an empty value as unset.
pub fn get_var(key: &str) -> Option<String> {
    stdenv::var(key).ok().filter(|v| !v.is_empty())
}

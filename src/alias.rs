//! Alias table: rewrites the first word of a line before tokenization.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AliasError {
    #[error("alias: syntax error: expected NAME=VALUE, got `{0}`")]
    Malformed(String),
}

/// Splits `NAME=VALUE` at the first `=`.
pub fn parse_definition(definition: &str) -> Result<(String, String), AliasError> {
    match definition.split_once('=') {
        Some((name, value)) if !name.is_empty() && !name.contains(char::is_whitespace) => {
            Ok((name.to_string(), value.to_string()))
        }
        _ => Err(AliasError::Malformed(definition.to_string())),
    }
}

/// Name to replacement mapping, optionally backed by an append-only file.
#[derive(Debug, Default)]
pub struct AliasTable {
    bindings: BTreeMap<String, String>,
    path: Option<PathBuf>,
}

impl AliasTable {
    /// A table that is never persisted.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads every `NAME=VALUE` line from `path`; later lines win.
    ///
    /// A missing file yields an empty table that will be created on the first
    /// definition. Malformed lines are skipped.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut table = Self {
            bindings: BTreeMap::new(),
            path: Some(path.clone()),
        };
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(table),
            Err(e) => {
                return Err(e).with_context(|| format!("cannot read aliases from {}", path.display()));
            }
        };
        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            match parse_definition(line) {
                Ok((name, value)) => table.insert(name, value),
                Err(e) => warn!("{}: skipping line: {}", path.display(), e),
            }
        }
        debug!("loaded {} aliases from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.bindings.insert(name.into(), value.into());
    }

    /// Binds `name` and appends the binding to the backing file, if any.
    pub fn define(&mut self, name: &str, value: &str) -> Result<()> {
        self.insert(name, value);
        if let Some(path) = &self.path {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open {}", path.display()))?;
            writeln!(file, "{name}={value}")
                .with_context(|| format!("cannot write {}", path.display()))?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replaces the first word of `line` if it names an alias.
    ///
    /// Expansion happens once: the replacement is not looked up again and
    /// later words are never touched.
    pub fn expand<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let trimmed = line.trim_start();
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (first, rest) = trimmed.split_at(end);
        match self.bindings.get(first) {
            Some(value) => Cow::Owned(format!("{value}{rest}")),
            None => Cow::Borrowed(line),
        }
    }
}

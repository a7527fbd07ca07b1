//! Non-fatal load-error accumulation.
//!
//! World files in the wild are full of anomalies: adjacency lists naming
//! rooms that never answer back, rooms with no map position, missing level
//! files. None of these abort a region load; they are collected here and
//! surfaced to the user as a dismissible list.

use std::fmt;

/// Category of a load anomaly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadErrorKind {
    MissingRoomFile,
    UnknownRoom,
    DanglingConnection,
    UnpositionedRoom,
    BadGateLock,
    BadMapLine,
    BadSettings,
}

impl LoadErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            LoadErrorKind::MissingRoomFile => "missing room file",
            LoadErrorKind::UnknownRoom => "unknown room",
            LoadErrorKind::DanglingConnection => "dangling connection",
            LoadErrorKind::UnpositionedRoom => "unpositioned room",
            LoadErrorKind::BadGateLock => "bad gate lock",
            LoadErrorKind::BadMapLine => "bad map line",
            LoadErrorKind::BadSettings => "bad room settings",
        }
    }
}

/// One accumulated anomaly.
#[derive(Clone, Debug)]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub message: String,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.label(), self.message)
    }
}

/// The shared, append-only error list for one load pass.
#[derive(Clone, Debug, Default)]
pub struct LoadErrorLog {
    entries: Vec<LoadError>,
}

impl LoadErrorLog {
    pub fn new() -> LoadErrorLog {
        LoadErrorLog::default()
    }

    pub fn push(&mut self, kind: LoadErrorKind, message: impl Into<String>) {
        self.entries.push(LoadError {
            kind,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[LoadError] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_of(&self, kind: LoadErrorKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

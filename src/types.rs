//! Core types shared by the cache, the backend contract and the coordinator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Revision: repository revision number as reported by the backend
pub type Revision = i64;

/// Inclusive revision range used for merges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRange {
    pub start: Revision,
    pub end: Revision,
}

impl RevisionRange {
    pub fn new(start: Revision, end: Revision) -> Self {
        Self { start, end }
    }

    /// A range running backwards undoes the changes between the two revisions
    pub fn is_reverse(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for RevisionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// How far a status query descends below the queried path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusDepth {
    /// Only the path itself
    Empty,
    /// The path and everything below it
    Infinity,
}

impl StatusDepth {
    pub fn as_arg(&self) -> &'static str {
        match self {
            StatusDepth::Empty => "empty",
            StatusDepth::Infinity => "infinity",
        }
    }
}

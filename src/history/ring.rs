//! Bounded command history

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::core::error::{ErrorKind, TabError};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// How a command ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success(String),
    Failure { kind: ErrorKind, message: String },
}

/// One executed (or failed) command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: CommandOutcome,
}

impl CommandRecord {
    pub fn success(text: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
            outcome: CommandOutcome::Success(summary.into()),
        }
    }

    pub fn failure(text: impl Into<String>, error: &TabError) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
            outcome: CommandOutcome::Failure {
                kind: error.kind(),
                message: error.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CommandOutcome::Success(_))
    }
}

/// Newest-first ring of command records
#[derive(Debug, Clone)]
pub struct CommandHistory {
    records: VecDeque<CommandRecord>,
    limit: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl CommandHistory {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            records: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Prepend a record, evicting the oldest when full
    pub fn record(&mut self, record: CommandRecord) {
        if self.records.len() == self.limit {
            self.records.pop_back();
        }
        self.records.push_front(record);
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandRecord> {
        self.records.iter()
    }

    /// The `k` newest records
    pub fn recent(&self, k: usize) -> impl Iterator<Item = &CommandRecord> {
        self.records.iter().take(k)
    }

    pub fn latest(&self) -> Option<&CommandRecord> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

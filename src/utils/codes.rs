// src/utils/codes.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::errors::DispatchResult;

/// Human-readable, date-stamped document codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeKind {
    Booking,
    Invoice,
}

impl CodeKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            CodeKind::Booking => "BK",
            CodeKind::Invoice => "INV",
        }
    }

    pub(crate) fn key_segment(&self) -> &'static str {
        match self {
            CodeKind::Booking => "booking",
            CodeKind::Invoice => "invoice",
        }
    }
}

/// `BK-20261016-0007`. The sequence is padded to four digits and widens past 9999.
pub fn format_code(kind: CodeKind, day: NaiveDate, sequence: u64) -> String {
    format!("{}-{}-{:04}", kind.prefix(), day.format("%Y%m%d"), sequence)
}

/// Hands out codes from a per-day monotonic counter. Implementations must never
/// return the same sequence twice for one kind and day.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn next_code(&self, kind: CodeKind, at: DateTime<Utc>) -> DispatchResult<String>;
}

/// Process-local counters.
#[derive(Debug, Default)]
pub struct MemoryCodeGenerator {
    counters: Mutex<HashMap<(CodeKind, NaiveDate), u64>>,
}

impl MemoryCodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodeGenerator for MemoryCodeGenerator {
    async fn next_code(&self, kind: CodeKind, at: DateTime<Utc>) -> DispatchResult<String> {
        let day = at.date_naive();
        let mut counters = self.counters.lock().await;
        let counter = counters.entry((kind, day)).or_insert(0);
        *counter += 1;
        Ok(format_code(kind, day, *counter))
    }
}

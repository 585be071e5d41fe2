//! Search Controller: raw query text, a debounced copy of it, and the result
//! set for the most recent settled query.

use std::{ops::Range, sync::Arc, time::Duration};

use shared::domain::Meeting;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    gateway::EntityGateway,
    state::{LoadStatus, Sequencer, Ticket},
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const SUMMARY_PREVIEW_CHARS: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    /// Input changed again before the window elapsed, or the debounced value
    /// did not change.
    Nothing,
    /// Debounced value became blank: results and error are cleared locally.
    Clear,
    Fetch { ticket: Ticket, query: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSnapshot {
    pub raw_query: String,
    pub debounced_query: String,
    pub results: Vec<Meeting>,
    pub status: LoadStatus,
    /// Query whose request produced the current failure, if any.
    pub failed_query: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    raw: String,
    debounced: String,
    input_generation: u64,
    results: Vec<Meeting>,
    status: LoadStatus,
    failed_query: Option<String>,
    seq: Sequencer,
}

impl SearchState {
    /// Records a keystroke and returns the generation a debounce timer must
    /// still match when it fires.
    pub fn input(&mut self, text: impl Into<String>) -> u64 {
        self.raw = text.into();
        self.input_generation += 1;
        self.input_generation
    }

    /// Called when a debounce timer fires.
    pub fn settle(&mut self, generation: u64) -> SearchAction {
        if generation != self.input_generation || self.raw == self.debounced {
            return SearchAction::Nothing;
        }
        self.debounced = self.raw.clone();

        let query = self.debounced.trim();
        if query.is_empty() {
            self.seq.supersede();
            self.results.clear();
            self.status = LoadStatus::Idle;
            self.failed_query = None;
            return SearchAction::Clear;
        }

        let query = query.to_string();
        self.status = LoadStatus::Loading;
        self.failed_query = None;
        SearchAction::Fetch {
            ticket: self.seq.issue(),
            query,
        }
    }

    /// Applies a response only if no newer search intent exists.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        query: &str,
        result: std::result::Result<Vec<Meeting>, String>,
    ) -> bool {
        if !self.seq.is_latest(ticket) {
            return false;
        }
        self.seq.mark_applied(ticket);

        match result {
            Ok(results) => {
                self.results = results;
                self.status = LoadStatus::Ready;
                self.failed_query = None;
            }
            Err(message) => {
                self.results.clear();
                self.status = LoadStatus::Failed(message);
                self.failed_query = Some(query.to_string());
            }
        }
        true
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            raw_query: self.raw.clone(),
            debounced_query: self.debounced.clone(),
            results: self.results.clone(),
            status: self.status.clone(),
            failed_query: self.failed_query.clone(),
        }
    }
}

pub struct SearchController {
    gateway: Arc<dyn EntityGateway>,
    debounce: Duration,
    state: Mutex<SearchState>,
}

impl SearchController {
    pub fn new(gateway: Arc<dyn EntityGateway>, debounce: Duration) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            debounce,
            state: Mutex::new(SearchState::default()),
        })
    }

    /// Records the keystroke and (re)starts the quiescence window. Timers of
    /// earlier keystrokes still fire but find their generation outdated.
    pub async fn set_query(self: &Arc<Self>, text: impl Into<String>) -> JoinHandle<()> {
        let generation = self.state.lock().await.input(text);
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(controller.debounce).await;
            controller.settle(generation).await;
        })
    }

    async fn settle(&self, generation: u64) {
        let action = self.state.lock().await.settle(generation);
        match action {
            SearchAction::Nothing => {}
            SearchAction::Clear => debug!("search: cleared for blank query"),
            SearchAction::Fetch { ticket, query } => self.fetch(ticket, query).await,
        }
    }

    async fn fetch(&self, ticket: Ticket, query: String) {
        debug!("search: fired query={query:?} ticket={}", ticket.value());
        let result = self
            .gateway
            .search_meetings(&query)
            .await
            .map_err(|err| err.message());
        if let Err(message) = &result {
            warn!("search: request failed query={query:?} error={message}");
        }

        let applied = self.state.lock().await.complete(ticket, &query, result);
        if !applied {
            debug!(
                "search: stale response discarded query={query:?} ticket={}",
                ticket.value()
            );
        }
    }

    pub async fn snapshot(&self) -> SearchSnapshot {
        self.state.lock().await.snapshot()
    }
}

/// Byte ranges of case-insensitive, non-overlapping matches of `query`.
pub fn highlight_ranges(text: &str, query: &str) -> Vec<Range<usize>> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let mut ranges = Vec::new();
    let mut cursor = 0;
    while cursor < text.len() {
        match match_len_at(&text[cursor..], query) {
            Some(len) => {
                ranges.push(cursor..cursor + len);
                cursor += len;
            }
            None => {
                let step = text[cursor..].chars().next().map_or(1, char::len_utf8);
                cursor += step;
            }
        }
    }
    ranges
}

fn match_len_at(haystack: &str, needle: &str) -> Option<usize> {
    let mut consumed = 0;
    let mut chars = haystack.chars();
    for expected in needle.chars() {
        let actual = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        consumed += actual.len_utf8();
    }
    Some(consumed)
}

/// Cuts `text` to at most `max_chars` characters, appending `...` when cut.
pub fn truncate_summary(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod tests;

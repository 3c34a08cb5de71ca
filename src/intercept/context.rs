//! Load-scoped mutable state shared by the interceptors.
//!
//! Everything the original page kept in closure-level globals lives here
//! instead, owned by one [`InterceptContext`] per install, so independent
//! instances never observe each other's counters or clocks.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::time::{Duration, Instant};

use crate::config::ShieldConfig;
use crate::console::LogSink;
use crate::patterns::Redactor;

/// Page-lifetime count of document-retrieval calls with a fixed ceiling.
#[derive(Debug)]
pub struct AccessCounter {
    count: AtomicU32,
    limit: u32,
}

impl AccessCounter {
    pub fn new(limit: u32) -> Self {
        Self {
            count: AtomicU32::new(0),
            limit,
        }
    }

    /// Increment and return the new count. Saturates at `u32::MAX`.
    pub fn record(&self) -> u32 {
        let previous = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| {
                Some(c.saturating_add(1))
            })
            .unwrap_or_else(|c| c);
        previous.saturating_add(1)
    }

    pub fn current(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn exceeds(&self, count: u32) -> bool {
        count > self.limit
    }
}

/// Session start plus last user interaction. `last_activity >= started` always.
#[derive(Debug)]
pub struct SessionClock {
    started: Instant,
    last_activity: Mutex<Instant>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(started: Instant) -> Self {
        Self {
            started,
            last_activity: Mutex::new(started),
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn last_activity(&self) -> Instant {
        *self.last_activity.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn touch(&self) {
        self.touch_at(Instant::now());
    }

    /// Record activity at `now`. Never moves backwards.
    pub fn touch_at(&self, now: Instant) {
        let mut last = self.last_activity.lock().unwrap_or_else(|e| e.into_inner());
        if now > *last {
            *last = now;
        }
    }

    pub fn session_age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    pub fn inactivity(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity())
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared state and collaborators injected into every wrapper.
pub struct InterceptContext {
    redactor: Redactor,
    counter: AccessCounter,
    clock: SessionClock,
    fetch_headers: BTreeMap<String, String>,
    xhr_headers: BTreeMap<String, String>,
    console: Arc<dyn LogSink>,
}

impl InterceptContext {
    /// `console` should already be filtered; advisory lines go through it verbatim.
    pub fn new(config: &ShieldConfig, redactor: Redactor, console: Arc<dyn LogSink>) -> Self {
        Self {
            redactor,
            counter: AccessCounter::new(config.limits.max_document_access),
            clock: SessionClock::new(),
            fetch_headers: config.headers.fetch.clone(),
            xhr_headers: config.headers.xhr.clone(),
            console,
        }
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    pub fn counter(&self) -> &AccessCounter {
        &self.counter
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn fetch_headers(&self) -> &BTreeMap<String, String> {
        &self.fetch_headers
    }

    pub fn xhr_headers(&self) -> &BTreeMap<String, String> {
        &self.xhr_headers
    }

    pub fn console(&self) -> &dyn LogSink {
        self.console.as_ref()
    }

    pub fn is_sensitive(&self, target: &str) -> bool {
        self.redactor.is_sensitive(target)
    }
}

/// Whether a target looks like a document-retrieval request.
pub fn is_document_request(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower.contains(".pdf") || lower.contains("/pdf/")
}

//! Counter - live request statistics owned by the collection engine
//!
//! A [`Counter`] is updated concurrently by the engine while the dispatcher
//! reads it. Readers never touch the live map directly: [`Counter::snapshot`]
//! deep-copies it under the lock.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// Aggregated statistics for one request name inside a counter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRequest {
    pub name: String,
    pub hits: u64,
    pub duration_sum_ms: u64,
    pub max_duration_ms: u64,
    pub system_errors: u64,
}

impl CounterRequest {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Mean duration in milliseconds (0 when never hit)
    pub fn mean_ms(&self) -> u64 {
        if self.hits == 0 {
            0
        } else {
            self.duration_sum_ms / self.hits
        }
    }
}

/// Point-in-time deep copy of a counter, safe to serialize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub name: String,
    #[serde(default)]
    pub requests: Vec<CounterRequest>,
}

impl CounterSnapshot {
    /// Total hits across all requests
    pub fn hits(&self) -> u64 {
        self.requests.iter().map(|r| r.hits).sum()
    }

    /// Total system errors across all requests
    pub fn system_errors(&self) -> u64 {
        self.requests.iter().map(|r| r.system_errors).sum()
    }
}

/// Live counter (http, sql, ...)
#[derive(Debug)]
pub struct Counter {
    name: String,
    requests: Mutex<BTreeMap<String, CounterRequest>>,
}

impl Counter {
    /// Create an empty counter
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requests: Mutex::new(BTreeMap::new()),
        }
    }

    /// Counter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record one hit of `request_name`
    pub fn add_hit(&self, request_name: &str, duration_ms: u64, system_error: bool) {
        let mut requests = self.lock();
        let request = requests
            .entry(request_name.to_string())
            .or_insert_with(|| CounterRequest::new(request_name));
        request.hits += 1;
        request.duration_sum_ms += duration_ms;
        request.max_duration_ms = request.max_duration_ms.max(duration_ms);
        if system_error {
            request.system_errors += 1;
        }
    }

    /// Drop all accumulated statistics
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Total hits so far
    pub fn hits(&self) -> u64 {
        self.lock().values().map(|r| r.hits).sum()
    }

    /// Deep copy taken under the counter lock
    pub fn snapshot(&self) -> CounterSnapshot {
        let requests = self.lock().values().cloned().collect();
        CounterSnapshot {
            name: self.name.clone(),
            requests,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, CounterRequest>> {
        // a panicked writer leaves plain integers behind, still readable
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_hit_accumulates() {
        let counter = Counter::new("http");
        counter.add_hit("/home", 10, false);
        counter.add_hit("/home", 30, true);
        counter.add_hit("/cart", 5, false);

        let snapshot = counter.snapshot();
        assert_eq!(snapshot.hits(), 3);
        assert_eq!(snapshot.system_errors(), 1);
        let home = snapshot.requests.iter().find(|r| r.name == "/home").unwrap();
        assert_eq!(home.mean_ms(), 20);
        assert_eq!(home.max_duration_ms, 30);
    }

    #[test]
    fn test_snapshot_is_detached_from_live_updates() {
        let counter = Counter::new("sql");
        counter.add_hit("select 1", 1, false);
        let snapshot = counter.snapshot();
        counter.add_hit("select 1", 1, false);
        assert_eq!(snapshot.hits(), 1);
        assert_eq!(counter.hits(), 2);
    }

    #[test]
    fn test_clear() {
        let counter = Counter::new("http");
        counter.add_hit("/", 1, false);
        counter.clear();
        assert_eq!(counter.hits(), 0);
    }
}

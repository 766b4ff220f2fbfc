//! In-memory collection engine
//!
//! Counters are updated by the host as requests complete. Every collection
//! pass appends one sample per series so the graph engine can draw them.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::debug;

use contracts::{Collector, Counter};

/// Counters created by [`InMemoryCollector::new`]
pub const DEFAULT_COUNTERS: [&str; 3] = ["http", "sql", "error"];

/// Oldest samples are dropped past this many per series
pub const MAX_SAMPLES_PER_SERIES: usize = 10_000;

/// One point of a time series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub at: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Default)]
struct SeriesState {
    series: BTreeMap<String, VecDeque<Sample>>,
    /// Totals seen by the previous pass, to turn counters into deltas
    last_totals: HashMap<String, (u64, u64)>,
    gauges: BTreeMap<String, f64>,
}

/// Collector keeping counters and their history in process memory
#[derive(Debug)]
pub struct InMemoryCollector {
    application: String,
    counters: Vec<Arc<Counter>>,
    state: Mutex<SeriesState>,
    running: AtomicBool,
}

impl InMemoryCollector {
    /// Collector with the [`DEFAULT_COUNTERS`]
    pub fn new(application: impl Into<String>) -> Self {
        Self::with_counters(application, DEFAULT_COUNTERS)
    }

    pub fn with_counters<I, S>(application: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            application: application.into(),
            counters: names
                .into_iter()
                .map(|name| Arc::new(Counter::new(name)))
                .collect(),
            state: Mutex::new(SeriesState::default()),
            running: AtomicBool::new(true),
        }
    }

    pub fn counter(&self, name: &str) -> Option<&Arc<Counter>> {
        self.counters.iter().find(|c| c.name() == name)
    }

    /// Record one completed request on the named counter
    ///
    /// Returns `false` when the counter does not exist.
    pub fn record_request(
        &self,
        counter: &str,
        request: &str,
        duration_ms: u64,
        system_error: bool,
    ) -> bool {
        match self.counter(counter) {
            Some(c) => {
                c.add_hit(request, duration_ms, system_error);
                true
            }
            None => false,
        }
    }

    /// Set a gauge sampled by the next collection pass (memory, threads...)
    pub fn set_gauge(&self, name: impl Into<String>, value: f64) {
        self.lock().gauges.insert(name.into(), value);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Names of every series with at least one sample
    pub fn series_names(&self) -> Vec<String> {
        self.lock().series.keys().cloned().collect()
    }

    /// Copy of the samples of `name`, oldest first
    pub fn series(&self, name: &str) -> Option<Vec<Sample>> {
        self.lock()
            .series
            .get(name)
            .map(|samples| samples.iter().copied().collect())
    }

    /// Collection pass stamped at `now`
    pub fn collect_at(&self, now: DateTime<Utc>) {
        if !self.is_running() {
            debug!(application = %self.application, "Collector stopped, pass skipped");
            return;
        }

        let mut state = self.lock();
        for counter in &self.counters {
            let snapshot = counter.snapshot();
            let hits = snapshot.hits();
            let errors = snapshot.system_errors();
            let duration: u64 = snapshot.requests.iter().map(|r| r.duration_sum_ms).sum();

            let (last_hits, last_errors) = state
                .last_totals
                .insert(counter.name().to_string(), (hits, errors))
                .unwrap_or_default();
            // a cleared counter restarts from zero
            let hit_delta = hits.saturating_sub(last_hits);
            let error_delta = errors.saturating_sub(last_errors);
            let mean = if hits == 0 { 0.0 } else { duration as f64 / hits as f64 };

            push_sample(&mut state, format!("{}_hits", counter.name()), now, hit_delta as f64);
            push_sample(&mut state, format!("{}_errors", counter.name()), now, error_delta as f64);
            push_sample(&mut state, format!("{}_mean", counter.name()), now, mean);
        }

        let gauges: Vec<(String, f64)> = state
            .gauges
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        for (name, value) in gauges {
            push_sample(&mut state, name, now, value);
        }
    }

    fn lock(&self) -> MutexGuard<'_, SeriesState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn push_sample(state: &mut SeriesState, name: String, at: DateTime<Utc>, value: f64) {
    let samples = state.series.entry(name).or_default();
    if samples.len() == MAX_SAMPLES_PER_SERIES {
        samples.pop_front();
    }
    samples.push_back(Sample { at, value });
}

impl Collector for InMemoryCollector {
    fn application(&self) -> &str {
        &self.application
    }

    fn counters(&self) -> Vec<Arc<Counter>> {
        self.counters.clone()
    }

    fn collect_local_context_without_errors(&self) {
        self.collect_at(Utc::now());
    }

    fn clear_counter(&self, name: &str) -> bool {
        match self.counter(name) {
            Some(counter) => {
                counter.clear();
                self.lock().last_totals.remove(name);
                true
            }
            None => false,
        }
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
        for counter in &self.counters {
            counter.clear();
        }
        let mut state = self.lock();
        state.series.clear();
        state.last_totals.clear();
        debug!(application = %self.application, "Collector stopped and reset");
    }
}

//! Collection engine and graph engine interfaces

use std::sync::Arc;

use crate::{ContractError, Counter, Period};

/// Metrics collection/aggregation engine
///
/// Owns the live counters. Implementations must tolerate concurrent reads
/// while the engine keeps updating.
pub trait Collector: Send + Sync {
    /// Name of the monitored application
    fn application(&self) -> &str;

    /// Live counters, shared with the engine
    fn counters(&self) -> Vec<Arc<Counter>>;

    /// Run one collection pass; failures are handled by the engine itself
    fn collect_local_context_without_errors(&self);

    /// Reset the statistics of the named counter; `false` if unknown
    fn clear_counter(&self, name: &str) -> bool;

    /// Stop periodic collection and reset accumulated statistics
    fn stop(&self);
}

/// Time-series graph engine
pub trait GraphEngine: Send + Sync {
    /// Render `name` over `period` as a PNG image
    ///
    /// Returns `Ok(None)` when no metric with that name exists.
    ///
    /// # Errors
    /// Returns an error if rendering fails
    fn graph(
        &self,
        name: &str,
        period: &Period,
        width: u32,
        height: u32,
    ) -> Result<Option<Vec<u8>>, ContractError>;
}

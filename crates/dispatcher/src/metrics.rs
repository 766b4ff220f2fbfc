//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Output path taken by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Resource,
    Graph,
    Descriptor,
    Html,
    Pdf,
    Snapshot,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Graph => "graph",
            Self::Descriptor => "descriptor",
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Snapshot => "snapshot",
        }
    }
}

/// Counters shared by every dispatcher built from the same builder
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    resource: AtomicU64,
    graph: AtomicU64,
    descriptor: AtomicU64,
    html: AtomicU64,
    pdf: AtomicU64,
    snapshot: AtomicU64,
    /// System actions executed
    actions: AtomicU64,
    /// Requests that returned an error
    failures: AtomicU64,
    /// Introspection failures rendered inline
    introspection_failures: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_route(&self, route: RouteKind) {
        self.route_counter(route).fetch_add(1, Ordering::Relaxed);
        observability::record_dispatch(route.as_str());
    }

    pub fn route_count(&self, route: RouteKind) -> u64 {
        self.route_counter(route).load(Ordering::Relaxed)
    }

    pub fn inc_actions(&self) {
        self.actions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_introspection_failures(&self) {
        self.introspection_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> DispatchMetricsSnapshot {
        DispatchMetricsSnapshot {
            resource: self.route_count(RouteKind::Resource),
            graph: self.route_count(RouteKind::Graph),
            descriptor: self.route_count(RouteKind::Descriptor),
            html: self.route_count(RouteKind::Html),
            pdf: self.route_count(RouteKind::Pdf),
            snapshot: self.route_count(RouteKind::Snapshot),
            actions: self.actions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            introspection_failures: self.introspection_failures.load(Ordering::Relaxed),
        }
    }

    fn route_counter(&self, route: RouteKind) -> &AtomicU64 {
        match route {
            RouteKind::Resource => &self.resource,
            RouteKind::Graph => &self.graph,
            RouteKind::Descriptor => &self.descriptor,
            RouteKind::Html => &self.html,
            RouteKind::Pdf => &self.pdf,
            RouteKind::Snapshot => &self.snapshot,
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchMetricsSnapshot {
    pub resource: u64,
    pub graph: u64,
    pub descriptor: u64,
    pub html: u64,
    pub pdf: u64,
    pub snapshot: u64,
    pub actions: u64,
    pub failures: u64,
    pub introspection_failures: u64,
}

impl DispatchMetricsSnapshot {
    pub fn total_requests(&self) -> u64 {
        self.resource + self.graph + self.descriptor + self.html + self.pdf + self.snapshot
    }
}

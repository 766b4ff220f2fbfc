//! # Standalone
//!
//! In-process collaborators so the console can run without a host
//! framework: in-memory collector and sessions, PNG graphs, plain HTML and
//! text PDF reports, `/proc` introspection and directory-backed hosting.

pub mod actions;
pub mod collector;
pub mod graph;
pub mod hosting;
pub mod introspection;
pub mod locale;
pub mod report_html;
pub mod report_pdf;
pub mod sessions;

use std::sync::Arc;

use tracing::info;

use contracts::{
    CollectorMode, MonitoringConfig, RuntimeInformations, SessionRegistry, StaticActionPolicy,
};
use dispatcher::{
    Collaborators, CollectorSnapshots, DispatcherError, ExecutionMode, MonitoringDispatcher,
};

pub use actions::DefaultActionExecutor;
pub use collector::{InMemoryCollector, Sample};
pub use graph::PngGraphEngine;
pub use hosting::DirectoryHosting;
pub use introspection::{ActiveRequest, RequestTracker, SystemIntrospection};
pub use locale::ThreadLocaleBinder;
pub use report_html::PlainHtmlReport;
pub use report_pdf::TextPdfReport;
pub use sessions::InMemorySessionRegistry;

/// Gauges sampled by [`Standalone::collect`]
pub const USED_MEMORY_GAUGE: &str = "used_memory";
pub const THREAD_COUNT_GAUGE: &str = "threads";
pub const SESSION_COUNT_GAUGE: &str = "sessions";

/// A dispatcher wired to the in-process collaborators
#[derive(Clone)]
pub struct Standalone {
    pub collector: Arc<InMemoryCollector>,
    pub sessions: Arc<InMemorySessionRegistry>,
    pub introspection: Arc<SystemIntrospection>,
    pub dispatcher: MonitoringDispatcher,
}

impl Standalone {
    /// # Errors
    /// Returns an error if the dispatcher cannot be built
    pub fn from_config(config: &MonitoringConfig) -> Result<Self, DispatcherError> {
        let collector = Arc::new(InMemoryCollector::new(config.application.name.clone()));
        let sessions = Arc::new(InMemorySessionRegistry::new());
        let introspection = Arc::new(SystemIntrospection::new());

        let collaborators = Collaborators {
            collector: collector.clone(),
            graphs: Arc::new(PngGraphEngine::new(collector.clone())),
            html: Arc::new(PlainHtmlReport),
            pdf: Arc::new(TextPdfReport),
            introspection: introspection.clone(),
            sessions: sessions.clone(),
            hosting: Arc::new(DirectoryHosting::from_config(
                &config.hosting,
                &config.dispatcher.resource_root,
            )),
            actions: Arc::new(DefaultActionExecutor::new(sessions.clone())),
            policy: Arc::new(StaticActionPolicy::new(config.security.system_actions_enabled)),
            locale: Arc::new(ThreadLocaleBinder),
        };
        let mode = match config.collector.mode {
            CollectorMode::Local => ExecutionMode::Local,
            CollectorMode::CollectorServer => {
                ExecutionMode::CollectorServer(CollectorSnapshots::default())
            }
        };

        let dispatcher = MonitoringDispatcher::builder()
            .collaborators(collaborators)
            .mode(mode)
            .settings(config.dispatcher.clone())
            .build()?;

        info!(
            application = %config.application.name,
            system_actions = config.security.system_actions_enabled,
            "Standalone console assembled"
        );
        Ok(Self {
            collector,
            sessions,
            introspection,
            dispatcher,
        })
    }

    /// Host facts for this process
    pub fn runtime_informations(&self) -> Vec<RuntimeInformations> {
        vec![self
            .introspection
            .runtime_informations(self.sessions.all_sessions().len())]
    }

    /// Sample host gauges, then run one collection pass
    pub fn collect(&self) {
        if let Some(info) = self.runtime_informations().first() {
            self.collector
                .set_gauge(USED_MEMORY_GAUGE, info.used_memory_bytes as f64);
            self.collector
                .set_gauge(THREAD_COUNT_GAUGE, info.thread_count as f64);
            self.collector
                .set_gauge(SESSION_COUNT_GAUGE, info.session_count as f64);
        }
        contracts::Collector::collect_local_context_without_errors(self.collector.as_ref());
    }
}

//! Monitoring dispatcher - routes one request to exactly one output path

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use contracts::{
    Action, ActionExecutor, ActionPolicy, Collector, ContractError, DescriptorAvailability,
    DispatcherSettings, GraphEngine, HeapHistogram, HostingEnvironment, HtmlReportRenderer,
    HtmlView, Introspection, Locale, LocaleBinder, NoopLocaleBinder, PdfReportRenderer, Period,
    ReportContext, RuntimeInformations, SessionInformations, SessionRegistry, StaticActionPolicy,
};

use crate::error::DispatcherError;
use crate::locale::LocaleScope;
use crate::metrics::{DispatchMetrics, DispatchMetricsSnapshot, RouteKind};
use crate::paths::resource::open_descriptor;
use crate::request::{
    DescriptorKind, DispatchContext, MonitoringRequest, OutputMode, ACTION_PARAMETER,
    COUNTER_PARAMETER, RESOURCE_PARAMETER, SESSION_ID_PARAMETER,
};
use crate::response::{no_cache, MonitoringResponse};

/// File written by [`MonitoringDispatcher::write_html_to_last_shutdown_file`]
pub const LAST_SHUTDOWN_FILE: &str = "last_shutdown.html";

/// Every external service the dispatcher talks to
#[derive(Clone)]
pub struct Collaborators {
    pub collector: Arc<dyn Collector>,
    pub graphs: Arc<dyn GraphEngine>,
    pub html: Arc<dyn HtmlReportRenderer>,
    pub pdf: Arc<dyn PdfReportRenderer>,
    pub introspection: Arc<dyn Introspection>,
    pub sessions: Arc<dyn SessionRegistry>,
    pub hosting: Arc<dyn HostingEnvironment>,
    pub actions: Arc<dyn ActionExecutor>,
    pub policy: Arc<dyn ActionPolicy>,
    pub locale: Arc<dyn LocaleBinder>,
}

/// Data pushed by remote agents, used instead of local introspection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectorSnapshots {
    pub heap_histogram: Option<HeapHistogram>,
    pub sessions: Option<Vec<SessionInformations>>,
}

/// Whether this instance owns live collection or aggregates remote agents
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ExecutionMode {
    #[default]
    Local,
    CollectorServer(CollectorSnapshots),
}

impl ExecutionMode {
    pub fn is_collector_server(&self) -> bool {
        matches!(self, Self::CollectorServer(_))
    }

    pub fn snapshots(&self) -> Option<&CollectorSnapshots> {
        match self {
            Self::Local => None,
            Self::CollectorServer(snapshots) => Some(snapshots),
        }
    }
}

/// Outcome of a system action, shown by the next render call only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMessage(String);

impl ActionMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builder for creating a [`MonitoringDispatcher`]
pub struct DispatcherBuilder {
    collector: Option<Arc<dyn Collector>>,
    graphs: Option<Arc<dyn GraphEngine>>,
    html: Option<Arc<dyn HtmlReportRenderer>>,
    pdf: Option<Arc<dyn PdfReportRenderer>>,
    introspection: Option<Arc<dyn Introspection>>,
    sessions: Option<Arc<dyn SessionRegistry>>,
    hosting: Option<Arc<dyn HostingEnvironment>>,
    actions: Option<Arc<dyn ActionExecutor>>,
    policy: Arc<dyn ActionPolicy>,
    locale: Arc<dyn LocaleBinder>,
    mode: ExecutionMode,
    settings: DispatcherSettings,
    metrics: Option<Arc<DispatchMetrics>>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    /// System actions disabled, no-op locale binding, local mode
    pub fn new() -> Self {
        Self {
            collector: None,
            graphs: None,
            html: None,
            pdf: None,
            introspection: None,
            sessions: None,
            hosting: None,
            actions: None,
            policy: Arc::new(StaticActionPolicy::new(false)),
            locale: Arc::new(NoopLocaleBinder),
            mode: ExecutionMode::Local,
            settings: DispatcherSettings::default(),
            metrics: None,
        }
    }

    /// Set every collaborator at once
    pub fn collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collector = Some(collaborators.collector);
        self.graphs = Some(collaborators.graphs);
        self.html = Some(collaborators.html);
        self.pdf = Some(collaborators.pdf);
        self.introspection = Some(collaborators.introspection);
        self.sessions = Some(collaborators.sessions);
        self.hosting = Some(collaborators.hosting);
        self.actions = Some(collaborators.actions);
        self.policy = collaborators.policy;
        self.locale = collaborators.locale;
        self
    }

    pub fn collector(mut self, collector: Arc<dyn Collector>) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn graphs(mut self, graphs: Arc<dyn GraphEngine>) -> Self {
        self.graphs = Some(graphs);
        self
    }

    pub fn html(mut self, html: Arc<dyn HtmlReportRenderer>) -> Self {
        self.html = Some(html);
        self
    }

    pub fn pdf(mut self, pdf: Arc<dyn PdfReportRenderer>) -> Self {
        self.pdf = Some(pdf);
        self
    }

    pub fn introspection(mut self, introspection: Arc<dyn Introspection>) -> Self {
        self.introspection = Some(introspection);
        self
    }

    pub fn sessions(mut self, sessions: Arc<dyn SessionRegistry>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn hosting(mut self, hosting: Arc<dyn HostingEnvironment>) -> Self {
        self.hosting = Some(hosting);
        self
    }

    pub fn actions(mut self, actions: Arc<dyn ActionExecutor>) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn policy(mut self, policy: Arc<dyn ActionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn locale_binder(mut self, locale: Arc<dyn LocaleBinder>) -> Self {
        self.locale = locale;
        self
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn settings(mut self, settings: DispatcherSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Share counters with other dispatchers
    pub fn metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the dispatcher and probe which descriptors the host exposes
    ///
    /// # Errors
    /// Returns [`DispatcherError::MissingCollaborator`] when a required
    /// collaborator was never set
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub fn build(self) -> Result<MonitoringDispatcher, DispatcherError> {
        let collaborators = Collaborators {
            collector: self.collector.ok_or(DispatcherError::MissingCollaborator("collector"))?,
            graphs: self.graphs.ok_or(DispatcherError::MissingCollaborator("graph engine"))?,
            html: self.html.ok_or(DispatcherError::MissingCollaborator("html renderer"))?,
            pdf: self.pdf.ok_or(DispatcherError::MissingCollaborator("pdf renderer"))?,
            introspection: self
                .introspection
                .ok_or(DispatcherError::MissingCollaborator("introspection"))?,
            sessions: self
                .sessions
                .ok_or(DispatcherError::MissingCollaborator("session registry"))?,
            hosting: self.hosting.ok_or(DispatcherError::MissingCollaborator("hosting"))?,
            actions: self
                .actions
                .ok_or(DispatcherError::MissingCollaborator("action executor"))?,
            policy: self.policy,
            locale: self.locale,
        };

        let descriptors = probe_descriptors(collaborators.hosting.as_ref());
        info!(
            application = collaborators.collector.application(),
            collector_server = self.mode.is_collector_server(),
            deployment_descriptor = descriptors.deployment,
            build_descriptor = descriptors.build,
            "Monitoring dispatcher ready"
        );

        Ok(MonitoringDispatcher {
            collaborators,
            mode: self.mode,
            settings: self.settings,
            descriptors,
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}

fn probe_descriptors(hosting: &dyn HostingEnvironment) -> DescriptorAvailability {
    let exists = |kind: DescriptorKind| match open_descriptor(hosting, kind) {
        Ok(stream) => stream.is_some(),
        Err(e) => {
            warn!(descriptor = kind.file_name(), error = %e, "Descriptor probe failed");
            false
        }
    };
    DescriptorAvailability {
        deployment: exists(DescriptorKind::Deployment),
        build: exists(DescriptorKind::Build),
    }
}

/// Per-request values shared by the HTML, PDF and snapshot paths
pub(crate) struct RenderRequest<'a> {
    pub request: &'a MonitoringRequest,
    pub context: &'a DispatchContext,
    pub runtime: &'a [RuntimeInformations],
    pub locale: &'a Locale,
    pub message: Option<&'a str>,
}

/// The dispatcher sitting between the HTTP transport and the collaborators
///
/// Cloning is cheap; clones share collaborators and metrics.
#[derive(Clone)]
pub struct MonitoringDispatcher {
    pub(crate) collaborators: Collaborators,
    pub(crate) mode: ExecutionMode,
    pub(crate) settings: DispatcherSettings,
    descriptors: DescriptorAvailability,
    metrics: Arc<DispatchMetrics>,
}

impl MonitoringDispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn mode(&self) -> &ExecutionMode {
        &self.mode
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    /// Descriptor files found at construction
    pub fn descriptors(&self) -> DescriptorAvailability {
        self.descriptors
    }

    pub fn metrics(&self) -> DispatchMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Same dispatcher with freshly pushed agent data
    ///
    /// `None` in local mode, which never carries snapshots.
    pub fn with_snapshots(&self, snapshots: CollectorSnapshots) -> Option<Self> {
        match self.mode {
            ExecutionMode::Local => None,
            ExecutionMode::CollectorServer(_) => Some(Self {
                mode: ExecutionMode::CollectorServer(snapshots),
                ..self.clone()
            }),
        }
    }

    /// Execute the requested action, then render
    ///
    /// The action message is handed to this render only.
    #[instrument(name = "dispatcher_dispatch", skip_all)]
    pub fn dispatch(
        &self,
        request: &MonitoringRequest,
        response: &mut dyn MonitoringResponse,
        runtime: &[RuntimeInformations],
    ) -> Result<(), DispatcherError> {
        let message = self.execute_action_if_needed(request)?;
        self.do_report(request, response, runtime, message.as_ref())
    }

    /// Run the `action` parameter, if any
    ///
    /// # Errors
    /// [`DispatcherError::ActionsDisabled`] when system actions are off,
    /// [`DispatcherError::UnknownAction`] for unknown names, or the
    /// executor's own failure
    pub fn execute_action_if_needed(
        &self,
        request: &MonitoringRequest,
    ) -> Result<Option<ActionMessage>, DispatcherError> {
        let Some(name) = request.parameter(ACTION_PARAMETER) else {
            return Ok(None);
        };
        let locale = request.locale();
        let _scope = LocaleScope::bind(self.collaborators.locale.as_ref(), &locale);
        let result = self.execute_action(
            name,
            request.parameter(COUNTER_PARAMETER),
            request.parameter(SESSION_ID_PARAMETER),
        );
        self.observe(result).map(Some)
    }

    #[instrument(name = "dispatcher_execute_action", skip(self))]
    fn execute_action(
        &self,
        name: &str,
        counter: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<ActionMessage, DispatcherError> {
        self.check_system_actions_enabled()?;
        let action: Action = name.parse()?;
        let message = self.collaborators.actions.execute(
            action,
            self.collaborators.collector.as_ref(),
            counter,
            session_id,
        )?;

        self.metrics.inc_actions();
        observability::record_action(action.token());
        info!(action = %action, counter, session_id, "System action executed");
        Ok(ActionMessage(message))
    }

    /// Produce the response for one request
    ///
    /// `message` is the result of a preceding action, if any.
    #[instrument(
        name = "dispatcher_do_report",
        skip_all,
        fields(route = tracing::field::Empty)
    )]
    pub fn do_report(
        &self,
        request: &MonitoringRequest,
        response: &mut dyn MonitoringResponse,
        runtime: &[RuntimeInformations],
        message: Option<&ActionMessage>,
    ) -> Result<(), DispatcherError> {
        if let Some(resource) = request.parameter(RESOURCE_PARAMETER) {
            tracing::Span::current().record("route", RouteKind::Resource.as_str());
            self.metrics.inc_route(RouteKind::Resource);
            let result = self.do_resource(response, resource);
            return self.observe(result);
        }

        no_cache(response);

        let locale = request.locale();
        let _scope = LocaleScope::bind(self.collaborators.locale.as_ref(), &locale);

        let result = DispatchContext::from_request(request).and_then(|context| {
            let mode = context.output_mode()?;
            tracing::Span::current().record("route", mode.kind().as_str());
            self.metrics.inc_route(mode.kind());

            let render = RenderRequest {
                request,
                context: &context,
                runtime,
                locale: &locale,
                message: message.map(ActionMessage::as_str),
            };
            match mode {
                OutputMode::Graph(name) => {
                    self.do_graph(request, response, &context.period, &name)
                }
                OutputMode::Descriptor(kind) => self.do_descriptor(response, kind),
                OutputMode::Html => self.do_compressed_html(&render, response),
                OutputMode::Pdf => self.do_pdf(&render, response),
                OutputMode::Snapshot(format) => self.do_snapshot(&render, response, format),
            }
        });
        self.observe(result)
    }

    /// Render the dashboard for the last day into `dir/last_shutdown.html`
    ///
    /// Failures are logged and swallowed; returns the written path.
    #[instrument(name = "dispatcher_last_shutdown", skip(self, runtime))]
    pub fn write_html_to_last_shutdown_file(
        &self,
        dir: &Path,
        runtime: &[RuntimeInformations],
    ) -> Option<PathBuf> {
        match self.write_last_shutdown(dir, runtime) {
            Ok(path) => {
                info!(path = %path.display(), "Last shutdown report written");
                Some(path)
            }
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "Failed to write last shutdown report");
                None
            }
        }
    }

    fn write_last_shutdown(
        &self,
        dir: &Path,
        runtime: &[RuntimeInformations],
    ) -> Result<PathBuf, DispatcherError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(LAST_SHUTDOWN_FILE);
        let mut writer = BufWriter::new(File::create(&path)?);

        let period = Period::Day;
        let locale = Locale::default();
        let context = self.report_context(runtime, &period, &locale);
        self.collaborators
            .html
            .render(&context, HtmlView::Dashboard { message: None }, &mut writer)?;
        writer.flush()?;
        Ok(path)
    }

    /// Gate for every privileged view, dump and action
    ///
    /// # Errors
    /// Returns [`DispatcherError::ActionsDisabled`] when the policy says no
    pub fn check_system_actions_enabled(&self) -> Result<(), DispatcherError> {
        if self.collaborators.policy.system_actions_enabled() {
            Ok(())
        } else {
            Err(DispatcherError::ActionsDisabled)
        }
    }

    pub(crate) fn report_context<'a>(
        &'a self,
        runtime: &'a [RuntimeInformations],
        period: &'a Period,
        locale: &'a Locale,
    ) -> ReportContext<'a> {
        ReportContext {
            collector: self.collaborators.collector.as_ref(),
            collector_server: self.mode.is_collector_server(),
            runtime,
            period,
            locale,
            descriptors: self.descriptors,
        }
    }

    /// Pushed histogram in collector-server mode, else a live one
    pub(crate) fn heap_histogram(&self) -> Result<HeapHistogram, ContractError> {
        match self.mode.snapshots().and_then(|s| s.heap_histogram.as_ref()) {
            Some(histogram) => Ok(histogram.clone()),
            None => self.collaborators.introspection.heap_histogram(),
        }
    }

    /// Pushed sessions in collector-server mode, else the live registry
    pub(crate) fn all_sessions(&self) -> Vec<SessionInformations> {
        match self.mode.snapshots().and_then(|s| s.sessions.as_ref()) {
            Some(sessions) => sessions.clone(),
            None => self.collaborators.sessions.all_sessions(),
        }
    }

    pub(crate) fn session(&self, id: &str) -> Option<SessionInformations> {
        match self.mode.snapshots().and_then(|s| s.sessions.as_ref()) {
            Some(sessions) => sessions.iter().find(|s| s.id == id).cloned(),
            None => self.collaborators.sessions.session(id),
        }
    }

    /// Refresh counters before a local render
    pub(crate) fn collect_if_local(&self) {
        if !self.mode.is_collector_server() {
            debug!("Collecting local context before render");
            self.collaborators.collector.collect_local_context_without_errors();
        }
    }

    pub(crate) fn record_introspection_failure(&self, what: &str, err: &ContractError) {
        warn!(what, error = %err, "Introspection failed, rendering message");
        self.metrics.inc_introspection_failures();
        observability::record_introspection_failure(what);
    }

    fn observe<T>(&self, result: Result<T, DispatcherError>) -> Result<T, DispatcherError> {
        if let Err(e) = &result {
            self.metrics.inc_failures();
            observability::record_dispatch_failure(e.kind());
            debug!(kind = e.kind(), error = %e, "Dispatch failed");
        }
        result
    }
}

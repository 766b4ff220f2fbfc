//! Recording fakes for every collaborator

use std::collections::BTreeMap;
use std::io::{self, Cursor, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};

use contracts::{
    Action, ActionExecutor, Collector, ContractError, Counter, GraphEngine, HeapHistogram,
    HostingEnvironment, HtmlReportRenderer, HtmlView, Introspection, Locale, LocaleBinder,
    PdfReportRenderer, Period, ProcessInformations, ReportContext, ResourceStream,
    SessionInformations, SessionRegistry, StaticActionPolicy, ThreadInformations,
};

use crate::dispatcher::{DispatcherBuilder, MonitoringDispatcher};

pub fn session(id: &str) -> SessionInformations {
    let at = Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap();
    SessionInformations {
        id: id.to_string(),
        created_at: at,
        last_access: at,
        attribute_count: 2,
        serialized_size: Some(512),
        remote_addr: Some("10.0.0.7".to_string()),
        user: None,
    }
}

#[derive(Default)]
pub struct FakeCollector {
    counters: Mutex<BTreeMap<String, Arc<Counter>>>,
    collections: AtomicUsize,
    stopped: AtomicBool,
}

impl FakeCollector {
    /// Live counter, created on first use
    pub fn counter(&self, name: &str) -> Arc<Counter> {
        self.counters
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Counter::new(name)))
            .clone()
    }

    pub fn collections(&self) -> usize {
        self.collections.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Collector for FakeCollector {
    fn application(&self) -> &str {
        "shop"
    }

    fn counters(&self) -> Vec<Arc<Counter>> {
        self.counters.lock().unwrap().values().cloned().collect()
    }

    fn collect_local_context_without_errors(&self) {
        self.collections.fetch_add(1, Ordering::SeqCst);
    }

    fn clear_counter(&self, name: &str) -> bool {
        match self.counters.lock().unwrap().get(name) {
            Some(counter) => {
                counter.clear();
                true
            }
            None => false,
        }
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Knows only the `cpu` graph; image bytes depend on every input
#[derive(Default)]
pub struct FakeGraphs {
    last: Mutex<Option<(String, u32, u32)>>,
}

impl FakeGraphs {
    pub fn last_request(&self) -> Option<(String, u32, u32)> {
        self.last.lock().unwrap().clone()
    }
}

impl GraphEngine for FakeGraphs {
    fn graph(
        &self,
        name: &str,
        period: &Period,
        width: u32,
        height: u32,
    ) -> Result<Option<Vec<u8>>, ContractError> {
        *self.last.lock().unwrap() = Some((name.to_string(), width, height));
        if name != "cpu" {
            return Ok(None);
        }
        let mut image = b"\x89PNG".to_vec();
        image.extend_from_slice(format!("{name}:{period}:{width}x{height}").as_bytes());
        Ok(Some(image))
    }
}

/// Writes a one-line description of each view
#[derive(Default)]
pub struct RecordingHtml {
    fail: AtomicBool,
}

impl RecordingHtml {
    /// Next renders write "partial" then fail
    pub fn fail_after_partial_write(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

impl HtmlReportRenderer for RecordingHtml {
    fn render(
        &self,
        context: &ReportContext<'_>,
        view: HtmlView<'_>,
        out: &mut dyn Write,
    ) -> Result<(), ContractError> {
        if self.fail.load(Ordering::SeqCst) {
            out.write_all(b"partial")?;
            return Err(ContractError::render("html", "template exploded"));
        }
        let line = match view {
            HtmlView::Dashboard { message } => {
                let mut line = format!(
                    "dashboard app={} period={} locale={} collector_server={}",
                    context.application(),
                    context.period,
                    context.locale,
                    context.collector_server
                );
                if let Some(message) = message {
                    line.push_str(&format!(" message={message}"));
                }
                line
            }
            HtmlView::GraphDetail { graph } => {
                format!("graph-detail graph={}", graph.unwrap_or("-"))
            }
            HtmlView::Sessions { sessions, .. } => format!("sessions count={}", sessions.len()),
            HtmlView::SessionDetail {
                session_id,
                session,
            } => format!(
                "session-detail id={session_id} found={}",
                session.is_some()
            ),
            HtmlView::CurrentRequests { threads } => {
                format!("current-requests threads={}", threads.len())
            }
            HtmlView::HeapHistogram { histogram, .. } => {
                format!("heap-histogram classes={}", histogram.classes.len())
            }
            HtmlView::Processes { processes } => format!("processes count={}", processes.len()),
            HtmlView::Message { text } => format!("message text={text}"),
        };
        out.write_all(line.as_bytes())?;
        Ok(())
    }
}

pub struct FakePdf;

impl PdfReportRenderer for FakePdf {
    fn file_name(&self, application: &str) -> String {
        format!("Monitoring_{application}.pdf")
    }

    fn render(&self, context: &ReportContext<'_>, out: &mut dyn Write) -> Result<(), ContractError> {
        write!(out, "%PDF-fake period={}", context.period)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeIntrospection {
    heap_failure: Mutex<Option<String>>,
    processes_failure: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl FakeIntrospection {
    pub fn fail_heap_histogram(&self, message: &str) {
        *self.heap_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_processes(&self, message: &str) {
        *self.processes_failure.lock().unwrap() = Some(message.to_string());
    }

    /// Heap and process collections attempted
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Introspection for FakeIntrospection {
    fn heap_histogram(&self) -> Result<HeapHistogram, ContractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.heap_failure.lock().unwrap().as_ref() {
            Some(message) => Err(ContractError::introspection("heap histogram", message)),
            None => Ok(HeapHistogram::default()),
        }
    }

    fn processes(&self) -> Result<Vec<ProcessInformations>, ContractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.processes_failure.lock().unwrap().as_ref() {
            return Err(ContractError::introspection("processes", message));
        }
        Ok(vec![ProcessInformations {
            user: "app".to_string(),
            pid: 1,
            cpu_percent: 0.5,
            memory_percent: 1.0,
            virtual_size_kb: 1024,
            resident_size_kb: 512,
            state: "S".to_string(),
            command: "shop".to_string(),
        }])
    }

    fn threads(&self) -> Vec<ThreadInformations> {
        vec![ThreadInformations {
            id: 7,
            name: "worker-1".to_string(),
            state: "RUNNABLE".to_string(),
            current_request: Some("/checkout".to_string()),
        }]
    }
}

#[derive(Default)]
pub struct FakeSessions {
    sessions: Mutex<Vec<SessionInformations>>,
}

impl FakeSessions {
    pub fn add(&self, session: SessionInformations) {
        self.sessions.lock().unwrap().push(session);
    }
}

impl SessionRegistry for FakeSessions {
    fn all_sessions(&self) -> Vec<SessionInformations> {
        self.sessions.lock().unwrap().clone()
    }

    fn session(&self, id: &str) -> Option<SessionInformations> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    fn invalidate_all(&self) -> usize {
        let mut sessions = self.sessions.lock().unwrap();
        let count = sessions.len();
        sessions.clear();
        count
    }

    fn invalidate(&self, id: &str) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        sessions.len() != before
    }
}

/// In-memory bundled resources and deployment tree
#[derive(Default)]
pub struct FakeHosting {
    bundled: Mutex<BTreeMap<String, Vec<u8>>>,
    deployment: Mutex<BTreeMap<String, Vec<u8>>>,
    requested: Mutex<Vec<String>>,
    fail_bundled: AtomicBool,
}

impl FakeHosting {
    pub fn add_bundled(&self, path: &str, content: &[u8]) {
        self.bundled
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_vec());
    }

    pub fn add_deployment(&self, path: &str, content: &[u8]) {
        self.deployment
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_vec());
    }

    pub fn fail_bundled(&self) {
        self.fail_bundled.store(true, Ordering::SeqCst);
    }

    /// Bundled paths looked up so far
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    fn open(files: &BTreeMap<String, Vec<u8>>, path: &str) -> Option<ResourceStream> {
        files
            .get(path)
            .map(|content| Box::new(Cursor::new(content.clone())) as ResourceStream)
    }
}

impl HostingEnvironment for FakeHosting {
    fn bundled_resource(&self, path: &str) -> io::Result<Option<ResourceStream>> {
        self.requested.lock().unwrap().push(path.to_string());
        if self.fail_bundled.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        Ok(Self::open(&self.bundled.lock().unwrap(), path))
    }

    fn deployment_resource(&self, path: &str) -> io::Result<Option<ResourceStream>> {
        Ok(Self::open(&self.deployment.lock().unwrap(), path))
    }

    fn deployment_paths(&self, dir: &str) -> Option<Vec<String>> {
        let deployment = self.deployment.lock().unwrap();
        let mut children: Vec<String> = deployment
            .keys()
            .filter_map(|path| path.strip_prefix(dir))
            .map(|rest| match rest.split_once('/') {
                Some((child, _)) => format!("{dir}{child}/"),
                None => format!("{dir}{rest}"),
            })
            .collect();
        children.sort();
        children.dedup();
        if children.is_empty() {
            None
        } else {
            Some(children)
        }
    }

    fn mime_type(&self, path: &str) -> Option<String> {
        let mime = match path.rsplit_once('.')?.1 {
            "css" => "text/css",
            "js" => "application/javascript",
            "xml" => "application/xml",
            "png" => "image/png",
            _ => return None,
        };
        Some(mime.to_string())
    }
}

#[derive(Default)]
pub struct RecordingActions {
    executed: Mutex<Vec<(Action, Option<String>, Option<String>)>>,
}

impl RecordingActions {
    pub fn executed(&self) -> Vec<(Action, Option<String>, Option<String>)> {
        self.executed.lock().unwrap().clone()
    }
}

impl ActionExecutor for RecordingActions {
    fn execute(
        &self,
        action: Action,
        _collector: &dyn Collector,
        counter_name: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<String, ContractError> {
        self.executed.lock().unwrap().push((
            action,
            counter_name.map(str::to_string),
            session_id.map(str::to_string),
        ));
        Ok(format!("executed {}", action.token()))
    }
}

/// Tracks binding depth and every locale bound
#[derive(Default)]
pub struct RecordingLocale {
    bound: Mutex<Vec<String>>,
    depth: AtomicUsize,
}

impl RecordingLocale {
    pub fn bound(&self) -> Vec<String> {
        self.bound.lock().unwrap().clone()
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

impl LocaleBinder for RecordingLocale {
    fn bind(&self, locale: &Locale) {
        self.bound.lock().unwrap().push(locale.tag().to_string());
        self.depth.fetch_add(1, Ordering::SeqCst);
    }

    fn unbind(&self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One fake per collaborator, shared with every dispatcher it builds
pub struct Fakes {
    pub collector: Arc<FakeCollector>,
    pub graphs: Arc<FakeGraphs>,
    pub html: Arc<RecordingHtml>,
    pub introspection: Arc<FakeIntrospection>,
    pub sessions: Arc<FakeSessions>,
    pub hosting: Arc<FakeHosting>,
    pub actions: Arc<RecordingActions>,
    pub locale: Arc<RecordingLocale>,
    actions_enabled: bool,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            collector: Arc::default(),
            graphs: Arc::default(),
            html: Arc::default(),
            introspection: Arc::default(),
            sessions: Arc::default(),
            hosting: Arc::default(),
            actions: Arc::default(),
            locale: Arc::default(),
            actions_enabled: false,
        }
    }

    pub fn with_actions_enabled(mut self) -> Self {
        self.actions_enabled = true;
        self
    }

    pub fn builder(&self) -> DispatcherBuilder {
        MonitoringDispatcher::builder()
            .collector(self.collector.clone())
            .graphs(self.graphs.clone())
            .html(self.html.clone())
            .pdf(Arc::new(FakePdf))
            .introspection(self.introspection.clone())
            .sessions(self.sessions.clone())
            .hosting(self.hosting.clone())
            .actions(self.actions.clone())
            .policy(Arc::new(StaticActionPolicy::new(self.actions_enabled)))
            .locale_binder(self.locale.clone())
    }

    pub fn dispatcher(&self) -> MonitoringDispatcher {
        self.builder().build().unwrap()
    }
}

//! Inbound request model and the per-request dispatch context
//!
//! [`MonitoringRequest`] is the transport-neutral view of an HTTP request.
//! [`DispatchContext`] decodes its parameters once into closed enumerations
//! so routing is an exhaustive match.

use std::collections::HashMap;

use contracts::{Locale, Period};

use crate::error::DispatcherError;
use crate::metrics::RouteKind;
use crate::transport::TransportFormat;

pub const ACTION_PARAMETER: &str = "action";
pub const PART_PARAMETER: &str = "part";
pub const PERIOD_PARAMETER: &str = "period";
pub const SESSION_ID_PARAMETER: &str = "sessionId";
pub const COLLECTOR_PARAMETER: &str = "collector";
pub const COUNTER_PARAMETER: &str = "counter";
pub const GRAPH_PARAMETER: &str = "graph";
pub const RESOURCE_PARAMETER: &str = "resource";
pub const FORMAT_PARAMETER: &str = "format";
pub const WIDTH_PARAMETER: &str = "width";
pub const HEIGHT_PARAMETER: &str = "height";

pub const WEB_XML_PART: &str = "web.xml";
pub const POM_XML_PART: &str = "pom.xml";
pub const HEAP_HISTO_PART: &str = "heaphisto";
pub const PROCESSES_PART: &str = "processes";
pub const SESSIONS_PART: &str = "sessions";
pub const CURRENT_REQUESTS_PART: &str = "currentRequests";
pub const GRAPH_PART: &str = "graph";

/// `collector` parameter value sent by remote collector agents
pub const COLLECTOR_STOP: &str = "stop";

/// Transport-neutral inbound request
#[derive(Debug, Clone, Default)]
pub struct MonitoringRequest {
    parameters: HashMap<String, String>,
    /// (lowercase name, value) in arrival order
    headers: Vec<(String, String)>,
    locale: Option<Locale>,
}

impl MonitoringRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an url-encoded query string; the first value of a repeated
    /// parameter wins
    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    /// Build from decoded (name, value) pairs; the first value wins
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut parameters = HashMap::new();
        for (name, value) in pairs {
            parameters.entry(name.into()).or_insert_with(|| value.into());
        }
        Self {
            parameters,
            ..Self::default()
        }
    }

    /// Set (or replace) a parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Append a header value
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    /// Force the rendering locale instead of deriving it from `Accept-Language`
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// First value of a header, name matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of a header, name matched case-insensitively
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }

    /// Rendering locale: explicit one, else the preferred `Accept-Language`
    pub fn locale(&self) -> Locale {
        self.locale
            .clone()
            .unwrap_or_else(|| Locale::from_accept_language(self.header("accept-language")))
    }

    /// Whether the response will show host information
    ///
    /// Resource, graph and part requests never do, so hosts can skip
    /// gathering it.
    pub fn needs_runtime_informations(&self) -> bool {
        self.parameter(RESOURCE_PARAMETER).is_none()
            && self.parameter(GRAPH_PARAMETER).is_none()
            && self.parameter(PART_PARAMETER).is_none()
    }
}

/// Decoded `part` parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    DeploymentDescriptor,
    BuildDescriptor,
    HeapHistogram,
    Processes,
    Sessions,
    CurrentRequests,
    Graph,
    /// Unknown token, rendered as an empty view
    Unrecognized(String),
}

impl Part {
    /// Case-insensitive decode of a part token
    pub fn parse(value: &str) -> Self {
        const KNOWN: [(&str, Part); 7] = [
            (WEB_XML_PART, Part::DeploymentDescriptor),
            (POM_XML_PART, Part::BuildDescriptor),
            (HEAP_HISTO_PART, Part::HeapHistogram),
            (PROCESSES_PART, Part::Processes),
            (SESSIONS_PART, Part::Sessions),
            (CURRENT_REQUESTS_PART, Part::CurrentRequests),
            (GRAPH_PART, Part::Graph),
        ];
        KNOWN
            .into_iter()
            .find(|(token, _)| token.eq_ignore_ascii_case(value))
            .map_or_else(|| Self::Unrecognized(value.to_string()), |(_, part)| part)
    }

    pub fn token(&self) -> &str {
        match self {
            Self::DeploymentDescriptor => WEB_XML_PART,
            Self::BuildDescriptor => POM_XML_PART,
            Self::HeapHistogram => HEAP_HISTO_PART,
            Self::Processes => PROCESSES_PART,
            Self::Sessions => SESSIONS_PART,
            Self::CurrentRequests => CURRENT_REQUESTS_PART,
            Self::Graph => GRAPH_PART,
            Self::Unrecognized(token) => token,
        }
    }
}

/// Overall transport selected by the `format` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Pdf,
    Transport(TransportFormat),
}

impl OutputFormat {
    /// Absent or `html` is HTML, `pdf` is PDF, anything else must name a
    /// transport format
    ///
    /// # Errors
    /// Returns [`DispatcherError::UnknownFormat`] for unknown names
    pub fn parse(value: Option<&str>) -> Result<Self, DispatcherError> {
        match value {
            None => Ok(Self::Html),
            Some(v) if v.eq_ignore_ascii_case("html") => Ok(Self::Html),
            Some(v) if v.eq_ignore_ascii_case("pdf") => Ok(Self::Pdf),
            Some(v) => v.parse().map(Self::Transport),
        }
    }
}

/// Descriptor file served raw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// Web-app deployment descriptor (`web.xml`)
    Deployment,
    /// Build descriptor (`pom.xml`)
    Build,
}

impl DescriptorKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Deployment => WEB_XML_PART,
            Self::Build => POM_XML_PART,
        }
    }
}

/// The single output path chosen for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// PNG usage graph of the named metric
    Graph(String),
    Descriptor(DescriptorKind),
    Html,
    Pdf,
    Snapshot(TransportFormat),
}

impl OutputMode {
    pub fn kind(&self) -> RouteKind {
        match self {
            Self::Graph(_) => RouteKind::Graph,
            Self::Descriptor(_) => RouteKind::Descriptor,
            Self::Html => RouteKind::Html,
            Self::Pdf => RouteKind::Pdf,
            Self::Snapshot(_) => RouteKind::Snapshot,
        }
    }
}

/// Immutable per-request bundle decoded from the parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    pub action: Option<String>,
    pub part: Option<Part>,
    pub period: Period,
    pub graph: Option<String>,
    /// Raw `format` value, decoded only once routing reaches it
    pub format: Option<String>,
    pub counter: Option<String>,
    pub session_id: Option<String>,
    /// Remote collector asked to stop and reset after the snapshot
    pub stop_collector: bool,
}

impl DispatchContext {
    /// Decode every routing parameter once; `format` is kept raw
    ///
    /// # Errors
    /// Returns [`DispatcherError::UnknownPeriod`] on bad client input
    pub fn from_request(request: &MonitoringRequest) -> Result<Self, DispatcherError> {
        let period = match request.parameter(PERIOD_PARAMETER) {
            None => Period::default(),
            Some(value) => value.parse()?,
        };
        let owned = |name: &str| request.parameter(name).map(str::to_string);

        Ok(Self {
            action: owned(ACTION_PARAMETER),
            part: request.parameter(PART_PARAMETER).map(Part::parse),
            period,
            graph: owned(GRAPH_PARAMETER),
            format: owned(FORMAT_PARAMETER),
            counter: owned(COUNTER_PARAMETER),
            session_id: owned(SESSION_ID_PARAMETER),
            stop_collector: request
                .parameter(COLLECTOR_PARAMETER)
                .is_some_and(|v| v.eq_ignore_ascii_case(COLLECTOR_STOP)),
        })
    }

    /// Routing decision; first match wins
    ///
    /// # Errors
    /// Returns [`DispatcherError::UnknownFormat`] when the request reaches
    /// the format branch with an unknown `format`
    pub fn output_mode(&self) -> Result<OutputMode, DispatcherError> {
        let mode = match (&self.part, &self.graph) {
            (None, Some(graph)) => OutputMode::Graph(graph.clone()),
            (Some(Part::DeploymentDescriptor), _) => {
                OutputMode::Descriptor(DescriptorKind::Deployment)
            }
            (Some(Part::BuildDescriptor), _) => OutputMode::Descriptor(DescriptorKind::Build),
            _ => match OutputFormat::parse(self.format.as_deref())? {
                OutputFormat::Html => OutputMode::Html,
                OutputFormat::Pdf => OutputMode::Pdf,
                OutputFormat::Transport(format) => OutputMode::Snapshot(format),
            },
        };
        Ok(mode)
    }
}

//! Machine-readable snapshot formats for remote collectors

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use contracts::{
    ClassHistogram, CounterSnapshot, HeapHistogram, ProcessInformations, RuntimeInformations,
    SessionInformations,
};
use serde::{Deserialize, Serialize};

use crate::error::DispatcherError;

/// Serialization format selected by a non-HTML, non-PDF `format` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportFormat {
    /// Compact binary (bincode)
    Serialized,
    /// JSON, human-readable
    Json,
    /// `<snapshot kind="...">` document
    Xml,
}

impl TransportFormat {
    pub const ALL: [TransportFormat; 3] = [
        TransportFormat::Serialized,
        TransportFormat::Json,
        TransportFormat::Xml,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Self::Serialized => "serialized",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Serialized => "application/x-bincode",
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }

    /// Encode `payload` onto `out`
    ///
    /// # Errors
    /// Returns [`DispatcherError::Serialization`] if encoding or writing fails
    pub fn write_to<W: Write>(
        &self,
        payload: &SnapshotPayload,
        mut out: W,
    ) -> Result<(), DispatcherError> {
        match self {
            Self::Serialized => bincode::serialize_into(out, payload)
                .map_err(|e| self.serialization_error(e.to_string())),
            Self::Json => serde_json::to_writer(out, payload)
                .map_err(|e| self.serialization_error(e.to_string())),
            Self::Xml => {
                let document = quick_xml::se::to_string(&XmlSnapshot::from(payload))
                    .map_err(|e| self.serialization_error(e.to_string()))?;
                out.write_all(document.as_bytes())?;
                Ok(())
            }
        }
    }

    /// Decode a payload previously written with [`TransportFormat::write_to`]
    ///
    /// # Errors
    /// Returns [`DispatcherError::Serialization`] if the input is malformed
    pub fn read_from<R: Read>(&self, mut input: R) -> Result<SnapshotPayload, DispatcherError> {
        match self {
            Self::Serialized => {
                bincode::deserialize_from(input).map_err(|e| self.serialization_error(e.to_string()))
            }
            Self::Json => {
                serde_json::from_reader(input).map_err(|e| self.serialization_error(e.to_string()))
            }
            Self::Xml => {
                let mut document = String::new();
                input.read_to_string(&mut document)?;
                let snapshot: XmlSnapshot = quick_xml::de::from_str(&document)
                    .map_err(|e| self.serialization_error(e.to_string()))?;
                snapshot
                    .into_payload()
                    .map_err(|kind| self.serialization_error(format!("unknown snapshot kind '{kind}'")))
            }
        }
    }

    fn serialization_error(&self, message: String) -> DispatcherError {
        DispatcherError::Serialization {
            format: self.token(),
            message,
        }
    }
}

impl FromStr for TransportFormat {
    type Err = DispatcherError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.token().eq_ignore_ascii_case(name))
            .ok_or_else(|| DispatcherError::UnknownFormat {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for TransportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Object streamed to a remote collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SnapshotPayload {
    /// Counter copies plus host information
    Monitoring {
        counters: Vec<CounterSnapshot>,
        runtime: Vec<RuntimeInformations>,
    },
    HeapHistogram(HeapHistogram),
    Sessions(Vec<SessionInformations>),
    Session(Option<SessionInformations>),
    Processes(Vec<ProcessInformations>),
    /// Introspection failed on the agent
    Failure { message: String },
}

/// Flat XML layout of a [`SnapshotPayload`]
///
/// `kind` names the variant; list items repeat as sibling elements and
/// empty lists or absent values are omitted.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "snapshot")]
struct XmlSnapshot {
    #[serde(rename = "@kind")]
    kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    counter: Vec<CounterSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    runtime: Vec<RuntimeInformations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    taken_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    class: Vec<ClassHistogram>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    session: Vec<SessionInformations>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    process: Vec<ProcessInformations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

const MONITORING_KIND: &str = "monitoring";
const HEAP_HISTOGRAM_KIND: &str = "heap_histogram";
const SESSIONS_KIND: &str = "sessions";
const SESSION_KIND: &str = "session";
const PROCESSES_KIND: &str = "processes";
const FAILURE_KIND: &str = "failure";

impl XmlSnapshot {
    fn of_kind(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Self::default()
        }
    }

    /// Returns the unknown kind on failure
    fn into_payload(self) -> Result<SnapshotPayload, String> {
        let payload = match self.kind.as_str() {
            MONITORING_KIND => SnapshotPayload::Monitoring {
                counters: self.counter,
                runtime: self.runtime,
            },
            HEAP_HISTOGRAM_KIND => SnapshotPayload::HeapHistogram(HeapHistogram {
                taken_at: self.taken_at,
                classes: self.class,
            }),
            SESSIONS_KIND => SnapshotPayload::Sessions(self.session),
            SESSION_KIND => SnapshotPayload::Session(self.session.into_iter().next()),
            PROCESSES_KIND => SnapshotPayload::Processes(self.process),
            FAILURE_KIND => SnapshotPayload::Failure {
                message: self.message.unwrap_or_default(),
            },
            _ => return Err(self.kind),
        };
        Ok(payload)
    }
}

impl From<&SnapshotPayload> for XmlSnapshot {
    fn from(payload: &SnapshotPayload) -> Self {
        match payload {
            SnapshotPayload::Monitoring { counters, runtime } => Self {
                counter: counters.clone(),
                runtime: runtime.clone(),
                ..Self::of_kind(MONITORING_KIND)
            },
            SnapshotPayload::HeapHistogram(histogram) => Self {
                taken_at: histogram.taken_at,
                class: histogram.classes.clone(),
                ..Self::of_kind(HEAP_HISTOGRAM_KIND)
            },
            SnapshotPayload::Sessions(sessions) => Self {
                session: sessions.clone(),
                ..Self::of_kind(SESSIONS_KIND)
            },
            SnapshotPayload::Session(session) => Self {
                session: session.iter().cloned().collect(),
                ..Self::of_kind(SESSION_KIND)
            },
            SnapshotPayload::Processes(processes) => Self {
                process: processes.clone(),
                ..Self::of_kind(PROCESSES_KIND)
            },
            SnapshotPayload::Failure { message } => Self {
                message: Some(message.clone()),
                ..Self::of_kind(FAILURE_KIND)
            },
        }
    }
}

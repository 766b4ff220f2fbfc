//! Host, heap, session, process and thread descriptions
//!
//! Plain data produced by introspection collaborators and consumed by the
//! renderers and the snapshot transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host/runtime facts displayed in reports and pushed to collector servers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeInformations {
    pub host: String,
    pub pid: u32,
    pub os: String,
    pub runtime_version: String,
    pub available_processors: usize,
    pub used_memory_bytes: u64,
    pub max_memory_bytes: u64,
    pub thread_count: usize,
    pub session_count: usize,
    pub system_load_average: Option<f64>,
    pub started_at: Option<DateTime<Utc>>,
}

/// One line of a heap histogram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassHistogram {
    pub name: String,
    pub instances: u64,
    pub bytes: u64,
}

/// Heap histogram, largest classes first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapHistogram {
    pub taken_at: Option<DateTime<Utc>>,
    pub classes: Vec<ClassHistogram>,
}

impl HeapHistogram {
    /// Build a histogram, sorting classes by descending byte size
    pub fn new(taken_at: DateTime<Utc>, mut classes: Vec<ClassHistogram>) -> Self {
        classes.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.name.cmp(&b.name)));
        Self {
            taken_at: Some(taken_at),
            classes,
        }
    }

    pub fn total_instances(&self) -> u64 {
        self.classes.iter().map(|c| c.instances).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.classes.iter().map(|c| c.bytes).sum()
    }
}

/// Live user session description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInformations {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub attribute_count: usize,
    pub serialized_size: Option<u64>,
    pub remote_addr: Option<String>,
    pub user: Option<String>,
}

/// OS process description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInformations {
    pub user: String,
    pub pid: u32,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub virtual_size_kb: u64,
    pub resident_size_kb: u64,
    pub state: String,
    pub command: String,
}

/// Thread currently executing a monitored request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInformations {
    pub id: u64,
    pub name: String,
    pub state: String,
    pub current_request: Option<String>,
}

/// Whether the hosting environment exposes each descriptor file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorAvailability {
    pub deployment: bool,
    pub build: bool,
}

//! Host introspection backed by `/proc` and `ps`
//!
//! A native process has no managed heap, so the "heap histogram" groups
//! the memory mappings of `/proc/self/smaps` by kind instead of classes.

use std::collections::BTreeMap;
use std::fs;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::debug;

use contracts::{
    ClassHistogram, ContractError, HeapHistogram, Introspection, ProcessInformations,
    RuntimeInformations, ThreadInformations,
};

const PS_COLUMNS: &str = "user,pid,%cpu,%mem,vsz,rss,stat,args";
const PAGE_SIZE: u64 = 4096;

/// Requests in flight, registered by the transport
#[derive(Debug, Default)]
pub struct RequestTracker {
    next_id: AtomicU64,
    active: Mutex<BTreeMap<u64, ThreadInformations>>,
}

impl RequestTracker {
    /// Register a request on the calling thread; drop the guard when done
    pub fn begin(&self, request: impl Into<String>) -> ActiveRequest<'_> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let current = std::thread::current();
        let name = current
            .name()
            .map_or_else(|| format!("{:?}", current.id()), str::to_string);
        self.lock().insert(
            id,
            ThreadInformations {
                id,
                name,
                state: "RUNNABLE".to_string(),
                current_request: Some(request.into()),
            },
        );
        ActiveRequest { tracker: self, id }
    }

    pub fn active(&self) -> Vec<ThreadInformations> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u64, ThreadInformations>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Unregisters its request on drop
#[must_use = "the request is unregistered as soon as the guard is dropped"]
pub struct ActiveRequest<'a> {
    tracker: &'a RequestTracker,
    id: u64,
}

impl Drop for ActiveRequest<'_> {
    fn drop(&mut self) {
        self.tracker.lock().remove(&self.id);
    }
}

/// Introspection of the current process and host
#[derive(Debug)]
pub struct SystemIntrospection {
    started_at: DateTime<Utc>,
    requests: RequestTracker,
}

impl Default for SystemIntrospection {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemIntrospection {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            requests: RequestTracker::default(),
        }
    }

    pub fn requests(&self) -> &RequestTracker {
        &self.requests
    }

    /// Host facts for report headers; unreadable sources are left at zero
    pub fn runtime_informations(&self, session_count: usize) -> RuntimeInformations {
        let used_memory_bytes = fs::read_to_string("/proc/self/statm")
            .ok()
            .and_then(|statm| parse_statm_resident(&statm))
            .unwrap_or_default();
        let max_memory_bytes = fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|meminfo| parse_meminfo_total(&meminfo))
            .unwrap_or_default();
        let system_load_average = fs::read_to_string("/proc/loadavg")
            .ok()
            .and_then(|loadavg| parse_loadavg(&loadavg));
        let thread_count = fs::read_dir("/proc/self/task")
            .map(|tasks| tasks.count())
            .unwrap_or(1);

        RuntimeInformations {
            host: host_name(),
            pid: std::process::id(),
            os: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            runtime_version: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            available_processors: std::thread::available_parallelism().map_or(1, usize::from),
            used_memory_bytes,
            max_memory_bytes,
            thread_count,
            session_count,
            system_load_average,
            started_at: Some(self.started_at),
        }
    }
}

impl Introspection for SystemIntrospection {
    fn heap_histogram(&self) -> Result<HeapHistogram, ContractError> {
        let smaps = fs::read_to_string("/proc/self/smaps")
            .map_err(|e| ContractError::introspection("heap histogram", e.to_string()))?;
        Ok(parse_smaps(&smaps, Utc::now()))
    }

    fn processes(&self) -> Result<Vec<ProcessInformations>, ContractError> {
        let output = Command::new("ps")
            .args(["-eo", PS_COLUMNS])
            .output()
            .map_err(|e| ContractError::introspection("processes", e.to_string()))?;
        if !output.status.success() {
            return Err(ContractError::introspection(
                "processes",
                format!("ps exited with {}", output.status),
            ));
        }
        let processes = parse_ps(&String::from_utf8_lossy(&output.stdout));
        debug!(count = processes.len(), "Process list collected");
        Ok(processes)
    }

    fn threads(&self) -> Vec<ThreadInformations> {
        self.requests.active()
    }
}

fn host_name() -> String {
    fs::read_to_string("/proc/sys/kernel/hostname")
        .or_else(|_| fs::read_to_string("/etc/hostname"))
        .map(|name| name.trim().to_string())
        .ok()
        .filter(|name| !name.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Parse `ps -eo user,pid,%cpu,%mem,vsz,rss,stat,args` output (header skipped)
pub fn parse_ps(output: &str) -> Vec<ProcessInformations> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let user = fields.next()?.to_string();
            let pid = fields.next()?.parse().ok()?;
            let cpu_percent = fields.next()?.parse().ok()?;
            let memory_percent = fields.next()?.parse().ok()?;
            let virtual_size_kb = fields.next()?.parse().ok()?;
            let resident_size_kb = fields.next()?.parse().ok()?;
            let state = fields.next()?.to_string();
            let command = fields.collect::<Vec<_>>().join(" ");
            Some(ProcessInformations {
                user,
                pid,
                cpu_percent,
                memory_percent,
                virtual_size_kb,
                resident_size_kb,
                state,
                command,
            })
        })
        .collect()
}

/// Group `/proc/<pid>/smaps` mappings by kind, weighted by resident size
pub fn parse_smaps(smaps: &str, taken_at: DateTime<Utc>) -> HeapHistogram {
    let mut groups: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in smaps.lines() {
        let mut fields = line.split_whitespace();
        let Some(first) = fields.next() else {
            continue;
        };
        if let Some(kb) = line.strip_prefix("Rss:") {
            let kb: u64 = kb.trim().trim_end_matches("kB").trim().parse().unwrap_or(0);
            if let Some(kind) = &current {
                groups.entry(kind.clone()).or_default().1 += kb * 1024;
            }
        } else if first.contains('-') && first.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
            // mapping header: address perms offset dev inode [pathname]
            let kind = fields
                .nth(4)
                .map_or_else(|| "[anonymous]".to_string(), str::to_string);
            groups.entry(kind.clone()).or_default().0 += 1;
            current = Some(kind);
        }
    }

    let classes = groups
        .into_iter()
        .map(|(name, (instances, bytes))| ClassHistogram {
            name,
            instances,
            bytes,
        })
        .collect();
    HeapHistogram::new(taken_at, classes)
}

fn parse_statm_resident(statm: &str) -> Option<u64> {
    let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(pages * PAGE_SIZE)
}

fn parse_meminfo_total(meminfo: &str) -> Option<u64> {
    let line = meminfo.lines().find(|l| l.starts_with("MemTotal:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

fn parse_loadavg(loadavg: &str) -> Option<f64> {
    loadavg.split_whitespace().next()?.parse().ok()
}

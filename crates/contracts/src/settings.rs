//! MonitoringConfig - Config Loader output
//!
//! Describes one console deployment: application identity, collection mode,
//! security policy, dispatcher tuning, hosting roots and the HTTP binding.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete console configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    #[validate(nested)]
    pub application: ApplicationConfig,

    #[serde(default)]
    #[validate(nested)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    #[validate(nested)]
    pub dispatcher: DispatcherSettings,

    #[serde(default)]
    pub hosting: HostingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Monitored application identity
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplicationConfig {
    /// Application name (report titles, PDF file name)
    #[validate(length(min = 1, message = "application name cannot be empty"))]
    pub name: String,
}

/// Whether this instance collects live data or aggregates remote agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorMode {
    #[default]
    Local,
    CollectorServer,
}

/// Collection engine settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CollectorConfig {
    #[serde(default)]
    pub mode: CollectorMode,

    /// Interval of the periodic collection pass (seconds)
    #[serde(default = "default_collect_interval")]
    #[validate(range(min = 1, message = "collect_interval_secs must be > 0"))]
    pub collect_interval_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            mode: CollectorMode::default(),
            collect_interval_secs: default_collect_interval(),
        }
    }
}

fn default_collect_interval() -> u64 {
    60
}

/// Privileged action policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Allow system actions and privileged views (sessions, heap, processes)
    #[serde(default)]
    pub system_actions_enabled: bool,
}

/// Dispatcher tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DispatcherSettings {
    /// Upper bound for requested graph width and height (pixels)
    #[serde(default = "default_max_graph_dimension")]
    #[validate(range(min = 1, message = "max_graph_dimension must be > 0"))]
    pub max_graph_dimension: u32,

    /// Chunk size of the gzip adapter (bytes)
    #[serde(default = "default_compression_buffer_size")]
    #[validate(range(min = 1, message = "compression_buffer_size must be > 0"))]
    pub compression_buffer_size: usize,

    /// Browser cache lifetime of bundled resources (seconds)
    #[serde(default = "default_resource_max_age")]
    pub resource_max_age_secs: u64,

    /// Prefix under which bundled resources are resolved
    #[serde(default = "default_resource_root")]
    pub resource_root: String,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            max_graph_dimension: default_max_graph_dimension(),
            compression_buffer_size: default_compression_buffer_size(),
            resource_max_age_secs: default_resource_max_age(),
            resource_root: default_resource_root(),
        }
    }
}

fn default_max_graph_dimension() -> u32 {
    1600
}

fn default_compression_buffer_size() -> usize {
    4096
}

fn default_resource_max_age() -> u64 {
    3600
}

fn default_resource_root() -> String {
    "/monitoring/resource/".to_string()
}

/// Filesystem roots of the standalone hosting environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostingConfig {
    /// Directory holding bundled resources
    #[serde(default = "default_resources_dir")]
    pub resources_dir: PathBuf,

    /// Root of the deployment metadata tree (`WEB-INF/`, `META-INF/`)
    #[serde(default = "default_deployment_dir")]
    pub deployment_dir: PathBuf,
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            resources_dir: default_resources_dir(),
            deployment_dir: default_deployment_dir(),
        }
    }
}

fn default_resources_dir() -> PathBuf {
    PathBuf::from("./resources")
}

fn default_deployment_dir() -> PathBuf {
    PathBuf::from("./webapp")
}

/// Storage of reports written outside a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub directory: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: default_storage_dir(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./melody-data")
}

/// HTTP binding of the console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Path of the monitoring endpoint
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_path() -> String {
    "/monitoring".to_string()
}

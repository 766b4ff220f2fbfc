//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式)
//! - Prometheus 指标导出
//! - 请求分发指标收集与耗时统计
//!
//! ## 使用示例
//!
//! ```ignore
//! observability::init()?;
//!
//! observability::record_dispatch("html");
//! ```

pub mod metrics;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_action, record_collector_stop, record_dispatch, record_dispatch_failure,
    record_dispatch_latency_ms, record_graph_rendered, record_introspection_failure,
    MetricsSummary, RequestStatsAggregator, RunningStats, StatsSummary,
};

/// 初始化可观测性（仅 Tracing，JSON 格式，支持 RUST_LOG 环境变量）
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// Prometheus 监听地址 (None = 禁用)
    pub metrics_listen: Option<SocketAddr>,
    /// 默认日志级别 (RUST_LOG 未设置时使用)
    pub default_log_level: String,
    /// 忽略 RUST_LOG，强制使用默认级别
    pub force_level: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_listen: None,
            default_log_level: "info".to_string(),
            force_level: false,
        }
    }
}

impl ObservabilityConfig {
    /// 由命令行参数推导：`-q` 只输出 warn，`-v` debug，`-vv` trace
    pub fn from_verbosity(log_format: LogFormat, verbose: u8, quiet: bool) -> Self {
        let (level, force_level) = match (quiet, verbose) {
            (true, _) => ("warn", true),
            (false, 0) => ("info", false),
            (false, 1) => ("debug", false),
            (false, _) => ("trace", false),
        };
        Self {
            log_format,
            metrics_listen: None,
            default_log_level: level.to_string(),
            force_level,
        }
    }

    /// 启用 Prometheus 导出
    pub fn with_metrics(mut self, listen: Option<SocketAddr>) -> Self {
        self.metrics_listen = listen;
        self
    }

    fn filter(&self) -> EnvFilter {
        if self.force_level {
            return EnvFilter::new(&self.default_log_level);
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_log_level))
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 使用自定义配置初始化
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    // 1. Initialize Tracing
    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    // 2. Initialize Prometheus Exporter (if enabled)
    if let Some(listen) = config.metrics_listen {
        PrometheusBuilder::new()
            .with_http_listener(listen)
            .install()
            .context("Failed to install Prometheus recorder")?;

        tracing::info!(%listen, "Prometheus metrics endpoint initialized");
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_listen = ?config.metrics_listen,
        "Observability initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_listen, None);
        assert_eq!(config.default_log_level, "info");
        assert!(!config.force_level);
    }

    #[test]
    fn test_from_verbosity() {
        let quiet = ObservabilityConfig::from_verbosity(LogFormat::Compact, 0, true);
        assert_eq!(quiet.default_log_level, "warn");
        assert!(quiet.force_level);

        let debug = ObservabilityConfig::from_verbosity(LogFormat::Pretty, 1, false);
        assert_eq!(debug.default_log_level, "debug");
        assert_eq!(debug.log_format, LogFormat::Pretty);

        let trace = ObservabilityConfig::from_verbosity(LogFormat::Json, 3, false);
        assert_eq!(trace.default_log_level, "trace");
    }
}

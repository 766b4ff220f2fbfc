//! 监控控制台指标收集模块
//!
//! 记录请求分发、系统操作、内省失败等事件，并在内存中聚合请求耗时。

use std::collections::BTreeMap;

use metrics::{counter, gauge, histogram};

/// 记录一次请求分发 (按输出路径)
pub fn record_dispatch(route: &str) {
    counter!(
        "melody_console_dispatch_total",
        "route" => route.to_string()
    )
    .increment(1);
}

/// 记录一次失败的请求 (按错误类型)
pub fn record_dispatch_failure(kind: &str) {
    counter!(
        "melody_console_dispatch_failures_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// 记录请求耗时
pub fn record_dispatch_latency_ms(route: &str, latency_ms: f64) {
    histogram!(
        "melody_console_dispatch_latency_ms",
        "route" => route.to_string()
    )
    .record(latency_ms);
}

/// 记录已执行的系统操作
pub fn record_action(action: &str) {
    counter!(
        "melody_console_actions_total",
        "action" => action.to_string()
    )
    .increment(1);
}

/// 记录内省失败 (堆直方图、进程列表)
pub fn record_introspection_failure(what: &str) {
    counter!(
        "melody_console_introspection_failures_total",
        "what" => what.to_string()
    )
    .increment(1);
}

/// 记录收集服务器触发的采集停止
pub fn record_collector_stop() {
    counter!("melody_console_collector_stops_total").increment(1);
}

/// 记录生成的图表大小
pub fn record_graph_rendered(bytes: usize) {
    counter!("melody_console_graphs_total").increment(1);
    gauge!("melody_console_last_graph_bytes").set(bytes as f64);
}

/// 请求耗时聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RequestStatsAggregator {
    /// 总请求数
    pub total_requests: u64,

    /// 失败请求数
    pub failed_requests: u64,

    /// 全部请求耗时统计
    pub latency_stats: RunningStats,

    /// 各输出路径耗时统计
    pub route_stats: BTreeMap<String, RunningStats>,
}

impl RequestStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, route: &str, latency_ms: f64, success: bool) {
        self.total_requests += 1;
        if !success {
            self.failed_requests += 1;
        }
        self.latency_stats.push(latency_ms);
        self.route_stats
            .entry(route.to_string())
            .or_default()
            .push(latency_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_requests: self.total_requests,
            failed_requests: self.failed_requests,
            failure_rate: if self.total_requests > 0 {
                self.failed_requests as f64 / self.total_requests as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            route_latency_ms: self
                .route_stats
                .iter()
                .map(|(route, stats)| (route.clone(), StatsSummary::from(stats)))
                .collect(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub failure_rate: f64,
    pub latency_ms: StatsSummary,
    pub route_latency_ms: BTreeMap<String, StatsSummary>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Console Request Summary ===")?;
        writeln!(f, "Total requests: {}", self.total_requests)?;
        writeln!(
            f,
            "Failed requests: {} ({:.2}%)",
            self.failed_requests, self.failure_rate
        )?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;

        if !self.route_latency_ms.is_empty() {
            writeln!(f, "Latency by route (ms):")?;
            for (route, stats) in &self.route_latency_ms {
                writeln!(f, "  {}: {}", route, stats)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

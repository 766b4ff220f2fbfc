//! # Dispatcher
//!
//! Request dispatch for the monitoring console.
//!
//! 负责：
//! - 执行特权操作（系统操作开关保护）
//! - 根据请求参数选择唯一的输出路径 (HTML / PDF / PNG / 描述文件 / 快照)
//! - 压缩、下载文件名编码、locale 作用域

pub mod compression;
pub mod dispatcher;
pub mod disposition;
pub mod error;
pub mod locale;
pub mod metrics;
pub mod paths;
pub mod request;
pub mod response;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use dispatcher::{
    ActionMessage, Collaborators, CollectorSnapshots, DispatcherBuilder, ExecutionMode,
    MonitoringDispatcher, LAST_SHUTDOWN_FILE,
};
pub use disposition::{
    encode_file_name_to_content_disposition, encode_file_name_to_standard_content_disposition,
};
pub use error::DispatcherError;
pub use locale::LocaleScope;
pub use metrics::{DispatchMetrics, DispatchMetricsSnapshot, RouteKind};
pub use paths::{resource_path, HTML_CONTENT_TYPE, PDF_CONTENT_TYPE, PNG_CONTENT_TYPE};
pub use request::{DispatchContext, MonitoringRequest, OutputFormat, OutputMode, Part};
pub use response::{BufferedResponse, MonitoringResponse};
pub use transport::{SnapshotPayload, TransportFormat};

//! HTML and PDF report renderer interfaces

use std::io::Write;

use chrono::Utc;

use crate::{
    Collector, ContractError, DescriptorAvailability, HeapHistogram, Locale, Period,
    ProcessInformations, RuntimeInformations, SessionInformations, ThreadInformations,
};

/// Everything a renderer needs besides the view itself
#[derive(Clone, Copy)]
pub struct ReportContext<'a> {
    pub collector: &'a dyn Collector,
    /// Rendering already-aggregated data pushed by remote agents
    pub collector_server: bool,
    pub runtime: &'a [RuntimeInformations],
    pub period: &'a Period,
    pub locale: &'a Locale,
    pub descriptors: DescriptorAvailability,
}

impl ReportContext<'_> {
    pub fn application(&self) -> &str {
        self.collector.application()
    }
}

/// Sub-view of the HTML console
#[derive(Debug, Clone, Copy)]
pub enum HtmlView<'a> {
    /// Full dashboard
    Dashboard { message: Option<&'a str> },
    /// Requests and graph detail for one metric
    GraphDetail { graph: Option<&'a str> },
    Sessions {
        sessions: &'a [SessionInformations],
        message: Option<&'a str>,
    },
    SessionDetail {
        session_id: &'a str,
        session: Option<&'a SessionInformations>,
    },
    CurrentRequests { threads: &'a [ThreadInformations] },
    HeapHistogram {
        histogram: &'a HeapHistogram,
        message: Option<&'a str>,
    },
    Processes { processes: &'a [ProcessInformations] },
    /// Standalone message, e.g. an introspection failure
    Message { text: &'a str },
}

/// HTML report renderer
pub trait HtmlReportRenderer: Send + Sync {
    /// # Errors
    /// Returns an error if rendering or writing fails
    fn render(
        &self,
        context: &ReportContext<'_>,
        view: HtmlView<'_>,
        out: &mut dyn Write,
    ) -> Result<(), ContractError>;
}

/// PDF report renderer
pub trait PdfReportRenderer: Send + Sync {
    /// Download file name for `application`'s report
    fn file_name(&self, application: &str) -> String {
        format!(
            "Monitoring_{}_{}.pdf",
            application,
            Utc::now().format("%Y_%m_%d")
        )
    }

    /// # Errors
    /// Returns an error if rendering or writing fails
    fn render(&self, context: &ReportContext<'_>, out: &mut dyn Write)
        -> Result<(), ContractError>;
}

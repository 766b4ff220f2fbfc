//! HTML dashboard and part views

use std::io::Write;

use tracing::{debug, instrument};

use contracts::{HtmlView, ReportContext};

use crate::compression::{accepts_gzip, HtmlWriter};
use crate::dispatcher::{MonitoringDispatcher, RenderRequest};
use crate::error::DispatcherError;
use crate::request::Part;
use crate::response::{MonitoringResponse, CONTENT_ENCODING};

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

impl MonitoringDispatcher {
    #[instrument(
        name = "dispatcher_html",
        skip_all,
        fields(part = render.context.part.as_ref().map(Part::token))
    )]
    pub(crate) fn do_compressed_html(
        &self,
        render: &RenderRequest<'_>,
        response: &mut dyn MonitoringResponse,
    ) -> Result<(), DispatcherError> {
        if !matches!(
            render.context.part,
            Some(Part::Sessions | Part::HeapHistogram)
        ) {
            self.collect_if_local();
        }

        response.set_content_type(HTML_CONTENT_TYPE);
        let gzip = accepts_gzip(render.request);
        if gzip {
            response.add_header(CONTENT_ENCODING, "gzip");
        }

        let chunk_size = self.settings.compression_buffer_size;
        let out = response.output();
        let mut writer = if gzip {
            HtmlWriter::gzip(out, chunk_size)
        } else {
            HtmlWriter::plain(out, chunk_size)
        };

        let rendered = self.write_html(render, &mut writer);
        let finished = writer.finish();
        rendered?;
        finished?;
        Ok(())
    }

    fn write_html(
        &self,
        render: &RenderRequest<'_>,
        out: &mut dyn Write,
    ) -> Result<(), DispatcherError> {
        let report = self.report_context(render.runtime, &render.context.period, render.locale);
        let html = self.collaborators.html.as_ref();

        match &render.context.part {
            None => html.render(
                &report,
                HtmlView::Dashboard {
                    message: render.message,
                },
                out,
            )?,
            Some(Part::Graph) => html.render(
                &report,
                HtmlView::GraphDetail {
                    graph: render.context.graph.as_deref(),
                },
                out,
            )?,
            Some(Part::Sessions) => self.write_sessions(render, &report, out)?,
            Some(Part::CurrentRequests) if !self.mode.is_collector_server() => {
                let threads = self.collaborators.introspection.threads();
                html.render(&report, HtmlView::CurrentRequests { threads: &threads }, out)?;
            }
            Some(Part::HeapHistogram) => self.write_heap_histogram(render, &report, out)?,
            Some(Part::Processes) => self.write_processes(&report, out)?,
            Some(other) => debug!(part = other.token(), "No view for part"),
        }
        Ok(())
    }

    fn write_sessions(
        &self,
        render: &RenderRequest<'_>,
        report: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<(), DispatcherError> {
        self.check_system_actions_enabled()?;
        let html = self.collaborators.html.as_ref();

        match render.context.session_id.as_deref() {
            None => {
                let sessions = self.all_sessions();
                html.render(
                    report,
                    HtmlView::Sessions {
                        sessions: &sessions,
                        message: render.message,
                    },
                    out,
                )?;
            }
            Some(session_id) => {
                let session = self.session(session_id);
                html.render(
                    report,
                    HtmlView::SessionDetail {
                        session_id,
                        session: session.as_ref(),
                    },
                    out,
                )?;
            }
        }
        Ok(())
    }

    fn write_heap_histogram(
        &self,
        render: &RenderRequest<'_>,
        report: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<(), DispatcherError> {
        self.check_system_actions_enabled()?;
        let html = self.collaborators.html.as_ref();

        match self.heap_histogram() {
            Ok(histogram) => html.render(
                report,
                HtmlView::HeapHistogram {
                    histogram: &histogram,
                    message: render.message,
                },
                out,
            )?,
            Err(e) => {
                self.record_introspection_failure("heap_histogram", &e);
                let text = e.display_message();
                html.render(report, HtmlView::Message { text: &text }, out)?;
            }
        }
        Ok(())
    }

    fn write_processes(
        &self,
        report: &ReportContext<'_>,
        out: &mut dyn Write,
    ) -> Result<(), DispatcherError> {
        self.check_system_actions_enabled()?;
        let html = self.collaborators.html.as_ref();

        match self.collaborators.introspection.processes() {
            Ok(processes) => html.render(
                report,
                HtmlView::Processes {
                    processes: &processes,
                },
                out,
            )?,
            Err(e) => {
                self.record_introspection_failure("processes", &e);
                let text = e.display_message();
                html.render(report, HtmlView::Message { text: &text }, out)?;
            }
        }
        Ok(())
    }
}

//! PDF report download

use tracing::instrument;

use crate::disposition::encode_file_name_to_content_disposition;
use crate::dispatcher::{MonitoringDispatcher, RenderRequest};
use crate::error::DispatcherError;
use crate::response::{MonitoringResponse, CONTENT_DISPOSITION};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

impl MonitoringDispatcher {
    #[instrument(name = "dispatcher_pdf", skip_all)]
    pub(crate) fn do_pdf(
        &self,
        render: &RenderRequest<'_>,
        response: &mut dyn MonitoringResponse,
    ) -> Result<(), DispatcherError> {
        self.collect_if_local();

        let pdf = self.collaborators.pdf.as_ref();
        let file_name = pdf.file_name(self.collaborators.collector.application());
        response.set_content_type(PDF_CONTENT_TYPE);
        response.add_header(
            CONTENT_DISPOSITION,
            &encode_file_name_to_content_disposition(render.request.user_agent(), &file_name),
        );

        let report = self.report_context(render.runtime, &render.context.period, render.locale);
        let rendered = pdf.render(&report, response.output());
        let flushed = response.output().flush();
        rendered?;
        flushed?;
        Ok(())
    }
}

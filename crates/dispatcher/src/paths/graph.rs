//! Single usage graph as a PNG image

use tracing::{debug, instrument};

use contracts::Period;

use crate::dispatcher::MonitoringDispatcher;
use crate::error::DispatcherError;
use crate::request::{MonitoringRequest, HEIGHT_PARAMETER, WIDTH_PARAMETER};
use crate::response::{MonitoringResponse, CONTENT_DISPOSITION};

pub const PNG_CONTENT_TYPE: &str = "image/png";

impl MonitoringDispatcher {
    #[instrument(name = "dispatcher_graph", skip(self, request, response, period))]
    pub(crate) fn do_graph(
        &self,
        request: &MonitoringRequest,
        response: &mut dyn MonitoringResponse,
        period: &Period,
        graph_name: &str,
    ) -> Result<(), DispatcherError> {
        let width = self.dimension(request, WIDTH_PARAMETER)?;
        let height = self.dimension(request, HEIGHT_PARAMETER)?;

        let Some(image) = self
            .collaborators
            .graphs
            .graph(graph_name, period, width, height)?
        else {
            debug!(graph = graph_name, "Unknown graph, nothing written");
            return Ok(());
        };

        response.set_content_type(PNG_CONTENT_TYPE);
        response.set_content_length(image.len() as u64);
        response.add_header(
            CONTENT_DISPOSITION,
            &format!("inline;filename={graph_name}.png"),
        );
        response.output().write_all(&image)?;
        response.flush_buffer()?;
        observability::record_graph_rendered(image.len());
        Ok(())
    }

    /// Pixel size from `parameter`, clamped to the configured maximum
    fn dimension(
        &self,
        request: &MonitoringRequest,
        parameter: &'static str,
    ) -> Result<u32, DispatcherError> {
        let value = request.parameter(parameter).unwrap_or_default();
        value
            .trim()
            .parse::<u32>()
            .map(|pixels| pixels.min(self.settings.max_graph_dimension))
            .map_err(|_| DispatcherError::InvalidDimension {
                parameter,
                value: value.to_string(),
            })
    }
}

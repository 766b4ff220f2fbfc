//! Machine-readable snapshots pulled by a collector server

use tracing::{info, instrument};

use crate::dispatcher::{MonitoringDispatcher, RenderRequest};
use crate::error::DispatcherError;
use crate::request::Part;
use crate::response::MonitoringResponse;
use crate::transport::{SnapshotPayload, TransportFormat};

impl MonitoringDispatcher {
    #[instrument(name = "dispatcher_snapshot", skip(self, render, response))]
    pub(crate) fn do_snapshot(
        &self,
        render: &RenderRequest<'_>,
        response: &mut dyn MonitoringResponse,
        format: TransportFormat,
    ) -> Result<(), DispatcherError> {
        let payload = self.create_payload(render)?;

        response.set_content_type(format.mime_type());
        format.write_to(&payload, response.output())?;
        response.output().flush()?;

        if render.context.stop_collector {
            // reset so the next pull only carries the delta
            self.collaborators.collector.stop();
            observability::record_collector_stop();
            info!("Collector stopped on collector server request");
        }
        Ok(())
    }

    fn create_payload(&self, render: &RenderRequest<'_>) -> Result<SnapshotPayload, DispatcherError> {
        let payload = match &render.context.part {
            Some(Part::HeapHistogram) => {
                self.check_system_actions_enabled()?;
                match self.heap_histogram() {
                    Ok(histogram) => SnapshotPayload::HeapHistogram(histogram),
                    Err(e) => {
                        self.record_introspection_failure("heap_histogram", &e);
                        SnapshotPayload::Failure {
                            message: e.display_message(),
                        }
                    }
                }
            }
            Some(Part::Sessions) => {
                self.check_system_actions_enabled()?;
                match render.context.session_id.as_deref() {
                    None => SnapshotPayload::Sessions(self.all_sessions()),
                    Some(id) => SnapshotPayload::Session(self.session(id)),
                }
            }
            Some(Part::Processes) => {
                self.check_system_actions_enabled()?;
                match self.collaborators.introspection.processes() {
                    Ok(processes) => SnapshotPayload::Processes(processes),
                    Err(e) => {
                        self.record_introspection_failure("processes", &e);
                        SnapshotPayload::Failure {
                            message: e.display_message(),
                        }
                    }
                }
            }
            _ => SnapshotPayload::Monitoring {
                // deep copies taken under each counter's lock
                counters: self
                    .collaborators
                    .collector
                    .counters()
                    .iter()
                    .map(|counter| counter.snapshot())
                    .collect(),
                runtime: render.runtime.to_vec(),
            },
        };
        Ok(payload)
    }
}

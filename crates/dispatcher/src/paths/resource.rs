//! Bundled resources and deployment descriptors, streamed as-is

use std::io;

use tracing::{debug, instrument};

use contracts::{HostingEnvironment, ResourceStream};

use crate::dispatcher::MonitoringDispatcher;
use crate::error::DispatcherError;
use crate::request::DescriptorKind;
use crate::response::{MonitoringResponse, CACHE_CONTROL, CONTENT_DISPOSITION};

pub const DEPLOYMENT_DESCRIPTOR_PATH: &str = "/WEB-INF/web.xml";
pub const BUILD_METADATA_DIR: &str = "/META-INF/maven/";

/// Resolve a client-supplied resource name under `root`
///
/// Every `..` is removed first, so the result never leaves `root`.
pub fn resource_path(root: &str, resource: &str) -> String {
    let cleaned = resource.replace("..", "");
    format!("{root}{}", cleaned.trim_start_matches('/'))
}

/// Open a descriptor from the deployment tree; `Ok(None)` when absent
///
/// The build descriptor lives two directory levels below
/// [`BUILD_METADATA_DIR`] (group, then artifact); the first entry is taken
/// at each level.
pub(crate) fn open_descriptor(
    hosting: &dyn HostingEnvironment,
    kind: DescriptorKind,
) -> io::Result<Option<ResourceStream>> {
    match kind {
        DescriptorKind::Deployment => hosting.deployment_resource(DEPLOYMENT_DESCRIPTOR_PATH),
        DescriptorKind::Build => {
            let first_child = |dir: &str| {
                hosting
                    .deployment_paths(dir)
                    .and_then(|paths| paths.into_iter().next())
            };
            let Some(group_dir) = first_child(BUILD_METADATA_DIR) else {
                return Ok(None);
            };
            let Some(artifact_dir) = first_child(&group_dir) else {
                return Ok(None);
            };
            hosting.deployment_resource(&format!("{artifact_dir}{}", kind.file_name()))
        }
    }
}

impl MonitoringDispatcher {
    #[instrument(name = "dispatcher_resource", skip(self, response))]
    pub(crate) fn do_resource(
        &self,
        response: &mut dyn MonitoringResponse,
        resource: &str,
    ) -> Result<(), DispatcherError> {
        response.add_header(
            CACHE_CONTROL,
            &format!("max-age={}", self.settings.resource_max_age_secs),
        );
        let hosting = self.collaborators.hosting.as_ref();
        let path = resource_path(&self.settings.resource_root, resource);
        if let Some(mime) = hosting.mime_type(&path) {
            response.set_content_type(&mime);
        }

        match hosting.bundled_resource(&path)? {
            Some(mut stream) => {
                io::copy(&mut stream, response.output())?;
            }
            None => debug!(path = %path, "Resource not found"),
        }
        Ok(())
    }

    #[instrument(name = "dispatcher_descriptor", skip(self, response))]
    pub(crate) fn do_descriptor(
        &self,
        response: &mut dyn MonitoringResponse,
        kind: DescriptorKind,
    ) -> Result<(), DispatcherError> {
        self.check_system_actions_enabled()?;

        let hosting = self.collaborators.hosting.as_ref();
        if let Some(mime) = hosting.mime_type(DEPLOYMENT_DESCRIPTOR_PATH) {
            response.set_content_type(&mime);
        }
        response.add_header(
            CONTENT_DISPOSITION,
            &format!("inline;filename={}", kind.file_name()),
        );

        match open_descriptor(hosting, kind)? {
            Some(mut stream) => {
                io::copy(&mut stream, response.output())?;
            }
            None => debug!(descriptor = kind.file_name(), "Descriptor not found"),
        }
        Ok(())
    }
}

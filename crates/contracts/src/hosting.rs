//! Hosting environment - bundled resources, deployment tree, MIME mapping

use std::io::{self, Read};

/// Readable stream handed out by the hosting environment
pub type ResourceStream = Box<dyn Read + Send>;

/// Static resource and descriptor lookup provided by the host
pub trait HostingEnvironment: Send + Sync {
    /// Open a resource bundled with the console (css, js, images)
    ///
    /// `Ok(None)` when the resource does not exist.
    ///
    /// # Errors
    /// Returns an error if the resource exists but cannot be opened
    fn bundled_resource(&self, path: &str) -> io::Result<Option<ResourceStream>>;

    /// Open a file of the deployment metadata tree (`/WEB-INF/web.xml`, ...)
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be opened
    fn deployment_resource(&self, path: &str) -> io::Result<Option<ResourceStream>>;

    /// Direct children of a deployment directory as absolute paths, sorted
    ///
    /// Sub-directories end with `/`. `None` when the directory is absent.
    fn deployment_paths(&self, dir: &str) -> Option<Vec<String>>;

    /// MIME type registered for `path`'s extension
    fn mime_type(&self, path: &str) -> Option<String>;
}

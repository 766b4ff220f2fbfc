//! Output paths
//!
//! One module per branch of the router: HTML, PDF, graph image, bundled
//! resources and descriptors, serialized snapshots.

mod graph;
mod html;
mod pdf;
pub(crate) mod resource;
mod snapshot;

pub use self::graph::PNG_CONTENT_TYPE;
pub use self::html::HTML_CONTENT_TYPE;
pub use self::pdf::PDF_CONTENT_TYPE;
pub use self::resource::{resource_path, BUILD_METADATA_DIR, DEPLOYMENT_DESCRIPTOR_PATH};

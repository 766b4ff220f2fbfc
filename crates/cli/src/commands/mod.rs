//! Command implementations.

mod info;
mod render;
mod serve;
mod validate;

use std::path::Path;

use contracts::MonitoringConfig;

use crate::error::{CliError, Result};

pub use info::run_info;
pub use render::run_render;
pub use serve::run_serve;
pub use validate::run_validate;

/// Load and validate the configuration at `path`
pub(crate) fn load_config(path: &Path) -> Result<MonitoringConfig> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }
    Ok(config_loader::ConfigLoader::load_from_path(path)?)
}

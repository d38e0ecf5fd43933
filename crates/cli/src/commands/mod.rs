//! Command implementations.

mod classify;
mod dispatch;
mod validate;

pub use classify::run_classify;
pub use dispatch::run_dispatch;
pub use validate::run_validate;

use anyhow::{Context, Result};
use contracts::{DispatcherConfig, OutputMode};
use std::path::Path;

use crate::error::CliError;

/// Load the dispatcher config (defaults when no path) and apply CLI overrides
pub(crate) fn load_config(
    path: Option<&Path>,
    mode: Option<OutputMode>,
) -> Result<DispatcherConfig> {
    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                observability::record_config_error("not_found");
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .inspect_err(|e| {
                    observability::record_config_error(if e.is_io() { "io" } else { "invalid" })
                })
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => DispatcherConfig::default(),
    };

    if let Some(mode) = mode {
        tracing::info!(mode = %mode, "Overriding output mode from CLI");
        config.output_mode = mode;
    }

    Ok(config)
}

//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::DispatcherConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    output_mode: String,
    output_step_name: String,
    download_requested: bool,
    pretty_json: bool,
    mime_override_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        observability::record_config_error("not_found");
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    output_mode: config.output_mode.to_string(),
                    output_step_name: config.output_step_name.clone(),
                    download_requested: config.download_requested,
                    pretty_json: config.pretty_json,
                    mime_override_count: config.mime_overrides.len(),
                }),
            }
        }
        Err(e) => {
            observability::record_config_error("invalid");
            ValidationResult {
                valid: false,
                config_path,
                error: Some(e.to_string()),
                warnings: None,
                summary: None,
            }
        }
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &DispatcherConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.output_mode.needs_rows()
        && config.output_step_name != contracts::DEFAULT_OUTPUT_STEP_NAME
    {
        warnings.push(format!(
            "output_step_name '{}' has no effect in mode {}",
            config.output_step_name, config.output_mode
        ));
    }

    if config.pretty_json && config.output_mode == contracts::OutputMode::ResultFiles {
        warnings.push("pretty_json has no effect when streaming produced files".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Output mode: {}", summary.output_mode);
            println!("  Output step: {}", summary.output_step_name);
            println!("  Download: {}", summary.download_requested);
            println!("  Pretty JSON: {}", summary.pretty_json);
            println!("  MIME overrides: {}", summary.mime_override_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{CollectorMode, MonitoringConfig};

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
    version: String,
    application: String,
    mode: String,
    listen: String,
    path: String,
    system_actions_enabled: bool,
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

    match super::load_config(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    application: config.application.name.clone(),
                    mode: format!("{:?}", config.collector.mode),
                    listen: config.server.listen.to_string(),
                    path: config.server.path.clone(),
                    system_actions_enabled: config.security.system_actions_enabled,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &MonitoringConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.security.system_actions_enabled && !config.server.listen.ip().is_loopback() {
        warnings.push(format!(
            "System actions are enabled on non-loopback address {}",
            config.server.listen
        ));
    }
    if !config.hosting.resources_dir.is_dir() {
        warnings.push(format!(
            "hosting.resources_dir {} does not exist - built-in stylesheet only",
            config.hosting.resources_dir.display()
        ));
    }
    if !config.hosting.deployment_dir.is_dir() {
        warnings.push(format!(
            "hosting.deployment_dir {} does not exist - descriptors unavailable",
            config.hosting.deployment_dir.display()
        ));
    }
    if config.collector.mode == CollectorMode::CollectorServer {
        warnings.push(
            "collector_server mode renders pushed data only - no local collection".to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Application: {}", summary.application);
            println!("  Mode: {}", summary.mode);
            println!("  Endpoint: http://{}{}", summary.listen, summary.path);
            println!("  System actions: {}", summary.system_actions_enabled);
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_resource_root_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("melody.toml");
        fs::write(
            &path,
            "[application]\nname = \"shop\"\n\n[dispatcher]\nresource_root = \"static\"\n",
        )
        .unwrap();

        let result = validate_config(&ValidateArgs {
            config: path,
            json: true,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("resource_root"));
    }

    #[test]
    fn test_public_system_actions_warn() {
        let mut config: MonitoringConfig =
            serde_json::from_str(r#"{ "application": { "name": "shop" } }"#).unwrap();
        config.security.system_actions_enabled = true;
        config.server.listen = "0.0.0.0:8080".parse().unwrap();

        let warnings = collect_warnings(&config);
        assert!(warnings.iter().any(|w| w.contains("non-loopback")));
    }
}

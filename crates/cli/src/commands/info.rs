//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::MonitoringConfig;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    application: String,
    collector: CollectorInfo,
    dispatcher: DispatcherInfo,
    hosting: HostingInfo,
    server: ServerInfo,
}

#[derive(Serialize)]
struct CollectorInfo {
    mode: String,
    collect_interval_secs: u64,
}

#[derive(Serialize)]
struct DispatcherInfo {
    system_actions_enabled: bool,
    max_graph_dimension: u32,
    compression_buffer_size: usize,
    resource_max_age_secs: u64,
    resource_root: String,
}

#[derive(Serialize)]
struct HostingInfo {
    resources_dir: String,
    deployment_dir: String,
    storage_dir: String,
}

#[derive(Serialize)]
struct ServerInfo {
    listen: String,
    path: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = super::load_config(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&build_config_info(&config))
            .context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config);
    }

    Ok(())
}

fn build_config_info(config: &MonitoringConfig) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", config.version),
        application: config.application.name.clone(),
        collector: CollectorInfo {
            mode: format!("{:?}", config.collector.mode),
            collect_interval_secs: config.collector.collect_interval_secs,
        },
        dispatcher: DispatcherInfo {
            system_actions_enabled: config.security.system_actions_enabled,
            max_graph_dimension: config.dispatcher.max_graph_dimension,
            compression_buffer_size: config.dispatcher.compression_buffer_size,
            resource_max_age_secs: config.dispatcher.resource_max_age_secs,
            resource_root: config.dispatcher.resource_root.clone(),
        },
        hosting: HostingInfo {
            resources_dir: config.hosting.resources_dir.display().to_string(),
            deployment_dir: config.hosting.deployment_dir.display().to_string(),
            storage_dir: config.storage.directory.display().to_string(),
        },
        server: ServerInfo {
            listen: config.server.listen.to_string(),
            path: config.server.path.clone(),
        },
    }
}

fn print_config_info(config: &MonitoringConfig) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Melody Console Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📍 Application");
    println!("   ├─ Version: {:?}", config.version);
    println!("   └─ Name: {}", config.application.name);

    println!("\n📊 Collector");
    println!("   ├─ Mode: {:?}", config.collector.mode);
    println!("   └─ Interval: {}s", config.collector.collect_interval_secs);

    let dispatcher = &config.dispatcher;
    println!("\n⚙️  Dispatcher");
    println!(
        "   ├─ System actions: {}",
        if config.security.system_actions_enabled { "enabled" } else { "disabled" }
    );
    println!("   ├─ Max graph dimension: {}px", dispatcher.max_graph_dimension);
    println!("   ├─ Compression buffer: {} bytes", dispatcher.compression_buffer_size);
    println!("   ├─ Resource max-age: {}s", dispatcher.resource_max_age_secs);
    println!("   └─ Resource root: {}", dispatcher.resource_root);

    println!("\n📁 Hosting");
    println!("   ├─ Resources: {}", config.hosting.resources_dir.display());
    println!("   ├─ Deployment: {}", config.hosting.deployment_dir.display());
    println!("   └─ Storage: {}", config.storage.directory.display());

    println!("\n🌐 Server");
    println!("   └─ http://{}{}", config.server.listen, config.server.path);

    println!();
}

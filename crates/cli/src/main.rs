//! # Melody Console CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - HTTP 监控控制台 (serve) 与离线渲染 (render)
//! - 优雅关闭处理与最后一次关闭报告

mod cli;
mod commands;
mod error;
mod server;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_render, run_serve, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let metrics_listen = match &cli.command {
        Commands::Serve(args) => args.metrics_listen,
        _ => None,
    };
    observability::init_with_config(
        observability::ObservabilityConfig::from_verbosity(
            cli.log_format.into(),
            cli.verbose,
            cli.quiet,
        )
        .with_metrics(metrics_listen),
    )?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Melody console starting"
    );

    // Execute command
    let result = match &cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Render(args) => run_render(args),
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

//! `render` command implementation.

use std::fs;
use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;

use contracts::Locale;
use dispatcher::{BufferedResponse, MonitoringRequest};
use standalone::Standalone;

use crate::cli::RenderArgs;
use crate::error::CliError;

/// Execute the `render` command
pub fn run_render(args: &RenderArgs) -> Result<()> {
    let config = super::load_config(&args.config)?;
    let standalone = Standalone::from_config(&config).context("Failed to assemble console")?;

    let request = build_request(args);
    let runtime = if request.needs_runtime_informations() {
        standalone.runtime_informations()
    } else {
        Vec::new()
    };

    let mut response = BufferedResponse::new();
    standalone
        .dispatcher
        .dispatch(&request, &mut response, &runtime)
        .map_err(CliError::from)?;

    if args.headers {
        for (name, value) in response.all_headers() {
            eprintln!("{name}: {value}");
        }
    }

    let body = response.into_body();
    match &args.output {
        Some(path) => {
            fs::write(path, &body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = body.len(), "Response written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&body)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn build_request(args: &RenderArgs) -> MonitoringRequest {
    let mut request = MonitoringRequest::from_query(args.query.trim_start_matches('?'));
    if let Some(locale) = &args.locale {
        request = request.with_locale(Locale::new(locale.as_str()));
    }
    if args.gzip {
        request = request.with_header("Accept-Encoding", "gzip");
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args(query: &str) -> RenderArgs {
        RenderArgs {
            config: PathBuf::from("melody.toml"),
            query: query.to_string(),
            locale: Some("fr".to_string()),
            gzip: true,
            output: None,
            headers: false,
        }
    }

    #[test]
    fn test_build_request() {
        let request = build_request(&args("?format=pdf&period=week"));
        assert_eq!(request.parameter("format"), Some("pdf"));
        assert_eq!(request.locale().tag(), "fr");
        assert_eq!(request.header("accept-encoding"), Some("gzip"));
    }

    #[test]
    fn test_render_pdf_to_file() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("melody.toml");
        fs::write(
            &config,
            format!(
                "[application]\nname = \"shop\"\n\n[hosting]\nresources_dir = \"{0}/resources\"\ndeployment_dir = \"{0}/webapp\"\n",
                dir.path().display()
            ),
        )
        .unwrap();
        let output = dir.path().join("report.pdf");

        run_render(&RenderArgs {
            config,
            query: "format=pdf".to_string(),
            locale: None,
            gzip: false,
            output: Some(output.clone()),
            headers: false,
        })
        .unwrap();

        assert!(fs::read(output).unwrap().starts_with(b"%PDF-1.4"));
    }

    #[test]
    fn test_missing_config() {
        let err = run_render(&RenderArgs {
            config: PathBuf::from("/nonexistent/melody.toml"),
            ..args("")
        })
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}

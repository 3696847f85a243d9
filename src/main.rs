//! genspec
//!
//! Generates the OpenAPI specification for the TFJob custom resource and
//! writes it to a file.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use genspec::generator::{render_swagger_json, LocalConfigGuard};
use genspec::server::APISERVER_LOCAL_CONFIG_PATH;

#[derive(Debug, Parser)]
#[command(name = "genspec", version, about = "Generate OpenAPI specification for TFJob")]
struct Cli {
    /// Path to write OpenAPI spec file
    #[arg(long, env = "GENSPEC_OUTPUT", default_value = "swagger.json")]
    output: PathBuf,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.log_json);

    match generate_swagger(&cli.output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing subscriber
fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,genspec=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .init();
    }
}

/// Render the spec and write it to `output`.
///
/// The local config directory is removed before this returns, whether or
/// not generation succeeded.
fn generate_swagger(output: &Path) -> anyhow::Result<()> {
    let guard = LocalConfigGuard::new(APISERVER_LOCAL_CONFIG_PATH);

    let api_spec = render_swagger_json(guard.path()).context("Failed to generate spec")?;

    fs::write(output, api_spec)
        .with_context(|| format!("Failed to write spec to {}", output.display()))?;
    info!("Write swagger to {} successful", output.display());

    Ok(())
}

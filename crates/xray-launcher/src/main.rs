//! `xray-launcher` — container entrypoint.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Render the template and write the xray configuration.
//! 4. Replace this process with `xray run -config <path>`.

mod config;
mod launch;
mod render;
mod telemetry;

use std::process::ExitCode;

use common::LaunchError;
use tracing::{debug, error, info};

use config::Config;

/// sysexits `EX_CONFIG`.
const EXIT_CONFIG: u8 = 78;

fn main() -> ExitCode {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Telemetry is not yet up; write to stderr directly.
            eprintln!("ERROR: xray-launcher configuration invalid: {e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    if let Err(e) = telemetry::init(&cfg.log_level) {
        eprintln!("ERROR: {e:#}");
        return ExitCode::FAILURE;
    }
    info!(version = env!("CARGO_PKG_VERSION"), "xray-launcher starting");

    // -----------------------------------------------------------------------
    // 3 + 4. Render, then launch
    // -----------------------------------------------------------------------
    match run(&cfg) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(step = e.step(), error = %e, "xray-launcher failed");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Returns the exit code of the fallback child; unreachable after a successful exec.
fn run(cfg: &Config) -> Result<u8, LaunchError> {
    let rendered = render::render(&cfg.template_path, &cfg.config_path, &cfg.bindings)?;
    debug!(bytes = rendered.contents.len(), "handing off to xray");

    let status = launch::launch(launch::XRAY_BINARY, &rendered.path)?;
    let code = launch::exit_code(status);
    if code != 0 {
        error!(%status, "xray exited with failure");
    }
    Ok(code)
}

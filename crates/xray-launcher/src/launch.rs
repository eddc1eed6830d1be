//! Hand control over to the proxy binary.
//!
//! On Unix the launcher replaces its own process image, so xray keeps the
//! PID, file descriptors, and signal disposition a container runtime expects
//! of PID 1. When replacement fails, or on platforms without it, xray runs as
//! a supervised child with inherited stdio and the launcher waits for it.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use common::LaunchError;
use tracing::{info, warn};

/// Name of the proxy binary looked up on `PATH`.
pub const XRAY_BINARY: &str = "xray";

/// Locate `binary` on the executable search path.
///
/// # Errors
///
/// Returns [`LaunchError::BinaryNotFound`] if no executable of that name exists.
pub fn resolve(binary: &str) -> Result<PathBuf, LaunchError> {
    which::which(binary).map_err(|e| LaunchError::BinaryNotFound {
        name: binary.to_string(),
        reason: e.to_string(),
    })
}

/// Arguments passed to xray after `argv[0]`.
pub fn args(config_path: &Path) -> Vec<std::ffi::OsString> {
    vec!["run".into(), "-config".into(), config_path.as_os_str().to_owned()]
}

/// Run `binary run -config <config_path>`.
///
/// Only returns when the fallback child was used; the value is its exit
/// status. After a successful in-place exec this function never returns.
///
/// # Errors
///
/// - [`LaunchError::BinaryNotFound`] if `binary` is not on `PATH`.
/// - [`LaunchError::Launch`] if the fallback child cannot be spawned.
pub fn launch(binary: &str, config_path: &Path) -> Result<ExitStatus, LaunchError> {
    let path = resolve(binary)?;
    let mut cmd = command(binary, &path, config_path);

    info!(binary = %path.display(), config_path = %config_path.display(), "launching xray");
    replace_process(&mut cmd, &path);

    spawn_and_wait(&mut cmd, path)
}

/// Run `cmd` as a child with inherited stdio and wait for it to exit.
///
/// # Errors
///
/// Returns [`LaunchError::Launch`] naming `path` if the child cannot be spawned.
fn spawn_and_wait(cmd: &mut Command, path: PathBuf) -> Result<ExitStatus, LaunchError> {
    cmd.status().map_err(|source| LaunchError::Launch { path, source })
}

fn command(binary: &str, path: &Path, config_path: &Path) -> Command {
    let mut cmd = Command::new(path);
    cmd.args(args(config_path));
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.arg0(binary);
    }
    #[cfg(not(unix))]
    let _ = binary;
    cmd
}

/// Replace the current process with `cmd`. Returns only if that failed.
#[cfg(unix)]
fn replace_process(cmd: &mut Command, path: &Path) {
    use std::os::unix::process::CommandExt;

    let e = cmd.exec();
    warn!(binary = %path.display(), error = %e, "exec failed, falling back to child process");
}

#[cfg(not(unix))]
fn replace_process(_cmd: &mut Command, path: &Path) {
    warn!(binary = %path.display(), "in-place exec unsupported, running xray as child process");
}

/// Exit code to report for a finished child.
///
/// A child killed by a signal on Unix maps to `128 + signal`, the shell convention.
pub fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return u8::try_from(code).unwrap_or(1);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return u8::try_from(128 + signal).unwrap_or(1);
        }
    }
    1
}

//! Render the template and persist the result for xray.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use common::{Bindings, LaunchError};
use tracing::{debug, info};

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};

#[cfg(unix)]
const DIR_MODE: u32 = 0o755;
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// A configuration file that has been written to disk.
#[derive(Debug, Clone)]
pub struct RenderedConfig {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

/// Read `template_path`, substitute `bindings`, and write the result to `output_path`.
///
/// The output's parent directory is created if needed. An existing file at
/// `output_path` is overwritten.
///
/// # Errors
///
/// - [`LaunchError::TemplateRead`] if the template cannot be read; nothing is written.
///   The template is not required to be UTF-8.
/// - [`LaunchError::DirectoryCreate`] if the parent directory cannot be created.
/// - [`LaunchError::ConfigWrite`] if the file cannot be written.
pub fn render(
    template_path: &Path,
    output_path: &Path,
    bindings: &Bindings,
) -> Result<RenderedConfig, LaunchError> {
    let template = fs::read(template_path).map_err(|source| LaunchError::TemplateRead {
        path: template_path.to_path_buf(),
        source,
    })?;

    let rendered = common::render(&template, bindings);
    debug!(
        substitutions = rendered.substitutions,
        bytes = rendered.bytes.len(),
        "template rendered"
    );
    let contents = rendered.bytes;

    if let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir(dir)?;
    }
    write_file(output_path, &contents)?;

    info!(
        template_path = %template_path.display(),
        config_path = %output_path.display(),
        "configuration written"
    );

    Ok(RenderedConfig {
        path: output_path.to_path_buf(),
        contents,
    })
}

fn create_dir(dir: &Path) -> Result<(), LaunchError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);

    builder.create(dir).map_err(|source| LaunchError::DirectoryCreate {
        path: dir.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), LaunchError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);

    options
        .open(path)
        .and_then(|mut f| f.write_all(contents))
        .map_err(|source| LaunchError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })
}

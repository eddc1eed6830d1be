//! Configuration loading and validation for the launcher.
//!
//! Everything comes from environment variables. Empty values count as unset,
//! so `PROTO=` behaves exactly like an absent `PROTO`.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use common::{Bindings, EnvOverrides};
use serde::Deserialize;

/// Validated launcher configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Template to render (`LAUNCHER_TEMPLATE_PATH`).
    #[serde(rename = "launcher_template_path", default = "default_template_path")]
    pub template_path: PathBuf,

    /// Where the rendered configuration is written (`LAUNCHER_CONFIG_PATH`).
    #[serde(rename = "launcher_config_path", default = "default_config_path")]
    pub config_path: PathBuf,

    /// Tracing log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Resolved placeholder values, filled from [`EnvOverrides`].
    #[serde(skip)]
    pub bindings: Bindings,
}

/// Collect `vars` into a map, dropping entries whose name or value is not UTF-8.
///
/// None of the variables the launcher reads can hold such bytes, and
/// `std::env::vars` would panic on them.
fn snapshot(vars: impl IntoIterator<Item = (OsString, OsString)>) -> config::Map<String, String> {
    vars.into_iter()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

fn default_template_path() -> PathBuf {
    "/config.json.tpl".into()
}
fn default_config_path() -> PathBuf {
    "/etc/xray/config.json".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment cannot be deserialised or fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_source(Some(snapshot(std::env::vars_os())))
    }

    /// Load from an explicit environment snapshot, or the process environment when `None`.
    pub fn from_source(source: Option<config::Map<String, String>>) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .ignore_empty(true)
                    .source(source),
            )
            .build()
            .context("failed to build xray-launcher configuration")?;

        let overrides: EnvOverrides = cfg
            .clone()
            .try_deserialize()
            .context("failed to deserialise placeholder variables")?;

        let mut c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise xray-launcher configuration")?;
        c.bindings = overrides.resolve();

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.template_path.as_os_str().is_empty() {
            anyhow::bail!("LAUNCHER_TEMPLATE_PATH must not be empty");
        }
        if self.config_path.as_os_str().is_empty() {
            anyhow::bail!("LAUNCHER_CONFIG_PATH must not be empty");
        }
        if self.template_path == self.config_path {
            anyhow::bail!(
                "LAUNCHER_CONFIG_PATH must differ from LAUNCHER_TEMPLATE_PATH ({})",
                self.template_path.display()
            );
        }
        Ok(())
    }
}

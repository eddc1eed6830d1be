//! Placeholder table, template rendering, and errors shared across `xray-launcher` crates.

pub mod error;
pub mod template;

pub use error::LaunchError;
pub use template::{render, Bindings, EnvOverrides, Placeholder, Rendered};

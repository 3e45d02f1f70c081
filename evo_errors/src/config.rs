//! Panic hook configuration.
//!
//! The hook installed by [`crate::install_hook`] is configured from the
//! `[panic_hook]` table of a TOML file. Every key is optional.
//!
//! ```toml
//! [panic_hook]
//! show_location = true   # append "created at <file>:<line>"
//! show_causes = true     # render the full cause tree
//! output = "tracing"     # "stderr" (default) or "tracing"
//! level = "error"        # tracing level when output = "tracing"
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use evo_errors::config::{ConfigError, HookConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = HookConfig::load(Path::new("config.toml"))?;
//!     evo_errors::install_hook(config);
//!     Ok(())
//! }
//! ```
//!
//! The file loader itself is internal; only the `[panic_hook]` table is
//! exposed:
//!
//! ```compile_fail
//! use evo_errors::config::ConfigLoader;
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// File unreadable, TOML malformed or an unknown key present.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Verbosity of hook reports routed through `tracing`.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    #[default]
    Error,
}

/// Where the panic hook writes its report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HookOutput {
    /// Write to standard error, like the default Rust hook.
    #[default]
    Stderr,
    /// Emit a `tracing` event at [`HookConfig::level`].
    Tracing,
}

/// Rendering options for [`crate::install_hook`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HookConfig {
    /// Append the location the error was constructed at.
    pub show_location: bool,
    /// Render every cause (`{:#}`) instead of the top message only.
    pub show_causes: bool,
    /// Report destination.
    pub output: HookOutput,
    /// Event level when `output` is [`HookOutput::Tracing`].
    pub level: LogLevel,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            show_location: true,
            show_causes: true,
            output: HookOutput::Stderr,
            level: LogLevel::Error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HookDocument {
    #[serde(default)]
    panic_hook: HookConfig,
}

impl HookConfig {
    /// Load the `[panic_hook]` table from a TOML file.
    ///
    /// A file without the table yields [`HookConfig::default`]; other tables
    /// in the file are ignored so the section can live in a shared config.
    ///
    /// # Errors
    ///
    /// - `ConfigError::FileNotFound` if the file does not exist
    /// - `ConfigError::ParseError` if it cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        HookDocument::load(path).map(|doc| doc.panic_hook)
    }

    /// Parse the `[panic_hook]` table from an in-memory TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str::<HookDocument>(content)
            .map(|doc| doc.panic_hook)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Loads a whole TOML file into `Self`.
///
/// Only the document type implements it: [`HookConfig`] is a table inside
/// the document, not a document, so loading it directly would reject every
/// valid file under `deny_unknown_fields`. Use [`HookConfig::load`].
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if the file is unreadable or the TOML
///   does not deserialize into `Self`
pub(crate) trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl ConfigLoader for HookDocument {}

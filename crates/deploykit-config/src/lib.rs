//! Lossless mutation of section/key-value configuration files for deploykit.
//!
//! This crate provides the config layer: a line-preserving `Document` model
//! with section-scoped get/set/remove/get-all operations, `ValueFormatter`
//! strategies for the generic (`key=value`) and CLI (`key = "value"`)
//! dialects, and `ConfigStore` for reading and atomically rewriting files.

pub mod document;
pub mod format;
pub mod store;

pub use document::{Document, Line, SectionMap, SetOutcome};
pub use format::{select_formatter, CliFormatter, PlainFormatter, ValueFormatter};
pub use store::ConfigStore;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fsync a directory so that a preceding `rename()` is durable.
#[cfg(unix)]
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

// Directories cannot be opened as files here; rename durability is left to the OS.
#[cfg(not(unix))]
pub(crate) fn fsync_dir(_dir: &Path) -> Result<(), std::io::Error> {
    Ok(())
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("section name must not be empty")]
    EmptySection,
    #[error("key must not be empty")]
    EmptyKey,
    #[error("unknown value formatter '{0}', expected 'plain' or 'cli'")]
    UnknownFormatter(String),
}

//! Package listing parser and ordered installation for deploykit.
//!
//! This crate turns package-manager listing output into records: `segment`
//! splits the text into blank-line-delimited blocks, `parse_block` turns each
//! into an open-ended `PackageRecord`, `filter_by_section` and `InstallPlan`
//! derive the category-ordered install sequence, and `Installer` drives that
//! sequence through a `PackageManager` implementation.

pub mod backend;
pub mod category;
pub mod installer;
pub mod mock;
pub mod plan;
pub mod record;
pub mod segment;

pub use backend::{query_records, ListMode, PackageManager};
pub use category::{filter_by_section, install_order, Category};
pub use installer::{InstallReport, InstalledPackage, Installer};
pub use mock::MockPackageManager;
pub use plan::{InstallPlan, PlanStep, SkipReason, SkippedRecord};
pub use record::{parse_block, parse_records, PackageRecord};
pub use segment::{segment, RawBlock, BLOCK_SEPARATOR_BLANKS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("package manager I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("package listing failed: {0}")]
    Query(String),
    #[error("installing '{package}' failed with exit code {code}")]
    ToolFailure { package: String, code: i32 },
    #[error("package manager error: {0}")]
    Backend(String),
}

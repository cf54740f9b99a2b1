use crate::record::{parse_records, PackageRecord};
use crate::InstallError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which listing the package manager is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    Installed,
    Available,
}

impl fmt::Display for ListMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListMode::Installed => write!(f, "installed"),
            ListMode::Available => write!(f, "available"),
        }
    }
}

/// The external package manager. Implementations own process invocation;
/// this crate only decides which identifiers to install and in what order.
pub trait PackageManager: Send + Sync {
    fn name(&self) -> &str;

    /// Captured standard output of the list query for `mode`.
    fn list_packages(&self, mode: ListMode) -> Result<String, InstallError>;

    /// Install one package identifier and return the tool's exit code.
    fn install(&self, package: &str) -> Result<i32, InstallError>;
}

/// Run the list query for `mode` and parse its output.
pub fn query_records(
    manager: &dyn PackageManager,
    mode: ListMode,
) -> Result<Vec<PackageRecord>, InstallError> {
    let text = manager.list_packages(mode)?;
    let records = parse_records(&text);
    tracing::debug!(
        "{}: {} {mode} package record(s)",
        manager.name(),
        records.len()
    );
    Ok(records)
}

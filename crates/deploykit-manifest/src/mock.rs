use crate::backend::{ListMode, PackageManager};
use crate::InstallError;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory package manager with canned listings and configurable exit codes.
///
/// Every `install` call is recorded, so tests and dry runs can check the exact
/// order in which identifiers were requested.
#[derive(Default)]
pub struct MockPackageManager {
    listings: HashMap<ListMode, String>,
    exit_codes: HashMap<String, i32>,
    calls: Mutex<Vec<String>>,
}

impl MockPackageManager {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_listing(mut self, mode: ListMode, text: impl Into<String>) -> Self {
        self.listings.insert(mode, text.into());
        self
    }

    #[must_use]
    pub fn with_exit_code(mut self, package: &str, code: i32) -> Self {
        self.exit_codes.insert(package.to_owned(), code);
        self
    }

    /// Identifiers passed to `install`, in call order.
    pub fn install_calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl PackageManager for MockPackageManager {
    fn name(&self) -> &str {
        "mock"
    }

    fn list_packages(&self, mode: ListMode) -> Result<String, InstallError> {
        Ok(self.listings.get(&mode).cloned().unwrap_or_default())
    }

    fn install(&self, package: &str) -> Result<i32, InstallError> {
        let mut calls = self
            .calls
            .lock()
            .map_err(|e| InstallError::Backend(format!("mutex poisoned: {e}")))?;
        calls.push(package.to_owned());
        Ok(self.exit_codes.get(package).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_and_exit_codes() {
        let mock = MockPackageManager::new().with_exit_code("broken", 5);
        assert_eq!(mock.install("ok").unwrap(), 0);
        assert_eq!(mock.install("broken").unwrap(), 5);
        assert_eq!(mock.install_calls(), vec!["ok", "broken"]);
    }

    #[test]
    fn missing_listing_is_empty() {
        let mock = MockPackageManager::new().with_listing(ListMode::Available, "Package: x\n");
        assert_eq!(mock.list_packages(ListMode::Available).unwrap(), "Package: x\n");
        assert_eq!(mock.list_packages(ListMode::Installed).unwrap(), "");
    }
}

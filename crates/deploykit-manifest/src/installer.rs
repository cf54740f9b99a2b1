use crate::backend::PackageManager;
use crate::category::Category;
use crate::plan::InstallPlan;
use crate::InstallError;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPackage {
    pub package: String,
    pub version: Option<String>,
    pub category: Category,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub dry_run: bool,
    pub installed: Vec<InstalledPackage>,
    pub skipped: usize,
}

/// Drives an [`InstallPlan`] through a [`PackageManager`], one package at a time.
///
/// The first non-zero exit code aborts the run with
/// [`InstallError::ToolFailure`]; packages already installed stay installed.
pub struct Installer<'m> {
    manager: &'m dyn PackageManager,
    dry_run: bool,
}

impl<'m> Installer<'m> {
    pub fn new(manager: &'m dyn PackageManager) -> Self {
        Self {
            manager,
            dry_run: false,
        }
    }

    /// Walk the plan without invoking the package manager.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run(&self, plan: &InstallPlan) -> Result<InstallReport, InstallError> {
        let mut report = InstallReport {
            dry_run: self.dry_run,
            skipped: plan.skipped().len(),
            ..InstallReport::default()
        };

        for skipped in plan.skipped() {
            debug!(
                "skipping {} ({:?})",
                skipped.record.package().unwrap_or("<unnamed>"),
                skipped.reason
            );
        }

        for step in plan.steps() {
            info!("{}: {} package(s)", step.category, step.packages.len());
            for record in &step.packages {
                let Some(package) = record.package() else {
                    continue;
                };

                if self.dry_run {
                    info!("would install {package}");
                } else {
                    info!("installing {package} via {}", self.manager.name());
                    let code = self.manager.install(package)?;
                    if code != 0 {
                        return Err(InstallError::ToolFailure {
                            package: package.to_owned(),
                            code,
                        });
                    }
                }

                report.installed.push(InstalledPackage {
                    package: package.to_owned(),
                    version: record.version().map(str::to_owned),
                    category: step.category,
                });
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPackageManager;
    use crate::record::parse_records;

    const LISTING: &str = "\
Package: zeta
Section: Utilities



Package: beta
Version: 2.0
Section: Drivers



Package: alpha
Section: Drivers
";

    #[test]
    fn installs_in_plan_order() {
        let mock = MockPackageManager::new();
        let plan = InstallPlan::from_records(parse_records(LISTING));
        let report = Installer::new(&mock).run(&plan).unwrap();

        assert_eq!(mock.install_calls(), vec!["alpha", "beta", "zeta"]);
        assert!(!report.dry_run);
        assert_eq!(report.installed.len(), 3);
        assert_eq!(report.installed[1].version.as_deref(), Some("2.0"));
        assert_eq!(report.installed[2].category, Category::Utilities);
    }

    #[test]
    fn dry_run_does_not_invoke_manager() {
        let mock = MockPackageManager::new();
        let plan = InstallPlan::from_records(parse_records(LISTING));
        let report = Installer::new(&mock).dry_run(true).run(&plan).unwrap();

        assert!(mock.install_calls().is_empty());
        assert!(report.dry_run);
        assert_eq!(report.installed.len(), 3);
    }

    #[test]
    fn non_zero_exit_aborts() {
        let mock = MockPackageManager::new().with_exit_code("beta", 1);
        let plan = InstallPlan::from_records(parse_records(LISTING));
        let err = Installer::new(&mock).run(&plan).unwrap_err();

        assert!(matches!(
            err,
            InstallError::ToolFailure { ref package, code: 1 } if package == "beta"
        ));
        assert_eq!(mock.install_calls(), vec!["alpha", "beta"]);
    }

    #[test]
    fn report_serializes() {
        let report = InstallReport {
            dry_run: true,
            installed: vec![InstalledPackage {
                package: "x".to_owned(),
                version: None,
                category: Category::Drivers,
            }],
            skipped: 0,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"category\":\"Drivers\""));
    }
}

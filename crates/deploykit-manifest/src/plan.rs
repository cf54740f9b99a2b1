use crate::category::{install_order, Category};
use crate::record::PackageRecord;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Why a record is not part of an [`InstallPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingSection,
    UnknownCategory,
    MissingPackage,
    CategoryExcluded,
    AlreadyInstalled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub record: PackageRecord,
    pub reason: SkipReason,
}

/// All packages of one category, in install order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    pub category: Category,
    pub packages: Vec<PackageRecord>,
}

/// Ordered installation plan: categories in [`Category::INSTALL_ORDER`],
/// packages ascending within each, empty categories omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallPlan {
    steps: Vec<PlanStep>,
    skipped: Vec<SkippedRecord>,
}

impl InstallPlan {
    pub fn from_records(records: impl IntoIterator<Item = PackageRecord>) -> Self {
        let mut buckets: [Vec<PackageRecord>; 4] = Default::default();
        let mut skipped = Vec::new();

        for record in records {
            let placement = match (record.section(), record.category()) {
                (None, _) => Err(SkipReason::MissingSection),
                (Some(_), None) => Err(SkipReason::UnknownCategory),
                (Some(_), Some(_)) if record.package().is_none() => Err(SkipReason::MissingPackage),
                (Some(_), Some(category)) => Ok(category),
            };
            match placement {
                // Variants are declared in install order.
                Ok(category) => buckets[category as usize].push(record),
                Err(reason) => {
                    debug!(
                        "skipping record {:?} (section {:?}): {reason:?}",
                        record.package(),
                        record.section()
                    );
                    skipped.push(SkippedRecord { record, reason });
                }
            }
        }

        let steps = Category::INSTALL_ORDER
            .into_iter()
            .zip(buckets)
            .filter(|(_, packages)| !packages.is_empty())
            .map(|(category, mut packages)| {
                packages.sort_by(install_order);
                PlanStep { category, packages }
            })
            .collect();

        Self { steps, skipped }
    }

    /// Keep only the listed categories; the rest move to `skipped`.
    #[must_use]
    pub fn with_categories(mut self, categories: &[Category]) -> Self {
        let (keep, drop): (Vec<_>, Vec<_>) = std::mem::take(&mut self.steps)
            .into_iter()
            .partition(|step| categories.contains(&step.category));
        self.steps = keep;
        for step in drop {
            self.skipped
                .extend(step.packages.into_iter().map(|record| SkippedRecord {
                    record,
                    reason: SkipReason::CategoryExcluded,
                }));
        }
        self
    }

    /// Drop packages whose identifier appears in `installed`.
    #[must_use]
    pub fn excluding_installed(mut self, installed: &[PackageRecord]) -> Self {
        let present: HashSet<&str> = installed.iter().filter_map(PackageRecord::package).collect();
        for step in &mut self.steps {
            let (already, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut step.packages)
                .into_iter()
                .partition(|r| r.package().is_some_and(|p| present.contains(p)));
            step.packages = pending;
            self.skipped
                .extend(already.into_iter().map(|record| SkippedRecord {
                    record,
                    reason: SkipReason::AlreadyInstalled,
                }));
        }
        self.steps.retain(|step| !step.packages.is_empty());
        self
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    /// Every planned package with its category, in install order.
    pub fn packages(&self) -> impl Iterator<Item = (Category, &PackageRecord)> {
        self.steps
            .iter()
            .flat_map(|step| step.packages.iter().map(move |r| (step.category, r)))
    }

    pub fn len(&self) -> usize {
        self.steps.iter().map(|s| s.packages.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse_records;

    fn record(package: &str, section: &str) -> PackageRecord {
        [("Package", package), ("Section", section)]
            .into_iter()
            .collect()
    }

    fn order(plan: &InstallPlan) -> Vec<(Category, String)> {
        plan.packages()
            .map(|(c, r)| (c, r.package().unwrap_or_default().to_owned()))
            .collect()
    }

    #[test]
    fn category_ordering_scenario() {
        let plan = InstallPlan::from_records(vec![
            record("zeta", "Utilities"),
            record("alpha", "Drivers"),
            record("beta", "Drivers"),
        ]);
        assert_eq!(
            order(&plan),
            vec![
                (Category::Drivers, "alpha".to_owned()),
                (Category::Drivers, "beta".to_owned()),
                (Category::Utilities, "zeta".to_owned()),
            ]
        );
        assert_eq!(plan.steps().len(), 2);
        assert_eq!(plan.len(), 3);
        assert!(plan.skipped().is_empty());
    }

    #[test]
    fn all_categories_follow_fixed_order() {
        let plan = InstallPlan::from_records(vec![
            record("u", "Utilities"),
            record("a", "Application Software"),
            record("d", "Drivers"),
            record("p", "Programming Environments"),
        ]);
        let categories: Vec<_> = plan.steps().iter().map(|s| s.category).collect();
        assert_eq!(categories, Category::INSTALL_ORDER.to_vec());
    }

    #[test]
    fn uninstallable_records_are_skipped_with_reason() {
        let plan = InstallPlan::from_records(vec![
            record("extra", "Add-Ons"),
            [("Package", "bare")].into_iter().collect(),
            [("Section", "Drivers")].into_iter().collect(),
            PackageRecord::new(),
        ]);
        assert!(plan.is_empty());
        let reasons: Vec<_> = plan.skipped().iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::UnknownCategory,
                SkipReason::MissingSection,
                SkipReason::MissingPackage,
                SkipReason::MissingSection,
            ]
        );
    }

    #[test]
    fn category_subset() {
        let plan = InstallPlan::from_records(vec![
            record("zeta", "Utilities"),
            record("alpha", "Drivers"),
        ])
        .with_categories(&[Category::Utilities]);
        assert_eq!(order(&plan), vec![(Category::Utilities, "zeta".to_owned())]);
        assert_eq!(plan.skipped()[0].reason, SkipReason::CategoryExcluded);
    }

    #[test]
    fn installed_packages_are_dropped() {
        let installed = parse_records("Package: alpha\nVersion: 1\n");
        let plan = InstallPlan::from_records(vec![
            record("alpha", "Drivers"),
            record("beta", "Drivers"),
            record("gamma", "Utilities"),
        ])
        .excluding_installed(&installed);
        assert_eq!(
            order(&plan),
            vec![
                (Category::Drivers, "beta".to_owned()),
                (Category::Utilities, "gamma".to_owned()),
            ]
        );
        assert_eq!(plan.skipped()[0].record.package(), Some("alpha"));
        assert_eq!(plan.skipped()[0].reason, SkipReason::AlreadyInstalled);
    }

    #[test]
    fn fully_installed_category_is_omitted() {
        let installed = vec![record("alpha", "Drivers")];
        let plan = InstallPlan::from_records(vec![record("alpha", "Drivers")])
            .excluding_installed(&installed);
        assert!(plan.is_empty());
        assert_eq!(plan.len(), 0);
    }
}

use crate::record::PackageRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Package categories that take part in installation, keyed by the `Section` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Programming Environments")]
    ProgrammingEnvironments,
    #[serde(rename = "Drivers")]
    Drivers,
    #[serde(rename = "Application Software")]
    ApplicationSoftware,
    #[serde(rename = "Utilities")]
    Utilities,
}

impl Category {
    /// Environments first so drivers can register with them, then drivers,
    /// then the applications and utilities that depend on both.
    pub const INSTALL_ORDER: [Category; 4] = [
        Category::ProgrammingEnvironments,
        Category::Drivers,
        Category::ApplicationSoftware,
        Category::Utilities,
    ];

    pub fn section_name(self) -> &'static str {
        match self {
            Category::ProgrammingEnvironments => "Programming Environments",
            Category::Drivers => "Drivers",
            Category::ApplicationSoftware => "Application Software",
            Category::Utilities => "Utilities",
        }
    }

    pub fn from_section(section: &str) -> Option<Self> {
        Self::INSTALL_ORDER
            .into_iter()
            .find(|c| c.section_name() == section)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section_name())
    }
}

/// Ascending `Package` by byte order, `Version` as tie break. Missing fields sort first.
pub fn install_order(a: &PackageRecord, b: &PackageRecord) -> Ordering {
    a.package()
        .cmp(&b.package())
        .then_with(|| a.version().cmp(&b.version()))
}

/// Records whose `Section` equals `section`, sorted for installation.
///
/// The name is not validated against [`Category`]; any section value can be
/// filtered. Records without a `Section` field never match.
pub fn filter_by_section<'r>(records: &'r [PackageRecord], section: &str) -> Vec<&'r PackageRecord> {
    let mut out: Vec<&PackageRecord> = records
        .iter()
        .filter(|r| r.section() == Some(section))
        .collect();
    out.sort_by(|a, b| install_order(a, b));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(package: &str, section: &str) -> PackageRecord {
        [("Package", package), ("Section", section)]
            .into_iter()
            .collect()
    }

    #[test]
    fn section_names_roundtrip() {
        for category in Category::INSTALL_ORDER {
            assert_eq!(Category::from_section(category.section_name()), Some(category));
        }
        assert_eq!(Category::from_section("drivers"), None);
        assert_eq!(Category::from_section("Add-Ons"), None);
    }

    #[test]
    fn install_order_matches_declaration_order() {
        for (idx, category) in Category::INSTALL_ORDER.into_iter().enumerate() {
            assert_eq!(category as usize, idx);
        }
    }

    #[test]
    fn serde_uses_section_names() {
        let json = serde_json::to_string(&Category::ProgrammingEnvironments).unwrap();
        assert_eq!(json, "\"Programming Environments\"");
        let back: Category = serde_json::from_str("\"Application Software\"").unwrap();
        assert_eq!(back, Category::ApplicationSoftware);
    }

    #[test]
    fn filter_sorts_by_package_bytes() {
        let records = vec![
            record("ni-visa", "Drivers"),
            record("Ni-Upper", "Drivers"),
            record("labview", "Programming Environments"),
            record("ni-daqmx", "Drivers"),
        ];
        let drivers: Vec<_> = filter_by_section(&records, "Drivers")
            .into_iter()
            .filter_map(PackageRecord::package)
            .collect();
        assert_eq!(drivers, vec!["Ni-Upper", "ni-daqmx", "ni-visa"]);
    }

    #[test]
    fn filter_passes_through_unknown_sections() {
        let records = vec![record("b", "Add-Ons"), record("a", "Add-Ons")];
        let found = filter_by_section(&records, "Add-Ons");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].package(), Some("a"));
    }

    #[test]
    fn missing_section_never_matches() {
        let records: Vec<PackageRecord> = vec![[("Package", "x")].into_iter().collect()];
        assert!(filter_by_section(&records, "Drivers").is_empty());
        assert!(filter_by_section(&records, "").is_empty());
    }

    #[test]
    fn version_breaks_ties() {
        let a: PackageRecord = [("Package", "x"), ("Version", "2.0"), ("Section", "Drivers")]
            .into_iter()
            .collect();
        let b: PackageRecord = [("Package", "x"), ("Version", "1.0"), ("Section", "Drivers")]
            .into_iter()
            .collect();
        let records = vec![a, b];
        let sorted = filter_by_section(&records, "Drivers");
        assert_eq!(sorted[0].version(), Some("1.0"));
        assert_eq!(sorted[1].version(), Some("2.0"));
    }
}

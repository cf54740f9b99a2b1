use crate::category::Category;
use crate::segment::{segment, RawBlock};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const FIELD_PACKAGE: &str = "Package";
pub const FIELD_VERSION: &str = "Version";
pub const FIELD_SECTION: &str = "Section";

/// Open-ended field map for one package, in first-seen field order.
///
/// The field set comes from the package manager, so nothing is predeclared;
/// `package`, `version`, and `section` are projections over the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageRecord {
    fields: Vec<(String, String)>,
}

impl PackageRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`. A repeated field keeps its position and takes
    /// the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn package(&self) -> Option<&str> {
        self.get(FIELD_PACKAGE)
    }

    pub fn version(&self) -> Option<&str> {
        self.get(FIELD_VERSION)
    }

    pub fn section(&self) -> Option<&str> {
        self.get(FIELD_SECTION)
    }

    /// Install category, if the `Section` field names one of the known ones.
    pub fn category(&self) -> Option<Category> {
        self.section().and_then(Category::from_section)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PackageRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl Serialize for PackageRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Build a record from `Field: value` lines.
///
/// Each line is split on its first colon and one following space is dropped.
/// Lines without a colon are skipped.
pub fn parse_block(block: &RawBlock<'_>) -> PackageRecord {
    let mut record = PackageRecord::new();
    for line in block.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        record.insert(name, value);
    }
    record
}

/// Segment `text` and parse every block. One record per block, empty ones included.
pub fn parse_records(text: &str) -> Vec<PackageRecord> {
    segment(text).iter().map(parse_block).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(lines: &[&'static str]) -> RawBlock<'static> {
        RawBlock::new(lines.to_vec())
    }

    #[test]
    fn parses_fields_in_order() {
        let record = parse_block(&block(&[
            "Package: ni-daqmx",
            "Version: 23.5.0.49296-0+f144",
            "Section: Drivers",
        ]));
        assert_eq!(record.package(), Some("ni-daqmx"));
        assert_eq!(record.version(), Some("23.5.0.49296-0+f144"));
        assert_eq!(record.section(), Some("Drivers"));
        assert_eq!(record.category(), Some(Category::Drivers));
        let names: Vec<_> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Package", "Version", "Section"]);
    }

    #[test]
    fn splits_on_first_colon_and_trims_one_space() {
        let record = parse_block(&block(&[
            "Homepage: http://www.ni.com",
            "Padded:   three",
            "Tight:value",
        ]));
        assert_eq!(record.get("Homepage"), Some("http://www.ni.com"));
        assert_eq!(record.get("Padded"), Some("  three"));
        assert_eq!(record.get("Tight"), Some("value"));
    }

    #[test]
    fn skips_colonless_lines_keeps_empty_field_name() {
        let record = parse_block(&block(&["free text", ": orphan", "Package: x"]));
        assert_eq!(record.len(), 2);
        assert_eq!(record.get(""), Some("orphan"));
        assert_eq!(record.package(), Some("x"));
    }

    #[test]
    fn repeated_field_last_wins_in_place() {
        let record = parse_block(&block(&["A: 1", "B: 2", "A: 3"]));
        let fields: Vec<_> = record.iter().collect();
        assert_eq!(fields, vec![("A", "3"), ("B", "2")]);
    }

    #[test]
    fn colonless_block_yields_empty_record() {
        let records = parse_records("just text\n\n\n\nPackage: x\n");
        assert_eq!(records.len(), 2);
        assert!(records[0].is_empty());
        assert_eq!(records[1].package(), Some("x"));
    }

    #[test]
    fn unknown_section_has_no_category() {
        let record: PackageRecord = [("Package", "x"), ("Section", "Add-Ons")]
            .into_iter()
            .collect();
        assert_eq!(record.section(), Some("Add-Ons"));
        assert_eq!(record.category(), None);
    }

    #[test]
    fn serializes_as_ordered_map() {
        let record: PackageRecord = [("Package", "x"), ("Version", "1.0")].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"Package":"x","Version":"1.0"}"#
        );
    }
}

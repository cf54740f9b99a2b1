use deploykit_config::select_formatter;
use deploykit_manifest::{Category, ListMode};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse profile: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unsupported profile_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("config edit #{index}: file must not be empty")]
    EmptyFile { index: usize },
    #[error("config edit for '{file}': section must not be empty")]
    EmptySection { file: String },
    #[error("config edit for '{file}': key must not be empty")]
    EmptyKey { file: String },
    #[error("config edit for '{file}': unknown dialect '{dialect}', expected 'plain' or 'cli'")]
    UnknownDialect { file: String, dialect: String },
    #[error("install.categories must not be empty when present")]
    EmptyCategories,
}

/// A deployment profile: which config keys to set or remove, and which
/// package categories to install.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub profile_version: u32,
    #[serde(default)]
    pub config: Vec<ConfigEdit>,
    #[serde(default)]
    pub install: Option<InstallSection>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigEdit {
    /// Target file; relative paths resolve against the profile's directory.
    pub file: String,
    #[serde(default = "default_dialect")]
    pub dialect: String,
    pub section: String,
    /// Create the file if it does not exist.
    #[serde(default)]
    pub create: bool,
    /// Applied in the order the profile lists them.
    #[serde(default)]
    pub set: KeyValues,
    #[serde(default)]
    pub remove: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InstallSection {
    #[serde(default = "default_mode")]
    pub mode: ListMode,
    /// Restrict installation to these categories. Order here does not matter.
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
    #[serde(default = "default_true")]
    pub skip_installed: bool,
    #[serde(default)]
    pub dry_run: bool,
}

/// String key/value pairs that keep their source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValues(Vec<(String, String)>);

impl KeyValues {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (String, String)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a KeyValues {
    type Item = &'a (String, String);
    type IntoIter = std::slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Serialize for KeyValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de> Deserialize<'de> for KeyValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = KeyValues;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<KeyValues, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    entries.push(entry);
                }
                Ok(KeyValues(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

fn default_dialect() -> String {
    "plain".to_owned()
}

fn default_mode() -> ListMode {
    ListMode::Available
}

fn default_true() -> bool {
    true
}

impl Profile {
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.profile_version != 1 {
            return Err(ProfileError::UnsupportedVersion(self.profile_version));
        }

        for (index, edit) in self.config.iter().enumerate() {
            if edit.file.trim().is_empty() {
                return Err(ProfileError::EmptyFile { index });
            }
            if edit.section.is_empty() {
                return Err(ProfileError::EmptySection {
                    file: edit.file.clone(),
                });
            }
            if edit
                .set
                .keys()
                .chain(edit.remove.iter().map(String::as_str))
                .any(str::is_empty)
            {
                return Err(ProfileError::EmptyKey {
                    file: edit.file.clone(),
                });
            }
            if select_formatter(&edit.dialect).is_err() {
                return Err(ProfileError::UnknownDialect {
                    file: edit.file.clone(),
                    dialect: edit.dialect.clone(),
                });
            }
        }

        if let Some(install) = &self.install {
            if install.categories.as_ref().is_some_and(Vec::is_empty) {
                return Err(ProfileError::EmptyCategories);
            }
        }

        Ok(())
    }
}

/// Parse and validate a profile.
pub fn parse_profile_str(input: &str) -> Result<Profile, ProfileError> {
    let profile: Profile = toml::from_str(input)?;
    profile.validate()?;
    Ok(profile)
}

pub fn parse_profile_file(path: impl AsRef<Path>) -> Result<Profile, ProfileError> {
    let content = fs::read_to_string(path)?;
    parse_profile_str(&content)
}

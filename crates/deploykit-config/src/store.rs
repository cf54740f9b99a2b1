use crate::document::{Document, SectionMap, SetOutcome};
use crate::format::{CliFormatter, PlainFormatter, ValueFormatter};
use crate::{fsync_dir, ConfigError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Section/key-value config engine parameterized by a [`ValueFormatter`].
///
/// Every file operation reads the file, works on a fresh [`Document`], and
/// writes the result back through a temp file and atomic rename. Nothing is
/// cached between calls; concurrent writers to one path must be serialized by
/// the caller.
pub struct ConfigStore {
    formatter: Box<dyn ValueFormatter>,
}

impl ConfigStore {
    pub fn new(formatter: impl ValueFormatter + 'static) -> Self {
        Self {
            formatter: Box::new(formatter),
        }
    }

    pub fn with_formatter(formatter: Box<dyn ValueFormatter>) -> Self {
        Self { formatter }
    }

    /// Generic `key=value` files.
    pub fn plain() -> Self {
        Self::new(PlainFormatter)
    }

    /// CLI-style `key = value` files with value quoting.
    pub fn cli() -> Self {
        Self::new(CliFormatter)
    }

    pub fn formatter(&self) -> &dyn ValueFormatter {
        self.formatter.as_ref()
    }

    pub fn parse(&self, text: &str) -> Document<'_> {
        Document::parse(text, self.formatter.as_ref())
    }

    /// Read `path` into a document. A missing file is an error unless
    /// `create_if_missing` is set, in which case an empty document is returned.
    pub fn load(&self, path: &Path, create_if_missing: bool) -> Result<Document<'_>, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                debug!("read {} ({} bytes)", path.display(), text.len());
                Ok(self.parse(&text))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if create_if_missing {
                    debug!("{} does not exist, starting from empty document", path.display());
                    Ok(Document::empty(self.formatter.as_ref()))
                } else {
                    Err(ConfigError::FileNotFound(path.to_path_buf()))
                }
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Atomically replace `path` with the serialized document.
    pub fn save(&self, path: &Path, doc: &Document<'_>) -> Result<(), ConfigError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let content = doc.to_string();
        let existing = fs::metadata(path).ok().map(|meta| meta.permissions());
        let mut tmp = match existing {
            Some(_) => NamedTempFile::new_in(dir)?,
            None => new_file_tempfile(dir)?,
        };
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        if let Some(perms) = existing {
            fs::set_permissions(tmp.path(), perms)?;
        }
        tmp.persist(path).map_err(|e| ConfigError::Io(e.error))?;
        fsync_dir(dir)?;

        debug!("wrote {} ({} bytes)", path.display(), content.len());
        Ok(())
    }

    /// Load, mutate, and write back only if the closure changed the document.
    pub fn edit<T>(
        &self,
        path: &Path,
        create_if_missing: bool,
        f: impl FnOnce(&mut Document<'_>) -> Result<T, ConfigError>,
    ) -> Result<T, ConfigError> {
        let mut doc = self.load(path, create_if_missing)?;
        let result = f(&mut doc)?;
        if doc.is_modified() {
            self.save(path, &doc)?;
        }
        Ok(result)
    }

    pub fn get(&self, path: &Path, section: &str, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.load(path, false)?.get(section, key))
    }

    pub fn get_all(&self, path: &Path, section: Option<&str>) -> Result<SectionMap, ConfigError> {
        Ok(self.load(path, false)?.get_all(section))
    }

    pub fn set(
        &self,
        path: &Path,
        section: &str,
        key: &str,
        value: &str,
        create_if_missing: bool,
    ) -> Result<SetOutcome, ConfigError> {
        self.edit(path, create_if_missing, |doc| doc.set(section, key, value))
    }

    /// Remove `key` from `[section]`. A missing key is logged and reported as
    /// `false`; the file is left untouched.
    pub fn remove(&self, path: &Path, section: &str, key: &str) -> Result<bool, ConfigError> {
        let removed = self.edit(path, false, |doc| Ok(doc.remove(section, key)))?;
        if !removed {
            warn!(
                "key '{key}' not found in [{section}] of {}, nothing removed",
                path.display()
            );
        }
        Ok(removed)
    }
}

/// Temp file for a target that does not exist yet: created with the mode a
/// plain `File::create` would get (0o666 less the umask) instead of 0o600.
fn new_file_tempfile(dir: &Path) -> std::io::Result<NamedTempFile> {
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("formatter", &self.formatter.name())
            .finish()
    }
}

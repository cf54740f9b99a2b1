use crate::profile::{parse_profile_file, ConfigEdit, InstallSection, Profile};
use crate::CoreError;
use deploykit_config::{select_formatter, ConfigStore, SetOutcome};
use deploykit_manifest::{
    query_records, InstallPlan, InstallReport, Installer, ListMode, PackageManager,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What happened to one config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEditReport {
    pub file: PathBuf,
    pub section: String,
    pub set: BTreeMap<String, SetOutcome>,
    pub removed: Vec<String>,
    /// Keys listed for removal that were not present.
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub install: Option<InstallReport>,
    pub config: Vec<ConfigEditReport>,
}

impl DeployReport {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Applies a [`Profile`]: ordered installation through a [`PackageManager`]
/// followed by config file edits.
pub struct Deployer {
    manager: Box<dyn PackageManager>,
    base_dir: PathBuf,
}

impl Deployer {
    pub fn new(manager: Box<dyn PackageManager>) -> Self {
        Self {
            manager,
            base_dir: PathBuf::from("."),
        }
    }

    /// Directory against which relative config paths are resolved.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Load a profile file and deploy it, resolving config paths next to it.
    pub fn deploy_file(self, path: &Path) -> Result<DeployReport, CoreError> {
        let profile = parse_profile_file(path)?;
        let deployer = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => self.with_base_dir(dir),
            _ => self,
        };
        deployer.deploy(&profile)
    }

    pub fn deploy(&self, profile: &Profile) -> Result<DeployReport, CoreError> {
        profile.validate()?;
        let install = match &profile.install {
            Some(section) => Some(self.install(section)?),
            None => None,
        };
        let config = self.apply_config(&profile.config)?;
        Ok(DeployReport { install, config })
    }

    pub fn install(&self, section: &InstallSection) -> Result<InstallReport, CoreError> {
        let manager = self.manager.as_ref();
        let records = query_records(manager, section.mode)?;
        let mut plan = InstallPlan::from_records(records);

        if let Some(categories) = &section.categories {
            plan = plan.with_categories(categories);
        }
        if section.skip_installed && section.mode != ListMode::Installed {
            let installed = query_records(manager, ListMode::Installed)?;
            plan = plan.excluding_installed(&installed);
        }

        info!(
            "install plan: {} package(s) in {} step(s), {} skipped",
            plan.len(),
            plan.steps().len(),
            plan.skipped().len()
        );
        let report = Installer::new(manager)
            .dry_run(section.dry_run)
            .run(&plan)?;
        Ok(report)
    }

    pub fn apply_config(&self, edits: &[ConfigEdit]) -> Result<Vec<ConfigEditReport>, CoreError> {
        edits.iter().map(|edit| self.apply_edit(edit)).collect()
    }

    fn apply_edit(&self, edit: &ConfigEdit) -> Result<ConfigEditReport, CoreError> {
        let store = ConfigStore::with_formatter(select_formatter(&edit.dialect)?);
        let path = self.resolve(&edit.file);
        let mut report = ConfigEditReport {
            file: path.clone(),
            section: edit.section.clone(),
            set: BTreeMap::new(),
            removed: Vec::new(),
            missing: Vec::new(),
        };

        store.edit(&path, edit.create, |doc| {
            for (key, value) in &edit.set {
                let outcome = doc.set(&edit.section, key, value)?;
                report.set.insert(key.clone(), outcome);
            }
            for key in &edit.remove {
                if doc.remove(&edit.section, key) {
                    report.removed.push(key.clone());
                } else {
                    report.missing.push(key.clone());
                }
            }
            Ok(())
        })?;

        for key in &report.missing {
            warn!(
                "key '{key}' not found in [{}] of {}, nothing removed",
                edit.section,
                path.display()
            );
        }
        info!(
            "{}: {} key(s) set, {} removed",
            path.display(),
            report.set.len(),
            report.removed.len()
        );
        Ok(report)
    }

    fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

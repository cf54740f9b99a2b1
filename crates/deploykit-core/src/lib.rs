//! Deployment profiles and the deployer for deploykit.
//!
//! A TOML `Profile` names the config keys to set or remove per file and the
//! package categories to install. `Deployer` runs the install phase through a
//! `PackageManager` in category order, then applies the config edits with
//! `deploykit-config`.

pub mod deployer;
pub mod profile;

pub use deployer::{ConfigEditReport, DeployReport, Deployer};
pub use profile::{
    parse_profile_file, parse_profile_str, ConfigEdit, InstallSection, KeyValues, Profile,
    ProfileError,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),
    #[error("config error: {0}")]
    Config(#[from] deploykit_config::ConfigError),
    #[error("install error: {0}")]
    Install(#[from] deploykit_manifest::InstallError),
}

//! Project configuration describing where the manifest and asset tree live.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::registry::DEFAULT_MERGE_ENVIRONMENT;

const DEFAULT_CONFIG_FILE: &str = "asset_packager.config.json";

/// Discoverable configuration for driving the packager against a project.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PackagerConfig {
  /// Path of the YAML package manifest, relative to the project directory.
  pub manifest_file: String,
  /// Root directory containing the `javascripts/` and `stylesheets/` trees.
  pub asset_root: String,
  /// Environments in which merging is active.
  pub merge_environments: Vec<String>,
}

impl Default for PackagerConfig {
  fn default() -> Self {
    Self {
      manifest_file: "config/asset_packages.yml".into(),
      asset_root: "public".into(),
      merge_environments: vec![DEFAULT_MERGE_ENVIRONMENT.into()],
    }
  }
}

impl PackagerConfig {
  /// Attempt to load configuration from the provided project directory.
  ///
  /// When the configuration file does not exist or fails to parse we fall
  /// back to default values so downstream callers can continue operating
  /// with sensible assumptions.
  pub fn discover(project_dir: &Path) -> Self {
    let candidate = project_dir.join(DEFAULT_CONFIG_FILE);
    Self::from_path(&candidate).unwrap_or_default()
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Option<Self> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
  }

  /// Manifest path resolved against the project directory.
  pub fn manifest_path(&self, project_dir: &Path) -> PathBuf {
    project_dir.join(&self.manifest_file)
  }

  /// Asset root resolved against the project directory.
  pub fn asset_root_path(&self, project_dir: &Path) -> PathBuf {
    project_dir.join(&self.asset_root)
  }
}

//! Registry owning every package definition, with lookup and lifecycle
//! operations.

use std::collections::BTreeSet;

use anyhow::Result;
use tracing::{info, warn};

use crate::builder::{BuildFailure, BuildReport, BuiltPackage, build_package};
use crate::manifest::PackageManifest;
use crate::package::{AssetKind, PackageDefinition};
use crate::store::AssetStore;

/// Environment merging defaults to when nothing else is configured.
pub const DEFAULT_MERGE_ENVIRONMENT: &str = "production";

/// Explicitly constructed registry of package definitions.
///
/// There is deliberately no global instance; tests and hosts build isolated
/// registries from a manifest and drive them through `build_all` and
/// `delete_all`.
#[derive(Debug, Clone)]
pub struct PackageRegistry {
  packages: Vec<PackageDefinition>,
  merge_environments: Vec<String>,
}

impl PackageRegistry {
  /// Construct a registry holding one definition per manifest rule, in
  /// manifest order.
  pub fn from_manifest(manifest: &PackageManifest) -> Self {
    let mut packages = Vec::new();
    for kind in AssetKind::all() {
      for entry in manifest.entries(kind) {
        packages.push(PackageDefinition::new(
          kind,
          entry.target.clone(),
          entry.sources.clone(),
        ));
      }
    }

    Self {
      packages,
      merge_environments: vec![DEFAULT_MERGE_ENVIRONMENT.to_string()],
    }
  }

  /// Every definition of the given kind, in registration order.
  pub fn find_by_kind(&self, kind: AssetKind) -> Vec<&PackageDefinition> {
    self
      .packages
      .iter()
      .filter(|package| package.kind() == kind)
      .collect()
  }

  /// The definition with an exact `(kind, target)` match. Not finding one is
  /// a normal outcome.
  pub fn find_by_target(&self, kind: AssetKind, target: &str) -> Option<&PackageDefinition> {
    self
      .packages
      .iter()
      .find(|package| package.kind() == kind && package.target() == target)
  }

  /// The first definition (in registration order) whose sources contain
  /// `source`.
  pub fn find_by_source(&self, kind: AssetKind, source: &str) -> Option<&PackageDefinition> {
    self.packages.iter().find(|package| {
      package.kind() == kind && package.sources().iter().any(|name| name == source)
    })
  }

  /// Translate requested source names into output target names.
  ///
  /// A name owned by some definition emits that definition's target, once,
  /// at the position of its first occurrence; consumers assemble tag lists
  /// from the result and must not include a package twice. Unrecognized
  /// names pass through unchanged, duplicates and all.
  pub fn targets_from_sources<S: AsRef<str>>(&self, kind: AssetKind, names: &[S]) -> Vec<String> {
    let mut resolved = Vec::new();
    let mut emitted: BTreeSet<&str> = BTreeSet::new();

    for name in names {
      let name = name.as_ref();
      match self.find_by_source(kind, name) {
        Some(package) => {
          if emitted.insert(package.target()) {
            resolved.push(package.target().to_string());
          }
        }
        None => resolved.push(name.to_string()),
      }
    }

    resolved
  }

  /// Build every definition sequentially. A failing definition is recorded
  /// and the run continues, so one broken package cannot hold back the rest.
  pub fn build_all(&mut self, store: &impl AssetStore) -> BuildReport {
    let mut report = BuildReport::default();

    for package in &mut self.packages {
      match build_package(package, store) {
        Ok(token) => {
          info!(kind = %package.kind(), package = %package.target(), %token, "packaged");
          report.built.push(BuiltPackage {
            kind: package.kind(),
            target: package.target().to_string(),
            token,
          });
        }
        Err(error) => {
          warn!(kind = %package.kind(), package = %package.target(), "build failed: {error:#}");
          report.failures.push(BuildFailure {
            kind: package.kind(),
            target: package.target().to_string(),
            error,
          });
        }
      }
    }

    report
  }

  /// Remove every packaged output and clear all recorded tokens, forcing the
  /// next `build_all` to start from scratch.
  pub fn delete_all(&mut self, store: &impl AssetStore) -> Result<()> {
    for package in &mut self.packages {
      for token in store.list_outputs(package.kind(), package.target())? {
        store.remove_output(package.kind(), package.target(), &token)?;
      }
      package.clear_current_token();
    }
    Ok(())
  }

  /// Environments in which merging is active.
  pub fn merge_environments(&self) -> &[String] {
    &self.merge_environments
  }

  /// Replace the merge environment list.
  pub fn set_merge_environments(&mut self, environments: Vec<String>) {
    self.merge_environments = environments;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::DiskAssetStore;
  use std::fs;
  use std::path::Path;
  use tempfile::tempdir;

  const MANIFEST: &str = "\
javascripts:
  - base:
      - prototype
      - effects
      - controls
      - dragdrop
  - secondary:
      - foo
      - bar
stylesheets:
  - base:
      - screen
      - header
  - secondary:
      - foo
      - vendor/jquery/ui
      - subdir/extra
  - subdir/styles:
      - nested
      - deeper
";

  fn registry() -> PackageRegistry {
    PackageRegistry::from_manifest(&PackageManifest::parse(MANIFEST).unwrap())
  }

  fn write_asset(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  /// Asset tree matching the manifest fixture above.
  fn populate_assets(root: &Path) {
    for name in ["prototype", "effects", "controls", "dragdrop", "foo", "bar"] {
      write_asset(
        root,
        &format!("javascripts/{name}.js"),
        &format!("var {name} = true;"),
      );
    }

    write_asset(
      root,
      "stylesheets/screen.css",
      "body { background: url(/images/root.gif); }",
    );
    write_asset(
      root,
      "stylesheets/header.css",
      "h1 { background: url(http://localhost/images/logo.gif); }",
    );
    write_asset(
      root,
      "stylesheets/foo.css",
      ".foo { background: url(images/foo.png); }",
    );
    write_asset(
      root,
      "stylesheets/vendor/jquery/ui.css",
      ".hover { background: url(images/bg_75_1x400.png); }",
    );
    write_asset(
      root,
      "stylesheets/subdir/extra.css",
      ".extra { background: url(../images/icons_16_green.gif); }",
    );
    write_asset(
      root,
      "stylesheets/subdir/nested.css",
      ".nested { background: url(../images/icons_16_green.gif); }",
    );
    write_asset(
      root,
      "stylesheets/subdir/deeper.css",
      ".deeper { background: url( ./images/icons_16_red.gif ); }",
    );
  }

  #[test]
  fn find_by_kind_returns_definitions_in_manifest_order() {
    let registry = registry();

    let scripts = registry.find_by_kind(AssetKind::Javascripts);
    assert_eq!(scripts.len(), 2);
    assert_eq!(scripts[0].target(), "base");
    assert_eq!(
      scripts[0].sources(),
      ["prototype", "effects", "controls", "dragdrop"]
    );
    assert_eq!(scripts[1].target(), "secondary");

    let styles = registry.find_by_kind(AssetKind::Stylesheets);
    assert_eq!(styles.len(), 3);
    assert_eq!(styles[2].target(), "subdir/styles");
  }

  #[test]
  fn find_by_kind_with_no_definitions_is_empty() {
    let manifest = PackageManifest::parse("javascripts:\n  - base:\n      - prototype\n").unwrap();
    let registry = PackageRegistry::from_manifest(&manifest);
    assert!(registry.find_by_kind(AssetKind::Stylesheets).is_empty());
  }

  #[test]
  fn find_by_target_matches_exactly() {
    let registry = registry();

    let package = registry
      .find_by_target(AssetKind::Javascripts, "base")
      .unwrap();
    assert_eq!(package.target(), "base");
    assert_eq!(
      package.sources(),
      ["prototype", "effects", "controls", "dragdrop"]
    );

    assert!(registry.find_by_target(AssetKind::Javascripts, "missing").is_none());
    assert!(registry.find_by_target(AssetKind::Stylesheets, "bas").is_none());
  }

  #[test]
  fn find_by_source_returns_the_owning_definition() {
    let registry = registry();

    let package = registry
      .find_by_source(AssetKind::Javascripts, "controls")
      .unwrap();
    assert_eq!(package.target(), "base");

    assert!(registry.find_by_source(AssetKind::Javascripts, "screen").is_none());
  }

  #[test]
  fn find_by_source_prefers_the_first_registered_definition() {
    let manifest = PackageManifest::parse(
      "javascripts:\n  - first:\n      - shared\n  - second:\n      - shared\n",
    )
    .unwrap();
    let registry = PackageRegistry::from_manifest(&manifest);

    let package = registry
      .find_by_source(AssetKind::Javascripts, "shared")
      .unwrap();
    assert_eq!(package.target(), "first");
  }

  #[test]
  fn lookups_are_consistent_with_each_other() {
    let registry = registry();
    for kind in AssetKind::all() {
      for package in registry.find_by_kind(kind) {
        let by_target = registry.find_by_target(kind, package.target()).unwrap();
        assert_eq!(by_target.target(), package.target());
        assert_eq!(by_target.sources(), package.sources());
      }
    }
  }

  #[test]
  fn translates_script_sources_to_targets() {
    let registry = registry();
    let names = registry.targets_from_sources(
      AssetKind::Javascripts,
      &["prototype", "effects", "noexist1", "controls", "foo", "noexist2"],
    );
    assert_eq!(names, ["base", "noexist1", "secondary", "noexist2"]);
  }

  #[test]
  fn translates_stylesheet_sources_to_targets() {
    let registry = registry();
    let names = registry.targets_from_sources(
      AssetKind::Stylesheets,
      &["header", "screen", "noexist1", "foo", "noexist2"],
    );
    assert_eq!(names, ["base", "noexist1", "secondary", "noexist2"]);
  }

  #[test]
  fn unmatched_duplicates_are_preserved() {
    let registry = registry();
    let names =
      registry.targets_from_sources(AssetKind::Javascripts, &["nope", "prototype", "nope"]);
    assert_eq!(names, ["nope", "base", "nope"]);
  }

  #[test]
  fn merge_environments_default_to_production() {
    let registry = registry();
    assert_eq!(registry.merge_environments(), ["production"]);
  }

  #[test]
  fn merge_environments_can_be_replaced() {
    let mut registry = registry();
    registry.set_merge_environments(vec!["staging".into(), "production".into()]);
    assert_eq!(registry.merge_environments(), ["staging", "production"]);
  }

  #[test]
  fn build_all_packages_every_definition() {
    let temp = tempdir().unwrap();
    populate_assets(temp.path());
    let store = DiskAssetStore::new(temp.path());
    let mut registry = registry();

    let report = registry.build_all(&store);
    assert!(report.is_success());
    assert_eq!(report.built.len(), 5);

    for kind in AssetKind::all() {
      for package in registry.find_by_kind(kind) {
        let tokens = store.list_outputs(kind, package.target()).unwrap();
        assert_eq!(tokens.len(), 1, "expected one output for {}", package.target());
        assert_eq!(package.current_token(), Some(tokens[0].as_str()));
      }
    }
  }

  #[test]
  fn merged_stylesheets_reanchor_relative_urls_only() {
    let temp = tempdir().unwrap();
    populate_assets(temp.path());
    let store = DiskAssetStore::new(temp.path());
    let mut registry = registry();
    registry.build_all(&store);

    let secondary = registry
      .find_by_target(AssetKind::Stylesheets, "secondary")
      .unwrap()
      .current_file()
      .unwrap();
    let merged =
      fs::read_to_string(temp.path().join(format!("stylesheets/{secondary}.css"))).unwrap();
    assert!(merged.contains("url(./images/foo.png)"));
    assert!(merged.contains("url(vendor/jquery/images/bg_75_1x400.png)"));
    assert!(merged.contains("url(subdir/../images/icons_16_green.gif)"));

    let base = registry
      .find_by_target(AssetKind::Stylesheets, "base")
      .unwrap()
      .current_file()
      .unwrap();
    let merged = fs::read_to_string(temp.path().join(format!("stylesheets/{base}.css"))).unwrap();
    assert!(merged.contains("url(/images/root.gif)"));
    assert!(merged.contains("url(http://localhost/images/logo.gif)"));

    let subdir = registry
      .find_by_target(AssetKind::Stylesheets, "subdir/styles")
      .unwrap()
      .current_file()
      .unwrap();
    let merged = fs::read_to_string(temp.path().join(format!("stylesheets/{subdir}.css"))).unwrap();
    assert!(merged.contains("url(./../images/icons_16_green.gif)"));
    assert!(merged.contains("url( ././images/icons_16_red.gif )"));
  }

  #[test]
  fn a_failing_definition_does_not_abort_the_run() {
    let temp = tempdir().unwrap();
    populate_assets(temp.path());
    fs::remove_file(temp.path().join("javascripts/bar.js")).unwrap();
    let store = DiskAssetStore::new(temp.path());
    let mut registry = registry();

    let report = registry.build_all(&store);
    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].target, "secondary");
    assert_eq!(report.built.len(), 4);

    let failed = registry
      .find_by_target(AssetKind::Javascripts, "secondary")
      .unwrap();
    assert!(failed.current_token().is_none());
    let built = registry
      .find_by_target(AssetKind::Javascripts, "base")
      .unwrap();
    assert!(built.current_token().is_some());
  }

  #[test]
  fn delete_all_then_build_all_reproduces_the_output_set() {
    let temp = tempdir().unwrap();
    populate_assets(temp.path());
    let store = DiskAssetStore::new(temp.path());
    let mut registry = registry();

    registry.build_all(&store);
    registry.delete_all(&store).unwrap();

    for kind in AssetKind::all() {
      for package in registry.find_by_kind(kind) {
        assert!(store.list_outputs(kind, package.target()).unwrap().is_empty());
        assert!(package.current_token().is_none());
      }
    }

    let report = registry.build_all(&store);
    assert!(report.is_success());
    assert_eq!(report.built.len(), 5);
    for built in &report.built {
      let tokens = store.list_outputs(built.kind, &built.target).unwrap();
      assert_eq!(tokens, vec![built.token.clone()]);
    }
  }
}

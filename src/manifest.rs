//! Loading and interpreting the YAML package manifest.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::package::AssetKind;

/// One `target: [sources...]` rule parsed from the manifest.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
  /// Output target name, possibly carrying a subdirectory prefix.
  pub target: String,
  /// Source names in concatenation order.
  pub sources: Vec<String>,
}

/// Parsed manifest: ordered packaging rules per asset kind.
#[derive(Debug, Clone, Default)]
pub struct PackageManifest {
  entries: BTreeMap<AssetKind, Vec<ManifestEntry>>,
}

/// Wire shape of the manifest document. Each rule is a single-key mapping so
/// the YAML reads as `- target:` followed by its source list.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RawManifest(BTreeMap<AssetKind, Vec<BTreeMap<String, Vec<String>>>>);

impl PackageManifest {
  /// Load a manifest from disk.
  pub fn load(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path)
      .with_context(|| format!("manifest not found at {}", path.display()))?;
    Self::parse(&content).with_context(|| format!("failed to parse manifest at {}", path.display()))
  }

  /// Parse a manifest document from its YAML text.
  pub fn parse(content: &str) -> Result<Self> {
    let raw: RawManifest =
      serde_yaml::from_str(content).context("failed to parse package manifest YAML")?;

    let mut entries = BTreeMap::new();
    for (kind, rules) in raw.0 {
      let mut converted = Vec::with_capacity(rules.len());
      for rule in rules {
        let mut fields = rule.into_iter();
        match (fields.next(), fields.next()) {
          (Some((target, sources)), None) => converted.push(ManifestEntry { target, sources }),
          _ => {
            return Err(anyhow!(
              "each package rule under `{kind}` must name exactly one target"
            ));
          }
        }
      }
      entries.insert(kind, converted);
    }

    Ok(Self { entries })
  }

  /// Rules declared for `kind`, in manifest order. Empty when the manifest
  /// has no section for the kind.
  pub fn entries(&self, kind: AssetKind) -> &[ManifestEntry] {
    self.entries.get(&kind).map(Vec::as_slice).unwrap_or(&[])
  }
}

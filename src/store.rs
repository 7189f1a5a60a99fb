//! File layer the packager reads sources from and writes outputs to.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::package::AssetKind;

/// A source fragment together with its logical pre-merge path.
#[derive(Debug, Clone)]
pub struct SourceFile {
  /// Raw file content.
  pub content: String,
  /// Location of the pre-merge file relative to the directory the merged
  /// output is written to, e.g. `vendor/jquery/ui.css`.
  pub path: String,
}

/// Storage seam between the packager core and the filesystem.
///
/// Tests and alternative hosts can substitute their own implementation; the
/// core never touches the disk directly.
pub trait AssetStore {
  /// Read one source fragment. `target_dir` is the subdirectory prefix of
  /// the owning target, empty for root-level targets.
  fn read_source(&self, kind: AssetKind, target_dir: &str, name: &str) -> Result<SourceFile>;

  /// Write a packaged output for `target` under the given token.
  fn write_output(&self, kind: AssetKind, target: &str, token: &str, content: &str) -> Result<()>;

  /// Tokens of the packaged outputs currently present for `target`.
  fn list_outputs(&self, kind: AssetKind, target: &str) -> Result<Vec<String>>;

  /// Remove a single packaged output.
  fn remove_output(&self, kind: AssetKind, target: &str, token: &str) -> Result<()>;
}

/// Disk-backed store rooted at the public asset directory, which holds one
/// subdirectory per [`AssetKind`].
#[derive(Debug, Clone)]
pub struct DiskAssetStore {
  root: PathBuf,
}

impl DiskAssetStore {
  /// Create a store rooted at `root`.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn kind_dir(&self, kind: AssetKind) -> PathBuf {
    self.root.join(kind.dir_name())
  }

  fn output_path(&self, kind: AssetKind, target: &str, token: &str) -> PathBuf {
    self
      .kind_dir(kind)
      .join(format!("{target}_packaged-{token}.{}", kind.extension()))
  }
}

impl AssetStore for DiskAssetStore {
  fn read_source(&self, kind: AssetKind, target_dir: &str, name: &str) -> Result<SourceFile> {
    let relative = format!("{name}.{}", kind.extension());
    let mut path = self.kind_dir(kind);
    if !target_dir.is_empty() {
      path.push(target_dir);
    }
    path.push(&relative);

    let content = fs::read_to_string(&path)
      .with_context(|| format!("failed to read source at {}", path.display()))?;
    Ok(SourceFile {
      content,
      path: relative,
    })
  }

  fn write_output(&self, kind: AssetKind, target: &str, token: &str, content: &str) -> Result<()> {
    let path = self.output_path(kind, target, token);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)
        .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }
    fs::write(&path, content).with_context(|| format!("failed to write {}", path.display()))
  }

  fn list_outputs(&self, kind: AssetKind, target: &str) -> Result<Vec<String>> {
    let (dir, stem) = match target.rsplit_once('/') {
      Some((sub, name)) => (self.kind_dir(kind).join(sub), name),
      None => (self.kind_dir(kind), target),
    };
    if !dir.is_dir() {
      return Ok(Vec::new());
    }

    let prefix = format!("{stem}_packaged-");
    let suffix = format!(".{}", kind.extension());
    let mut tokens = Vec::new();

    for entry in
      fs::read_dir(&dir).with_context(|| format!("failed to read {}", dir.display()))?
    {
      let entry = entry?;
      if !entry.file_type()?.is_file() {
        continue;
      }

      let file_name = entry.file_name();
      let Some(name) = file_name.to_str() else {
        continue;
      };

      if let Some(token) = name
        .strip_prefix(&prefix)
        .and_then(|rest| rest.strip_suffix(&suffix))
      {
        tokens.push(token.to_string());
      }
    }

    tokens.sort();
    Ok(tokens)
  }

  fn remove_output(&self, kind: AssetKind, target: &str, token: &str) -> Result<()> {
    let path = self.output_path(kind, target, token);
    fs::remove_file(&path).with_context(|| format!("failed to remove {}", path.display()))
  }
}

//! Builds a single package: read sources, rewrite stylesheet URLs,
//! concatenate and emit the merged output.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::package::{AssetKind, PackageDefinition};
use crate::rewrite::rewrite_stylesheet_urls;
use crate::store::AssetStore;

/// Hex characters of the content hash kept in the output token.
const TOKEN_LEN: usize = 12;

/// Identity of one successfully built package.
#[derive(Debug, Clone)]
pub struct BuiltPackage {
  /// Asset kind of the built package.
  pub kind: AssetKind,
  /// Target name of the built package.
  pub target: String,
  /// Fresh output token embedded in the written file name.
  pub token: String,
}

/// A definition that failed to build. The rest of the run continued.
#[derive(Debug)]
pub struct BuildFailure {
  /// Asset kind of the failed package.
  pub kind: AssetKind,
  /// Target name of the failed package.
  pub target: String,
  /// What went wrong.
  pub error: anyhow::Error,
}

/// Aggregated outcome of a full registry rebuild.
#[derive(Debug, Default)]
pub struct BuildReport {
  /// Packages built during the run, in build order.
  pub built: Vec<BuiltPackage>,
  /// Definitions that failed, each scoped to its own error.
  pub failures: Vec<BuildFailure>,
}

impl BuildReport {
  /// True when every definition built.
  pub fn is_success(&self) -> bool {
    self.failures.is_empty()
  }
}

/// Build one definition's merged output and return the fresh token.
///
/// Previously built outputs for the same target are pruned only after the new
/// file is written, so a failed build leaves the last good output in place.
pub fn build_package(package: &mut PackageDefinition, store: &impl AssetStore) -> Result<String> {
  let mut fragments = Vec::with_capacity(package.sources().len());
  for name in package.sources() {
    let source = store
      .read_source(package.kind(), package.target_dir(), name)
      .with_context(|| {
        format!(
          "failed to read source `{name}` for target `{}`",
          package.target()
        )
      })?;

    let fragment = match package.kind() {
      AssetKind::Stylesheets => rewrite_stylesheet_urls(&source.content, &source.path),
      AssetKind::Javascripts => source.content,
    };
    fragments.push(fragment);
  }

  // Newline boundaries keep line-terminated statements in adjacent
  // fragments from running together.
  let merged = fragments.join("\n");
  let token = content_token(&merged);

  let stale = store.list_outputs(package.kind(), package.target())?;
  store.write_output(package.kind(), package.target(), &token, &merged)?;
  for old in stale {
    if old != token {
      store.remove_output(package.kind(), package.target(), &old)?;
    }
  }

  package.set_current_token(&token);
  Ok(token)
}

fn content_token(content: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(content.as_bytes());
  let digest = format!("{:x}", hasher.finalize());
  digest[..TOKEN_LEN].to_string()
}

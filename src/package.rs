//! Core data model for asset packages.

use serde::Deserialize;

/// Asset categories the packager understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
  /// JavaScript sources merged into `.js` packages.
  Javascripts,
  /// Stylesheet sources merged into `.css` packages, with URL rewriting.
  Stylesheets,
}

impl AssetKind {
  /// Directory name holding assets of this kind, also the manifest key.
  pub fn dir_name(self) -> &'static str {
    match self {
      Self::Javascripts => "javascripts",
      Self::Stylesheets => "stylesheets",
    }
  }

  /// File extension shared by sources and packaged outputs of this kind.
  pub fn extension(self) -> &'static str {
    match self {
      Self::Javascripts => "js",
      Self::Stylesheets => "css",
    }
  }

  /// Every kind, in build order.
  pub fn all() -> [AssetKind; 2] {
    [Self::Javascripts, Self::Stylesheets]
  }
}

impl std::fmt::Display for AssetKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.dir_name())
  }
}

impl std::str::FromStr for AssetKind {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value {
      "javascripts" => Ok(Self::Javascripts),
      "stylesheets" => Ok(Self::Stylesheets),
      other => Err(format!(
        "unknown asset kind `{other}`, expected `javascripts` or `stylesheets`"
      )),
    }
  }
}

/// One packaging rule: a single output target built from ordered sources.
///
/// Definitions are constructed once from the manifest and stay read-only
/// afterwards, except for the output token recorded by a successful build.
#[derive(Debug, Clone)]
pub struct PackageDefinition {
  kind: AssetKind,
  target: String,
  sources: Vec<String>,
  current_token: Option<String>,
}

impl PackageDefinition {
  /// Create an unbuilt definition.
  pub fn new(kind: AssetKind, target: impl Into<String>, sources: Vec<String>) -> Self {
    Self {
      kind,
      target: target.into(),
      sources,
      current_token: None,
    }
  }

  /// Asset kind this definition belongs to.
  pub fn kind(&self) -> AssetKind {
    self.kind
  }

  /// Logical output name, unique within a kind. May carry a subdirectory
  /// prefix such as `subdir/styles`.
  pub fn target(&self) -> &str {
    &self.target
  }

  /// Source names in concatenation order.
  pub fn sources(&self) -> &[String] {
    &self.sources
  }

  /// Subdirectory prefix of the target, empty for root-level targets.
  ///
  /// Sources are resolved beneath this directory, which is also where the
  /// merged output is written.
  pub fn target_dir(&self) -> &str {
    match self.target.rsplit_once('/') {
      Some((dir, _)) => dir,
      None => "",
    }
  }

  /// Output name stem relative to the kind directory, without token or
  /// extension: `subdir/styles` becomes `subdir/styles_packaged`.
  pub fn packaged_stem(&self) -> String {
    format!("{}_packaged", self.target)
  }

  /// Token recorded by the most recent successful build, if any.
  pub fn current_token(&self) -> Option<&str> {
    self.current_token.as_deref()
  }

  /// File name (relative to the kind directory, without extension) of the
  /// currently built output. `None` until the definition has been built.
  pub fn current_file(&self) -> Option<String> {
    self
      .current_token
      .as_deref()
      .map(|token| format!("{}-{token}", self.packaged_stem()))
  }

  pub(crate) fn set_current_token(&mut self, token: impl Into<String>) {
    self.current_token = Some(token.into());
  }

  pub(crate) fn clear_current_token(&mut self) {
    self.current_token = None;
  }
}

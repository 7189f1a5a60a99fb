//! Relative URL rewriting for concatenated stylesheet fragments.

use regex::{Captures, Regex};

/// Matches `url(...)` with anything but a closing parenthesis inside. The
/// rewriter is deliberately conservative: anything this pattern does not
/// match passes through byte-identical.
const URL_PATTERN: &str = r"url\(([^)]*)\)";

/// Rewrite every relative `url(...)` reference in a stylesheet fragment so it
/// stays valid once the fragment is concatenated into a merged file.
///
/// `source_path` is the pre-merge location of the fragment relative to the
/// directory the merged output is written to. Its directory component is
/// prepended to each relative reference without collapsing `.` or `..`
/// segments; the browser resolves those at load time. Root-relative and
/// scheme-prefixed references are left untouched, as is any whitespace
/// immediately inside the parentheses.
pub fn rewrite_stylesheet_urls(content: &str, source_path: &str) -> String {
  let pattern = Regex::new(URL_PATTERN).expect("invalid url regex");
  let dir = source_dir(source_path);

  pattern
    .replace_all(content, |caps: &Captures<'_>| {
      let inner = &caps[1];
      let value = inner.trim();
      if value.is_empty() || is_absolute_reference(value) {
        return caps[0].to_string();
      }

      let lead = &inner[..inner.len() - inner.trim_start().len()];
      let trail = &inner[inner.trim_end().len()..];
      format!("url({lead}{dir}/{value}{trail})")
    })
    .into_owned()
}

/// Directory component of a source path, `.` when there is none.
fn source_dir(source_path: &str) -> &str {
  match source_path.rsplit_once('/') {
    Some((dir, _)) if !dir.is_empty() => dir,
    _ => ".",
  }
}

fn is_absolute_reference(value: &str) -> bool {
  if value.starts_with('/') {
    return true;
  }

  // Scheme-prefixed references (http:, https:, data:, ...) stay untouched.
  let Some(colon) = value.find(':') else {
    return false;
  };
  let scheme = &value[..colon];
  let mut chars = scheme.chars();
  matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
    && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

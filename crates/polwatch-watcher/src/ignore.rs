//! The ignore list — item names operators have asked watchers to skip.

/// Case-insensitive prefix patterns. An item whose name starts with any
/// pattern is skipped during a sweep.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
  patterns: Vec<String>,
}

impl IgnoreList {
  pub fn new(patterns: impl IntoIterator<Item = String>) -> Self {
    Self {
      patterns: patterns.into_iter().map(|p| p.to_lowercase()).collect(),
    }
  }

  pub fn is_empty(&self) -> bool { self.patterns.is_empty() }

  pub fn matches(&self, name: &str) -> bool {
    let name = name.to_lowercase();
    self.patterns.iter().any(|pattern| name.starts_with(pattern))
  }
}

#[cfg(test)]
mod tests {
  use super::IgnoreList;

  #[test]
  fn empty_list_matches_nothing() {
    assert!(!IgnoreList::default().matches("anything"));
  }

  #[test]
  fn prefix_match_is_case_insensitive() {
    let ignore = IgnoreList::new(["Legacy-".to_string()]);
    assert!(ignore.matches("legacy-billing-role"));
    assert!(ignore.matches("LEGACY-admin"));
    assert!(!ignore.matches("billing-legacy"));
  }
}

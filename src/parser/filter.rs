use crate::export::Record;
use crate::paginator::PostMap;

use super::fields;

const INCLUDE_PREFIXES: &[&str] = &["**Дебетовые", "**Обращение в top-deposit"];
const EXCLUDE_PREFIXES: &[&str] = &["**Дебетовые карты - WEB", "**Дебетовые карты - Мобильный банк"];

/// Selects workflow posts by the opening of their text: a post must start
/// with an include prefix and must not start with any exclude prefix.
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self::new(INCLUDE_PREFIXES, EXCLUDE_PREFIXES)
    }
}

impl CategoryFilter {
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Self {
        Self {
            include: include.iter().map(|s| s.as_ref().to_string()).collect(),
            exclude: exclude.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.include.iter().any(|p| text.starts_with(p.as_str()))
            && !self.exclude.iter().any(|p| text.starts_with(p.as_str()))
    }

    /// Extract a record for every matching post, in map order.
    pub fn filter(&self, posts: &PostMap) -> Vec<Record> {
        posts
            .values()
            .filter(|p| self.matches(&p.message))
            .map(fields::extract)
            .collect()
    }
}

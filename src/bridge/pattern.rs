//! URL match patterns for `closeTabs`

use regex::Regex;

use crate::core::error::{Result, TabError};

/// Glob over whole URLs: `*` matches any run of characters, everything else
/// is literal.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    regex: Regex,
}

impl UrlPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.trim().is_empty() {
            return Err(TabError::CommandFailed("empty url pattern".into()));
        }
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = Regex::new(&format!("^{}$", body))
            .map_err(|e| TabError::CommandFailed(format!("bad url pattern {:?}: {}", pattern, e)))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

//! Command resolution - turns command text into an action plan
//!
//! A small closed set of canned phrases resolves locally against the current
//! tabs without touching the network. Everything else is handed to the
//! interpreter, which answers with a complete replacement tab set.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::command::plan::{ActionPlan, TabMutation};
use crate::core::types::{Category, Tab};
use crate::tabs::grouping::group_by_category;

/// Outcome of resolving one command
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Blank input; nothing to dispatch
    Empty,
    /// Canned phrase resolved against the current tabs
    Local(ActionPlan),
    /// Free text for the interpreter
    Remote(RemoteCommand),
}

/// Body of an interpreter update request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCommand {
    pub command: String,
    pub current_tabs: Vec<Tab>,
}

/// Canned phrases understood without the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalPattern {
    CloseCategory(Category),
    CloseDuplicates,
    CloseDistractions,
    GroupCategory(Category),
    GroupByCategory,
}

const DUPLICATE_PHRASES: &[&str] = &[
    "close duplicate tabs",
    "merge duplicate tabs",
    "find duplicate tabs",
    "close duplicates",
    "merge duplicates",
];

const DISTRACTION_PHRASES: &[&str] = &["close distractions", "close distraction tabs"];

const ORGANIZE_PHRASES: &[&str] = &["group tabs by category", "auto-organize"];

fn close_category_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^close all (\w+) tabs$").expect("static regex"))
}

fn group_category_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^group (?:all )?(\w+?)(?:-related)? tabs$").expect("static regex")
    })
}

/// Trim, collapse inner whitespace and lowercase
pub fn normalize_command(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl LocalPattern {
    /// Match normalized command text against the canned phrases
    pub fn recognize(normalized: &str) -> Option<Self> {
        if DUPLICATE_PHRASES.contains(&normalized) {
            return Some(LocalPattern::CloseDuplicates);
        }
        if DISTRACTION_PHRASES.contains(&normalized) {
            return Some(LocalPattern::CloseDistractions);
        }
        if ORGANIZE_PHRASES.contains(&normalized) {
            return Some(LocalPattern::GroupByCategory);
        }
        if let Some(caps) = close_category_re().captures(normalized) {
            return Category::parse_name(&caps[1]).map(LocalPattern::CloseCategory);
        }
        if let Some(caps) = group_category_re().captures(normalized) {
            return Category::parse_name(&caps[1]).map(LocalPattern::GroupCategory);
        }
        None
    }

    /// Instantiate the pattern's plan template over `tabs`
    pub fn plan(self, tabs: &[Tab]) -> ActionPlan {
        match self {
            LocalPattern::CloseCategory(category) => {
                ActionPlan::close_all(tabs.iter().filter(|t| t.category == category).map(|t| &t.id))
            }
            LocalPattern::CloseDuplicates => {
                ActionPlan::close_all(tabs.iter().filter(|t| t.flags.duplicate).map(|t| &t.id))
            }
            LocalPattern::CloseDistractions => {
                ActionPlan::close_all(tabs.iter().filter(|t| t.flags.distraction).map(|t| &t.id))
            }
            LocalPattern::GroupCategory(category) => {
                let ids: Vec<_> = tabs
                    .iter()
                    .filter(|t| t.category == category)
                    .map(|t| t.id.clone())
                    .collect();
                if ids.is_empty() {
                    ActionPlan::new()
                } else {
                    std::iter::once(TabMutation::Group {
                        ids,
                        label: category.name().to_string(),
                    })
                    .collect()
                }
            }
            LocalPattern::GroupByCategory => group_by_category(tabs)
                .into_iter()
                .map(|g| TabMutation::Group {
                    ids: g.tabs.iter().map(|t| t.id.clone()).collect(),
                    label: g.category.name().to_string(),
                })
                .collect(),
        }
    }
}

/// Resolves command text against a snapshot of the current tabs
pub struct CommandResolver<'a> {
    tabs: &'a [Tab],
}

impl<'a> CommandResolver<'a> {
    pub fn new(tabs: &'a [Tab]) -> Self {
        Self { tabs }
    }

    pub fn resolve(&self, text: &str) -> Resolution {
        let normalized = normalize_command(text);
        if normalized.is_empty() {
            return Resolution::Empty;
        }

        match LocalPattern::recognize(&normalized) {
            Some(pattern) => {
                tracing::debug!(?pattern, "Resolved command locally");
                Resolution::Local(pattern.plan(self.tabs))
            }
            None => Resolution::Remote(RemoteCommand {
                command: text.trim().to_string(),
                current_tabs: self.tabs.to_vec(),
            }),
        }
    }
}

/// Resolve `text` against `tabs`
pub fn resolve(text: &str, tabs: &[Tab]) -> Resolution {
    CommandResolver::new(tabs).resolve(text)
}

/// True when `text` is one of the canned phrases
pub fn is_local(text: &str) -> bool {
    LocalPattern::recognize(&normalize_command(text)).is_some()
}

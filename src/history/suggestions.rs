//! Smart suggestions and command completion
//!
//! Suggestions are derived from tab counts alone and always carry a canned
//! phrase, so acting on one resolves locally.

use crate::core::types::{Category, Tab};
use crate::tabs::classifier::TabStats;

pub const DEFAULT_MAX_SUGGESTIONS: usize = 4;

const MAX_COMPLETIONS: usize = 4;

/// Commands offered while typing
pub const EXAMPLE_COMMANDS: &[&str] = &[
    "Close all YouTube tabs",
    "Group all work-related tabs",
    "Find duplicate tabs",
    "Close distractions",
    "Close all shopping tabs",
    "Group tabs by category",
    "Close tabs I haven't used in 30 minutes",
    "Bookmark all research tabs",
    "Group tabs by domain",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Duplicates,
    Distractions,
    Focus,
    Organize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub message: String,
    pub command: String,
    pub count: usize,
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Up to `max` suggestions for the current tab set
pub fn suggestions(tabs: &[Tab], max: usize) -> Vec<Suggestion> {
    let stats = TabStats::from_tabs(tabs);
    let mut out = Vec::new();

    if stats.duplicates > 0 {
        out.push(Suggestion {
            kind: SuggestionKind::Duplicates,
            message: format!("Merge {} duplicate tab{}", stats.duplicates, plural(stats.duplicates)),
            command: "close duplicate tabs".into(),
            count: stats.duplicates,
        });
    }

    if stats.distractions > 0 {
        out.push(Suggestion {
            kind: SuggestionKind::Distractions,
            message: format!(
                "Close {} distracting tab{}",
                stats.distractions,
                plural(stats.distractions)
            ),
            command: "close distractions".into(),
            count: stats.distractions,
        });
    }

    let entertainment = stats.count(Category::Entertainment);
    if entertainment > 0 && stats.count(Category::Work) > 0 {
        out.push(Suggestion {
            kind: SuggestionKind::Focus,
            message: format!(
                "Close {} entertainment tab{} to focus on work",
                entertainment,
                plural(entertainment)
            ),
            command: "close all entertainment tabs".into(),
            count: entertainment,
        });
    }

    // Ties go to the earlier category in the fixed order
    let largest = Category::ALL
        .into_iter()
        .map(|c| (c, stats.count(c)))
        .filter(|(_, n)| *n >= 2)
        .fold(None, |best: Option<(Category, usize)>, (c, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((c, n)),
        });
    if let Some((category, count)) = largest {
        out.push(Suggestion {
            kind: SuggestionKind::Organize,
            message: format!("Group {} {} tabs together", count, category.name().to_lowercase()),
            command: format!("group {} tabs", category.name().to_lowercase()),
            count,
        });
    }

    out.truncate(max);
    out
}

/// Example commands containing `input`, case-insensitively
pub fn complete(input: &str) -> Vec<&'static str> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    EXAMPLE_COMMANDS
        .iter()
        .copied()
        .filter(|cmd| cmd.to_lowercase().contains(&needle))
        .take(MAX_COMPLETIONS)
        .collect()
}

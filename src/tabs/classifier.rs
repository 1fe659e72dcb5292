//! Duplicate and distraction flagging
//!
//! Classification is a pure function of the tab set. Categories come from the
//! interpreter and are never re-derived here; the classifier only recomputes
//! the Duplicate and Distraction flags so repeated runs agree with each other.

use ahash::AHashMap;

use crate::core::types::{Category, Tab, TabId};
use crate::tabs::url::normalize_url;

/// Recompute derived flags in place.
///
/// Among tabs sharing a normalized URL the lexicographically smallest id is
/// canonical; every other member is a Duplicate. Distraction follows the
/// category alone. The Active flag is left as reported by the browser.
pub fn classify(tabs: &mut [Tab]) {
    let keys: Vec<String> = tabs.iter().map(|t| normalize_url(&t.url)).collect();

    let mut canonical: AHashMap<&str, &TabId> = AHashMap::new();
    for (tab, key) in tabs.iter().zip(&keys) {
        canonical
            .entry(key.as_str())
            .and_modify(|id| {
                if tab.id < **id {
                    *id = &tab.id;
                }
            })
            .or_insert(&tab.id);
    }

    let duplicate: Vec<bool> = tabs
        .iter()
        .zip(&keys)
        .map(|(tab, key)| canonical.get(key.as_str()).is_some_and(|id| **id != tab.id))
        .collect();

    for (tab, is_duplicate) in tabs.iter_mut().zip(duplicate) {
        tab.flags.duplicate = is_duplicate;
        tab.flags.distraction = tab.category.is_distraction();
    }
}

/// Owned variant of [`classify`]
pub fn classified(mut tabs: Vec<Tab>) -> Vec<Tab> {
    classify(&mut tabs);
    tabs
}

/// Counts used by suggestions and status lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabStats {
    pub total: usize,
    pub duplicates: usize,
    pub distractions: usize,
    pub by_category: AHashMap<Category, usize>,
}

impl TabStats {
    pub fn from_tabs(tabs: &[Tab]) -> Self {
        let mut stats = TabStats {
            total: tabs.len(),
            ..Default::default()
        };
        for tab in tabs {
            if tab.flags.duplicate {
                stats.duplicates += 1;
            }
            if tab.flags.distraction {
                stats.distractions += 1;
            }
            *stats.by_category.entry(tab.category).or_default() += 1;
        }
        stats
    }

    pub fn count(&self, category: Category) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

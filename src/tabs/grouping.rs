//! Read-only projection of the registry into category groups

use crate::core::types::{Category, Tab};

/// Tabs sharing a category, in registry order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabGroup<'a> {
    pub category: Category,
    pub icon: &'static str,
    pub tabs: Vec<&'a Tab>,
}

/// Group tabs by category.
///
/// Groups appear in order of each category's first tab; tabs keep registry
/// order within a group. Every tab lands in exactly one group.
pub fn group_by_category(tabs: &[Tab]) -> Vec<TabGroup<'_>> {
    let mut groups: Vec<TabGroup<'_>> = Vec::new();
    for tab in tabs {
        match groups.iter_mut().find(|g| g.category == tab.category) {
            Some(group) => group.tabs.push(tab),
            None => groups.push(TabGroup {
                category: tab.category,
                icon: tab.category.icon(),
                tabs: vec![tab],
            }),
        }
    }
    groups
}

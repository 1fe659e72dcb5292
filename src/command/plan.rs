//! Action plans - ordered tab mutations produced by resolution

use crate::core::types::{Category, TabId};

/// A single change to the tab set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabMutation {
    Close(TabId),
    SetCategory(TabId, Category),
    Group { ids: Vec<TabId>, label: String },
}

/// Ordered list of mutations, consumed once by the executor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionPlan {
    mutations: Vec<TabMutation>,
}

impl ActionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan that closes each id in order
    pub fn close_all<'a>(ids: impl IntoIterator<Item = &'a TabId>) -> Self {
        Self {
            mutations: ids.into_iter().cloned().map(TabMutation::Close).collect(),
        }
    }

    pub fn push(&mut self, mutation: TabMutation) {
        self.mutations.push(mutation);
    }

    pub fn mutations(&self) -> &[TabMutation] {
        &self.mutations
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Ids targeted by `Close` mutations, in plan order
    pub fn closed_ids(&self) -> impl Iterator<Item = &TabId> {
        self.mutations.iter().filter_map(|m| match m {
            TabMutation::Close(id) => Some(id),
            _ => None,
        })
    }
}

impl IntoIterator for ActionPlan {
    type Item = TabMutation;
    type IntoIter = std::vec::IntoIter<TabMutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.mutations.into_iter()
    }
}

impl FromIterator<TabMutation> for ActionPlan {
    fn from_iter<I: IntoIterator<Item = TabMutation>>(iter: I) -> Self {
        Self {
            mutations: iter.into_iter().collect(),
        }
    }
}

//! Tab registry - canonical, ordered store of open tabs
//!
//! The registry owns every [`Tab`]. Reads see tabs in arrival order and every
//! mutation re-runs the classifier before returning, so flags are always
//! current by the time anyone looks.

use ahash::{AHashMap, AHashSet};

use crate::core::error::{Result, TabError};
use crate::core::types::{Category, Tab, TabId};
use crate::tabs::classifier::classify;

#[derive(Debug, Default, Clone)]
pub struct TabRegistry {
    tabs: Vec<Tab>,
    /// id -> position in `tabs`
    index: AHashMap<TabId, usize>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an initial tab set
    pub fn with_tabs(tabs: Vec<Tab>) -> Self {
        let mut registry = Self::new();
        registry.upsert(tabs);
        registry
    }

    /// Current tabs in arrival order
    pub fn list(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn contains(&self, id: &TabId) -> bool {
        self.index.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &TabId> {
        self.tabs.iter().map(|t| &t.id)
    }

    pub fn get(&self, id: &TabId) -> Result<&Tab> {
        self.index
            .get(id)
            .map(|&i| &self.tabs[i])
            .ok_or_else(|| TabError::NotFound(id.clone()))
    }

    /// Replace the whole tab set.
    ///
    /// This is a full replace, so anything absent from `tabs` is gone
    /// afterwards. A repeated id keeps its first occurrence.
    pub fn upsert(&mut self, tabs: Vec<Tab>) {
        let mut seen = AHashSet::with_capacity(tabs.len());
        let mut kept = Vec::with_capacity(tabs.len());
        for tab in tabs {
            if seen.insert(tab.id.clone()) {
                kept.push(tab);
            } else {
                tracing::warn!(id = %tab.id, url = %tab.url, "Dropping tab with repeated id");
            }
        }
        self.tabs = kept;
        self.refresh();
    }

    /// Remove tabs by id. Unknown ids are ignored.
    pub fn remove(&mut self, ids: &[TabId]) {
        if !ids.iter().any(|id| self.index.contains_key(id)) {
            return;
        }
        let doomed: AHashSet<&TabId> = ids.iter().collect();
        self.tabs.retain(|t| !doomed.contains(&t.id));
        self.refresh();
    }

    pub fn set_category(&mut self, id: &TabId, category: Category) -> Result<()> {
        let &i = self
            .index
            .get(id)
            .ok_or_else(|| TabError::NotFound(id.clone()))?;
        self.tabs[i].category = category;
        self.refresh();
        Ok(())
    }

    /// Rebuild the index and re-run classification after a mutation
    fn refresh(&mut self) {
        self.index = self
            .tabs
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        classify(&mut self.tabs);
    }
}

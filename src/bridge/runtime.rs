//! Browser tab primitives behind the bridge

use std::sync::{Arc, Mutex, MutexGuard};

use ahash::AHashMap;
use async_trait::async_trait;

use crate::bridge::pattern::UrlPattern;
use crate::bridge::protocol::BrowserTab;
use crate::core::error::{Result, TabError};
use crate::core::types::TabId;

/// The browser's own tab API, as far as the bridge needs it
#[async_trait]
pub trait BrowserRuntime: Send + Sync {
    /// Tabs whose URL matches `pattern`, or every tab when `None`
    async fn query(&self, pattern: Option<&UrlPattern>) -> Result<Vec<BrowserTab>>;

    async fn remove(&self, ids: &[TabId]) -> Result<()>;

    /// Put tabs into a new group and return its id
    async fn group(&self, ids: &[TabId]) -> Result<u64>;

    async fn set_group_title(&self, group_id: u64, title: &str) -> Result<()>;
}

#[async_trait]
impl<T: BrowserRuntime + ?Sized> BrowserRuntime for Arc<T> {
    async fn query(&self, pattern: Option<&UrlPattern>) -> Result<Vec<BrowserTab>> {
        (**self).query(pattern).await
    }

    async fn remove(&self, ids: &[TabId]) -> Result<()> {
        (**self).remove(ids).await
    }

    async fn group(&self, ids: &[TabId]) -> Result<u64> {
        (**self).group(ids).await
    }

    async fn set_group_title(&self, group_id: u64, title: &str) -> Result<()> {
        (**self).set_group_title(group_id, title).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabGroupInfo {
    pub title: String,
    pub tab_ids: Vec<TabId>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tabs: Vec<BrowserTab>,
    groups: AHashMap<u64, TabGroupInfo>,
    next_group_id: u64,
}

/// In-process browser used by the demo CLI and tests
#[derive(Debug, Default)]
pub struct MemoryBrowser {
    state: Mutex<MemoryState>,
}

impl MemoryBrowser {
    pub fn new(tabs: Vec<BrowserTab>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                tabs,
                groups: AHashMap::new(),
                next_group_id: 1,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn tabs(&self) -> Vec<BrowserTab> {
        self.lock().tabs.clone()
    }

    pub fn group_info(&self, group_id: u64) -> Option<TabGroupInfo> {
        self.lock().groups.get(&group_id).cloned()
    }

    pub fn open(&self, tab: BrowserTab) {
        self.lock().tabs.push(tab);
    }
}

#[async_trait]
impl BrowserRuntime for MemoryBrowser {
    async fn query(&self, pattern: Option<&UrlPattern>) -> Result<Vec<BrowserTab>> {
        let state = self.lock();
        Ok(state
            .tabs
            .iter()
            .filter(|t| pattern.map_or(true, |p| p.matches(&t.url)))
            .cloned()
            .collect())
    }

    async fn remove(&self, ids: &[TabId]) -> Result<()> {
        let mut state = self.lock();
        state.tabs.retain(|t| !ids.contains(&t.id));
        for group in state.groups.values_mut() {
            group.tab_ids.retain(|id| !ids.contains(id));
        }
        state.groups.retain(|_, g| !g.tab_ids.is_empty());
        Ok(())
    }

    async fn group(&self, ids: &[TabId]) -> Result<u64> {
        let mut state = self.lock();
        if ids.is_empty() {
            return Err(TabError::CommandFailed("no tabs to group".into()));
        }
        if let Some(missing) = ids.iter().find(|id| !state.tabs.iter().any(|t| &t.id == *id)) {
            return Err(TabError::NotFound(missing.clone()));
        }

        // A tab belongs to at most one group
        for group in state.groups.values_mut() {
            group.tab_ids.retain(|id| !ids.contains(id));
        }
        state.groups.retain(|_, g| !g.tab_ids.is_empty());

        let group_id = state.next_group_id;
        state.next_group_id += 1;
        state.groups.insert(
            group_id,
            TabGroupInfo {
                title: String::new(),
                tab_ids: ids.to_vec(),
            },
        );
        Ok(group_id)
    }

    async fn set_group_title(&self, group_id: u64, title: &str) -> Result<()> {
        let mut state = self.lock();
        let group = state
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| TabError::CommandFailed(format!("no tab group {}", group_id)))?;
        group.title = title.to_string();
        Ok(())
    }
}

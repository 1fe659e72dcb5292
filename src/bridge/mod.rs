//! Browser-control bridge
//!
//! The bridge exposes three tab primitives (close by id or URL pattern,
//! group, list) to trusted local callers over message passing. [`TabControl`] is the
//! capability the rest of the crate sees; [`BridgeClient`] implements it on
//! top of a running [`BridgeService`].

pub mod client;
pub mod pattern;
pub mod protocol;
pub mod runtime;
pub mod service;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::core::types::TabId;

pub use client::BridgeClient;
pub use pattern::UrlPattern;
pub use protocol::{BridgeRequest, BridgeResponse, BrowserTab};
pub use runtime::{BrowserRuntime, MemoryBrowser};
pub use service::{origin_allowed, BridgeHandle, BridgeService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupResult {
    pub group_id: u64,
    pub tab_count: usize,
}

/// Real-browser side effects the executor and controller may request
#[async_trait]
pub trait TabControl: Send + Sync {
    /// Close every tab whose URL matches `pattern`; returns how many closed
    async fn close_tabs(&self, pattern: &str) -> Result<usize>;

    /// Close exactly these tabs; returns how many the browser still had
    async fn close_tab_ids(&self, ids: &[TabId]) -> Result<usize>;

    async fn group_tabs(&self, ids: &[TabId], label: &str) -> Result<GroupResult>;

    async fn get_tabs(&self) -> Result<Vec<BrowserTab>>;
}

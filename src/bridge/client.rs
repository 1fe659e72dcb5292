//! Typed client over a [`BridgeHandle`]

use async_trait::async_trait;

use crate::bridge::protocol::{BridgeRequest, BridgeResponse, BrowserTab};
use crate::bridge::service::BridgeHandle;
use crate::bridge::{GroupResult, TabControl};
use crate::core::error::Result;
use crate::core::types::TabId;

/// Talks to the bridge on behalf of one origin
#[derive(Debug, Clone)]
pub struct BridgeClient {
    handle: BridgeHandle,
    origin: String,
}

impl BridgeClient {
    pub fn new(handle: BridgeHandle, origin: impl Into<String>) -> Self {
        Self {
            handle,
            origin: origin.into(),
        }
    }

    async fn call(&self, request: BridgeRequest) -> Result<BridgeResponse> {
        self.handle.send(&self.origin, request.to_value()).await
    }
}

#[async_trait]
impl TabControl for BridgeClient {
    async fn close_tabs(&self, pattern: &str) -> Result<usize> {
        match self
            .call(BridgeRequest::CloseTabs {
                pattern: Some(pattern.to_string()),
                tab_ids: None,
            })
            .await?
        {
            BridgeResponse::Closed { closed_count } => Ok(closed_count),
            other => Err(other.into_error()),
        }
    }

    async fn close_tab_ids(&self, ids: &[TabId]) -> Result<usize> {
        match self
            .call(BridgeRequest::CloseTabs {
                pattern: None,
                tab_ids: Some(ids.to_vec()),
            })
            .await?
        {
            BridgeResponse::Closed { closed_count } => Ok(closed_count),
            other => Err(other.into_error()),
        }
    }

    async fn group_tabs(&self, ids: &[TabId], label: &str) -> Result<GroupResult> {
        match self
            .call(BridgeRequest::GroupTabs {
                tab_ids: ids.to_vec(),
                group_name: label.to_string(),
            })
            .await?
        {
            BridgeResponse::Grouped {
                group_id,
                tab_count,
            } => Ok(GroupResult {
                group_id,
                tab_count,
            }),
            other => Err(other.into_error()),
        }
    }

    async fn get_tabs(&self) -> Result<Vec<BrowserTab>> {
        match self.call(BridgeRequest::GetTabs).await? {
            BridgeResponse::Tabs(tabs) => Ok(tabs),
            other => Err(other.into_error()),
        }
    }
}

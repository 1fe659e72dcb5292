//! Bridge service - origin-checked message handler around a browser runtime
//!
//! Callers post an envelope (origin, JSON payload, reply slot) onto a channel.
//! Requests from origins outside the allow-list are dropped together with
//! their reply slot, so the sender simply never hears back.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use url::Url;

use crate::bridge::pattern::UrlPattern;
use crate::bridge::protocol::{BridgeRequest, BridgeResponse};
use crate::bridge::runtime::BrowserRuntime;
use crate::core::error::{Result, TabError};

/// One request in flight to the bridge
#[derive(Debug)]
pub struct BridgeEnvelope {
    pub origin: String,
    pub payload: Value,
    pub reply: oneshot::Sender<BridgeResponse>,
}

/// True when `origin` is an http(s) URL whose host is in `allowed_hosts`
pub fn origin_allowed(origin: &str, allowed_hosts: &[String]) -> bool {
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    allowed_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
}

pub struct BridgeService<R> {
    runtime: R,
    allowed_hosts: Vec<String>,
}

impl<R: BrowserRuntime> BridgeService<R> {
    pub fn new(runtime: R, allowed_hosts: Vec<String>) -> Self {
        Self {
            runtime,
            allowed_hosts,
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Handle one request; `None` means the origin was rejected
    pub async fn handle(&self, origin: &str, payload: &Value) -> Option<BridgeResponse> {
        if !origin_allowed(origin, &self.allowed_hosts) {
            warn!(origin, "Rejected bridge request from untrusted origin");
            return None;
        }

        Some(match self.dispatch(payload).await {
            Ok(response) => response,
            Err(e) => {
                warn!(origin, error = %e, "Bridge request failed");
                BridgeResponse::from_error(&e)
            }
        })
    }

    async fn dispatch(&self, payload: &Value) -> Result<BridgeResponse> {
        match BridgeRequest::from_value(payload)? {
            BridgeRequest::CloseTabs {
                tab_ids: Some(tab_ids),
                ..
            } => {
                // Only ids the browser still has count as closed
                let ids: Vec<_> = self
                    .runtime
                    .query(None)
                    .await?
                    .into_iter()
                    .map(|t| t.id)
                    .filter(|id| tab_ids.contains(id))
                    .collect();
                if !ids.is_empty() {
                    self.runtime.remove(&ids).await?;
                }
                debug!(requested = tab_ids.len(), closed = ids.len(), "closeTabs by id");
                Ok(BridgeResponse::Closed {
                    closed_count: ids.len(),
                })
            }
            BridgeRequest::CloseTabs {
                pattern: Some(pattern),
                ..
            } => {
                let pattern = UrlPattern::new(&pattern)?;
                let ids: Vec<_> = self
                    .runtime
                    .query(Some(&pattern))
                    .await?
                    .into_iter()
                    .map(|t| t.id)
                    .collect();
                if !ids.is_empty() {
                    self.runtime.remove(&ids).await?;
                }
                debug!(pattern = pattern.as_str(), closed = ids.len(), "closeTabs");
                Ok(BridgeResponse::Closed {
                    closed_count: ids.len(),
                })
            }
            BridgeRequest::CloseTabs { .. } => Err(TabError::CommandFailed(
                "closeTabs needs pattern or tabIds".into(),
            )),
            BridgeRequest::GroupTabs {
                tab_ids,
                group_name,
            } => {
                let group_id = self.runtime.group(&tab_ids).await?;
                self.runtime.set_group_title(group_id, &group_name).await?;
                debug!(group_id, label = %group_name, count = tab_ids.len(), "groupTabs");
                Ok(BridgeResponse::Grouped {
                    group_id,
                    tab_count: tab_ids.len(),
                })
            }
            BridgeRequest::GetTabs => Ok(BridgeResponse::Tabs(self.runtime.query(None).await?)),
        }
    }
}

impl<R: BrowserRuntime + 'static> BridgeService<R> {
    /// Run the service on its own task and return a handle for sending to it
    pub fn spawn(self) -> BridgeHandle {
        let (tx, mut rx) = mpsc::channel::<BridgeEnvelope>(32);
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                if let Some(response) = self.handle(&envelope.origin, &envelope.payload).await {
                    // The caller may have given up; nothing to do then
                    let _ = envelope.reply.send(response);
                }
            }
            debug!("Bridge channel closed");
        });
        BridgeHandle { tx }
    }
}

/// Sending side of a running bridge
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<BridgeEnvelope>,
}

impl BridgeHandle {
    /// Send a raw payload and wait for the reply
    pub async fn send(&self, origin: &str, payload: Value) -> Result<BridgeResponse> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BridgeEnvelope {
                origin: origin.to_string(),
                payload,
                reply,
            })
            .await
            .map_err(|_| TabError::Network("bridge is not running".into()))?;
        rx.await
            .map_err(|_| TabError::Network("bridge sent no response".into()))
    }
}

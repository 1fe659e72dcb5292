//! Bridge wire messages
//!
//! Requests are JSON objects discriminated by `action`; responses mirror what
//! the browser extension sends back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{Result, TabError};
use crate::core::types::{Tab, TabId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BridgeRequest {
    /// Close exact tabs by id, or every tab whose URL matches `pattern`
    #[serde(rename_all = "camelCase")]
    CloseTabs {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_ids: Option<Vec<TabId>>,
    },
    #[serde(rename_all = "camelCase")]
    GroupTabs {
        tab_ids: Vec<TabId>,
        group_name: String,
    },
    GetTabs,
}

const KNOWN_ACTIONS: &[&str] = &["closeTabs", "groupTabs", "getTabs"];

impl BridgeRequest {
    /// Decode a raw request, separating unknown actions from malformed ones
    pub fn from_value(payload: &Value) -> Result<Self> {
        let action = payload
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or("<missing>");
        if !KNOWN_ACTIONS.contains(&action) {
            return Err(TabError::UnsupportedCommand(action.to_string()));
        }
        let request: Self = serde_json::from_value(payload.clone())
            .map_err(|e| TabError::CommandFailed(format!("malformed {} request: {}", action, e)))?;
        if let BridgeRequest::CloseTabs {
            pattern: None,
            tab_ids: None,
        } = request
        {
            return Err(TabError::CommandFailed(
                "malformed closeTabs request: needs pattern or tabIds".into(),
            ));
        }
        Ok(request)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A tab as the browser reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserTab {
    pub id: TabId,
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(
        default,
        rename = "favIconUrl",
        alias = "faviconUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub fav_icon_url: Option<String>,
}

impl From<BrowserTab> for Tab {
    fn from(b: BrowserTab) -> Self {
        let mut tab = Tab::new(b.id, b.title, b.url);
        tab.favicon = b.fav_icon_url;
        tab
    }
}

/// Machine-readable failure class carried next to the error text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeErrorCode {
    Unsupported,
    NotFound,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    #[serde(rename_all = "camelCase")]
    Closed { closed_count: usize },
    #[serde(rename_all = "camelCase")]
    Grouped { group_id: u64, tab_count: usize },
    Tabs(Vec<BrowserTab>),
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<BridgeErrorCode>,
    },
}

impl BridgeResponse {
    pub fn from_error(err: &TabError) -> Self {
        let code = match err {
            TabError::UnsupportedCommand(_) => BridgeErrorCode::Unsupported,
            TabError::NotFound(_) => BridgeErrorCode::NotFound,
            _ => BridgeErrorCode::Failed,
        };
        BridgeResponse::Error {
            error: err.to_string(),
            code: Some(code),
        }
    }

    /// Turn an error response back into a typed error
    pub fn into_error(self) -> TabError {
        match self {
            BridgeResponse::Error { error, code } => match code {
                Some(BridgeErrorCode::Unsupported) => TabError::UnsupportedCommand(
                    error
                        .strip_prefix("Unsupported command: ")
                        .unwrap_or(&error)
                        .to_string(),
                ),
                _ => TabError::Network(format!("bridge: {}", error)),
            },
            other => TabError::CommandFailed(format!("unexpected bridge response: {:?}", other)),
        }
    }
}

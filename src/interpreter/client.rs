//! Async HTTP client for the natural-language interpreter
//!
//! The interpreter categorizes URLs and rewrites the tab set in response to
//! free-text commands. It always answers with a complete tab list, never a
//! diff.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::command::resolver::RemoteCommand;
use crate::core::config::TabmateConfig;
use crate::core::error::{Result, TabError};
use crate::core::types::Tab;
use crate::interpreter::parser::parse_tab_list;
use crate::interpreter::Interpreter;

/// Interpreter reached over HTTP
pub struct HttpInterpreter {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct CategorizeRequest<'a> {
    urls: &'a [String],
}

enum Endpoint {
    Categorize,
    Update,
}

impl Endpoint {
    fn path(&self) -> &'static str {
        match self {
            Endpoint::Categorize => "/api/categorize",
            Endpoint::Update => "/api/update",
        }
    }
}

impl HttpInterpreter {
    /// Create a new client against `base_url` (scheme, host and port)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &TabmateConfig) -> Self {
        Self::new(config.interpreter_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + ?Sized>(&self, endpoint: Endpoint, body: &B) -> Result<Vec<Tab>> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        tracing::debug!(%url, "Interpreter request");

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| TabError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let cause = format!("{} returned status {}: {}", endpoint.path(), status.as_u16(), error_text.trim());
            return Err(match endpoint {
                Endpoint::Update => TabError::CommandFailed(cause),
                Endpoint::Categorize => TabError::Network(cause),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| TabError::Network(e.to_string()))?;
        parse_tab_list(&text)
    }
}

#[async_trait]
impl Interpreter for HttpInterpreter {
    async fn categorize(&self, urls: &[String]) -> Result<Vec<Tab>> {
        self.post(Endpoint::Categorize, &CategorizeRequest { urls }).await
    }

    async fn update(&self, command: &RemoteCommand) -> Result<Vec<Tab>> {
        self.post(Endpoint::Update, command).await
    }
}

//! Natural-language interpreter access

pub mod client;
pub mod parser;

use async_trait::async_trait;

use crate::command::resolver::RemoteCommand;
use crate::core::error::Result;
use crate::core::types::Tab;

pub use client::HttpInterpreter;
pub use parser::parse_tab_list;

/// External service that labels tabs and rewrites them from free text
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// Categorize a list of URLs into tab records
    async fn categorize(&self, urls: &[String]) -> Result<Vec<Tab>>;

    /// Apply a free-text command; returns the full replacement tab set
    async fn update(&self, command: &RemoteCommand) -> Result<Vec<Tab>>;
}

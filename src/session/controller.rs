//! Drives commands through a shared session
//!
//! The session lock is only taken between network legs, never across an
//! await, so presentation code can read the session while a command is in
//! flight.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::bridge::TabControl;
use crate::command::executor::{ActionExecutor, ExecutionReport};
use crate::core::config::TabmateConfig;
use crate::core::error::{Result, TabError};
use crate::core::types::Tab;
use crate::interpreter::Interpreter;
use crate::session::{Begun, LocalRequest, Session};

/// What a submitted command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input
    Ignored,
    /// Canned command applied incrementally
    Applied(ExecutionReport),
    /// Interpreter replaced the tab set; holds the new tab count
    Replaced(usize),
}

pub struct Controller {
    session: Arc<Mutex<Session>>,
    interpreter: Arc<dyn Interpreter>,
    bridge: Option<Arc<dyn TabControl>>,
    timeout: Duration,
    seed_urls: Vec<String>,
}

impl Controller {
    pub fn new(
        session: Arc<Mutex<Session>>,
        interpreter: Arc<dyn Interpreter>,
        bridge: Option<Arc<dyn TabControl>>,
        timeout: Duration,
    ) -> Self {
        Self {
            session,
            interpreter,
            bridge,
            timeout,
            seed_urls: Vec::new(),
        }
    }

    pub fn from_config(
        config: &TabmateConfig,
        interpreter: Arc<dyn Interpreter>,
        bridge: Option<Arc<dyn TabControl>>,
    ) -> Self {
        let session = Arc::new(Mutex::new(Session::from_config(config)));
        let mut controller = Self::new(session, interpreter, bridge, config.request_timeout());
        controller.seed_urls = config.seed_urls.clone();
        controller
    }

    pub fn with_seed_urls(mut self, urls: Vec<String>) -> Self {
        self.seed_urls = urls;
        self
    }

    pub fn session(&self) -> Arc<Mutex<Session>> {
        Arc::clone(&self.session)
    }

    /// Lock the session, recovering from a poisoned lock
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run one command to completion
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome> {
        let begun = self.lock().begin(text)?;
        self.run(begun).await
    }

    /// Close every selected tab
    pub async fn close_selected(&self) -> Result<SubmitOutcome> {
        let begun = self.lock().close_selected()?;
        self.run(begun).await
    }

    /// Abandon the outstanding command, if any
    pub fn abandon(&self) -> bool {
        self.lock().abandon().is_some()
    }

    /// Load the current tab set and categorize it
    ///
    /// Tabs come from the bridge when one is connected, otherwise from the
    /// configured seed URLs. If categorization fails, bridge tabs are loaded
    /// uncategorized; without a bridge the error is returned.
    pub async fn refresh(&self) -> Result<usize> {
        let browser_tabs: Option<Vec<Tab>> = match &self.bridge {
            Some(bridge) => Some(
                self.with_timeout(bridge.get_tabs())
                    .await?
                    .into_iter()
                    .map(Tab::from)
                    .collect(),
            ),
            None => None,
        };
        let urls: Vec<String> = match &browser_tabs {
            Some(tabs) => tabs.iter().map(|t| t.url.clone()).collect(),
            None => self.seed_urls.clone(),
        };

        let categorized = self.with_timeout(self.interpreter.categorize(&urls)).await;
        let tabs = match (categorized, browser_tabs) {
            (Ok(tabs), Some(browser)) => merge_browser_ids(tabs, browser),
            (Ok(tabs), None) => tabs,
            (Err(e), Some(browser)) => {
                tracing::warn!(error = %e, "Categorization failed, loading tabs uncategorized");
                browser
            }
            (Err(e), None) => return Err(e),
        };

        let count = tabs.len();
        self.lock().load_tabs(tabs)?;
        tracing::info!(count, "Tabs refreshed");
        Ok(count)
    }

    async fn run(&self, begun: Begun) -> Result<SubmitOutcome> {
        match begun {
            Begun::Nothing => Ok(SubmitOutcome::Ignored),
            Begun::Local(req) => self.run_local(req).await.map(SubmitOutcome::Applied),
            Begun::Remote(req) => {
                let result = self.with_timeout(self.interpreter.update(&req.command)).await;
                let count = self.lock().finish_remote(req.ticket, result)?;
                Ok(SubmitOutcome::Replaced(count))
            }
        }
    }

    async fn run_local(&self, req: LocalRequest) -> Result<ExecutionReport> {
        let dispatched = self
            .with_timeout(async {
                let outcomes =
                    ActionExecutor::dispatch(&req.plan, &req.tabs, self.bridge.as_deref()).await;
                Ok::<_, TabError>(outcomes)
            })
            .await;
        match dispatched {
            Ok(outcomes) => self.lock().finish_local(req.ticket, req.plan, outcomes),
            Err(e) => Err(self.lock().fail_command(req.ticket, e)),
        }
    }

    async fn with_timeout<T>(&self, fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(TabError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

/// Keep the browser's ids on categorized tabs when both lists line up
fn merge_browser_ids(mut categorized: Vec<Tab>, browser: Vec<Tab>) -> Vec<Tab> {
    if categorized.len() != browser.len() {
        tracing::debug!(
            categorized = categorized.len(),
            browser = browser.len(),
            "Categorizer changed tab count, keeping its ids"
        );
        return categorized;
    }
    for (tab, source) in categorized.iter_mut().zip(browser) {
        tab.id = source.id;
        if tab.title.is_empty() {
            tab.title = source.title;
        }
        if tab.favicon.is_none() {
            tab.favicon = source.favicon;
        }
    }
    categorized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::resolver::RemoteCommand;
    use crate::core::error::ErrorKind;
    use crate::core::types::{Category, TabId};
    use crate::session::{IdleStatus, Lifecycle};
    use async_trait::async_trait;

    struct CannedInterpreter {
        tabs: Vec<Tab>,
        delay: Duration,
    }

    #[async_trait]
    impl Interpreter for CannedInterpreter {
        async fn categorize(&self, urls: &[String]) -> Result<Vec<Tab>> {
            Ok(urls
                .iter()
                .enumerate()
                .map(|(i, url)| Tab::new((i as u64) + 1, url.as_str(), url.as_str()).with_category(Category::Work))
                .collect())
        }

        async fn update(&self, _command: &RemoteCommand) -> Result<Vec<Tab>> {
            tokio::time::sleep(self.delay).await;
            Ok(self.tabs.clone())
        }
    }

    fn controller(delay: Duration, timeout: Duration) -> Controller {
        let interpreter = Arc::new(CannedInterpreter {
            tabs: vec![Tab::new("9", "Docs", "https://docs.rs")],
            delay,
        });
        Controller::new(Arc::new(Mutex::new(Session::new())), interpreter, None, timeout)
    }

    #[tokio::test]
    async fn test_refresh_from_seed_urls() {
        let controller = controller(Duration::ZERO, Duration::from_secs(1))
            .with_seed_urls(vec!["https://a.com".into(), "https://b.com".into()]);
        assert_eq!(controller.refresh().await.unwrap(), 2);
        assert_eq!(controller.lock().tabs()[1].id, TabId::from("2"));
    }

    #[tokio::test]
    async fn test_remote_submit_replaces() {
        let controller = controller(Duration::ZERO, Duration::from_secs(1));
        let outcome = controller.submit("only keep docs").await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Replaced(1));
        assert_eq!(
            controller.lock().state(),
            Lifecycle::Idle(IdleStatus::Succeeded)
        );
    }

    #[tokio::test]
    async fn test_timeout_ends_failed() {
        let controller = controller(Duration::from_millis(200), Duration::from_millis(20));
        let err = controller.submit("slow command").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        let session = controller.lock();
        assert_eq!(
            session.state(),
            Lifecycle::Idle(IdleStatus::Failed(ErrorKind::Timeout))
        );
        assert!(session.tabs().is_empty());
    }

    #[tokio::test]
    async fn test_blank_submit_ignored() {
        let controller = controller(Duration::ZERO, Duration::from_secs(1));
        assert_eq!(controller.submit("  ").await.unwrap(), SubmitOutcome::Ignored);
        assert!(!controller.abandon());
    }
}

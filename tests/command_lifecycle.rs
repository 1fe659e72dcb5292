//! Integration tests for the command lifecycle against a stub interpreter

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use tabmate::bridge::{
    BridgeClient, BridgeService, BrowserTab, GroupResult, MemoryBrowser, TabControl,
};
use tabmate::command::RemoteCommand;
use tabmate::core::error::{ErrorKind, Result, TabError};
use tabmate::core::types::{Category, Tab, TabId};
use tabmate::history::CommandOutcome;
use tabmate::interpreter::{HttpInterpreter, Interpreter};
use tabmate::session::{Controller, IdleStatus, Lifecycle, Session, SubmitOutcome};

/// Serve every connection with the same canned HTTP response.
/// Request bodies are forwarded on the returned channel.
async fn stub_interpreter(status: u16, body: &'static str) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                let _ = tx.send(request);
                let response = format!(
                    "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{}", addr), rx)
}

/// Read one request and return its body
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return text[header_end + 4..].to_string();
            }
        }
    }
    String::new()
}

fn seed_tabs() -> Vec<Tab> {
    vec![
        Tab::new("1", "GitHub", "https://github.com").with_category(Category::Work),
        Tab::new("2", "Lo-fi", "https://youtube.com/a").with_category(Category::Entertainment),
        Tab::new("3", "Lo-fi", "https://youtube.com/a").with_category(Category::Entertainment),
    ]
}

fn controller_for(url: &str) -> Controller {
    let controller = Controller::new(
        Arc::new(Mutex::new(Session::new())),
        Arc::new(HttpInterpreter::new(url)),
        None,
        Duration::from_secs(5),
    );
    controller.lock().load_tabs(seed_tabs()).unwrap();
    controller
}

/// Interpreter that answers after a fixed delay
struct SlowInterpreter {
    delay: Duration,
}

#[async_trait]
impl Interpreter for SlowInterpreter {
    async fn categorize(&self, _urls: &[String]) -> Result<Vec<Tab>> {
        Ok(Vec::new())
    }

    async fn update(&self, command: &RemoteCommand) -> Result<Vec<Tab>> {
        tokio::time::sleep(self.delay).await;
        Ok(command.current_tabs.iter().take(1).cloned().collect())
    }
}

fn slow_controller(delay: Duration, timeout: Duration) -> Controller {
    let controller = Controller::new(
        Arc::new(Mutex::new(Session::new())),
        Arc::new(SlowInterpreter { delay }),
        None,
        timeout,
    );
    controller.lock().load_tabs(seed_tabs()).unwrap();
    controller
}

#[tokio::test]
async fn test_update_500_leaves_registry_unchanged() {
    let (url, mut requests) = stub_interpreter(500, r#"{"detail": "boom"}"#).await;
    let controller = controller_for(&url);
    let before = controller.lock().tabs().to_vec();

    let err = controller.submit("close everything about cats").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CommandFailed);
    assert!(err.to_string().contains("status 500"));

    let session = controller.lock();
    assert_eq!(session.tabs(), before.as_slice());
    assert_eq!(
        session.state(),
        Lifecycle::Idle(IdleStatus::Failed(ErrorKind::CommandFailed))
    );
    assert_eq!(session.history().len(), 1);
    let record = session.history().latest().unwrap();
    assert_eq!(record.text, "close everything about cats");
    assert!(matches!(
        record.outcome,
        CommandOutcome::Failure { kind: ErrorKind::CommandFailed, .. }
    ));
    drop(session);

    let body: serde_json::Value = serde_json::from_str(&requests.recv().await.unwrap()).unwrap();
    assert_eq!(body["command"], "close everything about cats");
    assert_eq!(body["currentTabs"].as_array().unwrap().len(), 3);
    assert_eq!(body["currentTabs"][1]["isDistraction"], true);
}

#[tokio::test]
async fn test_update_success_replaces_and_reclassifies() {
    let (url, _requests) = stub_interpreter(
        200,
        r#"{"status": "success", "data": [
            {"id": "1", "title": "GitHub", "url": "https://github.com", "category": "Work"},
            {"id": "7", "title": "Docs", "url": "https://github.com/", "category": "Work"}
        ]}"#,
    )
    .await;
    let controller = controller_for(&url);

    let outcome = controller.submit("keep only work tabs").await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Replaced(2));

    let session = controller.lock();
    assert_eq!(session.tabs().len(), 2);
    assert!(!session.tabs()[0].flags.duplicate);
    assert!(session.tabs()[1].flags.duplicate);
    assert_eq!(session.state(), Lifecycle::Idle(IdleStatus::Succeeded));
}

#[tokio::test]
async fn test_unreachable_interpreter_is_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let controller = controller_for(&url);
    let err = controller.submit("sort my tabs").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(controller.lock().tabs().len(), 3);
}

#[tokio::test]
async fn test_canned_phrase_never_hits_network() {
    let (url, mut requests) = stub_interpreter(500, "{}").await;
    let controller = controller_for(&url);

    let outcome = controller.submit("Close all entertainment tabs").await.unwrap();
    let SubmitOutcome::Applied(report) = outcome else {
        panic!("expected a local plan");
    };
    assert_eq!(report.closed, vec![TabId::from("2"), TabId::from("3")]);
    assert_eq!(controller.lock().tabs().len(), 1);
    assert!(requests.try_recv().is_err());
}

#[tokio::test]
async fn test_refresh_categorizes_seed_urls() {
    let (url, mut requests) = stub_interpreter(
        200,
        r#"[{"title": "Cart", "url": "https://amazon.com/cart", "category": "E-commerce/Shopping"}]"#,
    )
    .await;
    let controller = Controller::new(
        Arc::new(Mutex::new(Session::new())),
        Arc::new(HttpInterpreter::new(url)),
        None,
        Duration::from_secs(5),
    )
    .with_seed_urls(vec!["https://amazon.com/cart".into()]);

    assert_eq!(controller.refresh().await.unwrap(), 1);
    let session = controller.lock();
    assert_eq!(session.tabs()[0].id, TabId::from("1"));
    assert_eq!(session.tabs()[0].category, Category::Shopping);
    drop(session);

    let body: serde_json::Value = serde_json::from_str(&requests.recv().await.unwrap()).unwrap();
    assert_eq!(body["urls"][0], "https://amazon.com/cart");
}

#[tokio::test]
async fn test_second_submit_while_resolving_is_busy() {
    let controller = slow_controller(Duration::from_millis(100), Duration::from_secs(5));

    let (first, second) = tokio::join!(controller.submit("keep the first tab"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.submit("close duplicates").await
    });

    assert_eq!(first.unwrap(), SubmitOutcome::Replaced(1));
    assert!(matches!(second, Err(TabError::Busy)));
    assert_eq!(controller.lock().history().len(), 1);
}

#[tokio::test]
async fn test_late_response_after_abandon_is_discarded() {
    let controller = slow_controller(Duration::from_millis(100), Duration::from_secs(5));

    let (first, second) = tokio::join!(controller.submit("keep the first tab"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(controller.abandon());
        controller.submit("close duplicate tabs").await
    });

    assert!(matches!(first, Err(TabError::StaleResponse(_))));
    let SubmitOutcome::Applied(report) = second.unwrap() else {
        panic!("expected a local plan");
    };
    assert_eq!(report.closed, vec![TabId::from("3")]);

    let session = controller.lock();
    // The stale replacement (one tab) must not have been applied
    assert_eq!(session.tabs().len(), 2);
    assert_eq!(session.state(), Lifecycle::Idle(IdleStatus::Succeeded));
    let kinds: Vec<bool> = session.history().iter().map(|r| r.is_success()).collect();
    assert_eq!(kinds, vec![true, false]);
}

#[tokio::test]
async fn test_timeout_ends_in_failed_state() {
    let controller = slow_controller(Duration::from_millis(300), Duration::from_millis(20));

    let err = controller.submit("keep the first tab").await.unwrap_err();
    assert!(matches!(err, TabError::Timeout(20)));

    let session = controller.lock();
    assert_eq!(
        session.state(),
        Lifecycle::Idle(IdleStatus::Failed(ErrorKind::Timeout))
    );
    assert_eq!(session.tabs().len(), 3);
}

#[tokio::test]
async fn test_close_selected_through_bridge() {
    let browser = Arc::new(MemoryBrowser::new(vec![
        BrowserTab {
            id: TabId::from(11u64),
            title: "GitHub".into(),
            url: "https://github.com".into(),
            fav_icon_url: None,
        },
        BrowserTab {
            id: TabId::from(12u64),
            title: "Shop".into(),
            url: "https://shop.example/item".into(),
            fav_icon_url: None,
        },
    ]));
    let handle = BridgeService::new(Arc::clone(&browser), vec!["localhost".into()]).spawn();
    let bridge: Arc<dyn TabControl> = Arc::new(BridgeClient::new(handle, "http://localhost:3000"));

    // Categorizer is down, so bridge tabs load uncategorized
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let controller = Controller::new(
        Arc::new(Mutex::new(Session::new())),
        Arc::new(HttpInterpreter::new(url)),
        Some(bridge),
        Duration::from_secs(5),
    );
    assert_eq!(controller.refresh().await.unwrap(), 2);
    assert!(controller
        .lock()
        .tabs()
        .iter()
        .all(|t| t.category == Category::Other));

    controller.lock().toggle_selection(&TabId::from("12")).unwrap();
    let SubmitOutcome::Applied(report) = controller.close_selected().await.unwrap() else {
        panic!("expected a local plan");
    };
    assert!(report.is_clean());
    assert_eq!(report.closed, vec![TabId::from("12")]);

    let remaining = browser.tabs();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, TabId::from("11"));
    assert!(controller.lock().selection().is_empty());
}

/// Browser holding two copies of one video plus a GitHub tab, behind a
/// controller whose categorizer is down
async fn duplicate_browser() -> (Arc<MemoryBrowser>, Controller) {
    let tab = |id: u64, url: &str| BrowserTab {
        id: TabId::from(id),
        title: format!("tab {}", id),
        url: url.into(),
        fav_icon_url: None,
    };
    let browser = Arc::new(MemoryBrowser::new(vec![
        tab(1, "https://youtube.com/a"),
        tab(2, "https://youtube.com/a"),
        tab(3, "https://github.com"),
    ]));
    let handle = BridgeService::new(Arc::clone(&browser), vec!["localhost".into()]).spawn();
    let bridge: Arc<dyn TabControl> = Arc::new(BridgeClient::new(handle, "http://localhost:3000"));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let controller = Controller::new(
        Arc::new(Mutex::new(Session::new())),
        Arc::new(HttpInterpreter::new(url)),
        Some(bridge),
        Duration::from_secs(5),
    );
    assert_eq!(controller.refresh().await.unwrap(), 3);
    (browser, controller)
}

fn ids(tabs: impl IntoIterator<Item = TabId>) -> Vec<String> {
    tabs.into_iter().map(|id| id.0).collect()
}

#[tokio::test]
async fn test_close_duplicates_keeps_canonical_in_browser() {
    let (browser, controller) = duplicate_browser().await;

    let SubmitOutcome::Applied(report) = controller.submit("close duplicate tabs").await.unwrap()
    else {
        panic!("expected a local plan");
    };
    assert!(report.is_clean());
    assert_eq!(report.closed, vec![TabId::from("2")]);

    assert_eq!(ids(browser.tabs().into_iter().map(|t| t.id)), ["1", "3"]);
    let registry = ids(controller.lock().tabs().iter().map(|t| t.id.clone()));
    assert_eq!(registry, ["1", "3"]);
}

#[tokio::test]
async fn test_close_selected_sharing_url_reports_both() {
    let (browser, controller) = duplicate_browser().await;
    controller.lock().toggle_selection(&TabId::from("1")).unwrap();
    controller.lock().toggle_selection(&TabId::from("2")).unwrap();

    let SubmitOutcome::Applied(report) = controller.close_selected().await.unwrap() else {
        panic!("expected a local plan");
    };
    assert!(report.is_clean(), "unexpected failures: {:?}", report.failed);
    assert_eq!(report.closed, vec![TabId::from("1"), TabId::from("2")]);
    assert_eq!(report.summary(), "closed 2 tab(s)");
    assert_eq!(ids(browser.tabs().into_iter().map(|t| t.id)), ["3"]);
}

/// Bridge that never answers
struct HungBridge;

#[async_trait]
impl TabControl for HungBridge {
    async fn close_tabs(&self, _pattern: &str) -> Result<usize> {
        std::future::pending().await
    }

    async fn close_tab_ids(&self, _ids: &[TabId]) -> Result<usize> {
        std::future::pending().await
    }

    async fn group_tabs(&self, _ids: &[TabId], _label: &str) -> Result<GroupResult> {
        std::future::pending().await
    }

    async fn get_tabs(&self) -> Result<Vec<BrowserTab>> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_hung_bridge_times_out_to_idle() {
    let controller = Controller::new(
        Arc::new(Mutex::new(Session::new())),
        Arc::new(SlowInterpreter {
            delay: Duration::ZERO,
        }),
        Some(Arc::new(HungBridge)),
        Duration::from_millis(50),
    );
    controller.lock().load_tabs(seed_tabs()).unwrap();

    let result = tokio::time::timeout(
        Duration::from_millis(500),
        controller.submit("close all entertainment tabs"),
    )
    .await
    .expect("submit should settle within the controller timeout");
    assert!(matches!(result, Err(TabError::Timeout(50))));

    let session = controller.lock();
    assert_eq!(
        session.state(),
        Lifecycle::Idle(IdleStatus::Failed(ErrorKind::Timeout))
    );
    assert_eq!(session.tabs().len(), 3);
    assert!(!session.history().latest().unwrap().is_success());
    drop(session);

    let refreshed = tokio::time::timeout(Duration::from_millis(500), controller.refresh())
        .await
        .expect("refresh should settle within the controller timeout");
    assert!(matches!(refreshed, Err(TabError::Timeout(50))));

    // Not stuck busy: the next command reaches the bridge and times out too
    let again = controller.submit("close duplicate tabs").await;
    assert!(matches!(again, Err(TabError::Timeout(50))));
}

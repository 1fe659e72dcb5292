//! Integration tests for the browser-control bridge over its channel

use std::sync::Arc;

use serde_json::json;

use tabmate::bridge::{
    BridgeClient, BridgeHandle, BridgeResponse, BridgeService, BrowserTab, MemoryBrowser,
    TabControl,
};
use tabmate::core::error::TabError;
use tabmate::core::types::TabId;

fn tab(id: u64, url: &str) -> BrowserTab {
    BrowserTab {
        id: TabId::from(id),
        title: format!("tab {}", id),
        url: url.to_string(),
        fav_icon_url: None,
    }
}

fn start() -> (Arc<MemoryBrowser>, BridgeHandle) {
    let browser = Arc::new(MemoryBrowser::new(vec![
        tab(1, "https://youtube.com/watch?v=a"),
        tab(2, "https://youtube.com/watch?v=b"),
        tab(3, "https://github.com/rust-lang/rust"),
    ]));
    let hosts = vec!["localhost".into(), "127.0.0.1".into(), "::1".into()];
    let handle = BridgeService::new(Arc::clone(&browser), hosts).spawn();
    (browser, handle)
}

#[tokio::test]
async fn test_untrusted_origin_gets_no_reply() {
    let (browser, handle) = start();

    let result = handle
        .send(
            "https://evil.example",
            json!({"action": "closeTabs", "pattern": "*youtube*"}),
        )
        .await;

    assert!(matches!(result, Err(TabError::Network(_))));
    assert_eq!(browser.tabs().len(), 3);
}

#[tokio::test]
async fn test_loopback_origins_any_port() {
    let (browser, handle) = start();

    for origin in ["http://localhost:3000", "https://127.0.0.1:8443", "http://[::1]:9000"] {
        let response = handle.send(origin, json!({"action": "getTabs"})).await.unwrap();
        assert!(matches!(response, BridgeResponse::Tabs(ref tabs) if tabs.len() == 3));
    }

    let rejected = handle
        .send("file:///home/user/page.html", json!({"action": "getTabs"}))
        .await;
    assert!(rejected.is_err());
    assert_eq!(browser.tabs().len(), 3);
}

#[tokio::test]
async fn test_close_by_pattern() {
    let (browser, handle) = start();
    let client = BridgeClient::new(handle, "http://localhost:3000");

    assert_eq!(client.close_tabs("*youtube.com*").await.unwrap(), 2);
    assert_eq!(client.close_tabs("*youtube.com*").await.unwrap(), 0);

    let remaining = browser.tabs();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, TabId::from(3u64));
}

#[tokio::test]
async fn test_group_and_title() {
    let (browser, handle) = start();
    let client = BridgeClient::new(handle, "http://localhost:3000");

    let result = client
        .group_tabs(&[TabId::from(1u64), TabId::from(2u64)], "Entertainment")
        .await
        .unwrap();
    assert_eq!(result.tab_count, 2);

    let info = browser.group_info(result.group_id).unwrap();
    assert_eq!(info.title, "Entertainment");
    assert_eq!(info.tab_ids.len(), 2);

    let err = client
        .group_tabs(&[TabId::from(42u64)], "Nowhere")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Tab not found: 42"));
}

#[tokio::test]
async fn test_unsupported_action() {
    let (_browser, handle) = start();

    let response = handle
        .send("http://localhost:3000", json!({"action": "bookmarkTabs"}))
        .await
        .unwrap();
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["error"], "Unsupported command: bookmarkTabs");
    assert!(matches!(
        response.into_error(),
        TabError::UnsupportedCommand(action) if action == "bookmarkTabs"
    ));
}

#[tokio::test]
async fn test_get_tabs_wire_shape() {
    let (browser, handle) = start();
    browser.open(BrowserTab {
        id: TabId::from(4u64),
        title: "Docs".into(),
        url: "https://docs.rs".into(),
        fav_icon_url: Some("https://docs.rs/favicon.ico".into()),
    });

    let client = BridgeClient::new(handle, "http://127.0.0.1:3000");
    let tabs = client.get_tabs().await.unwrap();
    assert_eq!(tabs.len(), 4);

    let value = serde_json::to_value(&tabs[3]).unwrap();
    assert_eq!(value["favIconUrl"], "https://docs.rs/favicon.ico");
}

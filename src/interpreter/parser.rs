//! Parse interpreter responses into tab sets
//!
//! The interpreter is a black box and has answered in a few shapes over time:
//! a bare JSON array, a `{"status": ..., "data": [...]}` envelope, array
//! elements that are themselves JSON-encoded strings, and arrays wrapped in
//! prose. All of them are accepted here; anything else is a command failure.

use ahash::AHashSet;
use serde_json::Value;

use crate::core::error::{Result, TabError};
use crate::core::types::{Tab, TabId};

/// Parse a response body into an ordered tab list
pub fn parse_tab_list(body: &str) -> Result<Vec<Tab>> {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(v) => v,
        Err(_) => serde_json::from_str(extract_json_array(body)?).map_err(|e| {
            TabError::CommandFailed(format!("Failed to parse tab list: {} - Response: {}", e, body))
        })?,
    };
    tabs_from_value(value)
}

fn tabs_from_value(value: Value) -> Result<Vec<Tab>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let failed = map
                .get("status")
                .and_then(Value::as_str)
                .is_some_and(|s| s != "success");
            if failed {
                let reason = map
                    .get("detail")
                    .or_else(|| map.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("interpreter reported failure");
                return Err(TabError::CommandFailed(reason.to_string()));
            }
            match map.remove("data") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(TabError::CommandFailed(
                        "expected a list of tabs in response".into(),
                    ))
                }
            }
        }
        _ => {
            return Err(TabError::CommandFailed(
                "expected a list of tabs in response".into(),
            ))
        }
    };

    let mut tabs = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| tab_from_item(i, item))
        .collect::<Result<Vec<_>>>()?;
    assign_missing_ids(&mut tabs);
    Ok(tabs)
}

fn tab_from_item(index: usize, item: Value) -> Result<Tab> {
    let item = match item {
        Value::String(encoded) => serde_json::from_str(&encoded).map_err(|e| {
            TabError::CommandFailed(format!("tab record {} is not JSON: {}", index, e))
        })?,
        other => other,
    };

    // Per-URL failures from the categorizer still describe an open tab
    if item.get("status").and_then(Value::as_str) == Some("error") {
        let url = item.get("url").and_then(Value::as_str).unwrap_or_default();
        tracing::warn!(url, "Interpreter could not categorize tab");
        return Ok(Tab::new(TabId::default(), url, url));
    }

    serde_json::from_value(item)
        .map_err(|e| TabError::CommandFailed(format!("malformed tab record {}: {}", index, e)))
}

/// Give id-less records their 1-based position, or the smallest free
/// number when an explicit id in the batch already holds that position
fn assign_missing_ids(tabs: &mut [Tab]) {
    let mut taken: AHashSet<TabId> = tabs
        .iter()
        .filter(|t| !t.id.as_str().is_empty())
        .map(|t| t.id.clone())
        .collect();
    let mut next_free = 1u64;

    for (index, tab) in tabs.iter_mut().enumerate() {
        if !tab.id.as_str().is_empty() {
            continue;
        }
        let mut id = TabId::from(index as u64 + 1);
        if taken.contains(&id) {
            while taken.contains(&TabId::from(next_free)) {
                next_free += 1;
            }
            id = TabId::from(next_free);
        }
        taken.insert(id.clone());
        tab.id = id;
    }
}

/// Extract a JSON array from a response with surrounding text
fn extract_json_array(response: &str) -> Result<&str> {
    let start = response
        .find('[')
        .ok_or_else(|| TabError::CommandFailed("No JSON found in response".into()))?;
    let end = response
        .rfind(']')
        .ok_or_else(|| TabError::CommandFailed("No closing bracket found in response".into()))?;
    if end < start {
        return Err(TabError::CommandFailed("No JSON found in response".into()));
    }
    Ok(&response[start..=end])
}

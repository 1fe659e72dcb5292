//! Core type definitions used throughout the codebase

use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize};

/// Browser-assigned tab identifier
///
/// Browsers hand out numeric ids while the interpreter speaks strings, so
/// both forms are accepted on the wire and held as a string. Ordering is
/// lexicographic on that string.
#[derive(Debug, Display, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TabId(pub String);

impl TabId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TabId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TabId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for TabId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for TabId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => TabId(s),
            RawId::Number(n) => TabId(n.to_string()),
        })
    }
}

/// Closed set of tab categories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub enum Category {
    Work,
    Research,
    Entertainment,
    Shopping,
    Social,
    News,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Work,
        Category::Research,
        Category::Entertainment,
        Category::Shopping,
        Category::Social,
        Category::News,
        Category::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Research => "Research",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Social => "Social",
            Category::News => "News",
            Category::Other => "Other",
        }
    }

    /// Map an interpreter label onto the closed set.
    ///
    /// Besides the seven canonical names this understands the broader
    /// vocabulary the interpreter's categorizer emits. Anything else is Other.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        match label.as_str() {
            "work" | "technical documentation" | "productivity tools" | "productivity" => {
                Category::Work
            }
            "research" | "educational resources" | "education" => Category::Research,
            "entertainment" | "video/multimedia" | "video" | "music" => Category::Entertainment,
            "shopping" | "e-commerce/shopping" | "e-commerce" => Category::Shopping,
            "social" | "social media" => Category::Social,
            "news" | "news/articles" => Category::News,
            _ => Category::Other,
        }
    }

    /// Strict parse of a canonical category name, used by command patterns
    pub fn parse_name(name: &str) -> Option<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Icon shown next to the category's group
    pub fn icon(self) -> &'static str {
        match self {
            Category::Work => "monitor",
            Category::Research => "book-open",
            Category::Entertainment => "music",
            Category::Shopping => "shopping-cart",
            Category::Social => "coffee",
            Category::News => "globe",
            Category::Other => "folder-open",
        }
    }

    pub fn is_distraction(self) -> bool {
        matches!(self, Category::Entertainment | Category::Social)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

impl<'de> Deserialize<'de> for Category {
    /// Any label is accepted; null, numbers and other non-strings are Other
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(label) => Category::from_label(&label),
            _ => Category::Other,
        })
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.name().to_string()
    }
}

/// Derived per-tab markers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabFlags {
    #[serde(default, rename = "isActive")]
    pub active: bool,
    #[serde(default, rename = "isDuplicate")]
    pub duplicate: bool,
    #[serde(default, rename = "isDistraction")]
    pub distraction: bool,
}

/// One open browser tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    #[serde(default)]
    pub id: TabId,
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(flatten)]
    pub flags: TabFlags,
}

impl Tab {
    pub fn new(id: impl Into<TabId>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            favicon: None,
            category: Category::Other,
            flags: TabFlags::default(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }
}

//! Domain entities shown in selectable lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Stable identifier of a list item. Backends hand out either numbers or strings.
///
/// Two ids are equal when they render the same, so `Num(17)` matches
/// `Text("17")`. Navigation queries carry ids as text and cannot tell the two apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Num(i64),
    Text(String),
}

impl PartialEq for ItemId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ItemId::Num(a), ItemId::Num(b)) => a == b,
            (ItemId::Text(a), ItemId::Text(b)) => a == b,
            (ItemId::Num(n), ItemId::Text(s)) | (ItemId::Text(s), ItemId::Num(n)) => {
                *s == n.to_string()
            }
        }
    }
}

impl Eq for ItemId {}

impl std::hash::Hash for ItemId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            ItemId::Num(n) => n.to_string().hash(state),
            ItemId::Text(s) => s.hash(state),
        }
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemId::Num(n) => write!(f, "{}", n),
            ItemId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl std::str::FromStr for ItemId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ItemId::parse(s))
    }
}

impl ItemId {
    /// Integers become `Num`, anything else stays text.
    pub fn parse(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) => ItemId::Num(n),
            Err(_) => ItemId::Text(s.to_string()),
        }
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        ItemId::Num(n)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::Text(s.to_string())
    }
}

/// What sort of entity a list holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Chat,
    Lead,
    Invoice,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Chat => write!(f, "chat"),
            EntityKind::Lead => write!(f, "lead"),
            EntityKind::Invoice => write!(f, "invoice"),
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(EntityKind::Chat),
            "lead" => Ok(EntityKind::Lead),
            "invoice" => Ok(EntityKind::Invoice),
            _ => anyhow::bail!(
                "Invalid entity kind '{}'. Valid values: chat, lead, invoice",
                s
            ),
        }
    }
}

/// A fetched entity. Immutable for the lifetime of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: ItemId,
    /// The other participant (chat partner, lead client, billed client).
    pub recipient_id: String,
    pub kind: EntityKind,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ListItem {
    /// Create an item with no topic, status or title.
    pub fn new(
        id: impl Into<ItemId>,
        recipient_id: &str,
        kind: EntityKind,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            recipient_id: recipient_id.to_string(),
            kind,
            created_at,
            topic: None,
            status: None,
            title: None,
        }
    }

    pub fn with_topic(mut self, topic: &str) -> Self {
        self.topic = Some(topic.to_string());
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

/// Query filters a list page is scoped by. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntityKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterpart: Option<String>,
}

impl CollectionFilters {
    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn with_topic(mut self, topic: &str) -> Self {
        self.topic = Some(topic.to_string());
        self
    }

    pub fn with_counterpart(mut self, counterpart: &str) -> Self {
        self.counterpart = Some(counterpart.to_string());
        self
    }

    /// Check whether an item falls inside these filters.
    pub fn matches(&self, item: &ListItem) -> bool {
        if self.kind.is_some_and(|k| k != item.kind) {
            return false;
        }
        if let Some(ref status) = self.status
            && item.status.as_deref() != Some(status.as_str())
        {
            return false;
        }
        if let Some(ref topic) = self.topic
            && item.topic.as_deref() != Some(topic.as_str())
        {
            return false;
        }
        if let Some(ref counterpart) = self.counterpart
            && &item.recipient_id != counterpart
        {
            return false;
        }
        true
    }
}

/// Ordering applied to every fetched list before resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Creation time descending (most recent first)
    #[default]
    NewestFirst,
    /// Creation time ascending
    OldestFirst,
}

impl SortOrder {
    /// Sort in place. The sort is stable: equal timestamps keep response order.
    pub fn apply(self, items: &mut [ListItem]) {
        items.sort_by(|a, b| self.compare(a, b));
    }

    fn compare(self, a: &ListItem, b: &ListItem) -> Ordering {
        match self {
            SortOrder::NewestFirst => b.created_at.cmp(&a.created_at),
            SortOrder::OldestFirst => a.created_at.cmp(&b.created_at),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::NewestFirst => write!(f, "newest_first"),
            SortOrder::OldestFirst => write!(f, "oldest_first"),
        }
    }
}

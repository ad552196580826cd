//! Desired selection read from navigation query parameters.
//!
//! Two query forms are understood:
//!
//! ```text
//! ?id=17                      direct id
//! ?recipientId=C&topic=42     find-or-create by counterpart
//! ```
//!
//! Values are form-encoded, so `jane%40firm.com` reads as `jane@firm.com`.

use crate::errors::SelectorError;
use crate::model::ItemId;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

const ID_PARAM: &str = "id";
const RECIPIENT_PARAM: &str = "recipientId";
const TOPIC_PARAM: &str = "topic";

/// What the navigation state asks to have selected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum DesiredSelector {
    /// Nothing requested; the first item wins
    #[default]
    None,
    /// An existing item by id
    Id { id: ItemId },
    /// The item shared with a counterpart, created on demand
    Counterpart {
        recipient_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<String>,
    },
}

impl DesiredSelector {
    pub fn id(id: impl Into<ItemId>) -> Self {
        Self::Id { id: id.into() }
    }

    pub fn counterpart(recipient_id: &str, context: Option<&str>) -> Self {
        Self::Counterpart {
            recipient_id: recipient_id.to_string(),
            context: context.map(str::to_string),
        }
    }

    /// Parse a query string, with or without the leading `?`.
    ///
    /// Keys and values are percent-decoded. `id` wins over `recipientId` when
    /// both are present. Unknown parameters are ignored.
    pub fn from_query(query: &str) -> Result<Self, SelectorError> {
        let query = query.strip_prefix('?').unwrap_or(query);

        if let Some(segment) = query
            .split('&')
            .find(|s| !s.is_empty() && (!s.contains('=') || s.starts_with('=')))
        {
            return Err(SelectorError::MalformedSegment(segment.to_string()));
        }

        let mut id = None;
        let mut recipient = None;
        let mut topic = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                ID_PARAM => id = Some(non_empty(&key, &value)?),
                RECIPIENT_PARAM => recipient = Some(non_empty(&key, &value)?),
                TOPIC_PARAM if !value.is_empty() => topic = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(id) = id {
            return Ok(Self::Id {
                id: ItemId::parse(&id),
            });
        }
        if let Some(recipient_id) = recipient {
            return Ok(Self::Counterpart {
                recipient_id,
                context: topic,
            });
        }
        Ok(Self::None)
    }

    /// Render back into percent-encoded query form, without the leading `?`.
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        match self {
            Self::None => {}
            Self::Id { id } => {
                query.append_pair(ID_PARAM, &id.to_string());
            }
            Self::Counterpart {
                recipient_id,
                context,
            } => {
                query.append_pair(RECIPIENT_PARAM, recipient_id);
                if let Some(topic) = context {
                    query.append_pair(TOPIC_PARAM, topic);
                }
            }
        }
        query.finish()
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl std::fmt::Display for DesiredSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "(none)"),
            other => write!(f, "?{}", other.to_query()),
        }
    }
}

impl std::str::FromStr for DesiredSelector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_query(s)
    }
}

fn non_empty(key: &str, value: &str) -> Result<String, SelectorError> {
    if value.is_empty() {
        Err(SelectorError::EmptyParam(key.to_string()))
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direct_id() {
        let sel = DesiredSelector::from_query("?id=2").unwrap();
        assert_eq!(sel, DesiredSelector::id(2));
    }

    #[test]
    fn test_parse_text_id() {
        let sel = DesiredSelector::from_query("id=chat-9").unwrap();
        assert_eq!(sel, DesiredSelector::id("chat-9"));
    }

    #[test]
    fn test_parse_counterpart_with_topic() {
        let sel = DesiredSelector::from_query("recipientId=C&topic=42").unwrap();
        assert_eq!(sel, DesiredSelector::counterpart("C", Some("42")));
    }

    #[test]
    fn test_parse_id_wins_over_counterpart() {
        let sel = DesiredSelector::from_query("recipientId=C&id=5").unwrap();
        assert_eq!(sel, DesiredSelector::id(5));
    }

    #[test]
    fn test_parse_empty_query_is_none() {
        assert_eq!(DesiredSelector::from_query("").unwrap(), DesiredSelector::None);
        assert_eq!(DesiredSelector::from_query("?").unwrap(), DesiredSelector::None);
    }

    #[test]
    fn test_parse_ignores_unknown_params() {
        let sel = DesiredSelector::from_query("tab=billing&id=3").unwrap();
        assert_eq!(sel, DesiredSelector::id(3));
    }

    #[test]
    fn test_parse_rejects_empty_id() {
        let err = DesiredSelector::from_query("id=").unwrap_err();
        assert_eq!(err, SelectorError::EmptyParam("id".to_string()));
    }

    #[test]
    fn test_parse_rejects_segment_without_value() {
        let err = DesiredSelector::from_query("id").unwrap_err();
        assert!(matches!(err, SelectorError::MalformedSegment(_)));
    }

    #[test]
    fn test_to_query_matches_parse() {
        for sel in [
            DesiredSelector::None,
            DesiredSelector::id(12),
            DesiredSelector::counterpart("B", None),
            DesiredSelector::counterpart("C", Some("topic42")),
        ] {
            assert_eq!(DesiredSelector::from_query(&sel.to_query()).unwrap(), sel);
        }
    }

    #[test]
    fn test_parse_decodes_percent_encoding() {
        let sel =
            DesiredSelector::from_query("recipientId=jane%40firm.com&topic=Family%20Law").unwrap();
        assert_eq!(
            sel,
            DesiredSelector::counterpart("jane@firm.com", Some("Family Law"))
        );
        let sel = DesiredSelector::from_query("recipientId=a+b").unwrap();
        assert_eq!(sel, DesiredSelector::counterpart("a b", None));
    }

    #[test]
    fn test_to_query_encodes_reserved_characters() {
        let sel = DesiredSelector::counterpart("a&b=c", Some("x y"));
        let query = sel.to_query();
        assert_eq!(query, "recipientId=a%26b%3Dc&topic=x+y");
        assert_eq!(DesiredSelector::from_query(&query).unwrap(), sel);
    }

    #[test]
    fn test_parse_rejects_empty_key() {
        let err = DesiredSelector::from_query("=5").unwrap_err();
        assert!(matches!(err, SelectorError::MalformedSegment(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(DesiredSelector::id(2).to_string(), "?id=2");
        assert_eq!(DesiredSelector::None.to_string(), "(none)");
    }
}

//! Pure resolution of a desired selector against a sorted snapshot.

use crate::model::{ItemId, ListItem};
use crate::selector::DesiredSelector;
use serde::{Deserialize, Serialize};

/// What the resolver is allowed to do when nothing matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverPolicy {
    /// Create an entity for an unmatched counterpart
    pub create_missing: bool,
    /// Redirect a stale or empty selector to the first item
    pub redirect_to_first: bool,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            create_missing: true,
            redirect_to_first: true,
        }
    }
}

impl ResolverPolicy {
    pub fn with_create_missing(mut self, enabled: bool) -> Self {
        self.create_missing = enabled;
        self
    }

    pub fn with_redirect_to_first(mut self, enabled: bool) -> Self {
        self.redirect_to_first = enabled;
        self
    }
}

/// Outcome of one resolution step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The selector names this item directly
    Selected(ListItem),
    /// Navigate to this id; nothing is selected in this cycle
    Redirect(ItemId),
    /// Nothing matches the counterpart; create one
    Create {
        recipient_id: String,
        context: Option<String>,
    },
    /// Nothing to select yet
    Pending,
}

impl Resolution {
    /// Check if this outcome ends the cycle with a navigation.
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }
}

/// Resolve `selector` against `items`, which must already be sorted.
///
/// When several items share a counterpart the first in sort order wins.
pub fn resolve(items: &[ListItem], selector: &DesiredSelector, policy: &ResolverPolicy) -> Resolution {
    match selector {
        DesiredSelector::Id { id } => match items.iter().find(|item| &item.id == id) {
            Some(item) => Resolution::Selected(item.clone()),
            None => fallback(items, policy),
        },
        DesiredSelector::Counterpart {
            recipient_id,
            context,
        } => {
            if let Some(item) = items.iter().find(|item| &item.recipient_id == recipient_id) {
                return Resolution::Redirect(item.id.clone());
            }
            if policy.create_missing {
                return Resolution::Create {
                    recipient_id: recipient_id.clone(),
                    context: context.clone(),
                };
            }
            fallback(items, policy)
        }
        DesiredSelector::None => fallback(items, policy),
    }
}

fn fallback(items: &[ListItem], policy: &ResolverPolicy) -> Resolution {
    match items.first() {
        Some(first) if policy.redirect_to_first => Resolution::Redirect(first.id.clone()),
        _ => Resolution::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityKind;
    use chrono::{TimeZone, Utc};

    fn item(id: i64, recipient: &str, secs: i64) -> ListItem {
        ListItem::new(id, recipient, EntityKind::Chat, Utc.timestamp_opt(secs, 0).unwrap())
    }

    fn chats() -> Vec<ListItem> {
        vec![item(1, "A", 2), item(2, "B", 1)]
    }

    #[test]
    fn test_direct_id_selects() {
        let res = resolve(&chats(), &DesiredSelector::id(2), &ResolverPolicy::default());
        assert_eq!(res, Resolution::Selected(item(2, "B", 1)));
    }

    #[test]
    fn test_counterpart_match_redirects_to_its_id() {
        let res = resolve(
            &chats(),
            &DesiredSelector::counterpart("B", None),
            &ResolverPolicy::default(),
        );
        assert_eq!(res, Resolution::Redirect(ItemId::Num(2)));
    }

    #[test]
    fn test_counterpart_without_match_creates() {
        let res = resolve(
            &[],
            &DesiredSelector::counterpart("C", Some("topic42")),
            &ResolverPolicy::default(),
        );
        assert_eq!(
            res,
            Resolution::Create {
                recipient_id: "C".to_string(),
                context: Some("topic42".to_string()),
            }
        );
    }

    #[test]
    fn test_counterpart_without_match_and_creation_disabled_falls_back() {
        let policy = ResolverPolicy::default().with_create_missing(false);
        let res = resolve(&chats(), &DesiredSelector::counterpart("Z", None), &policy);
        assert_eq!(res, Resolution::Redirect(ItemId::Num(1)));
    }

    #[test]
    fn test_stale_id_redirects_to_first() {
        let res = resolve(&chats(), &DesiredSelector::id(99), &ResolverPolicy::default());
        assert_eq!(res, Resolution::Redirect(ItemId::Num(1)));
        assert!(res.is_redirect());
    }

    #[test]
    fn test_no_selector_redirects_to_first() {
        let res = resolve(&chats(), &DesiredSelector::None, &ResolverPolicy::default());
        assert_eq!(res, Resolution::Redirect(ItemId::Num(1)));
    }

    #[test]
    fn test_empty_collection_is_pending() {
        let policy = ResolverPolicy::default();
        assert_eq!(resolve(&[], &DesiredSelector::id(1), &policy), Resolution::Pending);
        assert_eq!(resolve(&[], &DesiredSelector::None, &policy), Resolution::Pending);
    }

    #[test]
    fn test_redirect_disabled_stays_pending() {
        let policy = ResolverPolicy::default().with_redirect_to_first(false);
        assert_eq!(resolve(&chats(), &DesiredSelector::id(99), &policy), Resolution::Pending);
    }

    #[test]
    fn test_duplicate_counterparts_pick_first_in_order() {
        let items = vec![item(7, "A", 5), item(3, "A", 4)];
        let res = resolve(
            &items,
            &DesiredSelector::counterpart("A", None),
            &ResolverPolicy::default(),
        );
        assert_eq!(res, Resolution::Redirect(ItemId::Num(7)));
    }

    #[test]
    fn test_redirect_target_resolves_without_redirect() {
        let policy = ResolverPolicy::default();
        let Resolution::Redirect(id) =
            resolve(&chats(), &DesiredSelector::counterpart("B", None), &policy)
        else {
            panic!("Expected redirect");
        };
        let second = resolve(&chats(), &DesiredSelector::Id { id }, &policy);
        assert!(matches!(second, Resolution::Selected(_)));
    }

    #[test]
    fn test_text_id_selected_from_query() {
        let items = vec![
            ListItem::new("17", "A", EntityKind::Chat, Utc.timestamp_opt(2, 0).unwrap()),
            ListItem::new("18", "B", EntityKind::Chat, Utc.timestamp_opt(1, 0).unwrap()),
        ];
        let policy = ResolverPolicy::default();

        let selector = DesiredSelector::from_query("?id=17").unwrap();
        let res = resolve(&items, &selector, &policy);
        assert_eq!(res, Resolution::Selected(items[0].clone()));

        // A redirect to a text id must survive being written to and read from the URL.
        let Resolution::Redirect(id) =
            resolve(&items, &DesiredSelector::counterpart("B", None), &policy)
        else {
            panic!("Expected redirect");
        };
        let reread = DesiredSelector::from_query(&DesiredSelector::Id { id }.to_query()).unwrap();
        assert_eq!(resolve(&items, &reread, &policy), Resolution::Selected(items[1].clone()));
    }
}

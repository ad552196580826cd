//! Backend DTOs and their mapping onto [`ListItem`].
//!
//! The REST backend serves camelCase JSON. Each entity type names its
//! counterpart differently, so the mapping decides which field becomes
//! `recipient_id`.

use crate::model::{EntityKind, ItemId, ListItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat thread between the signed-in actor and one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDto {
    pub id: ItemId,
    pub recipient_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
}

/// A lead assigned to an attorney.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDto {
    pub id: ItemId,
    pub client_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

/// An invoice billed to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDto {
    pub id: ItemId,
    pub client_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

/// Any entity as it appears in a fixture file or mixed listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WireEntity {
    Chat(ChatDto),
    Lead(LeadDto),
    Invoice(InvoiceDto),
}

impl From<ChatDto> for ListItem {
    fn from(dto: ChatDto) -> Self {
        ListItem {
            id: dto.id,
            recipient_id: dto.recipient_id,
            kind: EntityKind::Chat,
            created_at: dto.created_at,
            topic: dto.topic_id,
            status: None,
            title: dto.last_message,
        }
    }
}

impl From<LeadDto> for ListItem {
    fn from(dto: LeadDto) -> Self {
        ListItem {
            id: dto.id,
            recipient_id: dto.client_id,
            kind: EntityKind::Lead,
            created_at: dto.created_at,
            topic: dto.practice_area,
            status: dto.status,
            title: dto.client_name,
        }
    }
}

impl From<InvoiceDto> for ListItem {
    fn from(dto: InvoiceDto) -> Self {
        ListItem {
            id: dto.id,
            recipient_id: dto.client_id,
            kind: EntityKind::Invoice,
            created_at: dto.created_at,
            topic: dto.case_id,
            status: dto.status,
            title: dto.number,
        }
    }
}

impl From<WireEntity> for ListItem {
    fn from(entity: WireEntity) -> Self {
        match entity {
            WireEntity::Chat(dto) => dto.into(),
            WireEntity::Lead(dto) => dto.into(),
            WireEntity::Invoice(dto) => dto.into(),
        }
    }
}

impl From<&ListItem> for WireEntity {
    fn from(item: &ListItem) -> Self {
        let item = item.clone();
        match item.kind {
            EntityKind::Chat => WireEntity::Chat(ChatDto {
                id: item.id,
                recipient_id: item.recipient_id,
                created_at: item.created_at,
                topic_id: item.topic,
                last_message: item.title,
            }),
            EntityKind::Lead => WireEntity::Lead(LeadDto {
                id: item.id,
                client_id: item.recipient_id,
                created_at: item.created_at,
                status: item.status,
                practice_area: item.topic,
                client_name: item.title,
            }),
            EntityKind::Invoice => WireEntity::Invoice(InvoiceDto {
                id: item.id,
                client_id: item.recipient_id,
                created_at: item.created_at,
                status: item.status,
                case_id: item.topic,
                number: item.title,
            }),
        }
    }
}

/// Parse a JSON array of wire entities into list items.
pub fn parse_entities(json: &str) -> serde_json::Result<Vec<ListItem>> {
    let entities: Vec<WireEntity> = serde_json::from_str(json)?;
    Ok(entities.into_iter().map(ListItem::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_dto_maps_recipient_and_topic() {
        let json = r#"{"id": 7, "recipientId": "atty-1", "createdAt": "2024-05-01T10:00:00Z", "topicId": "42"}"#;
        let dto: ChatDto = serde_json::from_str(json).unwrap();
        let item = ListItem::from(dto);
        assert_eq!(item.id, ItemId::Num(7));
        assert_eq!(item.recipient_id, "atty-1");
        assert_eq!(item.kind, EntityKind::Chat);
        assert_eq!(item.topic.as_deref(), Some("42"));
    }

    #[test]
    fn test_lead_dto_uses_client_as_recipient() {
        let json = r#"{"id": "lead-3", "clientId": "client-9", "createdAt": "2024-05-01T10:00:00Z", "status": "active"}"#;
        let dto: LeadDto = serde_json::from_str(json).unwrap();
        let item = ListItem::from(dto);
        assert_eq!(item.id, ItemId::Text("lead-3".to_string()));
        assert_eq!(item.recipient_id, "client-9");
        assert_eq!(item.status.as_deref(), Some("active"));
    }

    #[test]
    fn test_parse_mixed_entities() {
        let json = r#"[
            {"kind": "chat", "id": 1, "recipientId": "A", "createdAt": "2024-05-02T00:00:00Z"},
            {"kind": "invoice", "id": 2, "clientId": "B", "createdAt": "2024-05-01T00:00:00Z", "number": "INV-002"}
        ]"#;
        let items = parse_entities(json).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].kind, EntityKind::Invoice);
        assert_eq!(items[1].recipient_id, "B");
        assert_eq!(items[1].title.as_deref(), Some("INV-002"));
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        let json = r#"[{"kind": "memo", "id": 1}]"#;
        assert!(parse_entities(json).is_err());
    }

    #[test]
    fn test_list_item_back_to_wire_keeps_fields() {
        let json = r#"{"kind": "lead", "id": 5, "clientId": "C", "createdAt": "2024-05-01T00:00:00Z", "practiceArea": "family"}"#;
        let entity: WireEntity = serde_json::from_str(json).unwrap();
        let item = ListItem::from(entity.clone());
        assert_eq!(WireEntity::from(&item), entity);
    }
}

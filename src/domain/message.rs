use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::message_kind::MessageKind;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Message {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub kind: MessageKind,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub subscriber_id: Uuid,
    pub kind: MessageKind,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl NewMessage {
    pub fn into_message(self, id: Uuid) -> Message {
        Message {
            id,
            subscriber_id: self.subscriber_id,
            kind: self.kind,
            content: self.content,
            sent_at: self.sent_at,
            read: false,
        }
    }
}

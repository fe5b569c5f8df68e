use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Normal,
    Reasoning,
}

/// One transcript entry. Immutable once a turn finalizes; the streaming
/// placeholder is the only message ever edited in place, and only while its
/// turn is live. A User message always has kind Normal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: u64,
    pub origin: Origin,
    pub kind: MessageKind,
    pub text: String,
}

impl Message {
    pub fn user(id: u64, text: String) -> Self {
        Self {
            id,
            origin: Origin::User,
            kind: MessageKind::Normal,
            text,
        }
    }

    pub fn assistant(id: u64, kind: MessageKind, text: String) -> Self {
        Self {
            id,
            origin: Origin::Assistant,
            kind,
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_round_trip_serialization() {
        let message = Message::assistant(7, MessageKind::Reasoning, "weighing options".to_string());
        let json = serde_json::to_string(&message).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn test_user_messages_are_always_normal() {
        let message = Message::user(1, "hello".to_string());
        assert_eq!(message.origin, Origin::User);
        assert_eq!(message.kind, MessageKind::Normal);
    }
}

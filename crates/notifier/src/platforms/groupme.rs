use herald_common::types::ChannelKind;
use serde_json::{Value, json};

use crate::channel::Platform;

/// GroupMe bot posts: `{"bot_id": ..., "text": ...}` sent to the bots API.
pub struct GroupMe {
    bot_id: String,
    max_chunk_size: usize,
}

impl GroupMe {
    pub fn new(bot_id: impl Into<String>, max_chunk_size: usize) -> Self {
        Self {
            bot_id: bot_id.into(),
            max_chunk_size,
        }
    }
}

impl Platform for GroupMe {
    fn kind(&self) -> ChannelKind {
        ChannelKind::GroupMe
    }

    fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    fn payload(&self, chunk: &str) -> Value {
        json!({
            "bot_id": self.bot_id,
            "text": chunk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_carries_bot_id() {
        let groupme = GroupMe::new("bot-42", 1000);
        assert_eq!(
            groupme.payload("hello"),
            json!({"bot_id": "bot-42", "text": "hello"})
        );
        assert_eq!(groupme.kind(), ChannelKind::GroupMe);
        assert_eq!(groupme.max_chunk_size(), 1000);
    }
}

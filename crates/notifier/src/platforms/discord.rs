use herald_common::types::ChannelKind;
use serde_json::{Value, json};

use crate::channel::Platform;

/// Discord webhook: `{"content": ...}`.
pub struct Discord {
    max_chunk_size: usize,
}

impl Discord {
    pub fn new(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }
}

impl Platform for Discord {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Discord
    }

    fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    fn payload(&self, chunk: &str) -> Value {
        json!({ "content": chunk })
    }
}

use herald_common::types::ChannelKind;
use serde_json::{Value, json};

use crate::channel::Platform;

/// Slack incoming webhook. Text is wrapped in a code fence so score tables
/// keep their alignment.
pub struct Slack {
    max_chunk_size: usize,
}

impl Slack {
    pub fn new(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }
}

impl Platform for Slack {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Slack
    }

    fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    fn payload(&self, chunk: &str) -> Value {
        json!({ "text": format!("```\n{chunk}```") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_code_fenced() {
        assert_eq!(
            Slack::new(40000).payload("Week 3"),
            json!({"text": "```\nWeek 3```"})
        );
    }

    #[test]
    fn test_payload_escapes_quotes() {
        // Serialized through serde_json, never by string concatenation.
        let body = Slack::new(40000).payload(r#"say "hi""#).to_string();
        assert_eq!(body, r#"{"text":"```\nsay \"hi\"```"}"#);
    }
}

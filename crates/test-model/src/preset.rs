use serde::{Deserialize, Serialize};
use serde_json::Value;
use websage_model::ToolCallRequest;

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallRequest),
}

impl PresetEvent {
    /// Shorthand for a tool call event.
    pub fn tool_call(id: &str, name: &str, arguments: Value) -> Self {
        PresetEvent::ToolCall(ToolCallRequest {
            id: id.to_owned(),
            name: name.to_owned(),
            arguments,
        })
    }
}

/// The preset response for an assistant step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failures: None,
        }
    }

    /// Creates a text-only response.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.into())])
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_load_from_json() {
        let script = json!({
            "events": [
                { "type": "message_delta", "data": "Searching now." },
                {
                    "type": "tool_call",
                    "data": {
                        "id": "call:0",
                        "name": "searchWeb",
                        "arguments": { "query": "tokio 1.49 changelog" }
                    }
                }
            ]
        });

        let response: PresetResponse = serde_json::from_value(script).unwrap();
        assert_eq!(response.failures, None);
        assert_eq!(
            response,
            PresetResponse::with_events([
                PresetEvent::MessageDelta("Searching now.".to_owned()),
                PresetEvent::tool_call(
                    "call:0",
                    "searchWeb",
                    json!({ "query": "tokio 1.49 changelog" }),
                ),
            ])
        );
    }
}

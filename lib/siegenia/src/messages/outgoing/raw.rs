use super::OutgoingMessage;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct RawMessage {
    #[serde(skip)]
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl RawMessage {
    pub fn new(command: impl Into<String>, params: Option<Value>) -> Self {
        RawMessage {
            command: command.into(),
            params,
        }
    }
}

impl OutgoingMessage for RawMessage {
    fn command(&self) -> &str {
        &self.command
    }
}

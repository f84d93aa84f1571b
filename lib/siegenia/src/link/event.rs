use serde_json::Value;

use crate::Error;

#[derive(Debug)]
pub enum LinkEvent {
    Connected,
    Reconnected,
    Closed {
        code: u16,
        reason: String,
    },
    Error(Error),
    Data {
        status: String,
        data: Value,
        command: Option<String>,
    },
}

use super::OutgoingMessage;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct SetDeviceParamsMessage {
    params: Value,
}

impl SetDeviceParamsMessage {
    pub fn new(params: Value) -> Self {
        SetDeviceParamsMessage { params }
    }
}

impl OutgoingMessage for SetDeviceParamsMessage {
    fn command(&self) -> &str {
        "setDeviceParams"
    }
}

use super::OutgoingMessage;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct KeepAliveMessage {
    params: KeepAliveParams,
}

#[derive(Debug, Serialize)]
struct KeepAliveParams {
    extend_session: bool,
}

impl Default for KeepAliveMessage {
    fn default() -> Self {
        KeepAliveMessage {
            params: KeepAliveParams {
                extend_session: true,
            },
        }
    }
}

impl OutgoingMessage for KeepAliveMessage {
    fn command(&self) -> &str {
        "keepAlive"
    }
}

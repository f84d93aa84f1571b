use std::fmt;

use crate::device_type::UnknownDeviceType;

#[derive(Debug)]
pub enum Error {
    ConnectionAlreadyActive,
    ConnectionNotInitialized,
    Timeout(u64),
    StreamClosed,
    WebSocket(tokio_tungstenite::tungstenite::Error),
    Json(serde_json::Error),
    InvalidHeader,
    Tls(native_tls::Error),
    Url(url::ParseError),
    UnsupportedUrl(String),
    Status { command: String, status: String },
    UnknownDeviceType(u64),
    UnknownProperty(String),
    ReadOnlyProperty(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        match err {
            tokio_tungstenite::tungstenite::Error::AlreadyClosed
            | tokio_tungstenite::tungstenite::Error::ConnectionClosed => Self::StreamClosed,
            err => Self::WebSocket(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<native_tls::Error> for Error {
    fn from(err: native_tls::Error) -> Self {
        Self::Tls(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Url(err)
    }
}

impl From<tokio_tungstenite::tungstenite::http::header::InvalidHeaderValue> for Error {
    fn from(_: tokio_tungstenite::tungstenite::http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader
    }
}

impl From<UnknownDeviceType> for Error {
    fn from(err: UnknownDeviceType) -> Self {
        Self::UnknownDeviceType(err.0)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionAlreadyActive => write!(f, "connection already active"),
            Self::ConnectionNotInitialized => write!(f, "connection not initialized"),
            Self::Timeout(id) => write!(f, "timeout waiting for response to request {id}"),
            Self::StreamClosed => write!(f, "stream closed"),
            Self::WebSocket(err) => write!(f, "websocket error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::InvalidHeader => write!(f, "invalid header value"),
            Self::Tls(err) => write!(f, "tls error: {err}"),
            Self::Url(err) => write!(f, "url error: {err}"),
            Self::UnsupportedUrl(url) => write!(f, "unsupported device url {url}"),
            Self::Status { command, status } => {
                write!(f, "{command} failed with status {status}")
            }
            Self::UnknownDeviceType(value) => write!(f, "unknown device type {value}"),
            Self::UnknownProperty(path) => write!(f, "unknown property {path}"),
            Self::ReadOnlyProperty(path) => write!(f, "property {path} is read only"),
        }
    }
}

impl std::error::Error for Error {}

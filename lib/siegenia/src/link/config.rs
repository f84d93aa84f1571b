use std::fmt;
use std::time::Duration;

use url::Url;

use crate::{Error, Result};

const DEFAULT_PORT: u16 = 443;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scheme {
    Ws,
    Wss,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Ws => write!(f, "ws"),
            Scheme::Wss => write!(f, "wss"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LinkConfig {
    pub host: String,
    pub port: u16,
    pub scheme: Scheme,
    pub response_timeout: Duration,
    pub heartbeat_interval: Duration,
    pub heartbeat_initial_delay: Duration,
    pub reconnect_base: Duration,
    pub reconnect_step: Duration,
    pub reconnect_max: Duration,
    pub first_request_id: u64,
    pub accept_invalid_certs: bool,
}

impl LinkConfig {
    pub fn new(host: impl Into<String>) -> Self {
        LinkConfig {
            host: host.into(),
            port: DEFAULT_PORT,
            scheme: Scheme::Wss,
            response_timeout: Duration::from_secs(20),
            heartbeat_interval: Duration::from_secs(10),
            heartbeat_initial_delay: Duration::from_secs(1),
            reconnect_base: Duration::from_secs(5),
            reconnect_step: Duration::from_secs(5),
            reconnect_max: Duration::from_secs(60),
            first_request_id: 1,
            accept_invalid_certs: true,
        }
    }

    /// Parses `ws://host[:port]` or `wss://host[:port]`. The port defaults to
    /// 443 for both schemes.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)?;

        let scheme = match parsed.scheme() {
            "ws" => Scheme::Ws,
            "wss" => Scheme::Wss,
            _ => return Err(Error::UnsupportedUrl(url.to_string())),
        };

        let host = parsed
            .host_str()
            .ok_or_else(|| Error::UnsupportedUrl(url.to_string()))?;

        Ok(LinkConfig::new(host)
            .scheme(scheme)
            .port(parsed.port().unwrap_or(DEFAULT_PORT)))
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn heartbeat(mut self, interval: Duration, initial_delay: Duration) -> Self {
        self.heartbeat_interval = interval;
        self.heartbeat_initial_delay = initial_delay;
        self
    }

    pub fn reconnect_backoff(mut self, base: Duration, step: Duration, max: Duration) -> Self {
        self.reconnect_base = base;
        self.reconnect_step = step;
        self.reconnect_max = max;
        self
    }

    pub fn first_request_id(mut self, id: u64) -> Self {
        self.first_request_id = id;
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn url(&self) -> String {
        format!("{}/WebSocket", self.origin())
    }

    pub fn reconnect_delay(&self, errors: u32) -> Duration {
        let delay = self.reconnect_base.saturating_add(self.reconnect_step.saturating_mul(errors));
        delay.min(self.reconnect_max)
    }
}

mod config;
pub use config::{LinkConfig, Scheme};

mod event;
pub use event::LinkEvent;

#[cfg(test)]
mod simulator;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, ORIGIN};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{
    connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream,
};

use crate::messages::incoming::Response;
use crate::messages::outgoing::{
    GetDeviceDetailsMessage, GetDeviceMessage, GetDeviceParamsMessage, GetDeviceStateMessage,
    KeepAliveMessage, LoginMessage, LoginTokenMessage, LogoutMessage, OutgoingMessage,
    RebootDeviceMessage, RenewCertMessage, ResetDeviceMessage, SetDeviceParamsMessage,
};
use crate::{Error, Result};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Writer = SplitSink<Socket, Message>;
type Reader = SplitStream<Socket>;

const ABNORMAL_CLOSURE: u16 = 1006;
const NO_STATUS: u16 = 1005;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

struct PendingRequest {
    responder: oneshot::Sender<Result<Response>>,
    timeout: JoinHandle<()>,
}

#[derive(Default)]
struct LinkState {
    status: ConnectionStatus,
    writer: Option<Arc<Mutex<Writer>>>,
    request_id: u64,
    pending: HashMap<u64, PendingRequest>,
    was_connected: bool,
    error_counter: u32,
    stopped: bool,
    /// Bumped on every connect so stale tasks of an old transport are ignored.
    generation: u64,
    reader: Option<JoinHandle<()>>,
    heartbeat: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
}

struct Shared {
    config: LinkConfig,
    state: Mutex<LinkState>,
    events: mpsc::UnboundedSender<LinkEvent>,
}

#[derive(Clone)]
pub struct DeviceLink {
    shared: Arc<Shared>,
}

impl DeviceLink {
    pub fn new(config: LinkConfig) -> (DeviceLink, mpsc::UnboundedReceiver<LinkEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();

        let state = LinkState {
            request_id: config.first_request_id,
            ..LinkState::default()
        };

        let link = DeviceLink {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(state),
                events,
            }),
        };

        (link, receiver)
    }

    pub fn config(&self) -> &LinkConfig {
        &self.shared.config
    }

    fn host(&self) -> &str {
        &self.shared.config.host
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.shared.state.lock().await.status
    }

    pub async fn connect(&self) -> Result<()> {
        let generation = {
            let mut state = self.shared.state.lock().await;
            if state.status != ConnectionStatus::Disconnected {
                return Err(Error::ConnectionAlreadyActive);
            }

            state.status = ConnectionStatus::Connecting;
            state.stopped = false;
            state.generation += 1;

            if let Some(reconnect) = state.reconnect.take() {
                reconnect.abort();
            }

            state.generation
        };

        info!("{}: connecting to {}", self.host(), self.shared.config.url());

        let socket = match self.open().await {
            Ok(socket) => socket,
            Err(err) => {
                error!("{}: cannot open websocket: {err}", self.host());
                self.handle_close(generation, ABNORMAL_CLOSURE, err.to_string())
                    .await;
                return Err(err);
            }
        };

        let (writer, reader) = socket.split();
        let writer = Arc::new(Mutex::new(writer));

        let mut state = self.shared.state.lock().await;

        if state.stopped || state.generation != generation {
            state.status = ConnectionStatus::Disconnected;
            drop(state);

            info!("{}: disconnected while opening", self.host());
            _ = writer.lock().await.close().await;

            return Err(Error::StreamClosed);
        }

        info!("{}: websocket open, starting heartbeat", self.host());

        state.status = ConnectionStatus::Connected;
        state.writer = Some(writer);
        state.reader = Some(tokio::spawn(self.clone().read_loop(reader, generation)));

        let initial_delay = self.shared.config.heartbeat_initial_delay;
        self.schedule_heartbeat(&mut state, initial_delay);

        let event = if state.was_connected {
            LinkEvent::Reconnected
        } else {
            LinkEvent::Connected
        };
        state.was_connected = true;

        // emitted under the lock so it precedes any data event of this transport
        self.emit(event);

        Ok(())
    }

    async fn open(&self) -> Result<Socket> {
        let config = &self.shared.config;

        let mut request = config.url().into_client_request()?;
        request
            .headers_mut()
            .insert(ORIGIN, HeaderValue::from_str(&config.origin())?);

        let connector = match config.scheme {
            Scheme::Wss => {
                let tls = native_tls::TlsConnector::builder()
                    .danger_accept_invalid_certs(config.accept_invalid_certs)
                    .danger_accept_invalid_hostnames(config.accept_invalid_certs)
                    .build()?;
                Connector::NativeTls(tls)
            }
            Scheme::Ws => Connector::Plain,
        };

        let (socket, _) = connect_async_tls_with_config(request, None, false, Some(connector)).await?;

        Ok(socket)
    }

    pub async fn send_request<Msg>(&self, message: Msg) -> Result<Response>
    where
        Msg: Serialize + OutgoingMessage,
    {
        let (id, writer, text, receiver) = {
            let mut state = self.shared.state.lock().await;
            let writer = state.writer.clone().ok_or(Error::ConnectionNotInitialized)?;

            state.request_id += 1;
            let id = state.request_id;
            let text = envelope(&message, id)?;

            let (responder, receiver) = oneshot::channel();
            let timeout = tokio::spawn(self.clone().expire(id));
            state.pending.insert(id, PendingRequest { responder, timeout });

            (id, writer, text, receiver)
        };

        if let Err(err) = self.write(&writer, text).await {
            if let Some(pending) = self.shared.state.lock().await.pending.remove(&id) {
                pending.timeout.abort();
            }
            return Err(err);
        }

        receiver.await.map_err(|_| Error::StreamClosed)?
    }

    pub async fn send<Msg>(&self, message: Msg) -> Result<()>
    where
        Msg: Serialize + OutgoingMessage,
    {
        let (writer, text) = {
            let mut state = self.shared.state.lock().await;
            let writer = state.writer.clone().ok_or(Error::ConnectionNotInitialized)?;

            state.request_id += 1;
            (writer, envelope(&message, state.request_id)?)
        };

        self.write(&writer, text).await
    }

    async fn write(&self, writer: &Mutex<Writer>, text: String) -> Result<()> {
        debug!("{}: sent {}", self.host(), text);

        let mut writer = writer.lock().await;
        writer.send(Message::text(text)).await?;

        Ok(())
    }

    async fn expire(self, id: u64) {
        tokio::time::sleep(self.shared.config.response_timeout).await;

        let pending = self.shared.state.lock().await.pending.remove(&id);
        if let Some(pending) = pending {
            warn!("{}: no response to request {id}", self.host());
            _ = pending.responder.send(Err(Error::Timeout(id)));
        }
    }

    pub async fn heartbeat(&self, delay: Duration) {
        let mut state = self.shared.state.lock().await;
        self.schedule_heartbeat(&mut state, delay);
    }

    fn schedule_heartbeat(&self, state: &mut LinkState, delay: Duration) {
        if let Some(heartbeat) = state.heartbeat.take() {
            heartbeat.abort();
        }

        state.heartbeat = Some(tokio::spawn(self.clone().heartbeat_loop(delay)));
    }

    async fn heartbeat_loop(self, mut delay: Duration) {
        loop {
            tokio::time::sleep(delay).await;

            match self.send_request(KeepAliveMessage::default()).await {
                Ok(response) if response.is_ok() => {
                    delay = self.shared.config.heartbeat_interval;
                }
                Ok(response) => {
                    error!("{}: keep alive failed: {}", self.host(), response.status);
                    self.emit(LinkEvent::Error(Error::Status {
                        command: "keepAlive".to_string(),
                        status: response.status,
                    }));
                    break;
                }
                Err(err) => {
                    error!("{}: keep alive failed: {err}", self.host());
                    self.emit(LinkEvent::Error(err));
                    break;
                }
            }
        }
    }

    async fn read_loop(self, mut reader: Reader, generation: u64) {
        let (code, reason) = loop {
            match reader.next().await {
                Some(Ok(Message::Text(text))) => self.dispatch(text.as_str()).await,
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => self.dispatch(text).await,
                    Err(err) => warn!("{}: binary frame is not utf-8: {err}", self.host()),
                },
                Some(Ok(Message::Ping(payload))) => {
                    let writer = self.shared.state.lock().await.writer.clone();
                    if let Some(writer) = writer {
                        _ = writer.lock().await.send(Message::Pong(payload)).await;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    break match frame {
                        Some(frame) => (u16::from(frame.code), frame.reason.as_str().to_string()),
                        None => (NO_STATUS, String::new()),
                    };
                }
                Some(Ok(_)) => (),
                Some(Err(err)) => {
                    error!("{}: websocket error: {err}", self.host());
                    let reason = err.to_string();
                    self.emit(LinkEvent::Error(err.into()));
                    break (ABNORMAL_CLOSURE, reason);
                }
                None => break (ABNORMAL_CLOSURE, String::new()),
            }
        };

        self.handle_close(generation, code, reason).await;
    }

    async fn dispatch(&self, text: &str) {
        let response: Response = match serde_json::from_str(text) {
            Ok(response) => response,
            Err(err) => {
                warn!("{}: cannot parse {text}: {err}", self.host());
                self.emit(LinkEvent::Error(err.into()));
                return;
            }
        };

        debug!("{}: received {}", self.host(), text.trim());

        let pending = {
            let mut state = self.shared.state.lock().await;
            if state.error_counter > 1 {
                debug!("{}: message resets error counter", self.host());
            }
            state.error_counter = 0;

            response.id.and_then(|id| state.pending.remove(&id))
        };

        match pending {
            Some(pending) => {
                pending.timeout.abort();
                _ = pending.responder.send(Ok(response));
            }
            None => self.emit(LinkEvent::Data {
                status: response.status,
                data: response.data,
                command: response.command,
            }),
        }
    }

    async fn handle_close(&self, generation: u64, code: u16, reason: String) {
        let mut state = self.shared.state.lock().await;
        if state.generation != generation || state.status == ConnectionStatus::Disconnected {
            return;
        }

        info!("{}: websocket closed {code}: {reason}", self.host());

        state.status = ConnectionStatus::Disconnected;
        state.writer = None;
        state.reader = None;
        state.error_counter = state.error_counter.saturating_add(1);

        if let Some(heartbeat) = state.heartbeat.take() {
            heartbeat.abort();
        }

        if !state.stopped {
            let delay = self.shared.config.reconnect_delay(state.error_counter);
            info!("{}: reconnect in {}s", self.host(), delay.as_secs_f32());
            state.reconnect = Some(tokio::spawn(self.clone().reconnect_after(delay)));
        }

        self.emit(LinkEvent::Closed { code, reason });
    }

    // boxed to break the connect -> reader -> close -> reconnect type cycle
    fn reconnect_after(self, delay: Duration) -> BoxFuture<'static, ()> {
        async move {
            tokio::time::sleep(delay).await;

            {
                let mut state = self.shared.state.lock().await;
                state.reconnect = None;
                if state.stopped {
                    return;
                }
                info!("{}: reconnect ({})", self.host(), state.error_counter);
            }

            if let Err(err) = self.connect().await {
                warn!("{}: reconnect failed: {err}", self.host());
            }
        }
        .boxed()
    }

    /// Stops the link. Pending requests are left to their timeouts and no
    /// reconnect happens until the next [`DeviceLink::connect`].
    pub async fn disconnect(&self, force: bool) {
        let (writer, generation) = {
            let mut state = self.shared.state.lock().await;
            state.stopped = true;

            if let Some(reconnect) = state.reconnect.take() {
                reconnect.abort();
            }

            let Some(writer) = state.writer.clone() else {
                return;
            };

            if force {
                if let Some(reader) = state.reader.take() {
                    reader.abort();
                }
            } else {
                state.status = ConnectionStatus::Closing;
                state.writer = None;
            }

            (writer, state.generation)
        };

        if force {
            info!("{}: terminating websocket", self.host());
            self.handle_close(generation, ABNORMAL_CLOSURE, String::new())
                .await;
        } else {
            info!("{}: closing websocket", self.host());
            if let Err(err) = writer.lock().await.close().await {
                warn!("{}: cannot close websocket: {err}", self.host());
                self.handle_close(generation, ABNORMAL_CLOSURE, err.to_string())
                    .await;
            }
        }
    }

    fn emit(&self, event: LinkEvent) {
        _ = self.shared.events.send(event);
    }

    pub async fn login(&self, user: &str, password: &str) -> Result<Response> {
        self.send_request(LoginMessage::new(user, password)).await
    }

    pub async fn login_with_token(&self, token: &str) -> Result<Response> {
        self.send_request(LoginTokenMessage::new(token)).await
    }

    pub async fn logout(&self) -> Result<Response> {
        self.send_request(LogoutMessage::default()).await
    }

    pub async fn get_device(&self) -> Result<Response> {
        self.send_request(GetDeviceMessage::default()).await
    }

    pub async fn get_device_state(&self) -> Result<Response> {
        self.send_request(GetDeviceStateMessage::default()).await
    }

    pub async fn get_device_params(&self) -> Result<Response> {
        self.send_request(GetDeviceParamsMessage::default()).await
    }

    pub async fn set_device_params(&self, params: Value) -> Result<Response> {
        self.send_request(SetDeviceParamsMessage::new(params)).await
    }

    pub async fn get_device_details(&self) -> Result<Response> {
        self.send_request(GetDeviceDetailsMessage::default()).await
    }

    pub async fn reset_device(&self) -> Result<Response> {
        self.send_request(ResetDeviceMessage::default()).await
    }

    pub async fn reboot_device(&self) -> Result<Response> {
        self.send_request(RebootDeviceMessage::default()).await
    }

    pub async fn renew_cert(&self) -> Result<Response> {
        self.send_request(RenewCertMessage::default()).await
    }
}

fn envelope<Msg>(message: &Msg, id: u64) -> Result<String>
where
    Msg: Serialize + OutgoingMessage,
{
    let command = message.command().to_string();
    let mut json = serde_json::to_value(message)?;

    if let Some(object) = json.as_object_mut() {
        object.insert("command".to_string(), Value::String(command));
        object.insert("id".to_string(), Value::from(id));
    }

    Ok(serde_json::to_string(&json)?)
}

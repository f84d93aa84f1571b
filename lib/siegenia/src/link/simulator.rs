use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

type Responder = fn(&Value) -> Option<Value>;

#[derive(Debug)]
pub enum Action {
    Send(Value),
    SendRaw(String),
    Close,
    Drop,
}

pub struct Simulator {
    pub port: u16,
    requests: mpsc::UnboundedReceiver<Value>,
    actions: mpsc::UnboundedSender<Action>,
    connections: Arc<AtomicUsize>,
}

impl Simulator {
    pub async fn start(responder: Responder) -> Simulator {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (request_sender, requests) = mpsc::unbounded_channel();
        let (actions, action_receiver) = mpsc::unbounded_channel();
        let action_receiver = Arc::new(Mutex::new(action_receiver));
        let connections = Arc::new(AtomicUsize::new(0));

        let accepted = connections.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let Ok(socket) = accept_async(stream).await else {
                    continue;
                };
                accepted.fetch_add(1, Ordering::SeqCst);

                serve(socket, responder, &request_sender, &action_receiver).await;
            }
        });

        Simulator {
            port,
            requests,
            actions,
            connections,
        }
    }

    pub fn answer_ok(request: &Value) -> Option<Value> {
        Some(json!({ "id": request["id"], "status": "ok", "data": {} }))
    }

    pub fn silent(_: &Value) -> Option<Value> {
        None
    }

    pub async fn next_request(&mut self) -> Value {
        tokio::time::timeout(Duration::from_secs(5), self.requests.recv())
            .await
            .unwrap()
            .unwrap()
    }

    pub fn act(&self, action: Action) {
        self.actions.send(action).unwrap();
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

async fn serve(
    socket: WebSocketStream<TcpStream>,
    responder: Responder,
    requests: &mpsc::UnboundedSender<Value>,
    actions: &Mutex<mpsc::UnboundedReceiver<Action>>,
) {
    let (mut write, mut read) = socket.split();
    let mut actions = actions.lock().await;

    loop {
        tokio::select! {
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let request: Value = serde_json::from_str(text.as_str()).unwrap();
                    if let Some(reply) = responder(&request) {
                        _ = write.send(Message::text(reply.to_string())).await;
                    }
                    _ = requests.send(request);
                }
                Some(Ok(Message::Close(_))) => {
                    // sends the queued close reply
                    _ = write.flush().await;
                    break;
                }
                Some(Err(_)) | None => break,
                Some(Ok(_)) => (),
            },
            action = actions.recv() => match action {
                Some(Action::Send(value)) => {
                    _ = write.send(Message::text(value.to_string())).await;
                }
                Some(Action::SendRaw(text)) => {
                    _ = write.send(Message::text(text)).await;
                }
                Some(Action::Close) => {
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
                        reason: "bye".into(),
                    };
                    _ = write.send(Message::Close(Some(frame))).await;
                    break;
                }
                Some(Action::Drop) | None => break,
            },
        }
    }
}

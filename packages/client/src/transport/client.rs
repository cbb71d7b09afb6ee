//! Client transport state machine.
//!
//! `idle -> connecting -> open -> (closed -> reconnect-scheduled -> connecting)* -> open`,
//! ending in `closed-by-request` after [`ClientTransport::disconnect`] or
//! `closed-after-max-retries` once the reconnect budget is spent.
//!
//! Messages sent while the connection is down are queued and flushed in FIFO
//! order when the next connection opens.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use reqwest::Url;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::{sync::mpsc, task::JoinHandle};

use katagami_shared::{
    protocol::{MoldId, close_code},
    time::now_rfc3339,
};

use crate::error::{ListenerError, TransportError};

use super::{
    connector::{Connector, Frame, Link},
    listeners::{EventBus, ListenerId},
    reconnect::ReconnectPolicy,
};

/// Local events emitted by the transport itself.
///
/// Messages received from the gateway are emitted under their `type` tag.
pub mod event {
    /// A connection opened and the outbound queue was flushed.
    pub const CONNECTED: &str = "connected";
    /// The connection closed. Payload: `{ code, reason }`.
    pub const DISCONNECTED: &str = "disconnected";
    /// The reconnect budget is spent; no further automatic attempt follows.
    pub const RECONNECT_FAILED: &str = "reconnect_failed";
    /// A connection attempt failed before opening. Payload: `{ error }`.
    pub const ERROR: &str = "error";
}

const CLIENT_DISCONNECT_REASON: &str = "Client disconnect";

/// Snapshot of the transport state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportStatus {
    pub is_connected: bool,
    pub reconnect_attempts: u32,
    pub queued_messages: usize,
}

struct State {
    connected: bool,
    token: Option<String>,
    sink: Option<mpsc::UnboundedSender<Frame>>,
    queue: VecDeque<String>,
    policy: ReconnectPolicy,
    closed_by_request: bool,
    session: Option<JoinHandle<()>>,
}

struct Inner {
    url: String,
    connector: Arc<dyn Connector>,
    events: EventBus,
    state: Mutex<State>,
}

/// What the session loop does after a connection closed.
enum AfterClose {
    Stop,
    Retry(std::time::Duration),
    GiveUp,
}

/// Handle to one logical connection to the gateway.
///
/// Cloning the handle shares the same connection.
#[derive(Clone)]
pub struct ClientTransport {
    inner: Arc<Inner>,
}

impl ClientTransport {
    /// Create a transport for the gateway endpoint `url` (e.g. `ws://127.0.0.1:8080/ws`).
    pub fn new(url: impl Into<String>, connector: Arc<dyn Connector>, policy: ReconnectPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                connector,
                events: EventBus::new(),
                state: Mutex::new(State {
                    connected: false,
                    token: None,
                    sink: None,
                    queue: VecDeque::new(),
                    policy,
                    closed_by_request: false,
                    session: None,
                }),
            }),
        }
    }

    /// Open the connection with `token`.
    ///
    /// Does nothing while a connection is open or being established. Starting a
    /// fresh connection resets the reconnect budget.
    pub fn connect(&self, token: &str) {
        let mut state = self.inner.lock_state();
        if state.connected {
            return;
        }
        if let Some(session) = &state.session
            && !session.is_finished()
            && !state.closed_by_request
        {
            return;
        }
        if let Some(old) = state.session.take() {
            old.abort();
        }

        state.token = Some(token.to_string());
        state.closed_by_request = false;
        state.policy.reset();
        state.session = Some(tokio::spawn(run_session(self.inner.clone())));
    }

    /// Close the connection on the user's request.
    ///
    /// No automatic reconnect follows, and `reconnect_failed` is not emitted.
    pub fn disconnect(&self) {
        let mut state = self.inner.lock_state();
        state.policy.exhaust();
        state.closed_by_request = true;
        state.connected = false;
        if let Some(sink) = state.sink.take() {
            let _ = sink.send(Frame::Close {
                code: close_code::NORMAL_CLOSURE,
                reason: CLIENT_DISCONNECT_REASON.to_string(),
            });
        }
    }

    /// Send `{type, ...data, timestamp}`.
    ///
    /// Returns `false` when the message could not be handed to an open
    /// connection; it is then queued and sent on the next open.
    pub fn send(&self, message_type: &str, data: Map<String, Value>) -> bool {
        let text = Value::Object(envelope(message_type, data)).to_string();

        let mut state = self.inner.lock_state();
        let sink = if state.connected {
            state.sink.clone()
        } else {
            None
        };
        if let Some(sink) = sink {
            match sink.send(Frame::Text(text)) {
                Ok(()) => return true,
                Err(mpsc::error::SendError(frame)) => {
                    tracing::warn!("Failed to send '{}', queueing", message_type);
                    if let Frame::Text(text) = frame {
                        state.queue.push_back(text);
                    }
                    return false;
                }
            }
        }

        tracing::debug!("Not connected, queueing '{}'", message_type);
        state.queue.push_back(text);
        false
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock_state().connected
    }

    pub fn status(&self) -> TransportStatus {
        let state = self.inner.lock_state();
        TransportStatus {
            is_connected: state.connected,
            reconnect_attempts: state.policy.attempts(),
            queued_messages: state.queue.len(),
        }
    }

    /// Subscribe to a local event or a gateway message type.
    pub fn on<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&Value) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.inner.events.on(event, listener)
    }

    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.inner.events.off(event, id)
    }

    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        self.inner.events.emit(event, payload)
    }

    pub fn notify_mold_created(&self, mold: Value) -> bool {
        self.send("mold_created", fields([("mold", mold)]))
    }

    pub fn notify_mold_updated(&self, mold: Value) -> bool {
        self.send("mold_updated", fields([("mold", mold)]))
    }

    pub fn notify_mold_deleted(&self, mold_id: &MoldId) -> bool {
        self.send("mold_deleted", fields([("moldId", json!(mold_id))]))
    }

    pub fn notify_canvas_object_added(&self, object: Value) -> bool {
        self.send("canvas_object_added", fields([("object", object)]))
    }

    pub fn notify_canvas_object_moved(
        &self,
        object_id: &str,
        x: f64,
        y: f64,
        rotation: f64,
        scale: f64,
    ) -> bool {
        self.send(
            "canvas_object_moved",
            fields([
                ("objectId", json!(object_id)),
                ("x", json!(x)),
                ("y", json!(y)),
                ("rotation", json!(rotation)),
                ("scale", json!(scale)),
            ]),
        )
    }

    pub fn notify_canvas_object_removed(&self, object_id: &str) -> bool {
        self.send("canvas_object_removed", fields([("objectId", json!(object_id))]))
    }

    pub fn notify_canvas_cleared(&self) -> bool {
        self.send("canvas_cleared", Map::new())
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn endpoint(&self) -> Result<String, TransportError> {
        let token = self.lock_state().token.clone().unwrap_or_default();
        Url::parse_with_params(&self.url, &[("token", token.as_str())])
            .map(|url| url.to_string())
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))
    }

    /// Open transition: mark connected, reset the budget and flush the queue.
    fn on_open(&self, outgoing: &mpsc::UnboundedSender<Frame>) {
        {
            let mut state = self.lock_state();
            if state.closed_by_request {
                let _ = outgoing.send(Frame::Close {
                    code: close_code::NORMAL_CLOSURE,
                    reason: CLIENT_DISCONNECT_REASON.to_string(),
                });
                return;
            }
            state.connected = true;
            state.policy.reset();
            state.sink = Some(outgoing.clone());

            let mut flushed = 0;
            while let Some(text) = state.queue.pop_front() {
                if let Err(mpsc::error::SendError(frame)) = outgoing.send(Frame::Text(text)) {
                    // Keep the failed message first in line for the next open
                    if let Frame::Text(text) = frame {
                        state.queue.push_front(text);
                    }
                    break;
                }
                flushed += 1;
            }
            if flushed > 0 {
                tracing::info!("Flushed {} queued message(s)", flushed);
            }
        }
        tracing::info!("Connected to {}", self.url);
        self.events.emit(event::CONNECTED, &json!({}));
    }

    fn on_message(&self, text: &str) {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Dropping unparseable message: {}", e);
                return;
            }
        };
        match value.get("type").and_then(Value::as_str) {
            Some(message_type) => {
                self.events.emit(message_type, &value);
            }
            None => tracing::warn!("Dropping message without a type: {}", text),
        }
    }

    /// Close transition: decide whether another attempt follows.
    fn on_close(&self, code: u16, reason: &str) -> AfterClose {
        let after = {
            let mut state = self.lock_state();
            state.connected = false;
            state.sink = None;
            if state.closed_by_request {
                AfterClose::Stop
            } else {
                match state.policy.next_delay() {
                    Some(delay) => AfterClose::Retry(delay),
                    None => AfterClose::GiveUp,
                }
            }
        };
        tracing::info!("Disconnected (code {}): {}", code, reason);
        self.events
            .emit(event::DISCONNECTED, &json!({"code": code, "reason": reason}));
        after
    }

    fn attempts(&self) -> (u32, u32) {
        let state = self.lock_state();
        (state.policy.attempts(), state.policy.max_attempts())
    }

    fn closed_by_request(&self) -> bool {
        self.lock_state().closed_by_request
    }
}

/// Wait for the connection to close and return its close code and reason.
async fn pump(inner: &Inner, link: Link) -> (u16, String) {
    let Link {
        outgoing,
        mut incoming,
    } = link;
    inner.on_open(&outgoing);
    drop(outgoing);

    while let Some(frame) = incoming.recv().await {
        match frame {
            Frame::Text(text) => inner.on_message(&text),
            Frame::Close { code, reason } => return (code, reason),
        }
    }
    (close_code::ABNORMAL_CLOSURE, String::new())
}

async fn run_session(inner: Arc<Inner>) {
    loop {
        let opened = match inner.endpoint() {
            Ok(url) => inner.connector.open(&url).await,
            Err(e) => Err(e),
        };
        let (code, reason) = match opened {
            Ok(link) => pump(&inner, link).await,
            Err(e) => {
                tracing::warn!("Connection attempt failed: {}", e);
                inner
                    .events
                    .emit(event::ERROR, &json!({"error": e.to_string()}));
                (close_code::ABNORMAL_CLOSURE, e.to_string())
            }
        };

        match inner.on_close(code, &reason) {
            AfterClose::Stop => break,
            AfterClose::Retry(delay) => {
                let (attempt, max) = inner.attempts();
                tracing::info!(
                    "Reconnecting in {} ms... (attempt {}/{})",
                    delay.as_millis(),
                    attempt,
                    max
                );
                tokio::time::sleep(delay).await;
                if inner.closed_by_request() {
                    break;
                }
            }
            AfterClose::GiveUp => {
                tracing::error!("Failed to reconnect, giving up");
                inner.events.emit(event::RECONNECT_FAILED, &json!({}));
                break;
            }
        }
    }
}

fn envelope(message_type: &str, data: Map<String, Value>) -> Map<String, Value> {
    let mut envelope = Map::new();
    envelope.insert("type".to_string(), Value::String(message_type.to_string()));
    envelope.extend(data);
    envelope.insert("timestamp".to_string(), Value::String(now_rfc3339()));
    envelope
}

fn fields<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::test_support::{FailingConnector, MemoryConnector, recorder};
    use std::time::Duration;
    use tokio::time::Instant;

    const URL: &str = "ws://gateway.test/ws";

    fn transport_with(connector: Arc<dyn Connector>) -> ClientTransport {
        ClientTransport::new(URL, connector, ReconnectPolicy::default())
    }

    #[test]
    fn test_envelope_merges_data_and_timestamp() {
        // テスト項目: 封筒は type、データ、timestamp を一つのオブジェクトにまとめる
        // given (前提条件):
        let data = fields([("objectId", json!("o1")), ("timestamp", json!("old"))]);

        // when (操作):
        let envelope = envelope("canvas_object_removed", data);

        // then (期待する結果):
        assert_eq!(envelope["type"], "canvas_object_removed");
        assert_eq!(envelope["objectId"], "o1");
        assert_ne!(envelope["timestamp"], "old");
        assert!(envelope["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_send_while_disconnected_queues() {
        // テスト項目: 未接続時の送信はキューに積まれ false を返す
        // given (前提条件):
        let (connector, _peers) = MemoryConnector::new();
        let transport = transport_with(Arc::new(connector));

        // when (操作):
        let sent = transport.notify_canvas_cleared();

        // then (期待する結果):
        assert!(!sent);
        assert_eq!(
            transport.status(),
            TransportStatus {
                is_connected: false,
                reconnect_attempts: 0,
                queued_messages: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_queue_flushed_in_order_on_open() {
        // テスト項目: 未接続時に送った 3 件が接続後に同じ順序で届く
        // given (前提条件):
        let (connector, mut peers) = MemoryConnector::new();
        let transport = transport_with(Arc::new(connector));
        let (connected, mut connected_rx) = recorder();
        transport.on(event::CONNECTED, connected);
        transport.notify_canvas_object_removed("a");
        transport.notify_canvas_object_removed("b");
        transport.notify_canvas_object_removed("c");

        // when (操作):
        transport.connect("token-1");
        let mut peer = peers.recv().await.unwrap();
        connected_rx.recv().await.unwrap();

        // then (期待する結果):
        assert!(peer.url.ends_with("/ws?token=token-1"));
        let mut ids = Vec::new();
        for _ in 0..3 {
            let value = peer.next_json().await;
            assert_eq!(value["type"], "canvas_object_removed");
            ids.push(value["objectId"].as_str().unwrap().to_string());
        }
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(transport.status().queued_messages, 0);
        assert!(transport.is_connected());
    }

    #[tokio::test]
    async fn test_send_while_connected() {
        // テスト項目: 接続中の送信はそのまま届き true を返す
        // given (前提条件):
        let (connector, mut peers) = MemoryConnector::new();
        let transport = transport_with(Arc::new(connector));
        let (connected, mut connected_rx) = recorder();
        transport.on(event::CONNECTED, connected);
        transport.connect("token-1");
        let mut peer = peers.recv().await.unwrap();
        connected_rx.recv().await.unwrap();

        // when (操作):
        let sent = transport.notify_canvas_object_moved("o1", 120.0, 90.0, 0.0, 1.0);

        // then (期待する結果):
        assert!(sent);
        let value = peer.next_json().await;
        assert_eq!(value["type"], "canvas_object_moved");
        assert_eq!(value["x"], 120.0);
        assert_eq!(value["y"], 90.0);
    }

    #[tokio::test]
    async fn test_mold_notifications_carry_payload() {
        // テスト項目: モールド通知は mold / moldId と timestamp を載せて届く
        // given (前提条件):
        let (connector, mut peers) = MemoryConnector::new();
        let transport = transport_with(Arc::new(connector));
        let (connected, mut connected_rx) = recorder();
        transport.on(event::CONNECTED, connected);
        transport.connect("token-1");
        let mut peer = peers.recv().await.unwrap();
        connected_rx.recv().await.unwrap();
        let mold = json!({"id": 3, "name": "Star", "width": 120, "svgPath": "uploads/star.svg"});

        // when (操作):
        assert!(transport.notify_mold_created(mold.clone()));
        assert!(transport.notify_mold_updated(json!({"id": 3, "name": "Big star"})));
        assert!(transport.notify_mold_deleted(&MoldId::Number(3)));

        // then (期待する結果):
        let created = peer.next_json().await;
        assert_eq!(created["type"], "mold_created");
        assert_eq!(created["mold"], mold);
        assert!(created["timestamp"].is_string());

        let updated = peer.next_json().await;
        assert_eq!(updated["type"], "mold_updated");
        assert_eq!(updated["mold"]["name"], "Big star");
        assert!(updated["timestamp"].is_string());

        let deleted = peer.next_json().await;
        assert_eq!(deleted["type"], "mold_deleted");
        assert_eq!(deleted["moldId"], 3);
        assert!(deleted.get("mold").is_none());
        assert!(deleted["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_send_failure_while_connected_queues() {
        // テスト項目: 接続中でも送信に失敗した場合はキューに積まれ false を返す
        // given (前提条件):
        let (connector, mut peers) = MemoryConnector::new();
        let transport = transport_with(Arc::new(connector));
        let (connected, mut connected_rx) = recorder();
        transport.on(event::CONNECTED, connected);
        transport.connect("token-1");
        let peer = peers.recv().await.unwrap();
        connected_rx.recv().await.unwrap();
        let (from_client, _to_client) = peer.split();
        drop(from_client);

        // when (操作):
        let sent = transport.notify_canvas_cleared();

        // then (期待する結果):
        assert!(!sent);
        assert_eq!(transport.status().queued_messages, 1);
    }

    #[tokio::test]
    async fn test_incoming_messages_are_emitted_by_type() {
        // テスト項目: 受信したメッセージは type ごとにリスナーへ渡され、解析できないものは捨てられる
        // given (前提条件):
        let (connector, mut peers) = MemoryConnector::new();
        let transport = transport_with(Arc::new(connector));
        let (joined, mut joined_rx) = recorder();
        transport.on("user_joined", joined);
        transport.connect("token-1");
        let peer = peers.recv().await.unwrap();

        // when (操作):
        peer.send_text("not json");
        peer.send_text(r#"{"no_type":true}"#);
        peer.send_text(r#"{"type":"user_joined","userId":2,"email":"bob@example.com"}"#);

        // then (期待する結果):
        let value = joined_rx.recv().await.unwrap();
        assert_eq!(value["userId"], 2);
        assert!(joined_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_schedules_reconnect_after_delay() {
        // テスト項目: 切断されると disconnected が通知され、3000ms 後に再接続する
        // given (前提条件):
        let (connector, mut peers) = MemoryConnector::new();
        let transport = transport_with(Arc::new(connector));
        let (disconnected, mut disconnected_rx) = recorder();
        transport.on(event::DISCONNECTED, disconnected);
        transport.connect("token-1");
        let first = peers.recv().await.unwrap();

        // when (操作):
        let closed_at = Instant::now();
        first.send_close(1006, "gone");
        let payload = disconnected_rx.recv().await.unwrap();
        let _second = peers.recv().await.unwrap();

        // then (期待する結果):
        assert_eq!(payload, json!({"code": 1006, "reason": "gone"}));
        assert!(closed_at.elapsed() >= Duration::from_millis(3000));
        assert!(closed_at.elapsed() < Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_gives_up_after_max_attempts() {
        // テスト項目: 接続失敗が続くと 5 回の再試行の後に reconnect_failed が一度だけ通知される
        // given (前提条件):
        let connector = Arc::new(FailingConnector::default());
        let transport = transport_with(connector.clone());
        let (failed, mut failed_rx) = recorder();
        let (errors, mut errors_rx) = recorder();
        transport.on(event::RECONNECT_FAILED, failed);
        transport.on(event::ERROR, errors);

        // when (操作):
        transport.connect("token-1");
        failed_rx.recv().await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;

        // then (期待する結果):
        assert_eq!(connector.attempts(), 6);
        assert!(failed_rx.try_recv().is_err());
        let mut error_count = 0;
        while errors_rx.try_recv().is_ok() {
            error_count += 1;
        }
        assert_eq!(error_count, 6);
        assert_eq!(transport.status().reconnect_attempts, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_does_not_reconnect() {
        // テスト項目: 明示的な切断では close 1000 が送られ、再接続も reconnect_failed も起きない
        // given (前提条件):
        let (connector, mut peers) = MemoryConnector::new();
        let transport = transport_with(Arc::new(connector));
        let (connected, mut connected_rx) = recorder();
        let (disconnected, mut disconnected_rx) = recorder();
        let (failed, mut failed_rx) = recorder();
        transport.on(event::CONNECTED, connected);
        transport.on(event::DISCONNECTED, disconnected);
        transport.on(event::RECONNECT_FAILED, failed);
        transport.connect("token-1");
        let mut peer = peers.recv().await.unwrap();
        connected_rx.recv().await.unwrap();

        // when (操作):
        transport.disconnect();
        let frame = peer.next_frame().await;
        peer.send_close(1000, "Client disconnect");
        disconnected_rx.recv().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;

        // then (期待する結果):
        assert_eq!(
            frame,
            Some(Frame::Close {
                code: 1000,
                reason: "Client disconnect".to_string(),
            })
        );
        assert!(peers.try_recv().is_err());
        assert!(failed_rx.try_recv().is_err());
        assert!(!transport.is_connected());
        assert!(!transport.notify_canvas_cleared());
    }

    #[tokio::test]
    async fn test_connect_is_noop_while_connected() {
        // テスト項目: 接続中の connect は何もしない
        // given (前提条件):
        let (connector, mut peers) = MemoryConnector::new();
        let transport = transport_with(Arc::new(connector));
        let (connected, mut connected_rx) = recorder();
        transport.on(event::CONNECTED, connected);
        transport.connect("token-1");
        let _peer = peers.recv().await.unwrap();
        connected_rx.recv().await.unwrap();

        // when (操作):
        transport.connect("token-2");
        tokio::task::yield_now().await;

        // then (期待する結果):
        assert!(peers.try_recv().is_err());
    }
}

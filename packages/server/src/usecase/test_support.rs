//! UseCase テスト用のヘルパー

use std::sync::Arc;

use tokio::sync::mpsc;

use katagami_shared::protocol::{ServerMessage, UserIdentity};

use crate::{
    domain::{Connection, ConnectionId, GatewayRepository, MessagePusher, Outbound, RoomName},
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryGatewayRepository,
    },
};

pub fn create_test_repository() -> Arc<InMemoryGatewayRepository> {
    Arc::new(InMemoryGatewayRepository::new())
}

pub fn create_test_message_pusher() -> Arc<WebSocketMessagePusher> {
    Arc::new(WebSocketMessagePusher::new())
}

pub fn cid(value: &str) -> ConnectionId {
    ConnectionId::new(value.to_string()).unwrap()
}

/// 接続を直接登録し、その接続の受信側を返す
pub async fn register_test_connection(
    repository: &InMemoryGatewayRepository,
    pusher: &WebSocketMessagePusher,
    id: &str,
    user_id: i64,
    room: &str,
) -> mpsc::UnboundedReceiver<Outbound> {
    let (tx, rx) = mpsc::unbounded_channel();
    let connection = Connection::new(
        cid(id),
        UserIdentity::new(user_id, format!("user{}@example.com", user_id)),
        RoomName::new(room.to_string()).unwrap(),
        1000,
    );
    repository.register(connection).await.unwrap();
    pusher.register_client(cid(id), tx).await;
    rx
}

/// 受信済みのテキストフレームを全て ServerMessage として取り出す
pub fn drain_messages(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<ServerMessage> {
    let mut messages = Vec::new();
    while let Ok(outbound) = rx.try_recv() {
        if let Outbound::Text(text) = outbound {
            messages.push(serde_json::from_str(&text).unwrap());
        }
    }
    messages
}

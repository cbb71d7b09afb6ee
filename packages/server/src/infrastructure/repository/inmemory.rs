//! InMemory Gateway Repository 実装
//!
//! ドメイン層が定義する GatewayRepository trait の具体的な実装。
//! `GatewayState`（Connection Registry + Room Directory）を一つの Mutex で保持し、
//! 各操作を一つの排他区間で実行します。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionId, GatewayRepository, GatewayState, LivenessCheck, RepositoryError,
    RoomName,
};

/// インメモリ Gateway Repository 実装
#[derive(Default)]
pub struct InMemoryGatewayRepository {
    state: Mutex<GatewayState>,
}

impl InMemoryGatewayRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GatewayRepository for InMemoryGatewayRepository {
    async fn register(&self, connection: Connection) -> Result<(), RepositoryError> {
        self.state.lock().await.register(connection)
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> Option<Connection> {
        self.state.lock().await.unregister(connection_id)
    }

    async fn get_connection(&self, connection_id: &ConnectionId) -> Option<Connection> {
        self.state.lock().await.connection(connection_id).cloned()
    }

    async fn get_broadcast_targets(&self, connection_id: &ConnectionId) -> Vec<ConnectionId> {
        self.state.lock().await.broadcast_targets(connection_id)
    }

    async fn get_connections(&self) -> Vec<Connection> {
        self.state.lock().await.connections()
    }

    async fn get_room_names(&self) -> Vec<RoomName> {
        self.state.lock().await.room_names()
    }

    async fn mark_alive(&self, connection_id: &ConnectionId) -> bool {
        self.state.lock().await.mark_alive(connection_id)
    }

    async fn check_liveness(&self, connection_id: &ConnectionId) -> Option<LivenessCheck> {
        self.state.lock().await.check_liveness(connection_id)
    }

    async fn count_connections(&self) -> usize {
        self.state.lock().await.connection_count()
    }
}

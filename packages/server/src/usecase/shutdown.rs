//! UseCase: ゲートウェイ停止処理
//!
//! 停止時に全ての接続へ close 1012 を送ります。close を受け取った各接続の
//! writer タスクが終了し、接続ハンドラが通常の切断処理を行います。

use std::sync::Arc;

use katagami_shared::protocol::close_code;

use crate::domain::{GatewayRepository, MessagePusher, Outbound};

const SHUTDOWN_REASON: &str = "server shutting down";

/// 停止処理のユースケース
pub struct ShutdownUseCase {
    repository: Arc<dyn GatewayRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ShutdownUseCase {
    /// 新しい ShutdownUseCase を作成
    pub fn new(
        repository: Arc<dyn GatewayRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 全ての接続に close を送る
    ///
    /// # Returns
    ///
    /// close を送信できた接続の数
    pub async fn execute(&self) -> usize {
        let connections = self.repository.get_connections().await;
        let mut closed = 0;
        for connection in connections {
            let close = Outbound::Close {
                code: close_code::SERVICE_RESTART,
                reason: SHUTDOWN_REASON.to_string(),
            };
            match self.message_pusher.push_to(&connection.id, close).await {
                Ok(()) => closed += 1,
                Err(e) => tracing::warn!("Failed to close '{}' on shutdown: {}", connection.id, e),
            }
        }
        tracing::info!("Sent shutdown close to {} client(s)", closed);
        closed
    }
}

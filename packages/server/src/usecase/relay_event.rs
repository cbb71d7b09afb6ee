//! UseCase: イベント中継処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelayEventUseCase::execute() メソッド
//! - 受信メッセージの解析と種別ごとのルーティング
//!
//! ### なぜこのテストが必要か
//! - 送信者自身にはイベントが返らないこと（自己除外）を保証
//! - 別ルームの接続にイベントが漏れないこと（ルーム分離）を保証
//! - 不正なメッセージや未知の種別で誰にも何も送られないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：キャンバス・モールドイベントの中継、ping への pong 返信
//! - 異常系：JSON でないメッセージ、未知の種別
//! - エッジケース：送信者のみが接続している場合（中継対象なし）

use std::sync::Arc;

use katagami_shared::protocol::{ClientMessage, ProtocolError, Route};

use crate::domain::{ConnectionId, GatewayRepository, MessagePusher, Outbound};

use super::error::RelayError;

/// 中継結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// ルームの他の参加者に中継した
    Broadcast {
        message_type: &'static str,
        recipients: usize,
    },
    /// 送信者に直接返信した
    Replied { message_type: &'static str },
}

/// イベント中継のユースケース
pub struct RelayEventUseCase {
    /// Repository（接続・ルーム状態の抽象化）
    repository: Arc<dyn GatewayRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelayEventUseCase {
    /// 新しい RelayEventUseCase を作成
    pub fn new(
        repository: Arc<dyn GatewayRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 受信したテキストフレームを処理する
    ///
    /// # Arguments
    ///
    /// * `from` - 送信者の接続 ID
    /// * `text` - 受信した JSON テキスト
    ///
    /// # Returns
    ///
    /// * `Ok(RelayOutcome)` - 中継または返信した
    /// * `Err(RelayError)` - 解析できない・未知の種別・送信者不明など（誰にも何も送っていない）
    pub async fn execute(&self, from: &ConnectionId, text: &str) -> Result<RelayOutcome, RelayError> {
        // 1. 解析
        let message = ClientMessage::parse(text).map_err(|e| match e {
            ProtocolError::Malformed(reason) => RelayError::Malformed(reason),
            ProtocolError::UnknownType(message_type) => RelayError::UnknownType(message_type),
        })?;
        let message_type = message.message_type();

        // 2. 送信者の特定
        let sender = self
            .repository
            .get_connection(from)
            .await
            .ok_or_else(|| RelayError::UnknownConnection(from.to_string()))?;

        // 3. ルーティング
        match message.route(&sender.identity) {
            Route::Broadcast(event) => {
                let json = event
                    .to_json()
                    .map_err(|e| RelayError::Serialization(e.to_string()))?;
                let targets = self.repository.get_broadcast_targets(from).await;
                let recipients = self.message_pusher.broadcast(targets, &json).await?;
                Ok(RelayOutcome::Broadcast {
                    message_type,
                    recipients,
                })
            }
            Route::Reply(reply) => {
                let json = reply
                    .to_json()
                    .map_err(|e| RelayError::Serialization(e.to_string()))?;
                self.message_pusher
                    .push_to(from, Outbound::Text(json))
                    .await?;
                Ok(RelayOutcome::Replied { message_type })
            }
        }
    }
}

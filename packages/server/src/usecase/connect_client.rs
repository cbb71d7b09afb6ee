//! UseCase: クライアント接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectClientUseCase::authenticate() / execute() メソッド
//! - 資格情報の検証、接続の登録、デフォルトルームへの参加、参加通知
//!
//! ### なぜこのテストが必要か
//! - 資格情報のない・不正な接続がリソースを確保しないことを保証
//! - 新規接続には自分の `connected` が先に届き、自分の `user_joined` は届かないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規クライアントの接続
//! - 異常系：資格情報なし・検証失敗
//! - エッジケース：ルームに他の参加者がいない場合

use std::sync::Arc;

use katagami_shared::{
    protocol::{ServerMessage, UserIdentity},
    time::now_millis,
};

use crate::domain::{
    Connection, ConnectionId, CredentialVerifier, GatewayRepository, MessagePusher, Outbound,
    PusherChannel, RoomName,
};

use super::error::ConnectError;

/// 接続成功時に `connected` に載せるメッセージ
const CONNECTED_MESSAGE: &str = "Connected successfully";

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    /// Repository（接続・ルーム状態の抽象化）
    repository: Arc<dyn GatewayRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 資格情報の検証（認証サブシステムへの窓口）
    verifier: Arc<dyn CredentialVerifier>,
    /// 新規接続が参加するルーム
    default_room: RoomName,
}

impl ConnectClientUseCase {
    /// 新しい ConnectClientUseCase を作成
    pub fn new(
        repository: Arc<dyn GatewayRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        verifier: Arc<dyn CredentialVerifier>,
        default_room: RoomName,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            verifier,
            default_room,
        }
    }

    /// 資格情報を検証する
    ///
    /// 接続の登録より前に呼ばれ、失敗した場合は何も確保しない。
    pub fn authenticate(&self, token: Option<&str>) -> Result<UserIdentity, ConnectError> {
        let token = token.ok_or(ConnectError::MissingCredential)?;
        self.verifier
            .verify(token)
            .ok_or(ConnectError::InvalidCredential)
    }

    /// クライアント接続を実行
    ///
    /// 1. 接続 ID を生成し、送信チャンネルに直接 `connected` を積む
    /// 2. 送信チャンネルを MessagePusher に登録する
    /// 3. 接続を登録し、デフォルトルームに参加させる
    /// 4. ルームの他の参加者に `user_joined` をブロードキャストする
    ///
    /// `connected` はチャンネルが他の処理から見える前に積まれるため、常に最初の
    /// メッセージになる。ルームに参加した時点で送信チャンネルは登録済みなので、
    /// 参加直後に中継されたイベントも取りこぼさない。
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionId)` - 接続成功（生成された接続 ID）
    /// * `Err(ConnectError)` - 接続失敗
    pub async fn execute(
        &self,
        identity: UserIdentity,
        sender: PusherChannel,
    ) -> Result<ConnectionId, ConnectError> {
        let connection_id = ConnectionId::generate();
        let connected_json = ServerMessage::Connected {
            client_id: connection_id.to_string(),
            message: CONNECTED_MESSAGE.to_string(),
        }
        .to_json()
        .map_err(|e| ConnectError::Serialization(e.to_string()))?;
        let joined_json = ServerMessage::UserJoined {
            user_id: identity.user_id,
            email: identity.email.clone(),
        }
        .to_json()
        .map_err(|e| ConnectError::Serialization(e.to_string()))?;

        // 1. 新規接続への connected
        if sender.send(Outbound::Text(connected_json)).is_err() {
            tracing::warn!("Client '{}' went away before connected", connection_id);
        }

        // 2. 送信チャンネルの登録
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;

        // 3. 接続の登録とルーム参加
        let connection = Connection::new(
            connection_id.clone(),
            identity.clone(),
            self.default_room.clone(),
            now_millis(),
        );
        if let Err(e) = self.repository.register(connection).await {
            self.message_pusher.unregister_client(&connection_id).await;
            return Err(e.into());
        }
        tracing::info!(
            "Client '{}' connected as {} (user {}) in room '{}'",
            connection_id,
            identity.email,
            identity.user_id,
            self.default_room
        );

        // 4. 他の参加者への user_joined
        let targets = self
            .repository
            .get_broadcast_targets(&connection_id)
            .await;
        if let Err(e) = self.message_pusher.broadcast(targets, &joined_json).await {
            tracing::warn!("Failed to broadcast user_joined: {}", e);
        }

        Ok(connection_id)
    }
}

//! Server state shared by the handlers.

use std::{sync::Arc, time::Duration};

use crate::usecase::{
    ConnectClientUseCase, DisconnectClientUseCase, GetStatusUseCase, HeartbeatUseCase,
    RelayEventUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectClientUseCase（クライアント接続のユースケース）
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// RelayEventUseCase（イベント中継のユースケース）
    pub relay_event_usecase: Arc<RelayEventUseCase>,
    /// HeartbeatUseCase（生存確認のユースケース）
    pub heartbeat_usecase: Arc<HeartbeatUseCase>,
    /// GetStatusUseCase（状態取得のユースケース）
    pub get_status_usecase: Arc<GetStatusUseCase>,
    /// Period of the per-connection liveness monitor
    pub heartbeat_interval: Duration,
}

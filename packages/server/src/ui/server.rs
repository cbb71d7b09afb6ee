//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::GatewayConfig,
    domain::CredentialVerifier,
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryGatewayRepository,
    },
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, GetStatusUseCase, HeartbeatUseCase,
        RelayEventUseCase, ShutdownUseCase,
    },
};

use super::{
    handler::{health_check, websocket_handler, ws_status},
    signal::shutdown_signal,
    state::AppState,
};

/// Collaboration gateway server
///
/// # Example
///
/// ```ignore
/// let server = Server::in_memory(verifier, &GatewayConfig::default());
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// ConnectClientUseCase（クライアント接続のユースケース）
    connect_client_usecase: Arc<ConnectClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// RelayEventUseCase（イベント中継のユースケース）
    relay_event_usecase: Arc<RelayEventUseCase>,
    /// HeartbeatUseCase（生存確認のユースケース）
    heartbeat_usecase: Arc<HeartbeatUseCase>,
    /// GetStatusUseCase（状態取得のユースケース）
    get_status_usecase: Arc<GetStatusUseCase>,
    /// ShutdownUseCase（停止処理のユースケース）
    shutdown_usecase: Arc<ShutdownUseCase>,
    heartbeat_interval: Duration,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        connect_client_usecase: Arc<ConnectClientUseCase>,
        disconnect_client_usecase: Arc<DisconnectClientUseCase>,
        relay_event_usecase: Arc<RelayEventUseCase>,
        heartbeat_usecase: Arc<HeartbeatUseCase>,
        get_status_usecase: Arc<GetStatusUseCase>,
        shutdown_usecase: Arc<ShutdownUseCase>,
        heartbeat_interval: Duration,
    ) -> Self {
        Self {
            connect_client_usecase,
            disconnect_client_usecase,
            relay_event_usecase,
            heartbeat_usecase,
            get_status_usecase,
            shutdown_usecase,
            heartbeat_interval,
        }
    }

    /// Wire a server backed by the in-memory repository and the WebSocket pusher.
    pub fn in_memory(verifier: Arc<dyn CredentialVerifier>, config: &GatewayConfig) -> Self {
        let repository = Arc::new(InMemoryGatewayRepository::new());
        let message_pusher = Arc::new(WebSocketMessagePusher::new());

        Self::new(
            Arc::new(ConnectClientUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                verifier,
                config.default_room.clone(),
            )),
            Arc::new(DisconnectClientUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            Arc::new(RelayEventUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            Arc::new(HeartbeatUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            Arc::new(GetStatusUseCase::new(repository.clone())),
            Arc::new(ShutdownUseCase::new(repository, message_pusher)),
            config.heartbeat_interval,
        )
    }

    /// Build the router serving the WebSocket and HTTP endpoints.
    pub fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            connect_client_usecase: self.connect_client_usecase.clone(),
            disconnect_client_usecase: self.disconnect_client_usecase.clone(),
            relay_event_usecase: self.relay_event_usecase.clone(),
            heartbeat_usecase: self.heartbeat_usecase.clone(),
            get_status_usecase: self.get_status_usecase.clone(),
            heartbeat_interval: self.heartbeat_interval,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/ws-status", get(ws_status))
            .route("/api/health", get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the gateway until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Katagami gateway listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws?token=<token>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// Every open connection receives close 1012 before the listener stops.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let shutdown_usecase = self.shutdown_usecase.clone();
        let graceful = async move {
            shutdown.await;
            tracing::info!("Shutting down, closing client connections");
            shutdown_usecase.execute().await;
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(graceful)
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

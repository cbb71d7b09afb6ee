//! Katagami collaboration gateway.
//!
//! Authenticates WebSocket clients with a JWT and relays canvas and mold events
//! between the members of a room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin katagami-server
//! JWT_SECRET=... cargo run --bin katagami-server -- --host 0.0.0.0 --port 3000
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;

use katagami_server::{
    config::GatewayConfig, domain::RoomName, infrastructure::auth::JwtCredentialVerifier,
    ui::Server,
};
use katagami_shared::logger::setup_logger;

const INSECURE_DEFAULT_SECRET: &str = "secret";

#[derive(Parser, Debug)]
#[command(name = "katagami-server")]
#[command(about = "Real-time collaboration gateway for the Katagami canvas", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Shared secret used to verify access tokens
    #[arg(long, env = "JWT_SECRET", default_value = INSECURE_DEFAULT_SECRET, hide_env_values = true)]
    jwt_secret: String,

    /// Room every new connection joins
    #[arg(short = 'r', long, default_value = RoomName::DEFAULT)]
    room: String,

    /// Seconds between liveness probes
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    heartbeat_secs: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    if args.jwt_secret == INSECURE_DEFAULT_SECRET {
        tracing::warn!("JWT_SECRET is not set, falling back to the insecure default secret");
    }
    let default_room = match RoomName::new(args.room) {
        Ok(room) => room,
        Err(e) => {
            tracing::error!("Invalid room name: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize dependencies in order:
    // 1. Configuration
    // 2. CredentialVerifier
    // 3. Server (in-memory repository, WebSocket pusher, usecases)

    // 1. Build the gateway configuration
    let config = GatewayConfig {
        default_room,
        heartbeat_interval: Duration::from_secs(args.heartbeat_secs),
    };

    // 2. Create CredentialVerifier (HS256 JWT)
    let verifier = Arc::new(JwtCredentialVerifier::new(args.jwt_secret.as_bytes()));

    // 3. Create and run the server
    let server = Server::in_memory(verifier, &config);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_secs_rejects_zero() {
        // テスト項目: 生存確認の周期に 0 秒は指定できない
        // given (前提条件):
        let zero = ["katagami-server", "--heartbeat-secs", "0"];
        let one = ["katagami-server", "--heartbeat-secs", "1"];

        // when (操作):
        let rejected = Args::try_parse_from(zero);
        let accepted = Args::try_parse_from(one);

        // then (期待する結果):
        assert!(rejected.is_err());
        assert_eq!(accepted.unwrap().heartbeat_secs, 1);
    }

    #[test]
    fn test_default_args() {
        // テスト項目: 引数なしでは 127.0.0.1:8080、ルーム main、30 秒周期になる
        let args = Args::try_parse_from(["katagami-server"]).unwrap();
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 8080);
        assert_eq!(args.room, RoomName::DEFAULT);
        assert_eq!(args.heartbeat_secs, 30);
    }
}

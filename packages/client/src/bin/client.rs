//! Interactive canvas client for the Katagami gateway.
//!
//! Connects with an access token, keeps a local replica of the shared canvas and
//! lets the user place, move and remove molds from the prompt. Reconnects
//! automatically (max 5 attempts, 3 seconds apart by default).
//!
//! Run with:
//! ```not_rust
//! KATAGAMI_TOKEN=... cargo run --bin katagami-client
//! cargo run --bin katagami-client -- --token ... --user-id 1 --api http://localhost:5050
//! ```

use std::time::Duration;

use clap::Parser;

use katagami_client::{
    cli::{ClientConfig, resolve_user_id, run_client},
    transport::{DEFAULT_MAX_ATTEMPTS, ReconnectPolicy},
};
use katagami_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "katagami-client")]
#[command(about = "Collaborative canvas client for the Katagami gateway", long_about = None)]
struct Args {
    /// Gateway WebSocket URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Base URL of the mold API and asset server
    #[arg(short = 'a', long, env = "KATAGAMI_API", default_value = "http://localhost:5050")]
    api: String,

    /// Access token issued at login
    #[arg(short = 't', long, env = "KATAGAMI_TOKEN", hide_env_values = true)]
    token: String,

    /// Own user id, used to ignore echoes of own edits (defaults to the token's `id` claim)
    #[arg(long, env = "KATAGAMI_USER_ID")]
    user_id: Option<i64>,

    /// Automatic reconnect attempts
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    reconnect_attempts: u32,

    /// Delay before each reconnect attempt (milliseconds)
    #[arg(long, default_value = "3000")]
    reconnect_delay_ms: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let user_id = resolve_user_id(args.user_id, &args.token);
    let config = ClientConfig {
        url: args.url,
        api_base: args.api,
        token: args.token,
        user_id,
        reconnect: ReconnectPolicy::new(
            args.reconnect_attempts,
            Duration::from_millis(args.reconnect_delay_ms),
        ),
    };

    // Run the client
    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

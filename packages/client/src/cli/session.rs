//! Interactive canvas session.

use std::sync::Arc;

use rustyline::{DefaultEditor, error::ReadlineError};
use serde_json::Value;
use tokio::sync::mpsc;

use katagami_shared::{protocol::UserId, time::now_millis};

use crate::{
    error::ClientError,
    formatter::MessageFormatter,
    scene::{HttpAssetFetcher, Mold, SceneReconciler},
    transport::{ClientTransport, ReconnectPolicy, TungsteniteConnector, event},
};

use super::{
    command::{Command, HELP, parse_command},
    mold_api::fetch_molds,
    ui::{PROMPT, print_with_prompt},
};

/// Peer events printed as they arrive
const PEER_EVENTS: [&str; 5] = [
    "user_joined",
    "user_left",
    "mold_created",
    "mold_updated",
    "mold_deleted",
];

/// Settings of one interactive session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway endpoint, e.g. `ws://127.0.0.1:8080/ws`
    pub url: String,
    /// Base URL of the mold API and asset server
    pub api_base: String,
    pub token: String,
    /// Own user id, used to drop echoes of own events
    pub user_id: Option<UserId>,
    pub reconnect: ReconnectPolicy,
}

/// Run the interactive client until the user quits or reconnection gives up
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let http = reqwest::Client::new();
    let mut molds = match fetch_molds(&http, &config.api_base, &config.token).await {
        Ok(molds) => molds,
        Err(e) => {
            tracing::warn!("Could not load molds: {}", e);
            Vec::new()
        }
    };

    let max_attempts = config.reconnect.max_attempts();
    let transport = ClientTransport::new(
        config.url.clone(),
        Arc::new(TungsteniteConnector),
        config.reconnect.clone(),
    );
    let reconciler = SceneReconciler::new(
        transport.clone(),
        Arc::new(HttpAssetFetcher::new(config.api_base.clone())),
        config.user_id,
    );
    reconciler.set_on_redraw(|objects| print_with_prompt(&MessageFormatter::format_scene(objects)));
    reconciler.set_on_image_ready(|object| tracing::debug!("Image ready for '{}'", object.id));
    reconciler.attach();

    let (failed_tx, mut failed_rx) = mpsc::unbounded_channel::<()>();
    subscribe_display(&transport, failed_tx, max_attempts);

    transport.connect(&config.token);
    println!("\nType 'help' for commands. Press Ctrl+C to exit.\n");

    let mut input_rx = spawn_readline();
    let result = loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else {
                    break Ok(());
                };
                match parse_command(&line) {
                    Ok(Command::Quit) => break Ok(()),
                    Ok(command) => execute(command, &reconciler, &mut molds, &http, &config).await,
                    Err(e) => println!("{}", e),
                }
            }
            _ = failed_rx.recv() => break Err(ClientError::ReconnectFailed),
        }
    };

    reconciler.detach();
    transport.disconnect();
    result
}

async fn execute(
    command: Command,
    reconciler: &SceneReconciler,
    molds: &mut Vec<Mold>,
    http: &reqwest::Client,
    config: &ClientConfig,
) {
    match command {
        Command::Molds => {
            match fetch_molds(http, &config.api_base, &config.token).await {
                Ok(fresh) => *molds = fresh,
                Err(e) => tracing::warn!("Could not refresh molds: {}", e),
            }
            print!("{}", MessageFormatter::format_molds(molds));
        }
        Command::Add { mold_id, x, y } => {
            match molds.iter().find(|m| m.id.to_string() == mold_id) {
                Some(mold) => {
                    let object = reconciler.place_mold(mold, x, y);
                    println!("placed {} as {}", mold.name, object.id);
                }
                None => println!("mold #{} not found, try 'molds'", mold_id),
            }
        }
        Command::Move { object_id, x, y } => {
            if !reconciler.move_object(&object_id, x, y) {
                println!("no object '{}'", object_id);
            }
        }
        Command::Remove { object_id } => {
            if !reconciler.remove_object(&object_id) {
                println!("no object '{}'", object_id);
            }
        }
        Command::Clear => reconciler.clear(),
        Command::List => print!("{}", MessageFormatter::format_scene(&reconciler.objects())),
        Command::Status => print!(
            "{}",
            MessageFormatter::format_status(&reconciler.transport().status())
        ),
        Command::Help => print!("{}", HELP),
        Command::Quit => {}
    }
}

/// Print transport and peer events as they arrive
fn subscribe_display(
    transport: &ClientTransport,
    failed_tx: mpsc::UnboundedSender<()>,
    max_attempts: u32,
) {
    transport.on("connected", |payload: &Value| {
        // The gateway's `connected` carries the connection id; the local one is empty
        if let Some(client_id) = payload.get("clientId").and_then(Value::as_str) {
            print_with_prompt(&MessageFormatter::format_connected(client_id, now_millis()));
        }
        Ok(())
    });
    transport.on(event::DISCONNECTED, |payload: &Value| {
        let code = payload
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or_default();
        let reason = payload
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or_default();
        print_with_prompt(&MessageFormatter::format_disconnected(code, reason));
        Ok(())
    });
    transport.on(event::RECONNECT_FAILED, move |_| {
        print_with_prompt(&MessageFormatter::format_reconnect_failed(max_attempts));
        let _ = failed_tx.send(());
        Ok(())
    });
    transport.on(event::ERROR, |payload: &Value| {
        tracing::debug!("Transport error: {}", payload);
        Ok(())
    });
    for event_type in PEER_EVENTS {
        transport.on(event_type, |payload: &Value| {
            let message = serde_json::from_value(payload.clone())
                .map_err(|e| crate::error::ListenerError::new(e.to_string()))?;
            if let Some(text) = MessageFormatter::format_peer_event(&message) {
                print_with_prompt(&text);
            }
            Ok(())
        });
    }
}

/// Spawn a blocking thread for rustyline (synchronous readline)
fn spawn_readline() -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}

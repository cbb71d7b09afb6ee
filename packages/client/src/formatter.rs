//! Message formatting utilities for client display.

use katagami_shared::{
    protocol::{ServerMessage, close_code},
    time::timestamp_to_rfc3339,
};

use crate::{
    scene::{CanvasObject, Mold},
    transport::TransportStatus,
};

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the greeting shown once the gateway accepted the connection
    pub fn format_connected(client_id: &str, connected_at: i64) -> String {
        format!(
            "\n* connected as {} at {}\n",
            client_id,
            timestamp_to_rfc3339(connected_at)
        )
    }

    /// Format a local `disconnected` event
    pub fn format_disconnected(code: u16, reason: &str) -> String {
        let label = match code {
            close_code::NORMAL_CLOSURE => "normal closure",
            close_code::ABNORMAL_CLOSURE => "connection lost",
            close_code::POLICY_VIOLATION => "rejected credential",
            close_code::SERVICE_RESTART => "server restarting",
            close_code::LIVENESS_TIMEOUT => "liveness timeout",
            _ => "closed",
        };
        if reason.is_empty() {
            format!("\n! disconnected ({} {})\n", code, label)
        } else {
            format!("\n! disconnected ({} {}): {}\n", code, label, reason)
        }
    }

    pub fn format_reconnect_failed(max_attempts: u32) -> String {
        format!(
            "\n! could not reconnect after {} attempts, giving up\n",
            max_attempts
        )
    }

    /// Format a presence or mold event from a peer.
    ///
    /// Canvas events are shown through the scene instead, so they return `None`.
    pub fn format_peer_event(message: &ServerMessage) -> Option<String> {
        let line = match message {
            ServerMessage::UserJoined { email, .. } => format!("+ {} joined", email),
            ServerMessage::UserLeft { email, .. } => format!("- {} left", email),
            ServerMessage::MoldCreated { mold, email, .. } => {
                format!("@{} created mold {}", email, mold_label(mold))
            }
            ServerMessage::MoldUpdated { mold, email, .. } => {
                format!("@{} updated mold {}", email, mold_label(mold))
            }
            ServerMessage::MoldDeleted { mold_id, email, .. } => {
                format!("@{} deleted mold #{}", email, mold_id)
            }
            _ => return None,
        };
        Some(format!("\n{}\n", line))
    }

    /// Format the local scene
    pub fn format_scene(objects: &[CanvasObject]) -> String {
        let mut output = String::new();
        output.push('\n');
        output.push_str(RULE);
        output.push_str("\nCanvas:\n");

        if objects.is_empty() {
            output.push_str("(empty)\n");
        } else {
            for object in objects {
                let image = if object.image.is_some() { "" } else { " (no image)" };
                output.push_str(&format!(
                    "{} {} at ({}, {}) {}x{} rot {} scale {}{}\n",
                    object.id,
                    object.name,
                    object.x,
                    object.y,
                    object.width,
                    object.height,
                    object.rotation,
                    object.scale,
                    image
                ));
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format the molds available for placement
    pub fn format_molds(molds: &[Mold]) -> String {
        let mut output = String::new();
        output.push_str("\nMolds:\n");
        if molds.is_empty() {
            output.push_str("(no molds)\n");
        }
        for mold in molds {
            let size = match (mold.width, mold.height) {
                (Some(w), Some(h)) => format!("{}x{}", w, h),
                _ => "default size".to_string(),
            };
            output.push_str(&format!("#{} {} ({})\n", mold.id, mold.name, size));
        }
        output
    }

    pub fn format_status(status: &TransportStatus) -> String {
        format!(
            "\nconnected: {}, reconnect attempts: {}, queued messages: {}\n",
            status.is_connected, status.reconnect_attempts, status.queued_messages
        )
    }
}

fn mold_label(mold: &serde_json::Value) -> String {
    match (mold.get("id"), mold.get("name").and_then(|n| n.as_str())) {
        (Some(id), Some(name)) => format!("#{} {}", id, name),
        (Some(id), None) => format!("#{}", id),
        _ => "(unknown)".to_string(),
    }
}

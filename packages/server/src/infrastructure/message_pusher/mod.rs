//! メッセージ送信（通知）の実装
//!
//! - `websocket`: 接続ごとの writer タスクへ `Outbound` を流す実装

pub mod websocket;

pub use websocket::WebSocketMessagePusher;

//! Request handlers.

mod http;
mod websocket;

pub use http::{health_check, ws_status};
pub use websocket::websocket_handler;

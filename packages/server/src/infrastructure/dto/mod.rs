//! Data Transfer Objects (DTOs) for the HTTP API.
//!
//! WebSocket messages are defined in `katagami_shared::protocol`.

pub mod conversion;
pub mod http;

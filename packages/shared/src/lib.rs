//! Shared building blocks for the Katagami server and client.
//!
//! - `protocol`: typed messages exchanged over the collaboration channel
//! - `id`: timestamp + random suffix identifiers
//! - `time`: clock abstraction and timestamp formatting
//! - `logger`: tracing subscriber setup for the binaries

pub mod id;
pub mod logger;
pub mod protocol;
pub mod time;

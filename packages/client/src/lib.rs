//! Katagami canvas client.
//!
//! - `transport`: one logical connection to the gateway with reconnection,
//!   store-and-forward queuing and local pub/sub
//! - `scene`: the shared canvas replica kept in sync with peers
//! - `cli`: interactive terminal front end

pub mod cli;
pub mod error;
pub mod formatter;
pub mod scene;
pub mod transport;

//! Katagami collaboration gateway.
//!
//! Accepts authenticated WebSocket connections, groups them into rooms and relays
//! canvas and mold events from each client to the other members of its room.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

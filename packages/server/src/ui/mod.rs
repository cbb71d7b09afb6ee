//! Axum front end of the gateway.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;

//! Client transport: one logical connection to the gateway.

mod client;
mod connector;
mod listeners;
mod reconnect;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{ClientTransport, TransportStatus, event};
pub use connector::{Connector, Frame, Link, TungsteniteConnector};
pub use listeners::{EventBus, Listener, ListenerId};
pub use reconnect::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RECONNECT_DELAY, ReconnectPolicy};

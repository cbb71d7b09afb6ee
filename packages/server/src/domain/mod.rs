//! Domain layer: connections, rooms and the seams the gateway depends on.
//!
//! Everything here is free of transport details. The registry and room directory
//! are plain data structures; `GatewayState` keeps them consistent with each other.

pub mod credential;
pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod registry;
pub mod repository;
pub mod room_directory;
pub mod value_object;

pub use credential::{CredentialVerifier, extract_bearer_token};
pub use entity::{Connection, LivenessCheck};
pub use error::{MessagePushError, RepositoryError, ValueObjectError};
pub use message_pusher::{MessagePusher, Outbound, PusherChannel};
pub use registry::{ConnectionRegistry, GatewayState};
pub use repository::GatewayRepository;
pub use room_directory::RoomDirectory;
pub use value_object::{ConnectionId, RoomName};

pub use katagami_shared::protocol::{UserId, UserIdentity};

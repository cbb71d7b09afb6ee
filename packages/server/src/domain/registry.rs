//! Connection Registry and the gateway state aggregate.

use std::collections::HashMap;

use super::{
    entity::{Connection, LivenessCheck},
    error::RepositoryError,
    room_directory::RoomDirectory,
    value_object::{ConnectionId, RoomName},
};

/// Live connections keyed by id.
#[derive(Debug, Default, Clone)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, connection: Connection) -> Result<(), RepositoryError> {
        if self.connections.contains_key(&connection.id) {
            return Err(RepositoryError::DuplicateConnection(
                connection.id.into_string(),
            ));
        }
        self.connections.insert(connection.id.clone(), connection);
        Ok(())
    }

    pub fn remove(&mut self, id: &ConnectionId) -> Option<Connection> {
        self.connections.remove(id)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn get_mut(&mut self, id: &ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(id)
    }

    /// All connections, ordered by id.
    pub fn list(&self) -> Vec<Connection> {
        let mut connections: Vec<Connection> = self.connections.values().cloned().collect();
        connections.sort_by(|a, b| a.id.cmp(&b.id));
        connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

/// Registry and room directory kept in step.
///
/// Every registered connection is a member of exactly the room recorded on it.
#[derive(Debug, Default, Clone)]
pub struct GatewayState {
    registry: ConnectionRegistry,
    rooms: RoomDirectory,
}

impl GatewayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a connection and join it to its room.
    pub fn register(&mut self, connection: Connection) -> Result<(), RepositoryError> {
        let id = connection.id.clone();
        let room = connection.room.clone();
        self.registry.insert(connection)?;
        self.rooms.join(id, room);
        Ok(())
    }

    /// Remove a connection from its room (pruning the room if empty) and delete it.
    pub fn unregister(&mut self, id: &ConnectionId) -> Option<Connection> {
        let connection = self.registry.remove(id)?;
        self.rooms.leave(id, &connection.room);
        Some(connection)
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.registry.get(id)
    }

    /// Other members of `id`'s room. Empty if `id` is unknown.
    pub fn broadcast_targets(&self, id: &ConnectionId) -> Vec<ConnectionId> {
        match self.registry.get(id) {
            Some(connection) => self.rooms.broadcast_targets(&connection.room, id),
            None => Vec::new(),
        }
    }

    pub fn room_members(&self, room: &RoomName) -> Vec<ConnectionId> {
        self.rooms.members(room)
    }

    pub fn room_names(&self) -> Vec<RoomName> {
        self.rooms.room_names()
    }

    pub fn connections(&self) -> Vec<Connection> {
        self.registry.list()
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns `false` if the connection is unknown.
    pub fn mark_alive(&mut self, id: &ConnectionId) -> bool {
        match self.registry.get_mut(id) {
            Some(connection) => {
                connection.mark_alive();
                true
            }
            None => false,
        }
    }

    /// `None` if the connection is unknown.
    pub fn check_liveness(&mut self, id: &ConnectionId) -> Option<LivenessCheck> {
        self.registry
            .get_mut(id)
            .map(|connection| connection.check_liveness())
    }
}

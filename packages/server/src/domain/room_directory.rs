//! Room Directory: room name → member connection ids.

use std::collections::{BTreeSet, HashMap};

use super::value_object::{ConnectionId, RoomName};

/// Mapping from room name to its members.
///
/// Rooms are created on first join and removed as soon as their last member
/// leaves, so an existing entry always has at least one member.
#[derive(Debug, Default, Clone)]
pub struct RoomDirectory {
    rooms: HashMap<RoomName, BTreeSet<ConnectionId>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room, creating the room if needed.
    pub fn join(&mut self, connection_id: ConnectionId, room: RoomName) {
        tracing::debug!("Connection '{}' joined room '{}'", connection_id, room);
        self.rooms.entry(room).or_default().insert(connection_id);
    }

    /// Remove a connection from a room. Returns `true` if it was a member.
    pub fn leave(&mut self, connection_id: &ConnectionId, room: &RoomName) -> bool {
        let Some(members) = self.rooms.get_mut(room) else {
            return false;
        };
        let removed = members.remove(connection_id);
        if members.is_empty() {
            self.rooms.remove(room);
            tracing::debug!("Room '{}' is empty and has been removed", room);
        }
        removed
    }

    /// Members of a room, ordered by connection id. Empty if the room does not exist.
    pub fn members(&self, room: &RoomName) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Members of a room except `exclude`.
    pub fn broadcast_targets(&self, room: &RoomName, exclude: &ConnectionId) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().filter(|id| *id != exclude).cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains_room(&self, room: &RoomName) -> bool {
        self.rooms.contains_key(room)
    }

    /// Room names, sorted.
    pub fn room_names(&self) -> Vec<RoomName> {
        let mut names: Vec<RoomName> = self.rooms.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    fn room(value: &str) -> RoomName {
        RoomName::new(value.to_string()).unwrap()
    }

    #[test]
    fn test_join_creates_room_lazily() {
        // テスト項目: 最初の参加でルームが作成される
        // given (前提条件):
        let mut directory = RoomDirectory::new();
        assert!(!directory.contains_room(&room("main")));

        // when (操作):
        directory.join(id("a"), room("main"));

        // then (期待する結果):
        assert!(directory.contains_room(&room("main")));
        assert_eq!(directory.members(&room("main")), vec![id("a")]);
    }

    #[test]
    fn test_last_leave_removes_room() {
        // テスト項目: 最後のメンバーが退出するとルームが削除される
        // given (前提条件):
        let mut directory = RoomDirectory::new();
        directory.join(id("a"), room("main"));
        directory.join(id("b"), room("main"));

        // when (操作):
        let first = directory.leave(&id("a"), &room("main"));
        let still_exists = directory.contains_room(&room("main"));
        let second = directory.leave(&id("b"), &room("main"));

        // then (期待する結果):
        assert!(first);
        assert!(still_exists);
        assert!(second);
        assert!(!directory.contains_room(&room("main")));
        assert_eq!(directory.room_count(), 0);
    }

    #[test]
    fn test_leave_unknown_room_or_member() {
        // テスト項目: 存在しないルーム・メンバーの退出は false を返し、何も壊さない
        // given (前提条件):
        let mut directory = RoomDirectory::new();
        directory.join(id("a"), room("main"));

        // when (操作):
        let unknown_room = directory.leave(&id("a"), &room("other"));
        let unknown_member = directory.leave(&id("z"), &room("main"));

        // then (期待する結果):
        assert!(!unknown_room);
        assert!(!unknown_member);
        assert_eq!(directory.members(&room("main")), vec![id("a")]);
    }

    #[test]
    fn test_broadcast_targets_exclude_sender() {
        // テスト項目: ブロードキャスト対象から送信者が除外される
        // given (前提条件):
        let mut directory = RoomDirectory::new();
        directory.join(id("a"), room("main"));
        directory.join(id("b"), room("main"));
        directory.join(id("c"), room("main"));

        // when (操作):
        let targets = directory.broadcast_targets(&room("main"), &id("b"));

        // then (期待する結果):
        assert_eq!(targets, vec![id("a"), id("c")]);
    }

    #[test]
    fn test_broadcast_targets_isolated_per_room() {
        // テスト項目: 別ルームのメンバーはブロードキャスト対象にならない
        // given (前提条件):
        let mut directory = RoomDirectory::new();
        directory.join(id("a"), room("x"));
        directory.join(id("b"), room("x"));
        directory.join(id("c"), room("y"));

        // when (操作):
        let targets = directory.broadcast_targets(&room("x"), &id("a"));

        // then (期待する結果):
        assert_eq!(targets, vec![id("b")]);
        assert_eq!(directory.room_names(), vec![room("x"), room("y")]);
    }
}

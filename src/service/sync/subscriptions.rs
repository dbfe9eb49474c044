// =============================================================================
// zOS Sync - Subscription Tracker Module
// =============================================================================
//
// Project: zOS Sync - Sliding sync and presence services for the zOS chat client
// Author: zOS Chat Team
// Date: 2026-10-19
// Version: 0.4.0
// License: Apache 2.0 / MIT
//
// Description:
//   Tracks the rooms subscribed for detailed sync and the profile chosen for
//   each of them. Rooms are only ever added for the life of a session.
//
// =============================================================================

use std::collections::{BTreeMap, BTreeSet};

use ruma::{OwnedRoomId, RoomId};
use tracing::{debug, instrument};
use zos_sync_core::traits::ChatClient;

use super::lists::SubscriptionProfile;

/// Whether a room can be synced with lazy-loaded members.
///
/// Only rooms whose encryption is known to be off qualify. Encrypted rooms
/// need the whole member list to decrypt and verify senders, and a room whose
/// encryption state is unknown is treated as encrypted.
#[instrument(level = "debug", skip(client))]
pub async fn should_lazy_load(client: &dyn ChatClient, room_id: &RoomId) -> bool {
    if !client.has_room(room_id) {
        debug!("Room {} not known locally, requesting full state", room_id);
        return false;
    }

    matches!(client.is_encryption_enabled_in_room(room_id).await, Some(false))
}

/// Profile for a room about to be subscribed
pub async fn choose_profile(client: &dyn ChatClient, room_id: &RoomId) -> SubscriptionProfile {
    if should_lazy_load(client, room_id).await {
        SubscriptionProfile::UnencryptedLazy
    } else {
        SubscriptionProfile::Encrypted
    }
}

/// Rooms subscribed for detailed sync
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    rooms: BTreeMap<OwnedRoomId, SubscriptionProfile>,
}

impl SubscriptionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn profile_of(&self, room_id: &RoomId) -> Option<SubscriptionProfile> {
        self.rooms.get(room_id).copied()
    }

    /// Records a room with its profile. Returns `false` and keeps the
    /// first profile if the room was already tracked.
    pub fn insert(&mut self, room_id: OwnedRoomId, profile: SubscriptionProfile) -> bool {
        if self.rooms.contains_key(&room_id) {
            return false;
        }
        self.rooms.insert(room_id, profile);
        true
    }

    pub fn room_ids(&self) -> BTreeSet<OwnedRoomId> {
        self.rooms.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

//! Collaborator traits for zOS Sync
//!
//! The services drive a Matrix SDK they do not own. These traits are the seam:
//! the host application implements them over its SDK, tests implement them
//! with fakes.

use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use ruma::{presence::PresenceState, OwnedRoomId, OwnedUserId, RoomId, UserId};
use tokio::sync::broadcast;

use crate::{
    types::{LifecycleEvent, PresenceStatus, RoomSubscription, SlidingSyncOptions},
    Result,
};

/// The authenticated Matrix client
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Homeserver base URL
    fn base_url(&self) -> String;

    /// The logged-in user, if known
    fn user_id(&self) -> Option<OwnedUserId>;

    /// Whether the room object exists locally
    fn has_room(&self, room_id: &RoomId) -> bool;

    /// Notifications for rooms appearing in the local store
    fn room_events(&self) -> broadcast::Receiver<OwnedRoomId>;

    /// Encryption state of a room; `None` when crypto is unavailable or the
    /// state has not been resolved yet
    async fn is_encryption_enabled_in_room(&self, room_id: &RoomId) -> Option<bool>;

    /// Read a user's presence
    async fn get_presence(&self, user_id: &UserId) -> Result<PresenceStatus>;

    /// Publish the logged-in user's presence
    async fn set_presence(&self, presence: PresenceState) -> Result<()>;
}

/// An open sliding sync connection
///
/// Mutations are recorded by the SDK and sent with its next request.
pub trait SlidingSyncConnection: Send + Sync {
    /// Register a named alternative room subscription
    fn add_custom_subscription(&self, name: &str, subscription: RoomSubscription);

    /// Use a named custom subscription for a room
    fn use_custom_subscription(&self, room_id: &RoomId, name: &str);

    /// Rooms currently subscribed for detailed sync
    fn room_subscriptions(&self) -> BTreeSet<OwnedRoomId>;

    /// Replace the subscribed room set
    fn modify_room_subscriptions(&self, rooms: BTreeSet<OwnedRoomId>);

    /// Replace a list's ranges
    fn set_list_ranges(&self, list: &str, ranges: Vec<(u64, u64)>);

    /// Joined room count the server reported for a list
    fn list_joined_count(&self, list: &str) -> Option<u64>;

    /// Request cycle notifications; dropping the receiver detaches
    fn lifecycle_events(&self) -> broadcast::Receiver<LifecycleEvent>;
}

/// Opens sliding sync connections for a client
#[async_trait]
pub trait SlidingSyncProvider: Send + Sync {
    async fn connect(
        &self,
        client: Arc<dyn ChatClient>,
        options: SlidingSyncOptions,
    ) -> Result<Arc<dyn SlidingSyncConnection>>;
}

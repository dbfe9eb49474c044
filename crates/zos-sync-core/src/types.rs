//! Core types for zOS Sync
//!
//! Shapes exchanged with the sliding sync SDK: list definitions, room
//! subscription profiles, lifecycle notifications, plus presence readings and
//! tab visibility. List and subscription types serialize to the MSC3575 JSON
//! the SDK sends on the wire.

use std::time::Duration;

use ruma::{events::StateEventType, presence::PresenceState};
use serde::{Deserialize, Serialize};

/// State key placeholder for the syncing user's own member event
pub const STATE_KEY_ME: &str = "$ME";

/// State key placeholder asking the server to lazy-load members
pub const STATE_KEY_LAZY: &str = "$LAZY";

/// Wildcard for event types and state keys
pub const WILDCARD: &str = "*";

/// A `(event_type, state_key)` pair requested as room state
pub type RequiredState = (StateEventType, String);

/// Room ordering applied by the server to a list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "by_recency")]
    ByRecency,
    #[serde(rename = "by_name")]
    ByName,
}

/// Server-side filter for a list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_dm: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_invite: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// What to fetch for predecessor rooms of an upgraded room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OldRoomsSubscription {
    pub timeline_limit: u32,
    pub required_state: Vec<RequiredState>,
}

/// A named sliding window over the user's rooms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDefinition {
    /// List name, also the key of the list in requests
    #[serde(skip)]
    pub name: String,

    /// Inclusive index ranges requested from the server
    pub ranges: Vec<(u64, u64)>,

    /// Timeline events per room in the list
    pub timeline_limit: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortOrder>,

    pub required_state: Vec<RequiredState>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_old_rooms: Option<OldRoomsSubscription>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<ListFilters>,
}

impl ListDefinition {
    /// Upper index of the first range, zero when no range is set
    pub fn upper_bound(&self) -> u64 {
        self.ranges.first().map(|&(_, upper)| upper).unwrap_or(0)
    }
}

/// Room state and timeline requested for a subscribed room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSubscription {
    pub required_state: Vec<RequiredState>,
    pub timeline_limit: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_old_rooms: Option<OldRoomsSubscription>,
}

/// Everything the SDK needs to open a sliding sync connection
#[derive(Debug, Clone)]
pub struct SlidingSyncOptions {
    /// Sliding sync endpoint (proxy or homeserver)
    pub endpoint: String,

    /// Lists keyed by name
    pub lists: Vec<ListDefinition>,

    /// Subscription used for rooms without a custom subscription
    pub default_subscription: RoomSubscription,

    /// Long-poll timeout for a single sync request
    pub timeout: Duration,
}

/// Phase of a sliding sync request cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Response received, not yet processed
    RequestFinished,
    /// Response fully processed
    Complete,
}

/// Notification emitted by the connection after every request cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub state: LifecycleState,
    /// Set when the cycle failed
    pub error: Option<String>,
}

impl LifecycleEvent {
    pub fn complete() -> Self {
        Self {
            state: LifecycleState::Complete,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            state: LifecycleState::Complete,
            error: Some(error.into()),
        }
    }

    pub fn request_finished() -> Self {
        Self {
            state: LifecycleState::RequestFinished,
            error: None,
        }
    }

    /// A fully processed cycle without error
    pub fn is_successful_completion(&self) -> bool {
        self.state == LifecycleState::Complete && self.error.is_none()
    }
}

/// Presence reading for a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceStatus {
    pub presence: PresenceState,
    pub last_active_ago: Option<Duration>,
}

impl PresenceStatus {
    pub fn new(presence: PresenceState, last_active_ago: Option<Duration>) -> Self {
        Self {
            presence,
            last_active_ago,
        }
    }
}

/// Visibility of the application tab or window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_upper_bound() {
        let list = ListDefinition {
            name: "dms".to_string(),
            ranges: vec![(0, 20)],
            timeline_limit: 10,
            sort: vec![SortOrder::ByRecency],
            required_state: Vec::new(),
            include_old_rooms: None,
            filters: None,
        };
        assert_eq!(list.upper_bound(), 20);

        let empty = ListDefinition {
            ranges: Vec::new(),
            ..list
        };
        assert_eq!(empty.upper_bound(), 0);
    }

    #[test]
    fn test_lifecycle_event_completion() {
        assert!(LifecycleEvent::complete().is_successful_completion());
        assert!(!LifecycleEvent::failed("timeout").is_successful_completion());
        assert!(!LifecycleEvent::request_finished().is_successful_completion());
    }

    #[test]
    fn test_room_subscription_wire_shape() {
        let subscription = RoomSubscription {
            required_state: vec![(StateEventType::RoomMember, STATE_KEY_LAZY.to_string())],
            timeline_limit: 35,
            include_old_rooms: None,
        };

        let value = serde_json::to_value(&subscription).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "required_state": [["m.room.member", "$LAZY"]],
                "timeline_limit": 35,
            })
        );
    }

    #[test]
    fn test_visibility_default() {
        assert!(Visibility::default().is_visible());
        assert!(!Visibility::Hidden.is_visible());
    }
}

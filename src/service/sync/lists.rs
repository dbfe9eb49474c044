// =============================================================================
// zOS Sync - List Registry Module
// =============================================================================
//
// Project: zOS Sync - Sliding sync and presence services for the zOS chat client
// Author: zOS Chat Team
// Date: 2026-10-19
// Version: 0.4.0
// License: Apache 2.0 / MIT
//
// Description:
//   Static table of the sliding sync lists (invites, favorites, dms,
//   untagged) and the two room subscription profiles used for rooms the
//   user opens.
//
// =============================================================================

use std::collections::BTreeMap;

use ruma::events::StateEventType;
use zos_sync_core::types::{
    ListDefinition, ListFilters, OldRoomsSubscription, RequiredState, RoomSubscription, SortOrder,
    STATE_KEY_LAZY, STATE_KEY_ME, WILDCARD,
};

pub const INVITES_LIST: &str = "invites";
pub const FAVORITES_LIST: &str = "favorites";
pub const DMS_LIST: &str = "dms";
pub const UNTAGGED_LIST: &str = "untagged";

/// Last index of the initial window of every list
pub const INITIAL_UPPER_BOUND: u64 = 20;

/// Timeline events fetched for a room the user opens
pub const ROOM_TIMELINE_LIMIT: u32 = 35;

/// Custom subscription name registered for the lazy profile
pub const UNENCRYPTED_SUBSCRIPTION_NAME: &str = "unencrypted";

/// How much state to request for a subscribed room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionProfile {
    /// Full state including every member; needed to decrypt and verify senders
    Encrypted,
    /// Own membership plus lazy-loaded members
    UnencryptedLazy,
}

impl SubscriptionProfile {
    /// Name of the custom subscription, `None` for the connection default
    pub fn custom_name(self) -> Option<&'static str> {
        match self {
            SubscriptionProfile::Encrypted => None,
            SubscriptionProfile::UnencryptedLazy => Some(UNENCRYPTED_SUBSCRIPTION_NAME),
        }
    }

    pub fn subscription(self) -> RoomSubscription {
        let required_state = match self {
            SubscriptionProfile::Encrypted => {
                vec![(StateEventType::from(WILDCARD), WILDCARD.to_string())]
            }
            SubscriptionProfile::UnencryptedLazy => vec![
                (StateEventType::RoomMember, STATE_KEY_ME.to_string()),
                (StateEventType::RoomMember, STATE_KEY_LAZY.to_string()),
            ],
        };

        RoomSubscription {
            required_state,
            timeline_limit: ROOM_TIMELINE_LIMIT,
            include_old_rooms: Some(old_rooms()),
        }
    }
}

/// State every list entry carries: enough to render a room tile
pub fn required_state_list() -> Vec<RequiredState> {
    vec![
        (StateEventType::RoomJoinRules, String::new()),
        (StateEventType::RoomAvatar, String::new()),
        (StateEventType::RoomTombstone, String::new()),
        (StateEventType::RoomEncryption, String::new()),
        (StateEventType::RoomCreate, String::new()),
        (StateEventType::RoomMember, STATE_KEY_ME.to_string()),
    ]
}

fn old_rooms() -> OldRoomsSubscription {
    OldRoomsSubscription {
        timeline_limit: 0,
        required_state: required_state_list(),
    }
}

fn list(
    name: &str,
    timeline_limit: u32,
    sort: Vec<SortOrder>,
    filters: Option<ListFilters>,
) -> ListDefinition {
    ListDefinition {
        name: name.to_string(),
        ranges: vec![(0, INITIAL_UPPER_BOUND)],
        timeline_limit,
        sort,
        required_state: required_state_list(),
        include_old_rooms: Some(old_rooms()),
        filters,
    }
}

/// The lists requested on every sliding sync connection, keyed by name
pub fn list_definitions() -> BTreeMap<String, ListDefinition> {
    let lists = [
        list(
            INVITES_LIST,
            1,
            Vec::new(),
            Some(ListFilters {
                is_invite: Some(true),
                ..Default::default()
            }),
        ),
        list(
            FAVORITES_LIST,
            10,
            vec![SortOrder::ByRecency],
            Some(ListFilters {
                tags: Some(vec!["m.favorite".to_string()]),
                ..Default::default()
            }),
        ),
        list(
            DMS_LIST,
            10,
            vec![SortOrder::ByRecency],
            Some(ListFilters {
                is_dm: Some(true),
                is_invite: Some(false),
                ..Default::default()
            }),
        ),
        list(UNTAGGED_LIST, 10, vec![SortOrder::ByRecency], None),
    ];

    lists
        .into_iter()
        .map(|definition| (definition.name.clone(), definition))
        .collect()
}

// =============================================================================
// zOS Sync - Test Utils Module
// =============================================================================
//
// Project: zOS Sync - Sliding sync and presence services for the zOS chat client
// Author: zOS Chat Team
// Date: 2026-10-19
// Version: 0.4.0
// License: Apache 2.0 / MIT
//
// Description:
//   Recording fakes and mocks of the SDK collaborators for unit tests.
//
// =============================================================================

#![cfg(test)]

use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use mockall::mock;
use ruma::{presence::PresenceState, OwnedRoomId, OwnedUserId, RoomId, UserId};
use tokio::sync::{broadcast, Notify};
use zos_sync_core::{
    traits::{ChatClient, SlidingSyncConnection, SlidingSyncProvider},
    types::{LifecycleEvent, PresenceStatus, RoomSubscription, SlidingSyncOptions},
    Result, SyncError,
};

mock! {
    pub Client {}

    #[async_trait]
    impl ChatClient for Client {
        fn base_url(&self) -> String;
        fn user_id(&self) -> Option<OwnedUserId>;
        fn has_room(&self, room_id: &RoomId) -> bool;
        fn room_events(&self) -> broadcast::Receiver<OwnedRoomId>;
        async fn is_encryption_enabled_in_room(&self, room_id: &RoomId) -> Option<bool>;
        async fn get_presence(&self, user_id: &UserId) -> Result<PresenceStatus>;
        async fn set_presence(&self, presence: PresenceState) -> Result<()>;
    }
}

pub fn own_user_id() -> OwnedUserId {
    OwnedUserId::try_from("@me:zos.test").unwrap()
}

/// In-memory client: rooms with their encryption state, presence readings,
/// and a log of published presence
pub struct FakeClient {
    rooms: Mutex<HashMap<OwnedRoomId, Option<bool>>>,
    room_tx: broadcast::Sender<OwnedRoomId>,
    readings: Mutex<HashMap<OwnedUserId, PresenceStatus>>,
    published: Mutex<Vec<PresenceState>>,
    presence_reads: AtomicUsize,
    fail_publish: AtomicBool,
}

impl FakeClient {
    pub fn new() -> Self {
        let (room_tx, _) = broadcast::channel(16);
        Self {
            rooms: Mutex::new(HashMap::new()),
            room_tx,
            readings: Mutex::new(HashMap::new()),
            published: Mutex::new(Vec::new()),
            presence_reads: AtomicUsize::new(0),
            fail_publish: AtomicBool::new(false),
        }
    }

    /// Makes a room known locally without notifying
    pub fn add_room(&self, room_id: &RoomId, encrypted: Option<bool>) {
        self.rooms
            .lock()
            .unwrap()
            .insert(room_id.to_owned(), encrypted);
    }

    /// Makes a room known locally and notifies room listeners
    pub fn announce_room(&self, room_id: &RoomId, encrypted: Option<bool>) {
        self.add_room(room_id, encrypted);
        let _ = self.room_tx.send(room_id.to_owned());
    }

    pub fn room_listeners(&self) -> usize {
        self.room_tx.receiver_count()
    }

    pub fn set_reading(&self, user_id: &UserId, status: PresenceStatus) {
        self.readings
            .lock()
            .unwrap()
            .insert(user_id.to_owned(), status);
    }

    pub fn published(&self) -> Vec<PresenceState> {
        self.published.lock().unwrap().clone()
    }

    pub fn presence_reads(&self) -> usize {
        self.presence_reads.load(Ordering::SeqCst)
    }

    pub fn fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatClient for FakeClient {
    fn base_url(&self) -> String {
        "https://matrix.zos.test".to_string()
    }

    fn user_id(&self) -> Option<OwnedUserId> {
        Some(own_user_id())
    }

    fn has_room(&self, room_id: &RoomId) -> bool {
        self.rooms.lock().unwrap().contains_key(room_id)
    }

    fn room_events(&self) -> broadcast::Receiver<OwnedRoomId> {
        self.room_tx.subscribe()
    }

    async fn is_encryption_enabled_in_room(&self, room_id: &RoomId) -> Option<bool> {
        self.rooms.lock().unwrap().get(room_id).copied().flatten()
    }

    async fn get_presence(&self, user_id: &UserId) -> Result<PresenceStatus> {
        self.presence_reads.fetch_add(1, Ordering::SeqCst);
        self.readings
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .ok_or_else(|| SyncError::Presence(format!("no presence for {user_id}")))
    }

    async fn set_presence(&self, presence: PresenceState) -> Result<()> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(SyncError::Presence("publish rejected".to_string()));
        }
        self.published.lock().unwrap().push(presence);
        Ok(())
    }
}

/// Connection mutation recorded by [`FakeConnection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionCall {
    AddCustomSubscription(String),
    UseCustomSubscription(OwnedRoomId, String),
    ModifyRoomSubscriptions(BTreeSet<OwnedRoomId>),
    SetListRanges(String, Vec<(u64, u64)>),
}

pub struct FakeConnection {
    calls: Mutex<Vec<ConnectionCall>>,
    subscriptions: Mutex<BTreeSet<OwnedRoomId>>,
    joined_counts: Mutex<HashMap<String, u64>>,
    lifecycle_tx: broadcast::Sender<LifecycleEvent>,
}

impl FakeConnection {
    pub fn new() -> Self {
        let (lifecycle_tx, _) = broadcast::channel(16);
        Self {
            calls: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(BTreeSet::new()),
            joined_counts: Mutex::new(HashMap::new()),
            lifecycle_tx,
        }
    }

    pub fn calls(&self) -> Vec<ConnectionCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn range_calls(&self) -> Vec<(String, Vec<(u64, u64)>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ConnectionCall::SetListRanges(list, ranges) => Some((list, ranges)),
                _ => None,
            })
            .collect()
    }

    pub fn modify_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ConnectionCall::ModifyRoomSubscriptions(_)))
            .count()
    }

    pub fn set_joined_count(&self, list: &str, count: u64) {
        self.joined_counts
            .lock()
            .unwrap()
            .insert(list.to_string(), count);
    }

    pub fn emit(&self, event: LifecycleEvent) {
        let _ = self.lifecycle_tx.send(event);
    }

    pub fn lifecycle_listeners(&self) -> usize {
        self.lifecycle_tx.receiver_count()
    }

    fn record(&self, call: ConnectionCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl SlidingSyncConnection for FakeConnection {
    fn add_custom_subscription(&self, name: &str, _subscription: RoomSubscription) {
        self.record(ConnectionCall::AddCustomSubscription(name.to_string()));
    }

    fn use_custom_subscription(&self, room_id: &RoomId, name: &str) {
        self.record(ConnectionCall::UseCustomSubscription(
            room_id.to_owned(),
            name.to_string(),
        ));
    }

    fn room_subscriptions(&self) -> BTreeSet<OwnedRoomId> {
        self.subscriptions.lock().unwrap().clone()
    }

    fn modify_room_subscriptions(&self, rooms: BTreeSet<OwnedRoomId>) {
        *self.subscriptions.lock().unwrap() = rooms.clone();
        self.record(ConnectionCall::ModifyRoomSubscriptions(rooms));
    }

    fn set_list_ranges(&self, list: &str, ranges: Vec<(u64, u64)>) {
        self.record(ConnectionCall::SetListRanges(list.to_string(), ranges));
    }

    fn list_joined_count(&self, list: &str) -> Option<u64> {
        self.joined_counts.lock().unwrap().get(list).copied()
    }

    fn lifecycle_events(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.lifecycle_tx.subscribe()
    }
}

/// Hands out one shared [`FakeConnection`]; can hold `connect` until released
pub struct FakeProvider {
    pub connection: Arc<FakeConnection>,
    gate: Option<Arc<Notify>>,
    fail: AtomicBool,
    connects: AtomicUsize,
    last_options: Mutex<Option<SlidingSyncOptions>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            connection: Arc::new(FakeConnection::new()),
            gate: None,
            fail: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    /// `connect` blocks until the returned notifier fires
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let provider = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::new()
        };
        (provider, gate)
    }

    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<SlidingSyncOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

#[async_trait]
impl SlidingSyncProvider for FakeProvider {
    async fn connect(
        &self,
        _client: Arc<dyn ChatClient>,
        options: SlidingSyncOptions,
    ) -> Result<Arc<dyn SlidingSyncConnection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(SyncError::Connection("proxy unreachable".to_string()));
        }
        *self.last_options.lock().unwrap() = Some(options);
        let connection: Arc<dyn SlidingSyncConnection> = self.connection.clone();
        Ok(connection)
    }
}

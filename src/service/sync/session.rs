// =============================================================================
// zOS Sync - Sliding Sync Session Module
// =============================================================================
//
// Project: zOS Sync - Sliding sync and presence services for the zOS chat client
// Author: zOS Chat Team
// Date: 2026-10-19
// Version: 0.4.0
// License: Apache 2.0 / MIT
//
// Description:
//   Owns the single sliding sync connection of an authenticated client.
//   Configures it once, gates room subscriptions on that configuration,
//   subscribes rooms the user opens and starts the room crawl.
//
//   A session is created at login and dropped at logout; dropping it stops
//   the crawl.
//
// =============================================================================

use std::{sync::Arc, time::Duration};

use ruma::{OwnedRoomId, RoomId};
use tokio::{
    sync::{broadcast, broadcast::error::RecvError, watch, Mutex},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, error, info, instrument, warn};
use zos_sync_core::{
    config::SlidingSyncConfig,
    traits::{ChatClient, SlidingSyncConnection, SlidingSyncProvider},
    types::SlidingSyncOptions,
    Result, SyncError,
};

use super::{
    crawl::{CrawlOutcome, RoomCrawler},
    lists::{list_definitions, SubscriptionProfile, UNENCRYPTED_SUBSCRIPTION_NAME},
    subscriptions::{choose_profile, SubscriptionTracker},
};

/// Configuration progress of a session. `Configured` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unconfigured,
    Configuring,
    Configured,
}

enum SessionState {
    Unconfigured,
    Configuring,
    Configured(Arc<dyn SlidingSyncConnection>),
}

impl SessionState {
    fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Unconfigured => SessionPhase::Unconfigured,
            SessionState::Configuring => SessionPhase::Configuring,
            SessionState::Configured(_) => SessionPhase::Configured,
        }
    }

    fn connection(&self) -> Option<Arc<dyn SlidingSyncConnection>> {
        match self {
            SessionState::Configured(connection) => Some(Arc::clone(connection)),
            _ => None,
        }
    }
}

/// Sliding sync session for one authenticated client
pub struct SyncSession {
    client: Arc<dyn ChatClient>,
    provider: Arc<dyn SlidingSyncProvider>,
    config: SlidingSyncConfig,

    /// Configuration gate; waiters are released when it turns `Configured`
    state: watch::Sender<SessionState>,

    /// Rooms subscribed for detailed sync, locked for a whole add
    subscriptions: Mutex<SubscriptionTracker>,

    /// Serializes `setup` and holds the crawl task once configured
    crawl: Mutex<Option<JoinHandle<CrawlOutcome>>>,
}

impl SyncSession {
    pub fn new(
        client: Arc<dyn ChatClient>,
        provider: Arc<dyn SlidingSyncProvider>,
        config: SlidingSyncConfig,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Unconfigured);
        Self {
            client,
            provider,
            config,
            state,
            subscriptions: Mutex::new(SubscriptionTracker::new()),
            crawl: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SessionPhase {
        self.state.borrow().phase()
    }

    /// The connection, once configured
    pub fn connection(&self) -> Option<Arc<dyn SlidingSyncConnection>> {
        self.state.borrow().connection()
    }

    fn endpoint(&self) -> String {
        self.config
            .proxy_url
            .clone()
            .unwrap_or_else(|| self.client.base_url())
    }

    /// Configures the connection and starts the room crawl.
    ///
    /// Idempotent: later and concurrent calls get the same connection. A
    /// failed attempt leaves the session unconfigured so it can be retried.
    #[instrument(level = "debug", skip(self))]
    pub async fn setup(&self) -> Result<Arc<dyn SlidingSyncConnection>> {
        let mut crawl = self.crawl.lock().await;
        if let Some(connection) = self.connection() {
            return Ok(connection);
        }

        let start = Instant::now();
        self.state.send_replace(SessionState::Configuring);

        let lists = list_definitions();
        let options = SlidingSyncOptions {
            endpoint: self.endpoint(),
            lists: lists.values().cloned().collect(),
            default_subscription: SubscriptionProfile::Encrypted.subscription(),
            timeout: self.config.timeout(),
        };
        debug!("🔧 Connecting sliding sync to {}", options.endpoint);

        let connection = match self.provider.connect(Arc::clone(&self.client), options).await {
            Ok(connection) => connection,
            Err(e) => {
                error!("❌ Sliding sync setup failed: {}", e);
                self.state.send_replace(SessionState::Unconfigured);
                return Err(e);
            }
        };

        connection.add_custom_subscription(
            UNENCRYPTED_SUBSCRIPTION_NAME,
            SubscriptionProfile::UnencryptedLazy.subscription(),
        );
        self.state
            .send_replace(SessionState::Configured(Arc::clone(&connection)));

        let crawler = RoomCrawler::new(
            Arc::clone(&connection),
            &lists,
            self.config.crawl_batch_size,
            self.config.crawl_request_gap(),
        );
        *crawl = Some(tokio::spawn(crawler.run(connection.lifecycle_events())));

        info!("✅ Sliding sync configured in {:?}", start.elapsed());
        Ok(connection)
    }

    /// Waits for the configuration gate
    async fn configured_connection(&self) -> Result<Arc<dyn SlidingSyncConnection>> {
        let mut state = self.state.subscribe();
        let connection = {
            let configured = state
                .wait_for(|state| state.phase() == SessionPhase::Configured)
                .await
                .map_err(|_| SyncError::SessionClosed("sync session dropped".to_string()))?;
            configured.connection()
        };

        connection.ok_or_else(|| SyncError::SessionClosed("sync session not configured".to_string()))
    }

    /// Subscribes a room for detailed sync.
    ///
    /// Waits until the session is configured. Rooms already subscribed return
    /// at once. Otherwise the room is subscribed with the lazy profile if its
    /// encryption is known to be off and the full profile otherwise. When the
    /// room is not known locally yet, waits for it to appear, at most
    /// `room_wait_timeout`.
    #[instrument(level = "debug", skip(self), fields(room_id = %room_id))]
    pub async fn add_room_to_sync(&self, room_id: &RoomId) -> Result<()> {
        let connection = self.configured_connection().await?;

        // Listen before looking the room up so an appearance in between is kept.
        let appearance = self.wait_for_room(room_id);

        let room_known = {
            let mut subscriptions = self.subscriptions.lock().await;
            let mut rooms = connection.room_subscriptions();
            if subscriptions.contains(room_id) || rooms.contains(room_id) {
                debug!("Room {} already subscribed", room_id);
                return Ok(());
            }

            let room_known = self.client.has_room(room_id);
            let profile = choose_profile(&*self.client, room_id).await;
            if let Some(name) = profile.custom_name() {
                connection.use_custom_subscription(room_id, name);
            }
            subscriptions.insert(room_id.to_owned(), profile);

            rooms.insert(room_id.to_owned());
            connection.modify_room_subscriptions(rooms);
            debug!("📡 Subscribed room {} with {:?} profile", room_id, profile);

            room_known
        };

        if room_known {
            return Ok(());
        }

        appearance.wait(self.config.room_wait_timeout()).await
    }

    /// Handle that resolves when `room_id` shows up in the client.
    /// Dropping the handle stops listening.
    pub fn wait_for_room(&self, room_id: &RoomId) -> RoomAppearance {
        RoomAppearance {
            room_id: room_id.to_owned(),
            client: Arc::clone(&self.client),
            events: self.client.room_events(),
        }
    }

    pub async fn is_subscribed(&self, room_id: &RoomId) -> bool {
        self.subscriptions.lock().await.contains(room_id)
    }

    pub async fn profile_of(&self, room_id: &RoomId) -> Option<SubscriptionProfile> {
        self.subscriptions.lock().await.profile_of(room_id)
    }

    pub async fn subscribed_rooms(&self) -> Vec<OwnedRoomId> {
        self.subscriptions.lock().await.room_ids().into_iter().collect()
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        if let Some(crawl) = self.crawl.get_mut().take() {
            crawl.abort();
        }
    }
}

/// Pending wait for a room to appear in the client
pub struct RoomAppearance {
    room_id: OwnedRoomId,
    client: Arc<dyn ChatClient>,
    events: broadcast::Receiver<OwnedRoomId>,
}

impl RoomAppearance {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Resolves once the room is known locally, or fails after `timeout`
    pub async fn wait(mut self, timeout: Duration) -> Result<()> {
        if self.client.has_room(&self.room_id) {
            return Ok(());
        }

        match tokio::time::timeout(timeout, self.next_appearance()).await {
            Ok(result) => result,
            Err(_) => {
                warn!("⏰ Room {} did not appear within {:?}", self.room_id, timeout);
                Err(SyncError::Timeout(format!(
                    "room {} did not appear within {:?}",
                    self.room_id, timeout
                )))
            }
        }
    }

    async fn next_appearance(&mut self) -> Result<()> {
        loop {
            match self.events.recv().await {
                Ok(room_id) if room_id == self.room_id => return Ok(()),
                Ok(_) => continue,
                Err(RecvError::Lagged(_)) => {
                    if self.client.has_room(&self.room_id) {
                        return Ok(());
                    }
                }
                Err(RecvError::Closed) => {
                    return Err(SyncError::SessionClosed(format!(
                        "client stopped before room {} appeared",
                        self.room_id
                    )));
                }
            }
        }
    }
}

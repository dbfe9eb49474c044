// =============================================================================
// zOS Sync - Presence Poller Module
// =============================================================================
//
// Project: zOS Sync - Sliding sync and presence services for the zOS chat client
// Author: zOS Chat Team
// Date: 2026-10-19
// Version: 0.4.0
// License: Apache 2.0 / MIT
//
// Description:
//   Polls the presence of other users shown in the UI: members of direct
//   chats and small groups, plus the members of the room currently open.
//   Readings are cached for a short TTL and only changes are published to
//   subscribers.
//
// =============================================================================

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Weak},
    time::Duration,
};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::join_all;
use ruma::{presence::PresenceState, OwnedUserId, UserId};
use tokio::{
    sync::{broadcast, watch, Mutex, RwLock},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, instrument};
use zos_sync_core::{
    config::PresenceConfig,
    traits::ChatClient,
    types::{PresenceStatus, Visibility},
    Result, SyncError,
};

/// Largest room, in members, whose members' presence is shown
pub const MAX_PRESENCE_ROOM_SIZE: usize = 15;

/// Last-seen shifts smaller than this are jitter, not a change
const LAST_SEEN_TOLERANCE: Duration = Duration::from_secs(5);

/// Whether a room with `total_members` members shows member presence
pub fn is_eligible_for_presence(total_members: usize) -> bool {
    total_members == 2 || total_members <= MAX_PRESENCE_ROOM_SIZE
}

/// Presence of another user as shown in the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceUpdate {
    pub user_id: OwnedUserId,
    pub is_online: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl PresenceUpdate {
    /// Whether this reading is worth publishing over `other`: the online flag
    /// flipped, last-seen appeared or disappeared, or last-seen moved by at
    /// least [`LAST_SEEN_TOLERANCE`]. Smaller moves come from recomputing
    /// `now - last_active_ago` on every poll and are not reported, so an
    /// idle user does not produce an update per poll.
    fn differs_from(&self, other: &PresenceUpdate) -> bool {
        if self.is_online != other.is_online {
            return true;
        }

        match (self.last_seen_at, other.last_seen_at) {
            (Some(a), Some(b)) => (a - b)
                .abs()
                .to_std()
                .map_or(true, |shift| shift >= LAST_SEEN_TOLERANCE),
            (None, None) => false,
            _ => true,
        }
    }
}

struct CachedPresence {
    update: PresenceUpdate,
    fetched_at: Instant,
}

#[derive(Default)]
struct PollTargets {
    base: Vec<OwnedUserId>,
    active_room: Vec<OwnedUserId>,
    combined: Vec<OwnedUserId>,
    cache: HashMap<OwnedUserId, CachedPresence>,
}

impl PollTargets {
    fn recompute(&mut self, max_targets: usize) {
        self.combined = dedup_capped(self.base.iter().chain(&self.active_room), max_targets);
    }
}

fn dedup_capped<'a>(
    ids: impl IntoIterator<Item = &'a OwnedUserId>,
    max: usize,
) -> Vec<OwnedUserId> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(*id))
        .take(max)
        .cloned()
        .collect()
}

/// Poller for other users' presence
pub struct PresencePoller {
    client: Arc<dyn ChatClient>,
    config: PresenceConfig,
    targets: RwLock<PollTargets>,
    visibility: RwLock<Option<watch::Receiver<Visibility>>>,
    updates: broadcast::Sender<PresenceUpdate>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PresencePoller {
    pub fn new(client: Arc<dyn ChatClient>, config: PresenceConfig) -> Self {
        let (updates, _) = broadcast::channel(256);
        Self {
            client,
            config,
            targets: RwLock::new(PollTargets::default()),
            visibility: RwLock::new(None),
            updates,
            task: Mutex::new(None),
        }
    }

    /// Receives every presence change from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PresenceUpdate> {
        self.updates.subscribe()
    }

    /// Users currently polled, base targets first
    pub async fn targets(&self) -> Vec<OwnedUserId> {
        self.targets.read().await.combined.clone()
    }

    /// Last known presence of a user
    pub async fn cached(&self, user_id: &UserId) -> Option<PresenceUpdate> {
        self.targets
            .read()
            .await
            .cache
            .get(user_id)
            .map(|cached| cached.update.clone())
    }

    /// Replaces the base targets and fetches them right away
    pub async fn set_base_targets(&self, user_ids: Vec<OwnedUserId>) {
        {
            let mut targets = self.targets.write().await;
            targets.base = user_ids.clone();
            targets.recompute(self.config.max_targets);
        }
        self.fetch_presence_for(&user_ids).await;
    }

    /// Replaces the members of the open room and fetches them right away
    pub async fn set_active_room_members(&self, user_ids: Vec<OwnedUserId>) {
        {
            let mut targets = self.targets.write().await;
            targets.active_room = user_ids.clone();
            targets.recompute(self.config.max_targets);
        }
        self.fetch_presence_for(&user_ids).await;
    }

    /// Adds one base target and fetches it right away
    pub async fn add_base_target(&self, user_id: OwnedUserId) {
        {
            let mut targets = self.targets.write().await;
            if !targets.base.contains(&user_id) {
                targets.base.push(user_id.clone());
                targets.recompute(self.config.max_targets);
            }
        }
        self.fetch_presence_for(&[user_id]).await;
    }

    async fn is_hidden(&self) -> bool {
        self.visibility
            .read()
            .await
            .as_ref()
            .is_some_and(|visibility| !visibility.borrow().is_visible())
    }

    /// Refreshes the first batch of targets whose reading is older than the
    /// TTL or missing. Skipped while the tab is hidden. Returns the number of
    /// users requested.
    pub async fn tick(&self) -> usize {
        if self.is_hidden().await {
            debug!("Tab hidden, skipping presence poll");
            return 0;
        }

        let stale: Vec<OwnedUserId> = {
            let targets = self.targets.read().await;
            let ttl = self.config.poll_ttl();
            targets
                .combined
                .iter()
                .filter(|id| {
                    targets
                        .cache
                        .get(*id)
                        .map_or(true, |cached| cached.fetched_at.elapsed() >= ttl)
                })
                .take(self.config.max_concurrency)
                .cloned()
                .collect()
        };

        if stale.is_empty() {
            return 0;
        }
        self.fetch_presence_for(&stale).await
    }

    /// Fetches presence for `user_ids` in concurrent batches and publishes the
    /// readings that changed. Failed reads are skipped. Returns the number of
    /// users requested.
    #[instrument(level = "debug", skip_all, fields(count = user_ids.len()))]
    pub async fn fetch_presence_for(&self, user_ids: &[OwnedUserId]) -> usize {
        let user_ids = dedup_capped(user_ids, self.config.max_targets);

        for batch in user_ids.chunks(self.config.max_concurrency.max(1)) {
            let readings = join_all(batch.iter().map(|user_id| async move {
                (user_id, self.client.get_presence(user_id).await)
            }))
            .await;

            let fetched_at = Instant::now();
            let now = Utc::now();
            let mut targets = self.targets.write().await;

            for (user_id, reading) in readings {
                let status = match reading {
                    Ok(status) => status,
                    Err(e) => {
                        debug!("Failed to read presence of {}: {}", user_id, e);
                        continue;
                    }
                };

                let update = self.evaluate(user_id, &status, now);
                let changed = targets
                    .cache
                    .get(user_id)
                    .map_or(true, |cached| update.differs_from(&cached.update));

                if changed {
                    let _ = self.updates.send(update.clone());
                }
                targets
                    .cache
                    .insert(user_id.clone(), CachedPresence { update, fetched_at });
            }
        }

        user_ids.len()
    }

    fn evaluate(&self, user_id: &UserId, status: &PresenceStatus, now: DateTime<Utc>) -> PresenceUpdate {
        let recently_active = status
            .last_active_ago
            .is_some_and(|ago| ago < self.config.recent_activity_window());

        let last_seen_at = status
            .last_active_ago
            .and_then(|ago| ChronoDuration::from_std(ago).ok())
            .map(|ago| now - ago);

        PresenceUpdate {
            user_id: user_id.to_owned(),
            is_online: status.presence == PresenceState::Online || recently_active,
            last_seen_at,
        }
    }

    /// Polls on the configured interval until stopped. Restarting replaces
    /// the running loop. Targets kept from before a `stop` are polled again.
    pub async fn start(self: &Arc<Self>, visibility: watch::Receiver<Visibility>) -> Result<()> {
        let period = self.config.poll_interval();
        if period.is_zero() {
            return Err(SyncError::InvalidConfig(
                "presence.poll_interval_ms must be greater than zero".into(),
            ));
        }

        *self.visibility.write().await = Some(visibility);
        self.targets.write().await.recompute(self.config.max_targets);

        let mut task = self.task.lock().await;
        if let Some(previous) = task.take() {
            previous.abort();
        }

        *task = Some(tokio::spawn(run_poller(Arc::downgrade(self), period)));

        info!("👀 Presence poller started, polling every {:?}", period);
        Ok(())
    }

    /// Stops polling and forgets the readings and the combined target list.
    /// Base and open-room targets are kept for the next `start`.
    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
        }
        {
            let mut targets = self.targets.write().await;
            targets.combined.clear();
            targets.cache.clear();
        }
        *self.visibility.write().await = None;

        info!("🛑 Presence poller stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PresencePoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

async fn run_poller(poller: Weak<PresencePoller>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(poller) = poller.upgrade() else {
            break;
        };
        let polled = poller.tick().await;
        if polled > 0 {
            debug!("Polled presence of {} users", polled);
        }
    }
}

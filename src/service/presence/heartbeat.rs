// =============================================================================
// zOS Sync - Presence Heartbeat Module
// =============================================================================
//
// Project: zOS Sync - Sliding sync and presence services for the zOS chat client
// Author: zOS Chat Team
// Date: 2026-10-19
// Version: 0.4.0
// License: Apache 2.0 / MIT
//
// Description:
//   Keeps the user's own presence "online" while the application is in use.
//   Publishes once on start, then re-checks on a fixed interval and whenever
//   the tab becomes visible again, republishing only when the server's idea
//   of the user's last activity has gone stale. Nothing is republished while
//   the tab is hidden.
//
// =============================================================================

use std::{sync::Arc, time::Duration};

use ruma::presence::PresenceState;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, instrument};
use zos_sync_core::{
    config::PresenceConfig, traits::ChatClient, types::Visibility, Result, SyncError,
};

/// Own-presence heartbeat. `Stopped` until [`start`](Self::start), back to
/// `Stopped` on [`stop`](Self::stop).
pub struct PresenceHeartbeat {
    config: PresenceConfig,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PresenceHeartbeat {
    pub fn new(config: PresenceConfig) -> Self {
        Self {
            config,
            task: Mutex::new(None),
        }
    }

    /// Publishes `online` and starts the heartbeat loop. A running heartbeat
    /// is replaced. Fails without publishing when the interval is zero.
    #[instrument(level = "debug", skip_all)]
    pub async fn start(
        &self,
        client: Arc<dyn ChatClient>,
        visibility: watch::Receiver<Visibility>,
    ) -> Result<()> {
        let period = self.config.heartbeat_interval();
        if period.is_zero() {
            return Err(SyncError::InvalidConfig(
                "presence.heartbeat_interval_ms must be greater than zero".into(),
            ));
        }

        let mut task = self.task.lock().await;
        if let Some(previous) = task.take() {
            debug!("Replacing running presence heartbeat");
            previous.abort();
        }

        publish_online(&*client).await;

        let threshold = self.config.stale_threshold();
        *task = Some(tokio::spawn(run_heartbeat(
            client, visibility, period, threshold,
        )));

        info!("💓 Presence heartbeat started, checking every {:?}", period);
        Ok(())
    }

    /// Stops the interval and the visibility listener
    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
            info!("💤 Presence heartbeat stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PresenceHeartbeat {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

async fn run_heartbeat(
    client: Arc<dyn ChatClient>,
    mut visibility: watch::Receiver<Visibility>,
    period: Duration,
    threshold: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Last observed visibility, only used to spot hidden -> visible edges.
    let mut visible = visibility.borrow_and_update().is_visible();
    let mut listening = true;

    loop {
        tokio::select! {
            biased;

            changed = visibility.changed(), if listening => {
                if changed.is_err() {
                    debug!("Visibility source dropped, heartbeat keeps ticking");
                    listening = false;
                } else {
                    let now_visible = visibility.borrow_and_update().is_visible();
                    let became_visible = now_visible && !visible;
                    visible = now_visible;
                    if became_visible {
                        debug!("Tab visible again, checking own presence");
                        republish_if_stale(&*client, threshold).await;
                    }
                }
            }
            _ = ticker.tick() => {
                if visibility.borrow().is_visible() {
                    republish_if_stale(&*client, threshold).await;
                }
            }
        }
    }
}

/// Publishes `online`. Failures are logged and swallowed.
pub(crate) async fn publish_online(client: &dyn ChatClient) -> bool {
    match client.set_presence(PresenceState::Online).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Failed to publish presence: {}", e);
            false
        }
    }
}

/// Reads own presence and republishes `online` if the last activity is
/// older than `threshold` or unknown. Returns whether it published.
pub(crate) async fn republish_if_stale(client: &dyn ChatClient, threshold: Duration) -> bool {
    let Some(user_id) = client.user_id() else {
        debug!("No logged in user, skipping presence check");
        return false;
    };

    let status = match client.get_presence(&user_id).await {
        Ok(status) => status,
        Err(e) => {
            debug!("Failed to read own presence: {}", e);
            return false;
        }
    };

    let stale = status
        .last_active_ago
        .map_or(true, |last_active_ago| last_active_ago > threshold);
    if !stale {
        return false;
    }

    publish_online(client).await
}

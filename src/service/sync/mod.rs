// =============================================================================
// zOS Sync - Sliding Sync Service Module
// =============================================================================
//
// Project: zOS Sync - Sliding sync and presence services for the zOS chat client
// Author: zOS Chat Team
// Date: 2026-10-19
// Version: 0.4.0
// License: Apache 2.0 / MIT
//
// Description:
//   Sliding sync (MSC3575) integration: the list registry, the per-login
//   session that configures the connection and subscribes rooms, and the
//   room crawl that widens list windows until every room was fetched once.
//
// =============================================================================

pub mod crawl;
pub mod lists;
pub mod session;
pub mod subscriptions;

pub use crawl::{CrawlOutcome, RoomCrawler};
pub use lists::{list_definitions, SubscriptionProfile};
pub use session::{RoomAppearance, SessionPhase, SyncSession};
pub use subscriptions::{should_lazy_load, SubscriptionTracker};

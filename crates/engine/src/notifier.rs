//! Update notifier: tells connected clients to refetch
//!
//! Events carry no data. A client that receives one re-reads users,
//! leaderboard and history over the REST API.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// Pending events per subscriber before it starts lagging
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LeaderboardEvent {
    #[serde(rename = "leaderboardUpdate")]
    Refresh,
}

impl LeaderboardEvent {
    /// Event name as sent on the push channel
    pub fn name(&self) -> &'static str {
        match self {
            LeaderboardEvent::Refresh => "leaderboardUpdate",
        }
    }
}

/// Fan-out of refresh events to every subscriber
#[derive(Debug, Clone)]
pub struct UpdateNotifier {
    tx: broadcast::Sender<LeaderboardEvent>,
}

impl UpdateNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Broadcast a refresh. Having no subscribers is not an error.
    pub fn notify(&self) {
        let delivered = self.tx.send(LeaderboardEvent::Refresh).unwrap_or(0);
        trace!(delivered, "Refresh broadcast");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LeaderboardEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for UpdateNotifier {
    fn default() -> Self {
        Self::new()
    }
}

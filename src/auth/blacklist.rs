//! Token Blacklist
//! Mission: Remember logged-out tokens until they would have expired anyway

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy)]
struct BlacklistEntry {
    revoked_at: DateTime<Utc>,
    /// `exp` of the revoked token, when known.
    expires_at: Option<i64>,
}

/// Process-wide set of revoked tokens.
///
/// Lookups take the read lock and do not block each other; `add`/`revoke`
/// take the write lock for a single map insert. Timestamps are computed
/// before the lock is taken.
#[derive(Debug, Default)]
pub struct TokenBlacklist {
    entries: RwLock<HashMap<String, BlacklistEntry>>,
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke `token` with no known expiry. It stays until restart.
    pub fn add(&self, token: &str) {
        self.insert(token, None);
    }

    /// Revoke `token`, remembering its own `exp` so the sweeper can drop it.
    pub fn revoke(&self, token: &str, expires_at: i64) {
        self.insert(token, Some(expires_at));
    }

    fn insert(&self, token: &str, expires_at: Option<i64>) {
        let entry = BlacklistEntry {
            revoked_at: Utc::now(),
            expires_at,
        };
        let key = token.to_string();

        self.entries.write().insert(key, entry);
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.read().contains_key(token)
    }

    /// When `token` was revoked, if it was.
    pub fn revoked_at(&self, token: &str) -> Option<DateTime<Utc>> {
        self.entries.read().get(token).map(|entry| entry.revoked_at)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop entries whose token expired before `now` (unix seconds).
    /// Returns how many were removed.
    pub fn purge_expired(&self, now: i64) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| match entry.expires_at {
            Some(exp) => exp >= now,
            None => true,
        });
        before - entries.len()
    }

    /// Periodically purge expired entries on the tokio runtime.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(every);
            loop {
                interval_timer.tick().await;
                trace!("Purging expired revoked tokens...");
                let removed = self.purge_expired(Utc::now().timestamp());
                if removed > 0 {
                    debug!(removed, remaining = self.len(), "Purged expired revoked tokens");
                }
            }
        })
    }
}

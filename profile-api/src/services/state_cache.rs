use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use parking_lot::Mutex;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::domain::{
    models::{ProfileSection, SectionData, UserId},
    ports::outbound::Clock,
};

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Cache key rendered as `{user_id}_{section}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub user_id: UserId,
    pub section: ProfileSection,
}

impl CacheKey {
    pub fn new(user_id: &UserId, section: ProfileSection) -> Self {
        Self {
            user_id: user_id.clone(),
            section,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.user_id, self.section)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: SectionData,
    expires_at: OffsetDateTime,
    last_accessed: OffsetDateTime,
    access_count: u64,
}

/// In-memory profile section cache with a TTL and an entry bound.
///
/// When full, the least recently accessed entry makes room for a new key.
/// Expired entries are dropped on read and by [`ProfileStateCache::sweep`].
pub struct ProfileStateCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: time::Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl ProfileStateCache {
    pub fn new(ttl: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: time::Duration::try_from(ttl).unwrap_or(time::Duration::MAX),
            max_entries: max_entries.max(1),
            clock,
        }
    }

    pub fn get(&self, user_id: &UserId, section: ProfileSection) -> Option<SectionData> {
        let key = CacheKey::new(user_id, section);
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let entry = entries.get_mut(&key)?;
        if entry.expires_at <= now {
            entries.remove(&key);
            debug!(key = %key, "cache entry expired");
            return None;
        }

        entry.last_accessed = now;
        entry.access_count += 1;
        Some(entry.value.clone())
    }

    /// Insert or overwrite. Last write wins.
    pub fn insert(&self, user_id: &UserId, value: SectionData) {
        let key = CacheKey::new(user_id, value.section());
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!(key = %oldest, "evicting least recently used cache entry");
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now.saturating_add(self.ttl),
                last_accessed: now,
                access_count: 0,
            },
        );
    }

    /// Remove one section, or every section when `section` is `None`.
    pub fn invalidate(&self, user_id: &UserId, section: Option<ProfileSection>) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();

        match section {
            Some(section) => {
                entries.remove(&CacheKey::new(user_id, section));
            }
            None => entries.retain(|key, _| &key.user_id != user_id),
        }

        before - entries.len()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();

        entries.retain(|_, entry| entry.expires_at > now);

        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// How often the entry was read since it was last written.
    pub fn access_count(&self, user_id: &UserId, section: ProfileSection) -> Option<u64> {
        self.entries
            .lock()
            .get(&CacheKey::new(user_id, section))
            .map(|entry| entry.access_count)
    }

    pub fn start_sweep_task(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = self.sweep();
                if removed > 0 {
                    info!("Swept {} expired profile cache entries", removed);
                }
            }
        })
    }
}

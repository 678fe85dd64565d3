//! In-memory port implementations shared by the service tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::domain::{
    models::{AvatarRecord, ProfileHistoryEntry, ProfileSection, SectionData, UserId},
    ports::outbound::{AvatarStorage, FileSource, ProbeOutcome, ProfileStore, UrlProbe},
    AvatarError, ProfileError,
};

pub const PUBLIC_BASE: &str = "https://proj.supabase.co/storage/v1/object/public/avatars";

/// Storage that keeps objects in a map and can be told to fail uploads.
#[derive(Default)]
pub struct FakeStorage {
    pub objects: Mutex<HashMap<String, (Bytes, String)>>,
    pub upload_calls: AtomicUsize,
    failing_uploads: AtomicUsize,
    pub fail_list: AtomicBool,
}

impl FakeStorage {
    /// Fail the next `count` uploads.
    pub fn failing(count: usize) -> Self {
        let storage = Self::default();
        storage.failing_uploads.store(count, Ordering::SeqCst);
        storage
    }

    pub fn with_objects(paths: &[&str]) -> Self {
        let storage = Self::default();
        {
            let mut objects = storage.objects.lock();
            for path in paths {
                objects.insert(path.to_string(), (Bytes::new(), "image/png".into()));
            }
        }
        storage
    }

    pub fn uploads(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths = self.objects.lock().keys().cloned().collect::<Vec<_>>();
        paths.sort();
        paths
    }
}

#[async_trait]
impl AvatarStorage for FakeStorage {
    async fn upload(&self, path: &str, body: Bytes, content_type: &str) -> Result<(), AvatarError> {
        let call = self.upload_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failing_uploads.load(Ordering::SeqCst) {
            return Err(AvatarError::Storage(format!("upload attempt {call} failed")));
        }
        self.objects
            .lock()
            .insert(path.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, path: &str) -> Result<String, AvatarError> {
        Ok(format!("{PUBLIC_BASE}/{path}"))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, AvatarError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(AvatarError::Storage("list failed".into()));
        }
        let folder = format!("{}/", prefix.trim_end_matches('/'));
        Ok(self
            .objects
            .lock()
            .keys()
            .filter(|path| path.starts_with(&folder))
            .cloned()
            .collect())
    }

    async fn remove(&self, paths: &[String]) -> Result<(), AvatarError> {
        let mut objects = self.objects.lock();
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeProfiles {
    pub records: Mutex<HashMap<String, AvatarRecord>>,
    pub rpc_urls: Mutex<HashMap<String, String>>,
    pub sections: Mutex<HashMap<(String, ProfileSection), SectionData>>,
    pub history: Mutex<Vec<ProfileHistoryEntry>>,
    pub fail_lookup: AtomicBool,
    pub fail_rpc: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_history: AtomicBool,
    pub lookups: AtomicUsize,
    pub section_loads: AtomicUsize,
}

impl FakeProfiles {
    pub fn with_user(user_id: &str, avatar_url: Option<&str>, display_name: Option<&str>) -> Self {
        let profiles = Self::default();
        profiles.records.lock().insert(
            user_id.to_string(),
            AvatarRecord {
                avatar_url: avatar_url.map(String::from),
                display_name: display_name.map(String::from),
            },
        );
        profiles
    }

    pub fn avatar_url(&self, user_id: &str) -> Option<String> {
        self.records
            .lock()
            .get(user_id)
            .and_then(|record| record.avatar_url.clone())
    }

    pub fn flag(flag: &AtomicBool) -> bool {
        flag.load(Ordering::SeqCst)
    }

    pub fn set(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProfileStore for FakeProfiles {
    async fn avatar_record(&self, user_id: &UserId) -> Result<Option<AvatarRecord>, ProfileError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if Self::flag(&self.fail_lookup) {
            return Err(ProfileError::store("lookup failed"));
        }
        Ok(self.records.lock().get(user_id.as_str()).cloned())
    }

    async fn avatar_url_via_rpc(&self, user_id: &UserId) -> Result<Option<String>, ProfileError> {
        if Self::flag(&self.fail_rpc) {
            return Err(ProfileError::store("rpc failed"));
        }
        Ok(self.rpc_urls.lock().get(user_id.as_str()).cloned())
    }

    async fn set_avatar_url(&self, user_id: &UserId, url: Option<&str>) -> Result<(), ProfileError> {
        if Self::flag(&self.fail_writes) {
            return Err(ProfileError::store("write failed"));
        }
        let mut records = self.records.lock();
        let record = records
            .get_mut(user_id.as_str())
            .ok_or(ProfileError::NotFound)?;
        record.avatar_url = url.map(String::from);
        Ok(())
    }

    async fn load_section(
        &self,
        user_id: &UserId,
        section: ProfileSection,
    ) -> Result<Option<SectionData>, ProfileError> {
        self.section_loads.fetch_add(1, Ordering::SeqCst);
        if Self::flag(&self.fail_lookup) {
            return Err(ProfileError::store("lookup failed"));
        }
        Ok(self
            .sections
            .lock()
            .get(&(user_id.to_string(), section))
            .cloned())
    }

    async fn save_section(&self, user_id: &UserId, data: &SectionData) -> Result<(), ProfileError> {
        if Self::flag(&self.fail_writes) {
            return Err(ProfileError::store("write failed"));
        }
        self.sections
            .lock()
            .insert((user_id.to_string(), data.section()), data.clone());
        Ok(())
    }

    async fn record_history(&self, entry: &ProfileHistoryEntry) -> Result<(), ProfileError> {
        if Self::flag(&self.fail_history) {
            return Err(ProfileError::store("history insert failed"));
        }
        self.history.lock().push(entry.clone());
        Ok(())
    }
}

/// Returns `size` zero bytes for any URI, cut at the read limit, and counts reads.
pub struct FakeFiles {
    size: usize,
    pub reads: Arc<AtomicUsize>,
    largest: AtomicUsize,
}

impl FakeFiles {
    pub fn of_size(size: usize) -> Self {
        Self {
            size,
            reads: Arc::new(AtomicUsize::new(0)),
            largest: AtomicUsize::new(0),
        }
    }

    /// Length of the biggest body handed out so far.
    pub fn largest_read(&self) -> usize {
        self.largest.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileSource for FakeFiles {
    async fn read(&self, _uri: &str, limit: u64) -> Result<Bytes, AvatarError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let size = self.size.min(usize::try_from(limit).unwrap_or(usize::MAX));
        self.largest.fetch_max(size, Ordering::SeqCst);
        Ok(Bytes::from(vec![0u8; size]))
    }
}

pub struct FakeProbe {
    outcome: ProbeOutcome,
    pub checked: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn returning(outcome: ProbeOutcome) -> Self {
        Self {
            outcome,
            checked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl UrlProbe for FakeProbe {
    async fn check(&self, url: &str) -> ProbeOutcome {
        self.checked.lock().push(url.to_string());
        self.outcome.clone()
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    domain::{
        models::{
            AvatarFile, AvatarPathLayout, AvatarRecord, AvatarRetention, ProfileSection,
            ProgressCallback, UploadedAvatar, UserId, ValidationReport,
        },
        placeholder::PlaceholderAvatar,
        ports::{
            inbound::AvatarService,
            outbound::{AvatarStorage, Clock, FileSource, ProbeOutcome, ProfileStore, UrlProbe},
        },
        retry::RetryPolicy,
        validator::AvatarValidator,
        AvatarError,
    },
    services::ProfileStateCache,
};

const PROGRESS_VALIDATED: u8 = 10;
const PROGRESS_READ: u8 = 25;
const PROGRESS_UPLOADING: u8 = 50;
const PROGRESS_STORED: u8 = 75;
const PROGRESS_DONE: u8 = 100;

/// Everything about the pipeline that comes from configuration.
#[derive(Debug, Clone, Default)]
pub struct AvatarOptions {
    pub validator: AvatarValidator,
    pub layout: AvatarPathLayout,
    pub retention: AvatarRetention,
    pub retry: RetryPolicy,
    pub placeholder: PlaceholderAvatar,
}

pub struct AvatarServiceImpl<S, P> {
    storage: Arc<S>,
    profiles: Arc<P>,
    files: Arc<dyn FileSource>,
    clock: Arc<dyn Clock>,
    probe: Option<Arc<dyn UrlProbe>>,
    state_cache: Option<Arc<ProfileStateCache>>,
    options: AvatarOptions,
}

impl<S, P> AvatarServiceImpl<S, P> {
    pub fn new(
        storage: Arc<S>,
        profiles: Arc<P>,
        files: Arc<dyn FileSource>,
        clock: Arc<dyn Clock>,
        options: AvatarOptions,
    ) -> Self {
        Self {
            storage,
            profiles,
            files,
            clock,
            probe: None,
            state_cache: None,
            options,
        }
    }

    /// Check stored URLs for reachability before handing them out.
    pub fn with_probe(mut self, probe: Arc<dyn UrlProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Drop the user's cached `basic` section whenever the avatar changes.
    pub fn with_state_cache(mut self, cache: Arc<ProfileStateCache>) -> Self {
        self.state_cache = Some(cache);
        self
    }

    fn invalidate_cached_profile(&self, user_id: &UserId) {
        if let Some(cache) = &self.state_cache {
            cache.invalidate(user_id, Some(ProfileSection::Basic));
        }
    }

    fn timestamp_millis(&self) -> i64 {
        (self.clock.now().unix_timestamp_nanos() / 1_000_000) as i64
    }
}

impl<S: AvatarStorage, P: ProfileStore> AvatarServiceImpl<S, P> {
    /// Validate the file description and return the extension to store under.
    fn admit(&self, file: &AvatarFile) -> Result<String, AvatarError> {
        let report = self.options.validator.validate(file);
        if !report.valid {
            debug!(errors = ?report.errors, "avatar rejected by validation");
            return Err(AvatarError::Validation(report.errors));
        }
        file.extension()
            .ok_or_else(|| AvatarError::Validation(vec!["File extension is missing".into()]))
    }

    /// Size check, upload with retry, then publish the URL and tidy up.
    async fn store(
        &self,
        user_id: &UserId,
        extension: &str,
        body: Bytes,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<UploadedAvatar, AvatarError> {
        // the declared size is only a claim
        if let Some(error) = self.options.validator.check_size(body.len() as u64) {
            return Err(AvatarError::Validation(vec![error]));
        }
        emit_progress(on_progress, PROGRESS_READ);

        let path = self
            .options
            .layout
            .object_path(user_id, self.timestamp_millis(), extension);
        let content_type = content_type_for(extension);

        emit_progress(on_progress, PROGRESS_UPLOADING);
        let storage = &self.storage;
        let (path_ref, content_type_ref) = (path.as_str(), content_type.as_str());
        self.options
            .retry
            .run(|attempt| {
                let body = body.clone();
                async move {
                    debug!(attempt, path = path_ref, "uploading avatar");
                    storage.upload(path_ref, body, content_type_ref).await
                }
            })
            .await?;
        emit_progress(on_progress, PROGRESS_STORED);

        let public_url = self.storage.public_url(&path)?;
        if public_url.trim().is_empty() {
            return Err(AvatarError::Storage(
                "storage returned an empty public URL".to_string(),
            ));
        }

        if let Err(err) = self
            .profiles
            .set_avatar_url(user_id, Some(&public_url))
            .await
        {
            warn!(error = %err, path = %path, "avatar stored but profile update failed");
        }
        self.invalidate_cached_profile(user_id);

        if self.options.retention == AvatarRetention::LatestOnly {
            match self.remove_blobs(user_id, Some(&path)).await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "removed previous avatar blobs"),
                Err(err) => warn!(error = %err, "failed to remove previous avatar blobs"),
            }
        }

        emit_progress(on_progress, PROGRESS_DONE);
        info!(path = %path, "avatar uploaded");

        Ok(UploadedAvatar {
            storage_path: path,
            public_url,
        })
    }

    /// Remove every blob in the user's folder except `keep`.
    async fn remove_blobs(&self, user_id: &UserId, keep: Option<&str>) -> Result<usize, AvatarError> {
        let prefix = self.options.layout.user_prefix(user_id);
        let stale = self
            .storage
            .list(&prefix)
            .await?
            .into_iter()
            .filter(|path| Some(path.as_str()) != keep)
            .collect::<Vec<_>>();

        self.storage.remove(&stale).await?;
        Ok(stale.len())
    }

    async fn lookup(&self, user_id: &UserId) -> Option<AvatarRecord> {
        let err = match self.profiles.avatar_record(user_id).await {
            Ok(record) => return record,
            Err(err) => err,
        };

        warn!(error = %err, "avatar lookup failed, falling back to rpc");
        match self.profiles.avatar_url_via_rpc(user_id).await {
            Ok(url) => url.map(|avatar_url| AvatarRecord {
                avatar_url: Some(avatar_url),
                display_name: None,
            }),
            Err(err) => {
                warn!(error = %err, "avatar rpc lookup failed, using placeholder");
                None
            }
        }
    }

    async fn probe(&self, url: &str) {
        let Some(probe) = &self.probe else {
            return;
        };

        match probe.check(url).await {
            ProbeOutcome::Reachable => debug!("stored avatar url is reachable"),
            outcome => info!(?outcome, "stored avatar url not confirmed, returning it anyway"),
        }
    }
}

fn emit_progress(on_progress: Option<&ProgressCallback>, percent: u8) {
    if let Some(callback) = on_progress {
        callback(percent);
    }
}

fn content_type_for(extension: &str) -> String {
    mime_guess::from_ext(extension)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn is_http_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

#[async_trait]
impl<S: AvatarStorage, P: ProfileStore> AvatarService for AvatarServiceImpl<S, P> {
    fn validate(&self, file: &AvatarFile) -> ValidationReport {
        self.options.validator.validate(file)
    }

    #[instrument(
        name = "AvatarService::upload",
        skip(self, file, on_progress),
        fields(user_id = %user_id, upload_id = %Uuid::new_v4())
    )]
    async fn try_upload_avatar(
        &self,
        user_id: &UserId,
        file: &AvatarFile,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<UploadedAvatar, AvatarError> {
        let extension = self.admit(file)?;
        emit_progress(on_progress, PROGRESS_VALIDATED);

        let limit = self.options.validator.policy().max_file_size.saturating_add(1);
        let body = self.files.read(&file.uri, limit).await?;

        self.store(user_id, &extension, body, on_progress).await
    }

    #[instrument(
        name = "AvatarService::upload_bytes",
        skip(self, file, body, on_progress),
        fields(user_id = %user_id, upload_id = %Uuid::new_v4(), size = body.len())
    )]
    async fn try_upload_avatar_bytes(
        &self,
        user_id: &UserId,
        file: &AvatarFile,
        body: Bytes,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<UploadedAvatar, AvatarError> {
        let extension = self.admit(file)?;
        emit_progress(on_progress, PROGRESS_VALIDATED);

        self.store(user_id, &extension, body, on_progress).await
    }

    #[instrument(name = "AvatarService::get_avatar_url", skip(self), fields(user_id = %user_id))]
    async fn get_avatar_url(&self, user_id: &UserId) -> String {
        let record = self.lookup(user_id).await.unwrap_or_default();

        if let Some(url) = record.avatar_url.filter(|url| !url.trim().is_empty()) {
            if self.options.placeholder.is_placeholder(&url) {
                return url;
            }
            if is_http_url(&url) {
                self.probe(&url).await;
                return url;
            }
            warn!(url = %url, "stored avatar url is malformed, using placeholder");
        }

        let name = record
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| user_id.to_string());

        self.options.placeholder.url_for(&name)
    }

    #[instrument(name = "AvatarService::delete", skip(self), fields(user_id = %user_id))]
    async fn delete_avatar(&self, user_id: &UserId) -> Result<(), AvatarError> {
        self.profiles
            .set_avatar_url(user_id, None)
            .await
            .map_err(|err| AvatarError::Persistence(err.to_string()))?;
        self.invalidate_cached_profile(user_id);

        match self.remove_blobs(user_id, None).await {
            Ok(removed) => info!(removed, "avatar removed"),
            Err(err) => warn!(error = %err, "avatar cleared but blobs were not removed"),
        }

        Ok(())
    }
}

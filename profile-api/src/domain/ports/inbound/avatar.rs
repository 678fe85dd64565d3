use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{
    models::{AvatarFile, AvatarUploadResult, ProgressCallback, UploadedAvatar, UserId, ValidationReport},
    AvatarError,
};

#[async_trait]
pub trait AvatarService: Send + Sync + 'static {
    fn validate(&self, file: &AvatarFile) -> ValidationReport;

    /// Validate, read, store and publish a new avatar for the user.
    async fn try_upload_avatar(
        &self,
        user_id: &UserId,
        file: &AvatarFile,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<UploadedAvatar, AvatarError>;

    /// Same pipeline for bytes the caller already holds, such as a multipart
    /// upload. `file.uri` is never read.
    async fn try_upload_avatar_bytes(
        &self,
        user_id: &UserId,
        file: &AvatarFile,
        body: Bytes,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<UploadedAvatar, AvatarError>;

    /// [`AvatarService::try_upload_avatar`] folded into a terminal result.
    async fn upload_avatar(
        &self,
        user_id: &UserId,
        file: &AvatarFile,
        on_progress: Option<&ProgressCallback>,
    ) -> AvatarUploadResult {
        self.try_upload_avatar(user_id, file, on_progress).await.into()
    }

    /// Always yields a displayable URL, falling back to a placeholder.
    async fn get_avatar_url(&self, user_id: &UserId) -> String;

    async fn delete_avatar(&self, user_id: &UserId) -> Result<(), AvatarError>;
}

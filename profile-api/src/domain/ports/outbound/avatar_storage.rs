use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::AvatarError;

/// Blob storage holding avatar images. Paths are relative to the avatar bucket.
#[async_trait]
pub trait AvatarStorage: Send + Sync + 'static {
    /// Store `body` at `path`, overwriting whatever is there.
    async fn upload(&self, path: &str, body: Bytes, content_type: &str) -> Result<(), AvatarError>;

    fn public_url(&self, path: &str) -> Result<String, AvatarError>;

    /// Full paths of every object directly under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, AvatarError>;

    async fn remove(&self, paths: &[String]) -> Result<(), AvatarError>;
}

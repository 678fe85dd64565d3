use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::AvatarError;

/// Turns the URI handed over by the image picker into bytes.
#[async_trait]
pub trait FileSource: Send + Sync + 'static {
    /// Reads at most `limit` bytes. Longer sources come back cut at `limit`,
    /// so callers pass one byte more than they accept to spot them.
    async fn read(&self, uri: &str, limit: u64) -> Result<Bytes, AvatarError>;
}

use async_trait::async_trait;

use crate::domain::{
    models::{AvatarRecord, ProfileHistoryEntry, ProfileSection, SectionData, UserId},
    ProfileError,
};

/// The `user_profiles` row and its history table.
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    async fn avatar_record(&self, user_id: &UserId) -> Result<Option<AvatarRecord>, ProfileError>;

    /// Server-side lookup used when reading the row directly fails.
    async fn avatar_url_via_rpc(&self, user_id: &UserId) -> Result<Option<String>, ProfileError>;

    /// Set or clear the avatar URL. Fails with `NotFound` when the user has no row.
    async fn set_avatar_url(&self, user_id: &UserId, url: Option<&str>) -> Result<(), ProfileError>;

    async fn load_section(
        &self,
        user_id: &UserId,
        section: ProfileSection,
    ) -> Result<Option<SectionData>, ProfileError>;

    async fn save_section(&self, user_id: &UserId, data: &SectionData) -> Result<(), ProfileError>;

    async fn record_history(&self, entry: &ProfileHistoryEntry) -> Result<(), ProfileError>;
}

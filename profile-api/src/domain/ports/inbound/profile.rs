use async_trait::async_trait;

use crate::domain::{
    models::{ProfileSection, SectionData, UserId},
    ProfileError,
};

#[async_trait]
pub trait ProfileService: Send + Sync + 'static {
    async fn get_section(
        &self,
        user_id: &UserId,
        section: ProfileSection,
    ) -> Result<SectionData, ProfileError>;

    async fn update_section(
        &self,
        user_id: &UserId,
        data: SectionData,
    ) -> Result<SectionData, ProfileError>;

    /// Drop cached state for one section, or for all of them. Returns how
    /// many entries went away.
    fn invalidate(&self, user_id: &UserId, section: Option<ProfileSection>) -> usize;
}

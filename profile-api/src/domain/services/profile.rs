use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{
    domain::{
        models::{ProfileHistoryEntry, ProfileSection, SectionData, UserId},
        ports::{
            inbound::ProfileService,
            outbound::{Clock, ProfileStore},
        },
        ProfileError,
    },
    services::ProfileStateCache,
};

pub struct ProfileServiceImpl<P> {
    store: Arc<P>,
    cache: Arc<ProfileStateCache>,
    clock: Arc<dyn Clock>,
}

impl<P: ProfileStore> ProfileServiceImpl<P> {
    pub fn new(store: Arc<P>, cache: Arc<ProfileStateCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            cache,
            clock,
        }
    }

    async fn current(
        &self,
        user_id: &UserId,
        section: ProfileSection,
    ) -> Result<Option<SectionData>, ProfileError> {
        if let Some(cached) = self.cache.get(user_id, section) {
            return Ok(Some(cached));
        }
        self.store.load_section(user_id, section).await
    }
}

fn to_json(data: &SectionData) -> Result<Value, ProfileError> {
    serde_json::to_value(data).map_err(|err| ProfileError::store(err.to_string()))
}

#[async_trait]
impl<P: ProfileStore> ProfileService for ProfileServiceImpl<P> {
    #[instrument(name = "ProfileService::get_section", skip(self), fields(user_id = %user_id))]
    async fn get_section(
        &self,
        user_id: &UserId,
        section: ProfileSection,
    ) -> Result<SectionData, ProfileError> {
        if let Some(cached) = self.cache.get(user_id, section) {
            debug!("profile section served from cache");
            return Ok(cached);
        }

        let data = self
            .store
            .load_section(user_id, section)
            .await?
            .ok_or(ProfileError::NotFound)?;
        self.cache.insert(user_id, data.clone());

        Ok(data)
    }

    #[instrument(
        name = "ProfileService::update_section",
        skip(self, data),
        fields(user_id = %user_id, section = %data.section())
    )]
    async fn update_section(
        &self,
        user_id: &UserId,
        mut data: SectionData,
    ) -> Result<SectionData, ProfileError> {
        data.validate()?;
        let section = data.section();

        let previous = self.current(user_id, section).await?;
        // the avatar is owned by the avatar pipeline
        if let SectionData::Basic(next) = &mut data {
            next.avatar_url = match &previous {
                Some(SectionData::Basic(prev)) => prev.avatar_url.clone(),
                _ => None,
            };
        }

        self.store.save_section(user_id, &data).await?;
        self.cache.insert(user_id, data.clone());

        let entry = ProfileHistoryEntry {
            user_id: user_id.clone(),
            section,
            previous: previous.as_ref().map(to_json).transpose()?,
            current: to_json(&data)?,
            changed_at: self.clock.now(),
        };
        if let Err(err) = self.store.record_history(&entry).await {
            warn!(error = %err, "profile saved but history entry was not recorded");
        }

        Ok(data)
    }

    fn invalidate(&self, user_id: &UserId, section: Option<ProfileSection>) -> usize {
        let removed = self.cache.invalidate(user_id, section);
        debug!(user_id = %user_id, ?section, removed, "invalidated cached profile state");
        removed
    }
}

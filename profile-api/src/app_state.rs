use std::sync::Arc;

use crate::{
    config::Settings,
    domain::ports::inbound::{AvatarService, ProfileService},
    factory::Services,
};

#[derive(Clone)]
pub struct AppState {
    pub app_url: String,
    /// Largest avatar payload accepted, used to size the upload body limit.
    pub max_avatar_bytes: u64,
    pub avatar_service: Arc<dyn AvatarService>,
    pub profile_service: Arc<dyn ProfileService>,
}

impl AppState {
    pub fn new(settings: &Settings, services: &Services) -> Self {
        Self {
            app_url: settings.application.app_url.clone(),
            max_avatar_bytes: settings.avatar.validator().policy().max_file_size,
            avatar_service: services.avatars.clone(),
            profile_service: services.profiles.clone(),
        }
    }
}

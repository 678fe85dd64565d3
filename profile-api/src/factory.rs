//! Composition root. The only place that names concrete outbound adapters.

use std::sync::Arc;

use supabase::{SupabaseClient, SupabaseError};

use crate::{
    adapters::outbound::{
        ReqwestUrlProbe, SupabaseAvatarStorage, SupabaseProfileStore, UriFileSource,
    },
    config::Settings,
    domain::{
        ports::{
            inbound::{AvatarService, ProfileService},
            outbound::{Clock, SystemClock},
        },
        services::{AvatarOptions, AvatarServiceImpl, ProfileServiceImpl},
    },
    services::ProfileStateCache,
};

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("invalid supabase settings: {0}")]
    Supabase(#[from] SupabaseError),
    #[error("invalid placeholder base url: {0}")]
    Placeholder(#[from] url::ParseError),
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub struct Services {
    pub avatars: Arc<dyn AvatarService>,
    pub profiles: Arc<dyn ProfileService>,
    pub state_cache: Arc<ProfileStateCache>,
}

pub fn build_services(settings: &Settings) -> Result<Services, FactoryError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let timeout = settings.supabase.request_timeout();
    let http = reqwest::Client::builder().timeout(timeout).build()?;

    let client = SupabaseClient::with_http_client(
        http.clone(),
        &settings.supabase.url,
        settings.supabase.api_key.clone(),
    )?
    .with_timeout(timeout);
    let storage = Arc::new(SupabaseAvatarStorage::new(
        client.clone(),
        settings.supabase.bucket.clone(),
        settings.avatar.cache_control.clone(),
    ));
    let store = Arc::new(SupabaseProfileStore::new(
        client,
        settings.supabase.profiles_table.clone(),
        settings.supabase.history_table.clone(),
        settings.supabase.avatar_lookup_function.clone(),
    ));

    let state_cache = Arc::new(ProfileStateCache::new(
        settings.cache.ttl(),
        settings.cache.max_entries,
        clock.clone(),
    ));

    let options = AvatarOptions {
        validator: settings.avatar.validator(),
        layout: settings.avatar.layout,
        retention: settings.avatar.retention,
        retry: settings.avatar.retry(),
        placeholder: settings.placeholder.placeholder()?,
    };
    let mut avatars = AvatarServiceImpl::new(
        storage,
        store.clone(),
        Arc::new(UriFileSource::new(http.clone())),
        clock.clone(),
        options,
    )
    .with_state_cache(state_cache.clone());
    if settings.avatar.probe_urls {
        avatars = avatars.with_probe(Arc::new(ReqwestUrlProbe::new(
            http,
            settings.avatar.probe_timeout(),
        )));
    }

    let profiles = ProfileServiceImpl::new(store, state_cache.clone(), clock);

    Ok(Services {
        avatars: Arc::new(avatars),
        profiles: Arc::new(profiles),
        state_cache,
    })
}

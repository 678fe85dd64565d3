use std::{str::FromStr, time::Duration};

use serde::Deserialize;
use serde_with::serde_as;
use strum::{Display, EnumString};

use crate::{
    adapters::outbound::DEFAULT_PROBE_TIMEOUT,
    domain::{
        models::{AvatarPathLayout, AvatarRetention},
        placeholder::PlaceholderAvatar,
        retry::RetryPolicy,
        validator::{AvatarPolicy, AvatarValidator},
    },
    services::DEFAULT_SWEEP_INTERVAL,
};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub supabase: SupabaseSettings,
    pub avatar: AvatarSettings,
    pub placeholder: PlaceholderSettings,
    pub cache: CacheSettings,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub port: u16,
    pub host: String,
    pub app_url: String,
}

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct SupabaseSettings {
    pub url: String,
    pub api_key: String,
    pub bucket: String,
    pub profiles_table: String,
    pub history_table: String,
    pub avatar_lookup_function: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub request_timeout_secs: u64,
}

impl SupabaseSettings {
    /// Zero falls back to the client default.
    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_secs {
            0 => supabase::DEFAULT_TIMEOUT,
            secs => Duration::from_secs(secs),
        }
    }
}

impl std::fmt::Debug for SupabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseSettings")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("profiles_table", &self.profiles_table)
            .field("history_table", &self.history_table)
            .field("avatar_lookup_function", &self.avatar_lookup_function)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct AvatarSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_file_size_mb: u64,
    pub allowed_mime_types: Vec<String>,
    pub allowed_extensions: Vec<String>,
    pub layout: AvatarPathLayout,
    pub retention: AvatarRetention,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_attempts: u32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub base_delay_ms: u64,
    pub cache_control: String,
    pub probe_urls: bool,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub probe_timeout_ms: u64,
}

impl AvatarSettings {
    pub fn validator(&self) -> AvatarValidator {
        AvatarValidator::new(AvatarPolicy {
            max_file_size: self.max_file_size_mb * 1024 * 1024,
            allowed_mime_types: self.allowed_mime_types.clone(),
            allowed_extensions: self.allowed_extensions.clone(),
        })
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }

    /// Zero falls back to the default probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        match self.probe_timeout_ms {
            0 => DEFAULT_PROBE_TIMEOUT,
            ms => Duration::from_millis(ms),
        }
    }
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct PlaceholderSettings {
    pub base_url: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub size: u32,
}

impl PlaceholderSettings {
    pub fn placeholder(&self) -> Result<PlaceholderAvatar, url::ParseError> {
        PlaceholderAvatar::new(&self.base_url, self.size)
    }
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct CacheSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub ttl_secs: u64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_entries: usize,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub sweep_interval_secs: u64,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Zero falls back to the default interval.
    pub fn sweep_interval(&self) -> Duration {
        match self.sweep_interval_secs {
            0 => DEFAULT_SWEEP_INTERVAL,
            secs => Duration::from_secs(secs),
        }
    }
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;
    let config_directory = base_path.join("config");

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .map_err(|e| config::ConfigError::Message(format!("Failed to parse APP_ENVIRONMENT: {e}")))?;
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(config::File::from(
            config_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("PROFILE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("avatar.allowed_mime_types")
                .with_list_parse_key("avatar.allowed_extensions")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString, PartialEq, Eq)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}

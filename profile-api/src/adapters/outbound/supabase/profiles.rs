use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use supabase::{SupabaseClient, SupabaseError};

use crate::domain::{
    models::{AvatarRecord, ProfileHistoryEntry, ProfileSection, SectionData, UserId},
    ports::outbound::ProfileStore,
    ProfileError,
};

/// Profile rows and history kept in PostgREST tables.
pub struct SupabaseProfileStore {
    client: SupabaseClient,
    profiles_table: String,
    history_table: String,
    lookup_function: String,
}

impl SupabaseProfileStore {
    pub fn new(
        client: SupabaseClient,
        profiles_table: impl Into<String>,
        history_table: impl Into<String>,
        lookup_function: impl Into<String>,
    ) -> Self {
        Self {
            client,
            profiles_table: profiles_table.into(),
            history_table: history_table.into(),
            lookup_function: lookup_function.into(),
        }
    }

    async fn patch(&self, user_id: &UserId, columns: &Value) -> Result<(), ProfileError> {
        let updated = self
            .client
            .from(&self.profiles_table)
            .eq("id", user_id)
            .update(columns)
            .await
            .map_err(store_error)?;

        if updated == 0 {
            return Err(ProfileError::NotFound);
        }
        Ok(())
    }
}

fn store_error(err: SupabaseError) -> ProfileError {
    ProfileError::store(err.to_string())
}

#[derive(Debug, Deserialize)]
struct AvatarLookup {
    avatar_url: Option<String>,
}

#[async_trait]
impl ProfileStore for SupabaseProfileStore {
    async fn avatar_record(&self, user_id: &UserId) -> Result<Option<AvatarRecord>, ProfileError> {
        self.client
            .from(&self.profiles_table)
            .select("avatar_url,display_name")
            .eq("id", user_id)
            .maybe_single::<AvatarRecord>()
            .await
            .map_err(store_error)
    }

    async fn avatar_url_via_rpc(&self, user_id: &UserId) -> Result<Option<String>, ProfileError> {
        // the function returns either a bare url or a row
        let value = self
            .client
            .rpc::<_, Value>(&self.lookup_function, &json!({ "user_id": user_id }))
            .await
            .map_err(store_error)?;

        let url = match value {
            Value::String(url) => Some(url),
            Value::Array(rows) => rows
                .into_iter()
                .next()
                .and_then(|row| serde_json::from_value::<AvatarLookup>(row).ok())
                .and_then(|row| row.avatar_url),
            Value::Object(_) => serde_json::from_value::<AvatarLookup>(value)
                .ok()
                .and_then(|row| row.avatar_url),
            _ => None,
        };

        Ok(url.filter(|url| !url.is_empty()))
    }

    async fn set_avatar_url(&self, user_id: &UserId, url: Option<&str>) -> Result<(), ProfileError> {
        self.patch(user_id, &json!({ "avatar_url": url })).await
    }

    async fn load_section(
        &self,
        user_id: &UserId,
        section: ProfileSection,
    ) -> Result<Option<SectionData>, ProfileError> {
        let row = self
            .client
            .from(&self.profiles_table)
            .select(section.columns().join(","))
            .eq("id", user_id)
            .maybe_single::<Value>()
            .await
            .map_err(store_error)?;

        row.map(|row| SectionData::from_row(section, &row))
            .transpose()
            .map_err(|err| ProfileError::store(format!("malformed {section} row: {err}")))
    }

    async fn save_section(&self, user_id: &UserId, data: &SectionData) -> Result<(), ProfileError> {
        self.patch(user_id, &data.to_columns()).await
    }

    async fn record_history(&self, entry: &ProfileHistoryEntry) -> Result<(), ProfileError> {
        self.client
            .from(&self.history_table)
            .insert(entry)
            .await
            .map_err(store_error)
    }
}

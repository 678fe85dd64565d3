use async_trait::async_trait;
use bytes::Bytes;
use supabase::{SupabaseClient, UploadOptions};

use crate::domain::{ports::outbound::AvatarStorage, AvatarError};

/// Large enough to see every avatar a single user has ever kept.
const LIST_LIMIT: u32 = 1000;

pub struct SupabaseAvatarStorage {
    client: SupabaseClient,
    bucket: String,
    cache_control: String,
}

impl SupabaseAvatarStorage {
    pub fn new(client: SupabaseClient, bucket: impl Into<String>, cache_control: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            cache_control: cache_control.into(),
        }
    }
}

fn storage_error(err: supabase::SupabaseError) -> AvatarError {
    AvatarError::Storage(err.to_string())
}

#[async_trait]
impl AvatarStorage for SupabaseAvatarStorage {
    async fn upload(&self, path: &str, body: Bytes, content_type: &str) -> Result<(), AvatarError> {
        let options = UploadOptions {
            content_type: content_type.to_string(),
            cache_control: self.cache_control.clone(),
            upsert: true,
        };

        self.client
            .storage(&self.bucket)
            .upload(path, body, &options)
            .await
            .map(|_| ())
            .map_err(storage_error)
    }

    fn public_url(&self, path: &str) -> Result<String, AvatarError> {
        self.client
            .storage(&self.bucket)
            .public_url(path)
            .map_err(storage_error)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, AvatarError> {
        let prefix = prefix.trim_matches('/');
        let objects = self
            .client
            .storage(&self.bucket)
            .list(prefix, LIST_LIMIT)
            .await
            .map_err(storage_error)?;

        // folder placeholders come back without an id
        Ok(objects
            .into_iter()
            .filter(|object| object.id.is_some())
            .map(|object| format!("{prefix}/{}", object.name))
            .collect())
    }

    async fn remove(&self, paths: &[String]) -> Result<(), AvatarError> {
        match self.client.storage(&self.bucket).remove(paths).await {
            Ok(_) => Ok(()),
            // already gone
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(storage_error(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    async fn storage(server: &MockServer) -> SupabaseAvatarStorage {
        let client = SupabaseClient::new(server.uri(), "anon-key").unwrap();
        SupabaseAvatarStorage::new(client, "avatars", "3600")
    }

    #[tokio::test]
    async fn upload_sends_upsert_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/avatars/users/u1/avatar_1.png"))
            .and(header("x-upsert", "true"))
            .and(header("content-type", "image/png"))
            .and(header("cache-control", "max-age=3600"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "Key": "avatars/users/u1/avatar_1.png" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        storage(&server)
            .await
            .upload("users/u1/avatar_1.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn upload_failure_is_a_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })),
            )
            .mount(&server)
            .await;

        let err = storage(&server)
            .await
            .upload("users/u1/a.png", Bytes::new(), "image/png")
            .await
            .unwrap_err();

        assert!(matches!(err, AvatarError::Storage(message) if message.contains("boom")));
    }

    #[tokio::test]
    async fn list_returns_full_paths_of_files_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/avatars"))
            .and(body_json(json!({ "prefix": "users/u1", "limit": 1000, "offset": 0 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "avatar_1.png", "id": "a" },
                { "name": "nested", "id": null },
                { "name": "avatar_2.png", "id": "b" }
            ])))
            .mount(&server)
            .await;

        let paths = storage(&server).await.list("users/u1/").await.unwrap();

        assert_eq!(paths, vec!["users/u1/avatar_1.png", "users/u1/avatar_2.png"]);
    }

    #[tokio::test]
    async fn public_url_points_at_public_bucket() {
        let server = MockServer::start().await;

        let url = storage(&server).await.public_url("users/u1/avatar_1.png").unwrap();

        assert_eq!(
            url,
            format!("{}/storage/v1/object/public/avatars/users/u1/avatar_1.png", server.uri())
        );
    }

    #[tokio::test]
    async fn traversal_keys_are_storage_errors() {
        let server = MockServer::start().await;
        let storage = storage(&server).await;

        let upload = storage
            .upload("users/u2/../u1/avatar_1.png", Bytes::from_static(b"png"), "image/png")
            .await;

        assert!(matches!(upload, Err(AvatarError::Storage(_))));
        assert!(matches!(
            storage.public_url("users/u2/../u1/avatar_1.png"),
            Err(AvatarError::Storage(_))
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn removing_missing_objects_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/avatars"))
            .and(body_json(json!({ "prefixes": ["users/u1/old.png"] })))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "message": "Object not found" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        storage(&server)
            .await
            .remove(&["users/u1/old.png".to_string()])
            .await
            .unwrap();
    }
}

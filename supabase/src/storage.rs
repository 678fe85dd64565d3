use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Method};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::{SupabaseClient, SupabaseError};

/// Options sent along with an object upload.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub content_type: String,
    /// Value for the `cache-control` max-age, in seconds (e.g. `"3600"`).
    pub cache_control: String,
    /// Overwrite an existing object at the same path.
    pub upsert: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            content_type: "application/octet-stream".to_string(),
            cache_control: "3600".to_string(),
            upsert: false,
        }
    }
}

/// An object as returned by the storage list endpoint. `name` is relative to
/// the listed prefix.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StorageObject {
    pub name: String,
    pub id: Option<String>,
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key")]
    key: String,
}

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: u32,
    offset: u32,
}

/// Handle on a single storage bucket.
pub struct StorageBucket<'a> {
    client: &'a SupabaseClient,
    bucket: String,
}

impl SupabaseClient {
    pub fn storage(&self, bucket: impl Into<String>) -> StorageBucket<'_> {
        StorageBucket {
            client: self,
            bucket: bucket.into(),
        }
    }
}

impl StorageBucket<'_> {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `{endpoint}/{bucket}/{path}` with each segment percent-encoded. Empty,
    /// `.` and `..` segments are refused so a key can't leave its folder.
    fn object_url(&self, endpoint: &str, path: &str) -> Result<Url, SupabaseError> {
        let segments = path.trim_start_matches('/').split('/').collect::<Vec<_>>();
        if segments
            .iter()
            .any(|segment| segment.is_empty() || *segment == "." || *segment == "..")
        {
            return Err(SupabaseError::InvalidUrl(format!("invalid object path: {path}")));
        }

        let mut url = self.client.endpoint(endpoint)?;
        url.path_segments_mut()
            .map_err(|()| SupabaseError::InvalidUrl(format!("{endpoint} cannot take a path")))?
            .pop_if_empty()
            .push(&self.bucket)
            .extend(segments);

        Ok(url)
    }

    /// Upload `body` to `path` inside the bucket and return the storage key
    /// (`{bucket}/{path}`).
    #[tracing::instrument(name = "storage::upload", skip(self, body, options), fields(bucket = %self.bucket, size = body.len()))]
    pub async fn upload(
        &self,
        path: &str,
        body: Bytes,
        options: &UploadOptions,
    ) -> Result<String, SupabaseError> {
        let url = self.object_url("storage/v1/object", path)?;

        let builder = self
            .client
            .request(Method::POST, url)
            .header(CONTENT_TYPE, options.content_type.as_str())
            .header("cache-control", format!("max-age={}", options.cache_control))
            .header("x-upsert", options.upsert.to_string())
            .body(body);

        let resp = self.client.send(builder).await?;
        let upload = resp
            .json::<UploadResponse>()
            .await
            .map_err(|e| SupabaseError::Parsing(format!("Failed to parse upload response: {e}")))?;

        Ok(upload.key)
    }

    /// Public URL of an object in a public bucket. No request is made.
    pub fn public_url(&self, path: &str) -> Result<String, SupabaseError> {
        self.object_url("storage/v1/object/public", path)
            .map(String::from)
    }

    /// List the objects directly under `prefix`.
    pub async fn list(&self, prefix: &str, limit: u32) -> Result<Vec<StorageObject>, SupabaseError> {
        let url = self
            .client
            .endpoint(&format!("storage/v1/object/list/{}", self.bucket))?;

        let builder = self.client.request(Method::POST, url).json(&ListRequest {
            prefix: prefix.trim_matches('/'),
            limit,
            offset: 0,
        });

        self.client
            .send(builder)
            .await?
            .json::<Vec<StorageObject>>()
            .await
            .map_err(|e| SupabaseError::Parsing(format!("Failed to parse object list: {e}")))
    }

    /// Remove objects by their full paths inside the bucket. Returns the
    /// objects that were actually deleted.
    pub async fn remove(&self, paths: &[String]) -> Result<Vec<StorageObject>, SupabaseError> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let url = self
            .client
            .endpoint(&format!("storage/v1/object/{}", self.bucket))?;

        let builder = self
            .client
            .request(Method::DELETE, url)
            .json(&json!({ "prefixes": paths }));

        self.client
            .send(builder)
            .await?
            .json::<Vec<StorageObject>>()
            .await
            .map_err(|e| SupabaseError::Parsing(format!("Failed to parse remove response: {e}")))
    }
}

use serde::{Deserialize, Serialize};

use super::UserId;
use crate::domain::AvatarError;

/// A picked image waiting to be uploaded. `uri` may be a local path, a
/// `file://` URI, a `data:` URI or a remote `http(s)://` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarFile {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub size: u64,
    pub mime: String,
}

impl AvatarFile {
    pub fn new(uri: impl Into<String>, size: u64, mime: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            file_name: None,
            size,
            mime: mime.into(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Lowercased extension of the file name, or of the URI's last path
    /// segment when no file name was given. `data:` URIs carry no extension.
    pub fn extension(&self) -> Option<String> {
        let name = match &self.file_name {
            Some(file_name) => file_name.as_str(),
            None if self.uri.starts_with("data:") => return None,
            None => {
                let path = self.uri.split(['?', '#']).next().unwrap_or_default();
                path.rsplit('/').next().unwrap_or(path)
            }
        };

        name.rsplit_once('.')
            .map(|(_, ext)| ext.trim().to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// A stored avatar blob and the public URL recorded for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAvatar {
    pub storage_path: String,
    pub public_url: String,
}

/// Terminal outcome of an upload as handed to callers.
///
/// Exactly one of `avatar_url` and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUploadResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AvatarUploadResult {
    pub fn succeeded(avatar_url: impl Into<String>) -> Self {
        Self {
            success: true,
            avatar_url: Some(avatar_url.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            avatar_url: None,
            error: Some(error.into()),
        }
    }
}

impl From<Result<UploadedAvatar, AvatarError>> for AvatarUploadResult {
    fn from(result: Result<UploadedAvatar, AvatarError>) -> Self {
        match result {
            Ok(uploaded) => Self::succeeded(uploaded.public_url),
            Err(err) => Self::failed(err.to_string()),
        }
    }
}

/// Progress callback, invoked with a percentage.
pub type ProgressCallback = dyn Fn(u8) + Send + Sync;

/// Where avatar blobs live inside the bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarPathLayout {
    /// `users/{user_id}/avatar_{timestamp}.{ext}`
    #[default]
    UserFolder,
    /// `{user_id}/{timestamp}.{ext}`
    Flat,
}

impl AvatarPathLayout {
    /// Folder holding every avatar blob of the user.
    pub fn user_prefix(&self, user_id: &UserId) -> String {
        match self {
            Self::UserFolder => format!("users/{user_id}"),
            Self::Flat => user_id.to_string(),
        }
    }

    pub fn object_path(&self, user_id: &UserId, timestamp_ms: i64, extension: &str) -> String {
        let prefix = self.user_prefix(user_id);
        match self {
            Self::UserFolder => format!("{prefix}/avatar_{timestamp_ms}.{extension}"),
            Self::Flat => format!("{prefix}/{timestamp_ms}.{extension}"),
        }
    }
}

/// What happens to older blobs once a new avatar is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarRetention {
    #[default]
    LatestOnly,
    KeepHistory,
}

/// The profile columns the avatar resolver needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AvatarRecord {
    pub avatar_url: Option<String>,
    pub display_name: Option<String>,
}

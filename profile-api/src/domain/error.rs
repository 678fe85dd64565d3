use thiserror::Error;

use super::models::ProfileSection;

/// Errors that can occur along the avatar pipeline.
#[derive(Debug, Error)]
pub enum AvatarError {
    /// The file broke one or more upload constraints. Never retried.
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("failed to read avatar file: {0}")]
    Source(String),
    /// Blob storage call failed. Retried by the uploader.
    #[error("storage error: {0}")]
    Storage(String),
    #[error("failed to update profile: {0}")]
    Persistence(String),
}

/// Errors from profile section reads and writes.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile not found")]
    NotFound,
    #[error("invalid {section} data: {message}")]
    InvalidSection {
        section: ProfileSection,
        message: String,
    },
    #[error("profile store error: {0}")]
    Store(String),
}

impl ProfileError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

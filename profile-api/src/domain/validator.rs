//! Upload constraints checked before any file is read or sent.

use crate::domain::models::{AvatarFile, ValidationReport};

const MIB: u64 = 1024 * 1024;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * MIB;
pub const DEFAULT_ALLOWED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarPolicy {
    pub max_file_size: u64,
    pub allowed_mime_types: Vec<String>,
    pub allowed_extensions: Vec<String>,
}

impl Default for AvatarPolicy {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES.map(String::from).to_vec(),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.map(String::from).to_vec(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AvatarValidator {
    policy: AvatarPolicy,
}

impl AvatarValidator {
    pub fn new(policy: AvatarPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AvatarPolicy {
        &self.policy
    }

    /// Check size, MIME type and extension. Every violation is reported.
    pub fn validate(&self, file: &AvatarFile) -> ValidationReport {
        let mut errors = Vec::new();

        if let Some(error) = self.check_size(file.size) {
            errors.push(error);
        }

        let mime = file.mime.trim();
        if !self
            .policy
            .allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime))
        {
            errors.push(format!(
                "File type {} is not allowed. Allowed types: {}",
                if mime.is_empty() { "(unknown)" } else { mime },
                self.policy.allowed_mime_types.join(", ")
            ));
        }

        match file.extension() {
            Some(ext) if self.is_allowed_extension(&ext) => {}
            Some(ext) => errors.push(format!(
                "File extension .{ext} is not allowed. Allowed extensions: {}",
                self.policy.allowed_extensions.join(", ")
            )),
            None => errors.push(format!(
                "File extension is missing. Allowed extensions: {}",
                self.policy.allowed_extensions.join(", ")
            )),
        }

        ValidationReport::from_errors(errors)
    }

    /// Size check on its own, used again once the real byte count is known.
    pub fn check_size(&self, size: u64) -> Option<String> {
        (size > self.policy.max_file_size)
            .then(|| format!("File size exceeds {}MB limit", megabytes(self.policy.max_file_size)))
    }

    fn is_allowed_extension(&self, ext: &str) -> bool {
        self.policy
            .allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

fn megabytes(bytes: u64) -> String {
    if bytes % MIB == 0 {
        (bytes / MIB).to_string()
    } else {
        format!("{:.1}", bytes as f64 / MIB as f64)
    }
}

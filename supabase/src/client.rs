use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Method, RequestBuilder, Response, StatusCode,
};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for a single Supabase project.
///
/// Every request carries the project `apikey` header and a bearer token. The
/// bearer is the user's access token when one is attached, otherwise the API
/// key itself (which is how service-role access works).
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    project_url: Url,
    api_key: String,
    access_token: Option<String>,
    timeout: Duration,
}

impl SupabaseClient {
    pub fn new(
        project_url: impl AsRef<str>,
        api_key: impl Into<String>,
    ) -> Result<Self, SupabaseError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| SupabaseError::Request(e.to_string()))?;

        Self::with_http_client(http, project_url, api_key)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        project_url: impl AsRef<str>,
        api_key: impl Into<String>,
    ) -> Result<Self, SupabaseError> {
        // `Url::join` drops the last path segment unless the base ends with a slash
        let normalized = format!("{}/", project_url.as_ref().trim_end_matches('/'));
        let project_url = Url::parse(&normalized)
            .map_err(|e| SupabaseError::InvalidUrl(format!("{normalized}: {e}")))?;

        Ok(Self {
            http,
            project_url,
            api_key: api_key.into(),
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a user session token instead of the API key for authorization.
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn project_url(&self) -> &Url {
        &self.project_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        self.project_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| SupabaseError::InvalidUrl(format!("{path}: {e}")))
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .timeout(self.timeout)
            .headers(self.auth_headers())
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);

        if let Ok(value) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {bearer}")) {
            headers.insert(AUTHORIZATION, value);
        }

        headers
    }

    /// Send a request and turn non-success statuses into [`SupabaseError`]s.
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<Response, SupabaseError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| SupabaseError::Request(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SupabaseError::Unauthorized);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or(body);

        tracing::debug!(status = status.as_u16(), %message, "supabase request failed");

        Err(SupabaseError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("RequestError: {0}")]
    Request(String),
    #[error("ParsingError: {0}")]
    Parsing(String),
    #[error("InvalidUrl: {0}")]
    InvalidUrl(String),
}

impl SupabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Storage and PostgREST disagree on the error shape, so take whichever field is there.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    msg: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message.or(self.msg).or(self.error)
    }
}

//! Router harness backed by the in-memory port fakes.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    app_state::AppState,
    domain::{
        ports::outbound::ManualClock,
        services::{
            fakes::{FakeFiles, FakeProfiles, FakeStorage},
            AvatarOptions, AvatarServiceImpl, ProfileServiceImpl,
        },
    },
    router,
    services::ProfileStateCache,
};

const BOUNDARY: &str = "profile-api-test-boundary";

pub struct TestApp {
    pub storage: Arc<FakeStorage>,
    pub profiles: Arc<FakeProfiles>,
    pub files: Arc<FakeFiles>,
    pub cache: Arc<ProfileStateCache>,
    state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_storage(FakeStorage::default())
    }

    pub fn with_failing_storage() -> Self {
        Self::with_storage(FakeStorage::failing(usize::MAX))
    }

    fn with_storage(storage: FakeStorage) -> Self {
        let storage = Arc::new(storage);
        let profiles = Arc::new(FakeProfiles::with_user("u1", None, Some("Jane Doe")));
        let clock = Arc::new(ManualClock::at_unix_millis(1_700_000_000_000));
        let cache = Arc::new(ProfileStateCache::new(
            Duration::from_secs(600),
            100,
            clock.clone(),
        ));

        let files = Arc::new(FakeFiles::of_size(1024));
        let options = AvatarOptions::default();
        let max_avatar_bytes = options.validator.policy().max_file_size;

        let avatars = AvatarServiceImpl::new(
            storage.clone(),
            profiles.clone(),
            files.clone(),
            clock.clone(),
            options,
        )
        .with_state_cache(cache.clone());
        let profile_service = ProfileServiceImpl::new(profiles.clone(), cache.clone(), clock);

        Self {
            storage,
            profiles,
            files,
            cache,
            state: AppState {
                app_url: "http://localhost:8081".to_string(),
                max_avatar_bytes,
                avatar_service: Arc::new(avatars),
                profile_service: Arc::new(profile_service),
            },
        }
    }

    pub fn router(&self) -> Router {
        router::create(self.state.clone())
    }
}

/// Multipart body with a single `avatar` file part.
pub fn avatar_form(file_name: &str, content_type: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"avatar\"; filename=\"{file_name}\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST a multipart form built by [`avatar_form`].
pub async fn send_form(app: Router, uri: &str, form: Vec<u8>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(form))
        .unwrap();

    dispatch(app, request).await
}

/// Send one request and decode the JSON response body (`Null` when empty).
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    dispatch(app, request).await
}

/// Plain-text bodies, such as extractor rejections, come back as a JSON string.
async fn dispatch(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    (status, json)
}

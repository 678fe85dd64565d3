use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{app_state::AppState, routes};

pub fn create(app_state: AppState) -> Router<()> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(match HeaderValue::from_str(&app_state.app_url) {
            Ok(origin) => AllowOrigin::exact(origin),
            Err(_) => {
                tracing::warn!(app_url = %app_state.app_url, "app url is not a valid origin, CORS disabled");
                AllowOrigin::list(Vec::<HeaderValue>::new())
            }
        });

    Router::new()
        .route("/", get(|| async { "ok" }))
        .nest("/avatars", routes::avatars::router())
        .nest("/users", routes::users::router(app_state.max_avatar_bytes))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}

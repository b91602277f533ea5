pub mod api;
pub mod live_ws;

use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::auth::require_admin;

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

pub(crate) fn bad_request<E: ToString>(e: E) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

pub(crate) fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("Request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal error".to_string(),
        }),
    )
}

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/admin/signals", post(api::publish_signal))
        .route("/admin/signals/generate", post(api::generate_signal))
        .route("/admin/signals/:id", delete(api::delete_signal))
        .route(
            "/admin/ticker",
            post(api::push_ticker).put(api::replace_ticker),
        )
        .route_layer(middleware::from_fn_with_state(
            state.session.clone(),
            require_admin,
        ));

    Router::new()
        .route("/", get(|| async { "Gold Master backend is running" }))
        .route("/health", get(api::health_check))
        .route("/status", get(api::get_status))
        .route("/shell", get(api::get_shell))
        .route("/shell/view", post(api::set_view))
        .route("/shell/language", post(api::set_language))
        .route("/shell/auth-modal", post(api::set_auth_modal))
        .route("/auth/login", post(api::login))
        .route("/auth/social", post(api::social_login))
        .route("/auth/logout", post(api::logout))
        .route("/dashboard", get(api::get_dashboard))
        .route("/insight", get(api::get_insight))
        .route("/signals", get(api::list_signals))
        .route("/ticker", get(api::list_ticker))
        .route("/posts", get(api::list_posts).post(api::create_post))
        .route("/tutor", post(api::ask_tutor))
        .route("/tools/lot-size", get(api::lot_size))
        .route("/education/courses", get(api::list_courses))
        .route("/chart/config", get(api::chart_config))
        .route("/live", get(live_ws::live_socket))
        .merge(admin)
        .with_state(state)
}

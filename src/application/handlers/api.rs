use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use super::{bad_request, internal, ApiResult, ErrorResponse};
use crate::application::actors::SessionState;
use crate::application::services::signal_engine::ManualSignalForm;
use crate::application::shell::{nav_items, AppView, NavItem};
use crate::application::state::AppState;
use crate::auth::{email_sign_in, parse_social_provider, social_sign_in, AuthOutcome, Credentials};
use crate::content::{courses, economic_calendar, CalendarEvent, ChartConfig, Course};
use crate::domain::entities::post::Post;
use crate::domain::entities::signal::TradeSignal;
use crate::domain::entities::user::User;
use crate::domain::services::market_feed::{KeyLevels, Quote};
use crate::domain::services::position_sizer::{contract_specs, ContractSpec, PositionSizer};
use crate::domain::value_objects::language::Language;
use crate::domain::value_objects::position_sizing::{LotSizeRequest, LotSizeResult};

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "running" }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub engine_syncing: bool,
    pub engine_status: &'static str,
    pub live: SessionState,
    pub signals: usize,
    pub user: Option<User>,
}

pub async fn get_status(State(state): State<AppState>) -> ApiResult<StatusResponse> {
    let language = state.shell.read().await.language;
    let syncing = state.engine.is_syncing();
    Ok(Json(StatusResponse {
        engine_syncing: syncing,
        engine_status: language.engine_status(syncing),
        live: state.live.state().await,
        signals: state.signals.list_signals().map_err(internal)?.len(),
        user: state.session.current_user().map_err(internal)?,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellResponse {
    pub view: AppView,
    pub language: Language,
    pub auth_modal_open: bool,
    pub nav_items: Vec<NavItem>,
    pub user: Option<User>,
}

async fn shell_snapshot(state: &AppState) -> ApiResult<ShellResponse> {
    let user = state.session.current_user().map_err(internal)?;
    let shell = state.shell.read().await;
    Ok(Json(ShellResponse {
        view: shell.view,
        language: shell.language,
        auth_modal_open: shell.auth_modal_open,
        nav_items: nav_items(shell.language),
        user,
    }))
}

pub async fn get_shell(State(state): State<AppState>) -> ApiResult<ShellResponse> {
    shell_snapshot(&state).await
}

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    pub view: AppView,
}

pub async fn set_view(
    State(state): State<AppState>,
    Json(request): Json<ViewRequest>,
) -> ApiResult<ShellResponse> {
    let user = state.session.current_user().map_err(internal)?;
    state
        .shell
        .write()
        .await
        .navigate(request.view, user.as_ref())
        .map_err(|e| {
            (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
        })?;
    shell_snapshot(&state).await
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: Language,
}

pub async fn set_language(
    State(state): State<AppState>,
    Json(request): Json<LanguageRequest>,
) -> ApiResult<ShellResponse> {
    state.shell.write().await.set_language(request.language);
    shell_snapshot(&state).await
}

#[derive(Debug, Deserialize)]
pub struct AuthModalRequest {
    pub open: bool,
}

pub async fn set_auth_modal(
    State(state): State<AppState>,
    Json(request): Json<AuthModalRequest>,
) -> ApiResult<ShellResponse> {
    state.shell.write().await.set_auth_modal(request.open);
    shell_snapshot(&state).await
}

async fn sign_in(state: &AppState, user: User) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    state.session.set_user(Some(user.clone())).map_err(internal)?;
    state.shell.write().await.on_login(&user);
    info!("✓ Signed in {} via {}", user.id, user.provider.as_str());
    Ok(())
}

pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> ApiResult<AuthOutcome> {
    let outcome = email_sign_in(&credentials);
    if let AuthOutcome::SignedIn { user } = &outcome {
        sign_in(&state, user.clone()).await?;
    }
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct SocialRequest {
    pub provider: String,
}

pub async fn social_login(
    State(state): State<AppState>,
    Json(request): Json<SocialRequest>,
) -> ApiResult<AuthOutcome> {
    let user = parse_social_provider(&request.provider)
        .and_then(social_sign_in)
        .map_err(bad_request)?;
    sign_in(&state, user.clone()).await?;
    Ok(Json(AuthOutcome::SignedIn { user }))
}

pub async fn logout(State(state): State<AppState>) -> ApiResult<ShellResponse> {
    state.session.set_user(None).map_err(internal)?;
    state.shell.write().await.on_logout();
    info!("Signed out");
    shell_snapshot(&state).await
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub quote: Quote,
    pub levels: KeyLevels,
    pub calendar: Vec<CalendarEvent>,
    pub ticker: Vec<String>,
    pub engine_status: &'static str,
}

pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<DashboardResponse> {
    let language = state.shell.read().await.language;
    Ok(Json(DashboardResponse {
        quote: state.feed.quote(),
        levels: state.feed.levels().clone(),
        calendar: economic_calendar(),
        ticker: state.signals.list_ticker().map_err(internal)?,
        engine_status: language.engine_status(state.engine.is_syncing()),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct LanguageQuery {
    pub language: Option<Language>,
}

#[derive(Debug, Serialize)]
pub struct InsightResponse {
    pub language: Language,
    pub text: String,
}

pub async fn get_insight(
    State(state): State<AppState>,
    Query(query): Query<LanguageQuery>,
) -> Json<InsightResponse> {
    let language = match query.language {
        Some(language) => language,
        None => state.shell.read().await.language,
    };
    let price = state.feed.price();
    let trend = state.feed.levels().trend_at(price);
    let text = state.insight.market_commentary(price, trend, language).await;
    Json(InsightResponse { language, text })
}

pub async fn list_signals(State(state): State<AppState>) -> ApiResult<Vec<TradeSignal>> {
    Ok(Json(state.signals.list_signals().map_err(internal)?))
}

pub async fn list_ticker(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    Ok(Json(state.signals.list_ticker().map_err(internal)?))
}

pub async fn list_posts(State(state): State<AppState>) -> ApiResult<Vec<Post>> {
    Ok(Json(state.posts.list_posts().map_err(internal)?))
}

#[derive(Debug, Deserialize)]
pub struct NewPostRequest {
    pub content: String,
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<NewPostRequest>,
) -> Result<(StatusCode, Json<Post>), (StatusCode, Json<ErrorResponse>)> {
    let Some(user) = state.session.current_user().map_err(internal)? else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Sign in to post".to_string(),
            }),
        ));
    };
    let avatar = user
        .avatar
        .clone()
        .unwrap_or_else(|| format!("https://picsum.photos/seed/{}/100/100", user.id));
    let post = Post::new(&user.name, &request.content, &avatar, user.is_vip).map_err(bad_request)?;
    state.posts.add_post(post.clone()).map_err(internal)?;
    Ok((StatusCode::CREATED, Json(post)))
}

#[derive(Debug, Deserialize)]
pub struct TutorRequest {
    pub question: String,
    pub language: Option<Language>,
}

#[derive(Debug, Serialize)]
pub struct TutorResponse {
    pub answer: String,
}

pub async fn ask_tutor(
    State(state): State<AppState>,
    Json(request): Json<TutorRequest>,
) -> ApiResult<TutorResponse> {
    if request.question.trim().is_empty() {
        return Err(bad_request("question must not be empty"));
    }
    let language = match request.language {
        Some(language) => language,
        None => state.shell.read().await.language,
    };
    let answer = state.insight.tutor(&request.question, language).await;
    Ok(Json(TutorResponse { answer }))
}

#[derive(Debug, Default, Deserialize)]
pub struct LotSizeQuery {
    pub account_size: Option<f64>,
    pub risk_percent: Option<f64>,
    pub stop_loss_pips: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct LotSizeResponse {
    pub request: LotSizeRequest,
    pub result: LotSizeResult,
    pub contract: Vec<ContractSpec>,
}

pub async fn lot_size(Query(query): Query<LotSizeQuery>) -> ApiResult<LotSizeResponse> {
    let defaults = LotSizeRequest::default();
    let request = LotSizeRequest {
        account_size: query.account_size.unwrap_or(defaults.account_size),
        risk_percent: query.risk_percent.unwrap_or(defaults.risk_percent),
        stop_loss_pips: query.stop_loss_pips.unwrap_or(defaults.stop_loss_pips),
    };
    let result = PositionSizer::calculate(&request).map_err(bad_request)?;
    Ok(Json(LotSizeResponse {
        request,
        result,
        contract: contract_specs(),
    }))
}

pub async fn list_courses() -> Json<Vec<Course>> {
    Json(courses())
}

pub async fn chart_config() -> Json<ChartConfig> {
    Json(ChartConfig::default())
}

pub async fn publish_signal(
    State(state): State<AppState>,
    Json(form): Json<ManualSignalForm>,
) -> Result<(StatusCode, Json<TradeSignal>), (StatusCode, Json<ErrorResponse>)> {
    let signal = form
        .into_signal(&mut rand::thread_rng())
        .map_err(bad_request)?;
    state.signals.add_signal(signal.clone()).map_err(internal)?;
    info!("📣 Admin published {} {} @ {}", signal.direction, signal.pair, signal.entry);
    Ok((StatusCode::CREATED, Json(signal)))
}

pub async fn delete_signal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let removed = state.signals.delete_signal(&id).map_err(internal)?;
    Ok(Json(json!({ "id": id, "removed": removed })))
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub signal: Option<TradeSignal>,
}

pub async fn generate_signal(State(state): State<AppState>) -> ApiResult<GenerateResponse> {
    let signal = state.engine.generate_now().await.map_err(|e| {
        error!("Manual signal generation failed: {}", e);
        internal(e)
    })?;
    Ok(Json(GenerateResponse { signal }))
}

#[derive(Debug, Deserialize)]
pub struct TickerRequest {
    pub message: String,
}

pub async fn push_ticker(
    State(state): State<AppState>,
    Json(request): Json<TickerRequest>,
) -> ApiResult<Vec<String>> {
    Ok(Json(state.signals.push_ticker(&request.message).map_err(internal)?))
}

#[derive(Debug, Deserialize)]
pub struct ReplaceTickerRequest {
    pub messages: Vec<String>,
}

pub async fn replace_ticker(
    State(state): State<AppState>,
    Json(request): Json<ReplaceTickerRequest>,
) -> ApiResult<Vec<String>> {
    state
        .signals
        .set_ticker(request.messages)
        .map_err(internal)?;
    Ok(Json(state.signals.list_ticker().map_err(internal)?))
}

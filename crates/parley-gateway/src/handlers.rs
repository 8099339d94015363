// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the admin REST API.

use std::str::FromStr;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parley_core::ParleyError;
use parley_core::types::{
    Account, Conversation, ConversationEntry, ConversationStatus, Message, Page, Sender, Variant,
};
use parley_desk::AdminSession;
use serde::{Deserialize, Serialize};

use crate::auth::AdminId;
use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: ConversationStatus,
    pub count: u64,
}

/// Response body for GET /v1/stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub variant: Variant,
    pub by_status: Vec<StatusCount>,
    pub total: u64,
    pub needs_attention: u64,
}

/// Response body for GET /v1/dashboard.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub variant: Variant,
    pub needs_attention: u64,
    /// Admins currently attached to a conversation.
    pub reply_sessions: usize,
    /// The calling admin's reply target, if any.
    pub replying_to: Option<i64>,
    /// First page of conversations waiting in the initial status.
    pub waiting: Page<ConversationEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: u32,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u32,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    #[serde(flatten)]
    pub entry: ConversationEntry,
    pub messages: Page<Message>,
}

/// Request body for POST /v1/conversations/{id}/reply.
#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub message: Message,
    pub conversation: Conversation,
    /// `true` if the admin stays attached to the conversation.
    pub still_replying: bool,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps domain errors onto HTTP statuses. Infrastructure detail stays in
/// the logs.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Domain(ParleyError),
}

impl From<ParleyError> for ApiError {
    fn from(e: ParleyError) -> Self {
        Self::Domain(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Domain(e) => match &e {
                ParleyError::NotFound { .. } => (StatusCode::NOT_FOUND, e.to_string()),
                ParleyError::PermissionDenied(_) => (StatusCode::FORBIDDEN, e.to_string()),
                ParleyError::Conflict { .. } => (StatusCode::CONFLICT, e.to_string()),
                ParleyError::Config(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                _ => {
                    tracing::error!(error = %e, "gateway request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal error".to_string(),
                    )
                }
            },
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

fn parse_status(raw: Option<&str>, variant: Variant) -> Result<ConversationStatus, ApiError> {
    let Some(raw) = raw else {
        return Ok(variant.initial_status());
    };
    ConversationStatus::from_str(raw)
        .ok()
        .filter(|status| status.variant() == variant)
        .ok_or_else(|| {
            ApiError::BadRequest(format!("status '{raw}' is not valid for {variant} conversations"))
        })
}

/// The admin's stored account, created on first use.
async fn admin_account(state: &GatewayState, admin: AdminId) -> Result<Account, ParleyError> {
    let storage = state.router.store().storage();
    if let Some(account) = storage.get_account_by_external_id(admin.0).await? {
        return Ok(account);
    }
    let sender = Sender {
        external_id: admin.0,
        username: None,
        first_name: format!("Admin {}", admin.0),
        last_name: None,
    };
    Ok(state.router.identity().resolve(&sender).await?.account)
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /v1/dashboard
pub async fn get_dashboard(
    State(state): State<GatewayState>,
    Extension(admin): Extension<AdminId>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let store = state.router.store();
    let variant = store.variant();
    Ok(Json(DashboardResponse {
        variant,
        needs_attention: store.attention_count().await?,
        reply_sessions: state.router.sessions().active_count(),
        replying_to: state.router.sessions().current_target(admin.0),
        waiting: store.list_by_status(variant.initial_status(), 0).await?,
    }))
}

/// GET /v1/conversations?status=&page=
pub async fn list_conversations(
    State(state): State<GatewayState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<ConversationEntry>>, ApiError> {
    let store = state.router.store();
    let status = parse_status(query.status.as_deref(), store.variant())?;
    Ok(Json(store.list_by_status(status, query.page).await?))
}

/// GET /v1/conversations/{id}?page=
///
/// Viewing a threaded chat marks it read, as the bot view does.
pub async fn get_conversation(
    State(state): State<GatewayState>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let store = state.router.store();
    let mut entry = store.get(id).await?;
    if entry.conversation.variant == Variant::Threaded && entry.conversation.unread_count > 0 {
        store.mark_read(id).await?;
        entry = store.get(id).await?;
    }
    let messages = store.page_messages(id, query.page).await?;
    Ok(Json(ConversationResponse { entry, messages }))
}

/// POST /v1/conversations/{id}/reply
pub async fn post_reply(
    State(state): State<GatewayState>,
    Extension(admin): Extension<AdminId>,
    Path(id): Path<i64>,
    Json(body): Json<ReplyRequest>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let text = body.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("reply text cannot be empty".into()));
    }
    let account = admin_account(&state, admin).await?;
    let outcome = state
        .router
        .reply_as_admin(&account, id, Some(text.to_string()), &[])
        .await?;
    Ok(Json(ReplyResponse {
        message: outcome.message,
        conversation: outcome.conversation,
        still_replying: outcome.session == AdminSession::RepliesTo(id),
    }))
}

/// POST /v1/conversations/{id}/close
///
/// Closes a ticket or archives a chat. Idempotent.
pub async fn post_close(
    State(state): State<GatewayState>,
    Extension(admin): Extension<AdminId>,
    Path(id): Path<i64>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation = state.router.store().close(id).await?;
    state.router.sessions().clear_if_target(admin.0, id);
    Ok(Json(conversation))
}

/// GET /v1/stats
pub async fn get_stats(State(state): State<GatewayState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.router.store().stats().await?;
    Ok(Json(StatsResponse {
        variant: stats.variant,
        by_status: stats
            .by_status
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect(),
        total: stats.total,
        needs_attention: stats.needs_attention,
    }))
}

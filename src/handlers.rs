use crate::chat::{self, LeadState, FALLBACK_RESPONSE};
use crate::db_storage::{ChatSessionStorage, PropertyStorage};
use crate::errors::{AppError, ResultExt};
use crate::follow_up;
use crate::llm_client::LlmClient;
use crate::models::*;
use crate::notifier::{LeadNotification, LeadNotifier};
use crate::prompt;
use crate::stats::{aggregate_dashboard_stats, DashboardStats};
use crate::visitor::VisitorInfo;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use moka::future::Cache;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Chat-completions client.
    pub llm: LlmClient,
    /// Lead notification webhook client, absent when not configured.
    pub notifier: Option<LeadNotifier>,
    /// Property + agent context by property id (short TTL).
    pub property_cache: Cache<Uuid, PropertyContext>,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Validated `POST /api/chat` input.
#[derive(Debug)]
struct ChatInput {
    message: String,
    property_id: Uuid,
}

fn validate_chat_request(payload: &ChatRequest) -> Result<ChatInput, AppError> {
    let message = payload
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    let property_id = payload
        .property_id
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let (Some(message), Some(property_id)) = (message, property_id) else {
        return Err(AppError::BadRequest(
            "Message and property ID are required".to_string(),
        ));
    };

    let property_id = Uuid::parse_str(property_id)
        .map_err(|_| AppError::BadRequest("Invalid property ID".to_string()))?;

    Ok(ChatInput {
        message: message.to_string(),
        property_id,
    })
}

/// Property context from the cache, falling back to the database.
async fn load_property(state: &AppState, property_id: Uuid) -> Result<PropertyContext, AppError> {
    if let Some(cached) = state.property_cache.get(&property_id).await {
        tracing::debug!("Property cache HIT: {}", property_id);
        return Ok(cached);
    }

    let property = PropertyStorage::new(state.db.clone())
        .find_property_context(property_id)
        .await
        .context("loading property")?
        .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

    state
        .property_cache
        .insert(property_id, property.clone())
        .await;

    Ok(property)
}

/// Parses a client-supplied session id; blank or malformed ids are ignored.
fn parse_session_id(raw: Option<&str>) -> Option<Uuid> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::warn!("Ignoring malformed session id {:?}", raw);
            None
        }
    }
}

/// Finds the session this turn belongs to, creating one when needed.
///
/// An unknown, foreign or malformed session id falls through to the
/// returning-visitor lookup and then to creation.
async fn resolve_session(
    storage: &ChatSessionStorage,
    property_id: Uuid,
    session_id: Option<&str>,
    visitor: Option<&VisitorInfo>,
) -> Result<ChatSession, AppError> {
    let visitor_key = visitor.and_then(VisitorInfo::visitor_key);

    if let Some(id) = parse_session_id(session_id) {
        match storage.find_session(id).await? {
            Some(session) if session.property_id == property_id => {
                if let Some(info) = visitor {
                    let known = session.visitor_info.as_ref().map(|j| &j.0);
                    if known != Some(info) {
                        if let Err(e) = storage
                            .attach_visitor(session.id, visitor_key.as_deref(), info)
                            .await
                        {
                            tracing::warn!("Failed to attach visitor to session {}: {}", id, e);
                        }
                    }
                }
                return Ok(session);
            }
            Some(_) => tracing::warn!(
                "Session {} belongs to another property, ignoring it",
                id
            ),
            None => tracing::warn!("Session {} not found, ignoring it", id),
        }
    }

    if let Some(key) = visitor_key.as_deref() {
        if let Some(session) = storage.find_visitor_session(property_id, key).await? {
            tracing::info!("Resuming session {} for returning visitor", session.id);
            return Ok(session);
        }
    }

    storage
        .create_session(property_id, visitor_key.as_deref(), visitor)
        .await
        .context("creating chat session")
}

/// POST /api/chat
///
/// One chat turn with the property assistant:
/// 1. Validate input and load the property
/// 2. Load or create the visitor's session
/// 3. Ask the LLM (canned reply on failure)
/// 4. Score the visitor's message and update the session
/// 5. Notify the agent once the lead qualifies
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let input = validate_chat_request(&payload)?;
    tracing::info!("POST /api/chat - property_id: {}", input.property_id);

    let property = load_property(&state, input.property_id).await?;

    let visitor = payload
        .visitor_info
        .as_ref()
        .map(VisitorInfo::sanitized)
        .filter(|v| !v.is_empty());

    let storage = ChatSessionStorage::new(state.db.clone());
    let session = resolve_session(
        &storage,
        input.property_id,
        payload.session_id.as_deref(),
        visitor.as_ref(),
    )
    .await?;

    let mut history = session.conversation_history.0;
    let messages = prompt::build_messages(
        &property,
        payload.context.as_ref(),
        &history,
        &input.message,
    );

    let (ai_response, llm_failed) = match state.llm.complete(&messages).await {
        Ok(reply) => (reply, false),
        Err(e) => {
            tracing::error!("LLM call failed for session {}: {}", session.id, e);
            (FALLBACK_RESPONSE.to_string(), true)
        }
    };

    let previous = LeadState {
        score: session.lead_qualification_score,
        interests: session.identified_interests,
        notified: session.lead_notified,
    };
    let outcome = chat::apply_turn(
        &previous,
        &input.message,
        &ai_response,
        state.notifier.is_some(),
        chrono::Utc::now(),
    );

    tracing::info!(
        "Session {} score {} -> {} (signals: {:?})",
        session.id,
        previous.score,
        outcome.state.score,
        outcome.signals
    );

    history.push(outcome.turn.clone());
    if let Err(e) = storage
        .update_session(
            session.id,
            outcome.state.score,
            &outcome.state.interests,
            &history,
            outcome.state.notified,
        )
        .await
    {
        // The reply still goes out; the stored session may now lag behind it.
        tracing::error!("Failed to update chat session {}: {}", session.id, e);
    }

    if outcome.notify {
        if let Some(notifier) = &state.notifier {
            notifier.spawn_send(LeadNotification {
                kind: LeadNotification::KIND,
                session_id: session.id,
                property_id: property.id,
                agent_id: property.agent_id,
                property_title: property.display_name(),
                score: outcome.state.score,
                interests: outcome.state.interests.clone(),
                visitor_info: visitor
                    .clone()
                    .or_else(|| session.visitor_info.as_ref().map(|j| j.0.clone())),
                notified_at: chrono::Utc::now(),
            });
        }
    }

    let suggested_actions = chat::response_actions(&outcome.state, &outcome.signals, llm_failed);

    Ok(Json(ChatResponse {
        response: ai_response,
        session_id: session.id,
        lead_qualification: chat::lead_qualification(&outcome.state),
        agent_contact: AgentContact::from_property(
            &property,
            follow_up::should_show_contact(outcome.state.score),
        ),
        suggested_actions,
    }))
}

/// GET /api/chat/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChatSessionView>, AppError> {
    tracing::info!("GET /api/chat/sessions/{}", id);

    let session = ChatSessionStorage::new(state.db.clone())
        .find_session(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Chat session {} not found", id)))?;

    Ok(Json(session.into()))
}

/// GET /api/chat/sessions?property_id=...
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SessionListParams>,
) -> Result<Json<Vec<ChatSessionSummary>>, AppError> {
    tracing::info!("GET /api/chat/sessions - property_id: {}", params.property_id);

    let sessions = ChatSessionStorage::new(state.db.clone())
        .list_property_sessions(params.property_id)
        .await?;

    Ok(Json(sessions))
}

/// DELETE /api/chat/sessions/:id
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    tracing::info!("DELETE /api/chat/sessions/{}", id);

    let deleted = ChatSessionStorage::new(state.db.clone())
        .delete_session(id)
        .await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Chat session {} not found", id)))
    }
}

/// GET /api/dashboard/stats?agent_id=...
pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardStats>, AppError> {
    tracing::info!("GET /api/dashboard/stats - agent_id: {}", params.agent_id);

    let total_properties = PropertyStorage::new(state.db.clone())
        .count_agent_properties(params.agent_id)
        .await?;
    let sessions = ChatSessionStorage::new(state.db.clone())
        .list_agent_sessions(params.agent_id)
        .await?;

    Ok(Json(aggregate_dashboard_stats(total_properties, &sessions)))
}

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{EventId, EventRecord};
use crate::reconcile::{build_ranking, ranking_score};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: String,
    pub title: BTreeMap<String, String>,
    pub platform: String,
    pub game: String,
    pub active: bool,
    pub featured: bool,
    pub participant_number: u32,
    pub total_prize: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&EventRecord> for EventSummary {
    fn from(event: &EventRecord) -> Self {
        Self {
            id: event.id.to_string(),
            title: event.titles.clone(),
            platform: event.platform.clone(),
            game: event.game.clone(),
            active: event.active,
            featured: event.featured,
            participant_number: event.participant_number,
            total_prize: event.prices.total_committed(),
            scheduled_at: event.scheduled_at,
            created_at: event.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<EventSummary>,
}

pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<EventListResponse>, ApiError> {
    let events = state.store.list_events().await?;
    let summaries = events.iter().map(EventSummary::from).collect();
    Ok(Json(EventListResponse { events: summaries }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,

    /// Locale the title is written in; the server default applies when absent.
    pub locale: Option<String>,

    pub platform: Option<String>,
    pub game: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,

    /// Expected participant tier; resolves the preset prize table.
    pub preset_tier: Option<u32>,
}

pub async fn create_event(
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventRecord>), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Event title is required".to_string()));
    }

    let locale = req.locale.as_deref().unwrap_or(&state.default_locale);
    let mut event = EventRecord::new(locale, req.title, Utc::now());

    if let Some(platform) = req.platform {
        event.platform = platform;
    }
    if let Some(game) = req.game {
        event.game = game;
    }
    event.scheduled_at = req.scheduled_at;

    if let Some(tier) = req.preset_tier {
        event
            .apply_preset(tier)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    }

    let id = state.store.create_event(event.clone()).await?;
    info!("Created event {}", id);
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventRecord>, ApiError> {
    let event_id = EventId::from(id.as_str());
    state
        .store
        .get_event(&event_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Event not found: {}", id)))
}

pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(event): Json<EventRecord>,
) -> Result<Json<EventRecord>, ApiError> {
    if event.id.as_str() != id {
        return Err(ApiError::BadRequest(format!(
            "Body id {} does not match path id {}",
            event.id, id
        )));
    }

    state.store.update_event(event.clone()).await?;
    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let event_id = EventId::from(id.as_str());
    state.store.delete_event(&event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub position: u32,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub victories: u32,
    pub matches_played: u32,
    pub credits_earned: u32,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct RankingResponse {
    pub ranking: Vec<RankingEntry>,
}

pub async fn get_ranking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RankingResponse>, ApiError> {
    let event_id = EventId::from(id.as_str());
    state
        .store
        .get_event(&event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event not found: {}", id)))?;

    let snapshot = state.store.fetch_ranking(&event_id).await?;
    let ranked = build_ranking(&snapshot);

    let ranking = ranked
        .iter()
        .enumerate()
        .map(|(i, p)| RankingEntry {
            position: i as u32 + 1,
            user_id: p.id.to_string(),
            user_name: p.user_name.clone(),
            victories: p.victories,
            matches_played: p.matches_played,
            credits_earned: p.credits_earned,
            score: ranking_score(p).unwrap_or(0.0),
        })
        .collect();

    Ok(Json(RankingResponse { ranking }))
}

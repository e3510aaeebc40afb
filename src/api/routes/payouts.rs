use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::distribute::{payouts_from_rows, template_rows, ImportRow};
use crate::models::{EventId, EventRecord};
use crate::reconcile::{build_ranking, compute_payouts, validate_disjoint};
use crate::store::PayoutReport;

#[derive(Debug, Deserialize)]
pub struct PayoutParams {
    /// Reject the prize table up front when ranges overlap.
    pub strict: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutLine {
    pub user_id: String,
    pub amount: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutPreviewResponse {
    pub event_id: String,
    pub payouts: Vec<PayoutLine>,
    pub total: u64,
}

async fn load_event(state: &AppState, id: &str) -> Result<EventRecord, ApiError> {
    let event_id = EventId::from(id);
    state
        .store
        .get_event(&event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event not found: {}", id)))
}

async fn resolve_payouts(
    state: &AppState,
    event: &EventRecord,
    strict: bool,
) -> Result<std::collections::BTreeMap<crate::models::ParticipantId, u32>, ApiError> {
    if strict {
        validate_disjoint(&event.prices).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    }

    let snapshot = state.store.fetch_ranking(&event.id).await?;
    let ranking = build_ranking(&snapshot);
    Ok(compute_payouts(&ranking, &event.prices))
}

pub async fn preview_payouts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PayoutParams>,
) -> Result<Json<PayoutPreviewResponse>, ApiError> {
    let event = load_event(&state, &id).await?;
    let payouts = resolve_payouts(&state, &event, params.strict.unwrap_or(false)).await?;

    let lines: Vec<PayoutLine> = payouts
        .iter()
        .map(|(user, amount)| PayoutLine {
            user_id: user.to_string(),
            amount: *amount,
        })
        .collect();
    let total = lines.iter().map(|l| l.amount as u64).sum();

    Ok(Json(PayoutPreviewResponse {
        event_id: event.id.to_string(),
        payouts: lines,
        total,
    }))
}

pub async fn apply_payouts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PayoutParams>,
) -> Result<Json<PayoutReport>, ApiError> {
    let event = load_event(&state, &id).await?;
    let payouts = resolve_payouts(&state, &event, params.strict.unwrap_or(false)).await?;

    let report = state.store.apply_payouts(&event.id, &payouts).await?;
    info!(
        "Closed payouts for event {} ({} credited)",
        event.id,
        report.credited.len()
    );
    Ok(Json(report))
}

/// Apply operator-provided rows directly, bypassing the reconciler.
pub async fn apply_bulk(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(rows): Json<Vec<ImportRow>>,
) -> Result<Json<PayoutReport>, ApiError> {
    let event = load_event(&state, &id).await?;
    let payouts = payouts_from_rows(&rows);

    let report = state.store.apply_payouts(&event.id, &payouts).await?;
    info!(
        "Applied bulk distribution for event {} ({} credited)",
        event.id,
        report.credited.len()
    );
    Ok(Json(report))
}

/// Downloadable participant template rows, best performers first.
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ImportRow>>, ApiError> {
    let event = load_event(&state, &id).await?;
    let snapshot = state.store.fetch_ranking(&event.id).await?;
    Ok(Json(template_rows(&snapshot)))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::state::AppState;
    use crate::models::{EventRecord, Participant, PrizeTable};
    use crate::store::{EventStore, MemoryStore};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use chrono::Utc;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    async fn request(app: axum::Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .header(axum::http::header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn prize_table(rows: &[(&str, u32)]) -> PrizeTable {
        let mut table = PrizeTable::new();
        for (key, amount) in rows {
            table.set(key, *amount).unwrap();
        }
        table
    }

    async fn seed_event(store: &MemoryStore, table: PrizeTable) -> crate::models::EventId {
        let event = EventRecord::new("es", "Copa", Utc::now()).with_prizes(table);
        store.create_event(event).await.unwrap()
    }

    fn test_app(store: Arc<MemoryStore>) -> axum::Router {
        build_router(AppState::new(store, "es"))
    }

    #[tokio::test]
    async fn test_preview_matches_ranking_order() {
        let store = Arc::new(MemoryStore::new());
        let id = seed_event(&store, prize_table(&[("1", 100), ("2", 75), ("3-5", 20)])).await;

        store
            .upsert_participant(&id, Participant::new("a").with_record(4, 4).with_credits(90))
            .await
            .unwrap();
        store
            .upsert_participant(&id, Participant::new("b").with_record(2, 4).with_credits(50))
            .await
            .unwrap();
        store
            .upsert_participant(&id, Participant::new("c").with_record(1, 4).with_credits(10))
            .await
            .unwrap();

        let app = test_app(store);
        let (status, json) = request(app, Method::GET, &format!("/api/events/{}/payouts", id)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 195);
        let lines = json["payouts"].as_array().unwrap();
        let amount_of = |user: &str| {
            lines
                .iter()
                .find(|l| l["userId"] == user)
                .map(|l| l["amount"].as_u64().unwrap())
        };
        assert_eq!(amount_of("a"), Some(100));
        assert_eq!(amount_of("b"), Some(75));
        assert_eq!(amount_of("c"), Some(20));
    }

    #[tokio::test]
    async fn test_strict_preview_rejects_overlap() {
        let store = Arc::new(MemoryStore::new());
        let id = seed_event(&store, prize_table(&[("1-3", 100), ("2-5", 50)])).await;

        let app = test_app(store);
        let uri = format!("/api/events/{}/payouts?strict=true", id);
        let (status, json) = request(app, Method::GET, &uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_lenient_preview_allows_overlap() {
        let store = Arc::new(MemoryStore::new());
        let id = seed_event(&store, prize_table(&[("1-2", 100), ("1-5", 50)])).await;

        store
            .upsert_participant(&id, Participant::new("a").with_record(1, 1))
            .await
            .unwrap();

        let app = test_app(store);
        let (status, json) = request(app, Method::GET, &format!("/api/events/{}/payouts", id)).await;

        assert_eq!(status, StatusCode::OK);
        // First sorted entry covering position 1 wins.
        assert_eq!(json["payouts"][0]["amount"], 50);
    }

    #[tokio::test]
    async fn test_apply_twice_skips_second_run() {
        let store = Arc::new(MemoryStore::new());
        let id = seed_event(&store, prize_table(&[("1", 100)])).await;
        store
            .upsert_participant(&id, Participant::new("a").with_record(1, 1))
            .await
            .unwrap();

        let app = test_app(store.clone());
        let uri = format!("/api/events/{}/payouts/apply", id);

        let (status, json) = request(app.clone(), Method::POST, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalCredited"], 100);
        assert_eq!(json["credited"].as_array().unwrap().len(), 1);

        let (status, json) = request(app, Method::POST, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["totalCredited"], 0);
        assert_eq!(json["skipped"].as_array().unwrap().len(), 1);

        assert_eq!(store.balance(&"a".into()).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_bulk_distribution_bypasses_reconciler() {
        let store = Arc::new(MemoryStore::new());
        let id = seed_event(&store, PrizeTable::new()).await;

        let app = test_app(store.clone());
        let rows = json!([
            {"id": "a", "name": "Ana", "email": "ana@example.com", "metric": 40},
            {"id": "b", "name": "Ben", "email": "ben@example.com", "metric": 0}
        ]);
        let uri = format!("/api/events/{}/payouts/bulk", id);
        let (status, report) = post_json(app, &uri, rows).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["totalCredited"], 40);
        assert_eq!(store.balance(&"a".into()).await.unwrap(), 40);
        // Zero-metric rows never reach the ledger.
        assert_eq!(store.balance(&"b".into()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_template_rows_sorted() {
        let store = Arc::new(MemoryStore::new());
        let id = seed_event(&store, PrizeTable::new()).await;

        store
            .upsert_participant(&id, Participant::new("low").with_record(1, 2).with_credits(5))
            .await
            .unwrap();
        store
            .upsert_participant(
                &id,
                Participant::new("high").with_record(2, 2).with_credits(80),
            )
            .await
            .unwrap();

        let app = test_app(store);
        let (status, json) = request(app, Method::GET, &format!("/api/events/{}/template", id)).await;

        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows[0]["id"], "high");
        assert_eq!(rows[0]["metric"], 80);
        assert_eq!(rows[1]["id"], "low");
    }

    #[tokio::test]
    async fn test_payouts_unknown_event() {
        let store = Arc::new(MemoryStore::new());
        let app = test_app(store);
        let (status, _) = request(app, Method::GET, "/api/events/nope/payouts").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use ledgerlink_connect::{BatchSyncSummary, CancelRequest, CancelResponse, SyncSummary};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub sync_all: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SyncResponse {
    Organization(SyncSummary),
    Batch(BatchSyncSummary),
}

fn check_cron_secret(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let Some(expected) = state.cron_secret.as_deref() else {
        return Ok(());
    };
    let provided = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if provided != expected {
        return Err(ApiError::Unauthorized("Invalid cron secret".to_string()));
    }
    Ok(())
}

async fn sync_billing(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SyncRequest>,
) -> ApiResult<Json<SyncResponse>> {
    if body.sync_all {
        check_cron_secret(&state, &headers)?;
        let summary = state.orchestrator.sync_all().await?;
        return Ok(Json(SyncResponse::Batch(summary)));
    }

    let user_id = state.auth.user_from_headers(&headers)?;
    let organization_id = body
        .organization_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest("organization_id is required unless sync_all is set".to_string())
        })?;

    tracing::info!("User {} requested billing sync of {}", user_id, organization_id);
    let summary = state
        .orchestrator
        .sync_organization(&user_id, &organization_id)
        .await?;
    Ok(Json(SyncResponse::Organization(summary)))
}

async fn cancel_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CancelRequest>,
) -> ApiResult<Json<CancelResponse>> {
    let user_id = state.auth.user_from_headers(&headers)?;
    tracing::info!(
        "User {} requested cancellation of {} {} in {}",
        user_id,
        body.document_type,
        body.external_id,
        body.organization_id
    );
    let response = state.cancellation.execute(&user_id, body).await?;
    Ok(Json(response))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/billing/sync", post(sync_billing))
        .route("/billing/cancel", post(cancel_document))
}

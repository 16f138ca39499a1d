use axum::{Router, extract::State, http::HeaderMap, response::Json, routing::get};
use qrmenu_proto::menu_service::GetDashboardStatsPayload;
use tracing::instrument;

use crate::error::ApiError;
use crate::models::*;

use super::{AppState, extract_user_id};

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(get_dashboard))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Usage statistics of the caller", body = DashboardStatsResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = []),
    ),
    tag = "dashboard"
)]
#[instrument(skip(state, headers))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardStatsResponse>, ApiError> {
    let user_id = extract_user_id(&headers, &state.decoding_key)?;
    let mut menu_client = state.menu_client.clone();

    let stats = menu_client
        .get_dashboard_stats(tonic::Request::new(GetDashboardStatsPayload { user_id }))
        .await
        .map_err(ApiError::from_status)?
        .into_inner();

    Ok(Json(DashboardStatsResponse {
        total_menus: stats.total_menus,
        published_menus: stats.published_menus,
        qr_codes: stats.qr_codes,
        total_scans: stats.total_scans,
    }))
}

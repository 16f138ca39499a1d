use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
    routing::{get, post},
};
use qrmenu_proto::menu_service::{GenerateQrCodePayload, GetQrCodePayload, ListUserQrCodesPayload};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::models::*;

use super::{AppState, extract_user_id, parse_json, rfc3339, verify_menu_access};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/menus/{id}/qr-code",
            post(generate_qr_code).get(get_qr_code),
        )
        .route("/qr-codes", get(list_qr_codes))
}

#[utoipa::path(
    post,
    path = "/menus/{id}/qr-code",
    request_body(content = GenerateQrCodeRequest, description = "Optional target address"),
    responses(
        (status = 200, description = "QR code published", body = GenerateQrCodeResponse),
        (status = 400, description = "Invalid menu address", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Menu belongs to another user", body = ApiErrorResponse),
        (status = 404, description = "Menu not found", body = ApiErrorResponse),
        (status = 502, description = "Publication failed", body = ApiErrorResponse),
        (status = 503, description = "Storage unavailable", body = ApiErrorResponse),
        (status = 504, description = "Publication timed out", body = ApiErrorResponse),
    ),
    params(
        ("id" = String, Path, description = "Menu ID")
    ),
    security(
        ("bearer" = []),
    ),
    tag = "qr-codes"
)]
#[instrument(skip(state, headers, body))]
pub async fn generate_qr_code(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(menu_id): Path<String>,
    body: Bytes,
) -> Result<Json<GenerateQrCodeResponse>, ApiError> {
    let user_id = extract_user_id(&headers, &state.decoding_key)?;
    let payload: GenerateQrCodeRequest = if body.is_empty() {
        GenerateQrCodeRequest::default()
    } else {
        parse_json(&body)?
    };

    let mut menu_client = state.menu_client.clone();
    verify_menu_access(&mut menu_client, &user_id, &menu_id).await?;

    let menu_url = payload.menu_url.unwrap_or_else(|| {
        format!(
            "{}/menu/{}",
            state.public_menu_base_url.trim_end_matches('/'),
            menu_id
        )
    });

    let response = menu_client
        .generate_qr_code(tonic::Request::new(GenerateQrCodePayload {
            menu_id: menu_id.clone(),
            menu_url,
        }))
        .await
        .map_err(ApiError::from_status)?;

    let qr_code_url = response.into_inner().qr_code_url;
    info!(%menu_id, %qr_code_url, "menu published");

    Ok(Json(GenerateQrCodeResponse { qr_code_url }))
}

#[utoipa::path(
    get,
    path = "/menus/{id}/qr-code",
    responses(
        (status = 200, description = "QR code of the menu, if any", body = QrCodeStatusResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Menu belongs to another user", body = ApiErrorResponse),
        (status = 404, description = "Menu not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = String, Path, description = "Menu ID")
    ),
    security(
        ("bearer" = []),
    ),
    tag = "qr-codes"
)]
#[instrument(skip(state, headers))]
pub async fn get_qr_code(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(menu_id): Path<String>,
) -> Result<Json<QrCodeStatusResponse>, ApiError> {
    let user_id = extract_user_id(&headers, &state.decoding_key)?;
    let mut menu_client = state.menu_client.clone();
    verify_menu_access(&mut menu_client, &user_id, &menu_id).await?;

    let response = menu_client
        .get_qr_code(tonic::Request::new(GetQrCodePayload { menu_id }))
        .await
        .map_err(ApiError::from_status)?
        .into_inner();

    Ok(Json(QrCodeStatusResponse {
        publication_status: response
            .publication_status()
            .as_str_name()
            .to_lowercase(),
        qr_code_url: response.qr_code_url,
    }))
}

#[utoipa::path(
    get,
    path = "/qr-codes",
    responses(
        (status = 200, description = "QR codes of the caller, newest first", body = ListQrCodesResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = []),
    ),
    tag = "qr-codes"
)]
#[instrument(skip(state, headers))]
pub async fn list_qr_codes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListQrCodesResponse>, ApiError> {
    let user_id = extract_user_id(&headers, &state.decoding_key)?;
    let mut menu_client = state.menu_client.clone();

    let response = menu_client
        .list_user_qr_codes(tonic::Request::new(ListUserQrCodesPayload { user_id }))
        .await
        .map_err(ApiError::from_status)?;

    let qr_codes = response
        .into_inner()
        .qr_codes
        .into_iter()
        .map(|q| QrCode {
            menu_id: q.menu_id,
            menu_name: q.menu_name,
            qr_code_url: q.qr_code_url,
            scan_count: q.scan_count,
            created_at: rfc3339(q.created_at),
        })
        .collect();

    Ok(Json(ListQrCodesResponse { qr_codes }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::tests::{json_body, send, test_app};

    async fn create_lunch(app: &axum::Router, user_id: &str) -> String {
        let response = send(
            app,
            "POST",
            "/menus",
            Some(user_id),
            Some(json!({"menu_type": "custom", "menu_data": {"name": "Lunch"}})),
        )
        .await;
        json_body(response).await["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_generate_qr_code_with_default_url() {
        let app = test_app().await;
        let id = create_lunch(&app, "u1").await;
        let uri = format!("/menus/{id}/qr-code");

        let before = json_body(send(&app, "GET", &uri, Some("u1"), None).await).await;
        assert_eq!(before["publication_status"], "unpublished");
        assert!(before["qr_code_url"].is_null());

        let response = send(&app, "POST", &uri, Some("u1"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let url = json_body(response).await["qr_code_url"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(url.starts_with("https://cdn.example.com/files/menu-files/qr-codes/"));
        assert!(url.ends_with(".png"));

        let image = send(
            &app,
            "GET",
            url.strip_prefix("https://cdn.example.com").unwrap(),
            None,
            None,
        )
        .await;
        assert_eq!(image.status(), StatusCode::OK);
        assert_eq!(image.headers()["content-type"], "image/png");
        let bytes = axum::body::to_bytes(image.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));

        let after = json_body(send(&app, "GET", &uri, Some("u1"), None).await).await;
        assert_eq!(after["publication_status"], "published");
        assert_eq!(after["qr_code_url"], url.as_str());

        let menu = json_body(send(&app, "GET", &format!("/menus/{id}"), Some("u1"), None).await)
            .await;
        assert_eq!(menu["qr_code_generated"], true);

        let listed = json_body(send(&app, "GET", "/qr-codes", Some("u1"), None).await).await;
        assert_eq!(listed["qr_codes"][0]["menu_name"], "Lunch");
        assert_eq!(listed["qr_codes"][0]["qr_code_url"], url.as_str());
        assert_eq!(listed["qr_codes"][0]["scan_count"], 0);
    }

    #[tokio::test]
    async fn test_generate_qr_code_rejects_invalid_url() {
        let app = test_app().await;
        let id = create_lunch(&app, "u1").await;

        let response = send(
            &app,
            "POST",
            &format!("/menus/{id}/qr-code"),
            Some("u1"),
            Some(json!({"menu_url": "not a url"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let menu = json_body(send(&app, "GET", &format!("/menus/{id}"), Some("u1"), None).await)
            .await;
        assert_eq!(menu["qr_code_generated"], false);
    }

    #[tokio::test]
    async fn test_generate_qr_code_for_another_users_menu_is_forbidden() {
        let app = test_app().await;
        let id = create_lunch(&app, "u1").await;

        let response = send(&app, "POST", &format!("/menus/{id}/qr-code"), Some("u2"), None).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let listed = json_body(send(&app, "GET", "/qr-codes", Some("u1"), None).await).await;
        assert!(listed["qr_codes"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_qr_code_for_unknown_menu() {
        let app = test_app().await;

        let response = send(
            &app,
            "POST",
            &format!("/menus/{}/qr-code", uuid::Uuid::new_v4()),
            Some("u1"),
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

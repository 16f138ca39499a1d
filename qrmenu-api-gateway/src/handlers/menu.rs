use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
    routing::{get, post},
};
use qrmenu_proto::menu_service::{
    self as pb, CreateMenuFromTemplatePayload, CreateMenuPayload, ListUserMenusPayload, menu_data,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::models::*;

use super::{AppState, extract_user_id, parse_json, rfc3339, verify_menu_access};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/templates", get(list_templates))
        .route("/menus", post(create_menu).get(list_menus))
        .route("/menus/from-template", post(create_menu_from_template))
        .route("/menus/{id}", get(get_menu))
}

fn menu_data_to_proto(request: CreateMenuRequest) -> pb::MenuData {
    let data = match request {
        CreateMenuRequest::Template(t) => menu_data::Data::Template(pb::TemplateMenuData {
            name: t.name,
            category: t.category,
            template_id: t.template_id,
        }),
        CreateMenuRequest::Custom(c) => {
            menu_data::Data::Custom(pb::CustomMenuData { name: c.name })
        }
        CreateMenuRequest::Imported(i) => menu_data::Data::Imported(pb::ImportedMenuData {
            name: i.name,
            source: Some(pb::MenuSource {
                r#type: i.source.mime_type,
                url: i.source.url,
                original_name: i.source.original_name,
            }),
        }),
    };
    pb::MenuData { data: Some(data) }
}

fn menu_data_from_proto(data: pb::MenuData) -> Option<MenuData> {
    Some(match data.data? {
        menu_data::Data::Template(t) => MenuData::Template(TemplateMenuData {
            name: t.name,
            category: t.category,
            template_id: t.template_id,
        }),
        menu_data::Data::Custom(c) => MenuData::Custom(CustomMenuData { name: c.name }),
        menu_data::Data::Imported(i) => {
            let source = i.source.unwrap_or_default();
            MenuData::Imported(ImportedMenuData {
                name: i.name,
                source: MenuSource {
                    mime_type: source.r#type,
                    url: source.url,
                    original_name: source.original_name,
                },
            })
        }
    })
}

pub(super) fn menu_from_proto(menu: pb::Menu) -> Menu {
    Menu {
        menu_type: menu.menu_type().as_str_name().to_lowercase(),
        id: menu.id,
        user_id: menu.user_id,
        menu_data: menu.menu_data.and_then(menu_data_from_proto),
        created_at: rfc3339(menu.created_at),
        updated_at: rfc3339(menu.updated_at),
        qr_code_generated: menu.qr_code_generated,
    }
}

#[utoipa::path(
    get,
    path = "/templates",
    responses(
        (status = 200, description = "Available menu templates", body = ListMenuTemplatesResponse),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    tag = "menus"
)]
#[instrument(skip(state))]
pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<ListMenuTemplatesResponse>, ApiError> {
    let mut menu_client = state.menu_client.clone();

    let response = menu_client
        .list_menu_templates(tonic::Request::new(()))
        .await
        .map_err(ApiError::from_status)?;

    let templates = response
        .into_inner()
        .templates
        .into_iter()
        .map(|t| MenuTemplate {
            id: t.id,
            name: t.name,
            category: t.category,
            image_url: t.image_url,
        })
        .collect();

    Ok(Json(ListMenuTemplatesResponse { templates }))
}

#[utoipa::path(
    post,
    path = "/menus",
    request_body = CreateMenuRequest,
    responses(
        (status = 200, description = "Menu created successfully", body = Menu),
        (status = 400, description = "Invalid menu", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = []),
    ),
    tag = "menus"
)]
#[instrument(skip(state, headers, body))]
pub async fn create_menu(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Menu>, ApiError> {
    let user_id = extract_user_id(&headers, &state.decoding_key)?;
    let payload: CreateMenuRequest = parse_json(&body)?;
    let mut menu_client = state.menu_client.clone();

    let request = tonic::Request::new(CreateMenuPayload {
        user_id,
        menu_data: Some(menu_data_to_proto(payload)),
    });

    let response = menu_client
        .create_menu(request)
        .await
        .map_err(ApiError::from_status)?;

    Ok(Json(menu_from_proto(response.into_inner())))
}

#[utoipa::path(
    post,
    path = "/menus/from-template",
    request_body = CreateMenuFromTemplateRequest,
    responses(
        (status = 200, description = "Menu created from template", body = Menu),
        (status = 400, description = "Unknown template", body = ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = []),
    ),
    tag = "menus"
)]
#[instrument(skip(state, headers, body))]
pub async fn create_menu_from_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Menu>, ApiError> {
    let user_id = extract_user_id(&headers, &state.decoding_key)?;
    let payload: CreateMenuFromTemplateRequest = parse_json(&body)?;
    let mut menu_client = state.menu_client.clone();

    let request = tonic::Request::new(CreateMenuFromTemplatePayload {
        user_id,
        template_id: payload.template_id,
    });

    let response = menu_client
        .create_menu_from_template(request)
        .await
        .map_err(ApiError::from_status)?;

    Ok(Json(menu_from_proto(response.into_inner())))
}

#[utoipa::path(
    get,
    path = "/menus",
    responses(
        (status = 200, description = "Menus of the caller, newest first", body = ListMenusResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 503, description = "Service unavailable", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = []),
    ),
    tag = "menus"
)]
#[instrument(skip(state, headers))]
pub async fn list_menus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListMenusResponse>, ApiError> {
    let user_id = extract_user_id(&headers, &state.decoding_key)?;
    let mut menu_client = state.menu_client.clone();

    let response = menu_client
        .list_user_menus(tonic::Request::new(ListUserMenusPayload { user_id }))
        .await
        .map_err(ApiError::from_status)?;

    let menus = response
        .into_inner()
        .menus
        .into_iter()
        .map(menu_from_proto)
        .collect();

    Ok(Json(ListMenusResponse { menus }))
}

#[utoipa::path(
    get,
    path = "/menus/{id}",
    responses(
        (status = 200, description = "Menu details", body = Menu),
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
    tag = "menus"
)]
#[instrument(skip(state, headers))]
pub async fn get_menu(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(menu_id): Path<String>,
) -> Result<Json<Menu>, ApiError> {
    let user_id = extract_user_id(&headers, &state.decoding_key)?;
    let mut menu_client = state.menu_client.clone();

    let menu = verify_menu_access(&mut menu_client, &user_id, &menu_id).await?;

    Ok(Json(menu_from_proto(menu)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::super::tests::{json_body, send, test_app};

    #[tokio::test]
    async fn test_list_templates_without_token() {
        let app = test_app().await;

        let response = send(&app, "GET", "/templates", None, None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["templates"].as_array().unwrap().len(), 6);
        assert_eq!(body["templates"][0]["name"], "Modern Bistro");
    }

    #[tokio::test]
    async fn test_create_and_list_menus() {
        let app = test_app().await;

        let response = send(
            &app,
            "POST",
            "/menus",
            Some("u1"),
            Some(json!({"menu_type": "custom", "menu_data": {"name": "Lunch"}})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let created = json_body(response).await;
        assert_eq!(created["menu_type"], "custom");
        assert_eq!(created["menu_data"]["name"], "Lunch");
        assert_eq!(created["user_id"], "u1");
        assert_eq!(created["qr_code_generated"], false);

        let response = send(&app, "GET", "/menus", Some("u1"), None).await;
        let listed = json_body(response).await;
        assert_eq!(listed["menus"].as_array().unwrap().len(), 1);
        assert_eq!(listed["menus"][0]["id"], created["id"]);

        let response = send(&app, "GET", "/menus", Some("u2"), None).await;
        assert!(json_body(response).await["menus"]
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_create_menu_from_template() {
        let app = test_app().await;

        let response = send(
            &app,
            "POST",
            "/menus/from-template",
            Some("u1"),
            Some(json!({"template_id": 2})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let created = json_body(response).await;
        assert_eq!(created["menu_type"], "template");
        assert_eq!(created["menu_data"]["template_id"], 2);

        let response = send(
            &app,
            "POST",
            "/menus/from-template",
            Some("u1"),
            Some(json!({"template_id": 99})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_bad_request() {
        let app = test_app().await;

        for (uri, body) in [
            ("/menus", json!({"menu_type": "custom"})),
            ("/menus", json!({"menu_type": "drawing", "menu_data": {"name": "Sketch"}})),
            ("/menus/from-template", json!({"template": "two"})),
        ] {
            let response = send(&app, "POST", uri, Some("u1"), Some(body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let error = json_body(response).await;
            assert!(
                error["error"]
                    .as_str()
                    .unwrap()
                    .starts_with("Invalid request body"),
                "{error}"
            );
        }

        let response = send(&app, "POST", "/menus", Some("u1"), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unsupported_import_is_bad_request() {
        let app = test_app().await;

        let response = send(
            &app,
            "POST",
            "/menus",
            Some("u1"),
            Some(json!({
                "menu_type": "imported",
                "menu_data": {
                    "name": "menu.html",
                    "source": {
                        "type": "text/html",
                        "url": "https://files.example.com/menu.html",
                        "originalName": "menu.html"
                    }
                }
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_menu_checks_ownership() {
        let app = test_app().await;
        let response = send(
            &app,
            "POST",
            "/menus",
            Some("u1"),
            Some(json!({"menu_type": "custom", "menu_data": {"name": "Lunch"}})),
        )
        .await;
        let id = json_body(response).await["id"].as_str().unwrap().to_string();

        let own = send(&app, "GET", &format!("/menus/{id}"), Some("u1"), None).await;
        assert_eq!(own.status(), StatusCode::OK);

        let other = send(&app, "GET", &format!("/menus/{id}"), Some("u2"), None).await;
        assert_eq!(other.status(), StatusCode::FORBIDDEN);

        let unknown = send(
            &app,
            "GET",
            &format!("/menus/{}", uuid::Uuid::new_v4()),
            Some("u1"),
            None,
        )
        .await;
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let malformed = send(&app, "GET", "/menus/not-a-uuid", Some("u1"), None).await;
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    }
}

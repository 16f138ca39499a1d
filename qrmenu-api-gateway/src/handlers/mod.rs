pub mod dashboard;
pub mod menu;
pub mod qr_code;

use std::path::PathBuf;

use axum::{Router, body::Bytes, http::HeaderMap};
use jsonwebtoken::{DecodingKey, Validation};
use prost_types::Timestamp;
use qrmenu_proto::menu_service::{self as pb, GetMenuPayload, menu_service_client::MenuServiceClient};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tonic::transport::Channel;
use tower_http::{cors::CorsLayer, services::ServeDir};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub menu_client: MenuServiceClient<Channel>,
    pub decoding_key: DecodingKey,
    pub public_menu_base_url: String,
    pub local_files: Option<LocalFiles>,
}

/// Bucket of the local object storage backend exposed at `/files/{bucket}`.
#[derive(Clone, Debug)]
pub struct LocalFiles {
    pub root: PathBuf,
    pub bucket: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(menu::router())
        .merge(qr_code::router())
        .merge(dashboard::router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    if let Some(files) = &state.local_files {
        router = router.nest_service(
            &format!("/files/{}", files.bucket),
            ServeDir::new(files.root.join(&files.bucket)),
        );
    }
    router.with_state(state).layer(CorsLayer::permissive())
}

fn extract_user_id(headers: &HeaderMap, decoding_key: &DecodingKey) -> Result<String, ApiError> {
    let auth_header = headers
        .get("authorization")
        .ok_or(ApiError::AuthenticationFailed)?
        .to_str()
        .map_err(|_| ApiError::InvalidToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::InvalidToken)?;

    let mut validation = Validation::default();
    validation.validate_aud = false;
    let token = jsonwebtoken::decode::<Claims>(token, decoding_key, &validation)
        .map_err(|_| ApiError::InvalidToken)?;

    if token.claims.sub.is_empty() {
        return Err(ApiError::InvalidToken);
    }
    Ok(token.claims.sub)
}

/// Loads the menu and checks it belongs to the caller.
async fn verify_menu_access(
    menu_client: &mut MenuServiceClient<Channel>,
    user_id: &str,
    menu_id: &str,
) -> Result<pb::Menu, ApiError> {
    let request = tonic::Request::new(GetMenuPayload {
        menu_id: menu_id.to_string(),
    });
    let menu = menu_client
        .get_menu(request)
        .await
        .map_err(ApiError::from_status)?
        .into_inner();

    if menu.user_id == user_id {
        Ok(menu)
    } else {
        Err(ApiError::Forbidden)
    }
}

fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))
}

fn rfc3339(ts: Option<Timestamp>) -> Option<String> {
    let ts = ts?;
    let nanos = u32::try_from(ts.nanos).ok()?;
    chrono::DateTime::from_timestamp(ts.seconds, nanos).map(|at| at.to_rfc3339())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        menu::list_templates,
        menu::create_menu,
        menu::create_menu_from_template,
        menu::list_menus,
        menu::get_menu,
        qr_code::generate_qr_code,
        qr_code::get_qr_code,
        qr_code::list_qr_codes,
        dashboard::get_dashboard,
    ),
    components(
        schemas(
            crate::models::CreateMenuRequest,
            crate::models::CreateMenuFromTemplateRequest,
            crate::models::TemplateMenuData,
            crate::models::CustomMenuData,
            crate::models::ImportedMenuData,
            crate::models::MenuSource,
            crate::models::MenuData,
            crate::models::Menu,
            crate::models::ListMenusResponse,
            crate::models::MenuTemplate,
            crate::models::ListMenuTemplatesResponse,
            crate::models::GenerateQrCodeRequest,
            crate::models::GenerateQrCodeResponse,
            crate::models::QrCodeStatusResponse,
            crate::models::QrCode,
            crate::models::ListQrCodesResponse,
            crate::models::DashboardStatsResponse,
            crate::models::ApiErrorResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "menus", description = "Menu management endpoints"),
        (name = "qr-codes", description = "QR code publication endpoints"),
        (name = "dashboard", description = "Usage statistics endpoints")
    ),
    info(
        title = "QR Menu API Gateway",
        description = "API Gateway for the QR menu service",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::*;
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode};
    use jsonwebtoken::{EncodingKey, Header};
    use qrmenu_menu_service::service::MenuServiceImpl;
    use qrmenu_menu_service::storage::LocalStorage;
    use qrmenu_menu_service::store::MemoryStore;
    use qrmenu_proto::menu_service::menu_service_server::MenuServiceServer;
    use serde_json::Value;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::transport::Server;
    use tower::ServiceExt;

    use super::*;

    const SECRET: &[u8] = b"test-secret";

    pub async fn test_app() -> Router {
        let root = std::env::temp_dir().join(format!("qrmenu-gateway-{}", uuid::Uuid::new_v4()));
        let service = MenuServiceImpl::new(
            MemoryStore::default(),
            LocalStorage::new(root.clone(), "menu-files", "https://cdn.example.com/files"),
            Duration::from_secs(5),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(
            Server::builder()
                .add_service(MenuServiceServer::new(service))
                .serve_with_incoming(TcpListenerStream::new(listener)),
        );

        let menu_client = MenuServiceClient::connect(format!("http://{addr}"))
            .await
            .unwrap();
        app(AppState {
            menu_client,
            decoding_key: DecodingKey::from_secret(SECRET),
            public_menu_base_url: "https://qrmenu.example.com".to_string(),
            local_files: Some(LocalFiles {
                root,
                bucket: "menu-files".to_string(),
            }),
        })
    }

    pub fn token_for(user_id: &str) -> String {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET))
            .unwrap()
    }

    pub async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            builder = builder.header("authorization", format!("Bearer {}", token_for(user_id)));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    pub async fn json_body(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_extract_user_id() {
        let key = DecodingKey::from_secret(SECRET);
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            format!("Bearer {}", token_for("u1")).parse().unwrap(),
        );

        assert_eq!(extract_user_id(&headers, &key).unwrap(), "u1");
    }

    #[test]
    fn test_extract_user_id_rejects_bad_tokens() {
        let key = DecodingKey::from_secret(SECRET);

        assert!(matches!(
            extract_user_id(&HeaderMap::new(), &key),
            Err(ApiError::AuthenticationFailed)
        ));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Basic dTE6cGFzcw==".parse().unwrap());
        assert!(matches!(
            extract_user_id(&headers, &key),
            Err(ApiError::InvalidToken)
        ));

        let forged = jsonwebtoken::encode(
            &Header::default(),
            &Claims {
                sub: "u1".to_string(),
                exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
            },
            &EncodingKey::from_secret(b"another-secret"),
        )
        .unwrap();
        headers.insert("authorization", format!("Bearer {forged}").parse().unwrap());
        assert!(matches!(
            extract_user_id(&headers, &key),
            Err(ApiError::InvalidToken)
        ));
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(rfc3339(None), None);
        assert_eq!(
            rfc3339(Some(Timestamp {
                seconds: 0,
                nanos: -1
            })),
            None
        );
        assert_eq!(
            rfc3339(Some(Timestamp {
                seconds: 1_700_000_000,
                nanos: 0
            }))
            .as_deref(),
            Some("2023-11-14T22:13:20+00:00")
        );
    }

    #[tokio::test]
    async fn test_requests_without_token_are_unauthorized() {
        let app = test_app().await;

        let response = send(&app, "GET", "/menus", None, None).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Authentication failed");
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let app = test_app().await;

        let response = send(&app, "GET", "/api-docs/openapi.json", None, None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = json_body(response).await;
        assert!(document["paths"]["/menus/{id}/qr-code"].is_object());
    }
}

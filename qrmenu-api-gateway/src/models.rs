use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplateMenuData {
    pub name: String,
    pub category: String,
    pub template_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustomMenuData {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MenuSource {
    /// MIME type of the uploaded file
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Location of the uploaded file
    pub url: String,
    #[serde(rename = "originalName")]
    pub original_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImportedMenuData {
    pub name: String,
    pub source: MenuSource,
}

/// Menu payload tagged by its kind, e.g.
/// `{"menu_type": "custom", "menu_data": {"name": "Lunch"}}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "menu_type", content = "menu_data", rename_all = "lowercase")]
pub enum CreateMenuRequest {
    Template(TemplateMenuData),
    Custom(CustomMenuData),
    Imported(ImportedMenuData),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMenuFromTemplateRequest {
    pub template_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum MenuData {
    Template(TemplateMenuData),
    Imported(ImportedMenuData),
    Custom(CustomMenuData),
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Menu {
    pub id: String,
    pub user_id: String,
    /// One of `template`, `custom`, `imported`
    pub menu_type: String,
    pub menu_data: Option<MenuData>,
    /// ISO 8601 timestamp when the menu was created
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub qr_code_generated: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListMenusResponse {
    pub menus: Vec<Menu>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MenuTemplate {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub image_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListMenuTemplatesResponse {
    pub templates: Vec<MenuTemplate>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct GenerateQrCodeRequest {
    /// Address the QR code points at. Defaults to the public menu page.
    pub menu_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateQrCodeResponse {
    pub qr_code_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QrCodeStatusResponse {
    pub qr_code_url: Option<String>,
    /// One of `unpublished`, `published`, `recorded_unpublished`
    pub publication_status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QrCode {
    pub menu_id: String,
    pub menu_name: String,
    pub qr_code_url: String,
    pub scan_count: i32,
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListQrCodesResponse {
    pub qr_codes: Vec<QrCode>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardStatsResponse {
    pub total_menus: i64,
    pub published_menus: i64,
    pub qr_codes: i64,
    pub total_scans: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Error message
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_menu_request_is_tagged() {
        let request: CreateMenuRequest = serde_json::from_value(json!({
            "menu_type": "imported",
            "menu_data": {
                "name": "menu.pdf",
                "source": {
                    "type": "application/pdf",
                    "url": "https://files.example.com/menu.pdf",
                    "originalName": "menu.pdf"
                }
            }
        }))
        .unwrap();

        match request {
            CreateMenuRequest::Imported(imported) => {
                assert_eq!(imported.source.mime_type, "application/pdf");
                assert_eq!(imported.source.original_name, "menu.pdf");
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_unknown_menu_type_is_rejected() {
        let result = serde_json::from_value::<CreateMenuRequest>(json!({
            "menu_type": "drawing",
            "menu_data": {"name": "Sketch"}
        }));

        assert!(result.is_err());
    }
}

//! Domain types shared by the menu registry and the QR publication pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::MenuType;

/// MIME types accepted for imported menu files.
pub const ACCEPTED_IMPORT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
];

pub const UNTITLED_MENU: &str = "Untitled Menu";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TemplateMenu {
    pub name: String,
    pub category: String,
    pub template_id: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CustomMenu {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MenuSource {
    #[serde(rename = "type")]
    pub mime_type: String,
    pub url: String,
    #[serde(rename = "originalName", default)]
    pub original_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ImportedMenu {
    pub name: String,
    pub source: MenuSource,
}

/// Menu payload. The variant decides the stored `menu_type`; the JSON column
/// holds only the variant's fields.
#[derive(Clone, Debug, PartialEq)]
pub enum MenuData {
    Template(TemplateMenu),
    Custom(CustomMenu),
    Imported(ImportedMenu),
}

impl MenuData {
    pub fn menu_type(&self) -> MenuType {
        match self {
            MenuData::Template(_) => MenuType::Template,
            MenuData::Custom(_) => MenuType::Custom,
            MenuData::Imported(_) => MenuType::Imported,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MenuData::Template(t) => &t.name,
            MenuData::Custom(c) => &c.name,
            MenuData::Imported(i) => &i.name,
        }
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            MenuData::Template(t) => serde_json::to_value(t),
            MenuData::Custom(c) => serde_json::to_value(c),
            MenuData::Imported(i) => serde_json::to_value(i),
        }
    }

    pub fn from_json(menu_type: MenuType, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match menu_type {
            MenuType::Template => MenuData::Template(serde_json::from_value(value)?),
            MenuType::Custom => MenuData::Custom(serde_json::from_value(value)?),
            MenuType::Imported => MenuData::Imported(serde_json::from_value(value)?),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Menu {
    pub id: Uuid,
    pub user_id: String,
    pub data: MenuData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub qr_code_generated: bool,
}

impl Menu {
    pub fn menu_type(&self) -> MenuType {
        self.data.menu_type()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewMenu {
    pub id: Uuid,
    pub user_id: String,
    pub data: MenuData,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QrCode {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub qr_code_url: String,
    pub scan_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewQrCode {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub qr_code_url: String,
}

/// A QR code joined with the name of the menu it points at.
#[derive(Clone, Debug, PartialEq)]
pub struct QrCodeListing {
    pub menu_id: Uuid,
    pub menu_name: String,
    pub qr_code_url: String,
    pub scan_count: i32,
    pub created_at: DateTime<Utc>,
}

use std::fmt;
use std::io::Write;

use chrono::{DateTime, Utc};
use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    prelude::*,
    serialize::{self, IsNull, Output, ToSql},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::schema::{menus, qr_codes};

#[derive(FromSqlRow, AsExpression, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Debug)]
#[diesel(sql_type = crate::schema::sql_types::MenuType)]
#[serde(rename_all = "lowercase")]
pub enum MenuType {
    Template,
    Custom,
    Imported,
}

impl MenuType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuType::Template => "template",
            MenuType::Custom => "custom",
            MenuType::Imported => "imported",
        }
    }
}

impl fmt::Display for MenuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql<crate::schema::sql_types::MenuType, Pg> for MenuType {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::MenuType, Pg> for MenuType {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"template" => Ok(MenuType::Template),
            b"custom" => Ok(MenuType::Custom),
            b"imported" => Ok(MenuType::Imported),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl From<qrmenu_proto::menu_service::MenuType> for MenuType {
    fn from(t: qrmenu_proto::menu_service::MenuType) -> Self {
        match t {
            qrmenu_proto::menu_service::MenuType::Template => MenuType::Template,
            qrmenu_proto::menu_service::MenuType::Custom => MenuType::Custom,
            qrmenu_proto::menu_service::MenuType::Imported => MenuType::Imported,
        }
    }
}

impl From<MenuType> for qrmenu_proto::menu_service::MenuType {
    fn from(t: MenuType) -> Self {
        match t {
            MenuType::Template => qrmenu_proto::menu_service::MenuType::Template,
            MenuType::Custom => qrmenu_proto::menu_service::MenuType::Custom,
            MenuType::Imported => qrmenu_proto::menu_service::MenuType::Imported,
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq)]
#[diesel(table_name = menus)]
#[diesel(primary_key(menu_id))]
pub struct MenuRow {
    pub menu_id: Uuid,
    pub user_id: String,
    pub menu_type: MenuType,
    pub menu_data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub qr_code_generated: bool,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = menus)]
pub struct NewMenuRow {
    pub menu_id: Uuid,
    pub user_id: String,
    pub menu_type: MenuType,
    pub menu_data: Value,
    pub qr_code_generated: bool,
}

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq)]
#[diesel(table_name = qr_codes)]
pub struct QrCodeRow {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub qr_code_url: String,
    pub scan_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = qr_codes)]
pub struct NewQrCodeRow {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub qr_code_url: String,
    pub scan_count: i32,
}

use diesel::{insert_into, prelude::*, update};
use diesel_async::{
    async_connection_wrapper::AsyncConnectionWrapper, AsyncConnection, AsyncPgConnection,
    RunQueryDsl,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::{MenuStore, QrCodeStore, StoreError};
use crate::menu::{Menu, MenuData, NewMenu, NewQrCode, QrCode, QrCodeListing, UNTITLED_MENU};
use crate::models::{MenuRow, NewMenuRow, NewQrCodeRow, QrCodeRow};
use crate::schema::{menus, qr_codes};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

/// Postgres-backed store. Each call opens its own connection.
#[derive(Clone, Debug)]
pub struct PgStore {
    database_url: String,
}

impl PgStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    async fn connect(&self) -> Result<AsyncPgConnection, StoreError> {
        Ok(AsyncPgConnection::establish(&self.database_url).await?)
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        let conn = self.connect().await?;
        let mut async_wrapper: AsyncConnectionWrapper<AsyncPgConnection> =
            AsyncConnectionWrapper::from(conn);
        let applied = tokio::task::spawn_blocking(move || {
            async_wrapper
                .run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.len())
                .map_err(|e| StoreError::Migration(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::Migration(e.to_string()))??;
        info!(applied, "database migrations up to date");
        Ok(())
    }
}

impl TryFrom<MenuRow> for Menu {
    type Error = StoreError;

    fn try_from(row: MenuRow) -> Result<Self, Self::Error> {
        let data = MenuData::from_json(row.menu_type, row.menu_data).map_err(|e| {
            StoreError::Corrupt(format!("menu {} has invalid menu_data: {}", row.menu_id, e))
        })?;
        Ok(Menu {
            id: row.menu_id,
            user_id: row.user_id,
            data,
            created_at: row.created_at,
            updated_at: row.updated_at,
            qr_code_generated: row.qr_code_generated,
        })
    }
}

impl From<QrCodeRow> for QrCode {
    fn from(row: QrCodeRow) -> Self {
        QrCode {
            id: row.id,
            menu_id: row.menu_id,
            qr_code_url: row.qr_code_url,
            scan_count: row.scan_count,
            created_at: row.created_at,
        }
    }
}

impl MenuStore for PgStore {
    async fn insert_menu(&self, menu: NewMenu) -> Result<Menu, StoreError> {
        let row = NewMenuRow {
            menu_id: menu.id,
            user_id: menu.user_id,
            menu_type: menu.data.menu_type(),
            menu_data: menu
                .data
                .to_json()
                .map_err(|e| StoreError::Corrupt(e.to_string()))?,
            qr_code_generated: false,
        };

        let conn = &mut self.connect().await?;
        let inserted = insert_into(menus::table)
            .values(&row)
            .returning(MenuRow::as_returning())
            .get_result(conn)
            .await?;
        Menu::try_from(inserted)
    }

    async fn menus_by_user(&self, user_id: &str) -> Result<Vec<Menu>, StoreError> {
        let conn = &mut self.connect().await?;
        menus::table
            .filter(menus::user_id.eq(user_id))
            .order(menus::created_at.desc())
            .select(MenuRow::as_select())
            .load(conn)
            .await?
            .into_iter()
            .map(Menu::try_from)
            .collect()
    }

    async fn menu_by_id(&self, menu_id: Uuid) -> Result<Option<Menu>, StoreError> {
        let conn = &mut self.connect().await?;
        menus::table
            .find(menu_id)
            .select(MenuRow::as_select())
            .first(conn)
            .await
            .optional()?
            .map(Menu::try_from)
            .transpose()
    }

    async fn set_qr_code_generated(&self, menu_id: Uuid, generated: bool) -> Result<(), StoreError> {
        let conn = &mut self.connect().await?;
        let updated = update(menus::table.find(menu_id))
            .set(menus::qr_code_generated.eq(generated))
            .execute(conn)
            .await?;
        match updated {
            0 => Err(StoreError::NotFound),
            _ => Ok(()),
        }
    }
}

impl QrCodeStore for PgStore {
    async fn insert_qr_code(&self, qr_code: NewQrCode) -> Result<QrCode, StoreError> {
        let row = NewQrCodeRow {
            id: qr_code.id,
            menu_id: qr_code.menu_id,
            qr_code_url: qr_code.qr_code_url,
            scan_count: 0,
        };

        let conn = &mut self.connect().await?;
        let inserted = insert_into(qr_codes::table)
            .values(&row)
            .returning(QrCodeRow::as_returning())
            .get_result(conn)
            .await?;
        Ok(inserted.into())
    }

    async fn qr_code_by_menu(&self, menu_id: Uuid) -> Result<Option<QrCode>, StoreError> {
        let conn = &mut self.connect().await?;
        let row = qr_codes::table
            .filter(qr_codes::menu_id.eq(menu_id))
            .select(QrCodeRow::as_select())
            .first(conn)
            .await
            .optional()?;
        Ok(row.map(QrCode::from))
    }

    async fn qr_codes_by_user(&self, user_id: &str) -> Result<Vec<QrCodeListing>, StoreError> {
        let conn = &mut self.connect().await?;
        let rows = qr_codes::table
            .inner_join(menus::table)
            .filter(menus::user_id.eq(user_id))
            .order(qr_codes::created_at.desc())
            .select((QrCodeRow::as_select(), menus::menu_data))
            .load::<(QrCodeRow, Value)>(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(qr, menu_data)| QrCodeListing {
                menu_id: qr.menu_id,
                menu_name: menu_data
                    .get("name")
                    .and_then(Value::as_str)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(UNTITLED_MENU)
                    .to_string(),
                qr_code_url: qr.qr_code_url,
                scan_count: qr.scan_count,
                created_at: qr.created_at,
            })
            .collect())
    }
}

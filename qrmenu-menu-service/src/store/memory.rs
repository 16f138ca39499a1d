use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use uuid::Uuid;

use super::{MenuStore, QrCodeStore, StoreError};
use crate::menu::{Menu, NewMenu, NewQrCode, QrCode, QrCodeListing, UNTITLED_MENU};

#[derive(Default)]
struct Tables {
    menus: Vec<Menu>,
    qr_codes: Vec<QrCode>,
}

/// In-process store with the same constraints as the Postgres schema:
/// unique menu ids, one QR code per menu, QR codes must reference a menu.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MenuStore for MemoryStore {
    async fn insert_menu(&self, menu: NewMenu) -> Result<Menu, StoreError> {
        let mut tables = self.tables();
        if tables.menus.iter().any(|m| m.id == menu.id) {
            return Err(StoreError::UniqueViolation("menus_pkey".to_string()));
        }
        let now = Utc::now();
        let menu = Menu {
            id: menu.id,
            user_id: menu.user_id,
            data: menu.data,
            created_at: now,
            updated_at: now,
            qr_code_generated: false,
        };
        tables.menus.push(menu.clone());
        Ok(menu)
    }

    async fn menus_by_user(&self, user_id: &str) -> Result<Vec<Menu>, StoreError> {
        let tables = self.tables();
        // Latest insert first, so equal timestamps still come out newest first.
        let mut menus = tables
            .menus
            .iter()
            .rev()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect::<Vec<_>>();
        menus.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(menus)
    }

    async fn menu_by_id(&self, menu_id: Uuid) -> Result<Option<Menu>, StoreError> {
        Ok(self.tables().menus.iter().find(|m| m.id == menu_id).cloned())
    }

    async fn set_qr_code_generated(&self, menu_id: Uuid, generated: bool) -> Result<(), StoreError> {
        let mut tables = self.tables();
        let menu = tables
            .menus
            .iter_mut()
            .find(|m| m.id == menu_id)
            .ok_or(StoreError::NotFound)?;
        if menu.qr_code_generated != generated {
            menu.qr_code_generated = generated;
            menu.updated_at = Utc::now();
        }
        Ok(())
    }
}

impl QrCodeStore for MemoryStore {
    async fn insert_qr_code(&self, qr_code: NewQrCode) -> Result<QrCode, StoreError> {
        let mut tables = self.tables();
        if !tables.menus.iter().any(|m| m.id == qr_code.menu_id) {
            return Err(StoreError::ForeignKeyViolation(
                "qr_codes_menu_id_fkey".to_string(),
            ));
        }
        if tables.qr_codes.iter().any(|q| q.menu_id == qr_code.menu_id) {
            return Err(StoreError::UniqueViolation(
                "qr_codes_menu_id_key".to_string(),
            ));
        }
        let qr_code = QrCode {
            id: qr_code.id,
            menu_id: qr_code.menu_id,
            qr_code_url: qr_code.qr_code_url,
            scan_count: 0,
            created_at: Utc::now(),
        };
        tables.qr_codes.push(qr_code.clone());
        Ok(qr_code)
    }

    async fn qr_code_by_menu(&self, menu_id: Uuid) -> Result<Option<QrCode>, StoreError> {
        Ok(self
            .tables()
            .qr_codes
            .iter()
            .find(|q| q.menu_id == menu_id)
            .cloned())
    }

    async fn qr_codes_by_user(&self, user_id: &str) -> Result<Vec<QrCodeListing>, StoreError> {
        let tables = self.tables();
        let mut listings = tables
            .qr_codes
            .iter()
            .rev()
            .filter_map(|q| {
                let menu = tables
                    .menus
                    .iter()
                    .find(|m| m.id == q.menu_id && m.user_id == user_id)?;
                let menu_name = match menu.data.name() {
                    "" => UNTITLED_MENU.to_string(),
                    name => name.to_string(),
                };
                Some(QrCodeListing {
                    menu_id: q.menu_id,
                    menu_name,
                    qr_code_url: q.qr_code_url.clone(),
                    scan_count: q.scan_count,
                    created_at: q.created_at,
                })
            })
            .collect::<Vec<_>>();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }
}

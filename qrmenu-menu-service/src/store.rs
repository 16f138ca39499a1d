use std::future::Future;
use std::time::Duration;

use diesel::result::DatabaseErrorKind;
use thiserror::Error;
use uuid::Uuid;

use crate::menu::{Menu, NewMenu, NewQrCode, QrCode, QrCodeListing};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence of menu records.
pub trait MenuStore {
    fn insert_menu(&self, menu: NewMenu) -> impl Future<Output = Result<Menu, StoreError>> + Send;

    /// Menus owned by `user_id`, newest first.
    fn menus_by_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<Menu>, StoreError>> + Send;

    fn menu_by_id(
        &self,
        menu_id: Uuid,
    ) -> impl Future<Output = Result<Option<Menu>, StoreError>> + Send;

    fn set_qr_code_generated(
        &self,
        menu_id: Uuid,
        generated: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Persistence of QR code records. At most one row exists per menu; a second
/// insert for the same menu fails with [`StoreError::UniqueViolation`].
pub trait QrCodeStore {
    fn insert_qr_code(
        &self,
        qr_code: NewQrCode,
    ) -> impl Future<Output = Result<QrCode, StoreError>> + Send;

    fn qr_code_by_menu(
        &self,
        menu_id: Uuid,
    ) -> impl Future<Output = Result<Option<QrCode>, StoreError>> + Send;

    /// QR codes of every menu owned by `user_id`, newest first.
    fn qr_codes_by_user(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<QrCodeListing>, StoreError>> + Send;
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),
    #[error("cannot connect to database")]
    Connection(#[from] diesel::ConnectionError),
    #[error("error while executing database query")]
    Query(#[source] diesel::result::Error),
    #[error("failed to run migrations: {0}")]
    Migration(String),
    #[error("stored record is malformed: {0}")]
    Corrupt(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(_))
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => StoreError::NotFound,
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::UniqueViolation(info.message().to_string())
            }
            diesel::result::Error::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                info,
            ) => StoreError::ForeignKeyViolation(info.message().to_string()),
            other => StoreError::Query(other),
        }
    }
}

/// Runs a store call under `limit`, reporting expiry as [`StoreError::Timeout`].
pub async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_reports_timeout() {
        let result: Result<(), StoreError> = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(StoreError::Timeout(_))));
    }

    #[test]
    fn test_not_found_maps_from_diesel() {
        let error = StoreError::from(diesel::result::Error::NotFound);
        assert!(matches!(error, StoreError::NotFound));
        assert!(!error.is_unique_violation());
    }
}

//! QR publication pipeline.
//!
//! `generate_qr_code` runs four steps in order: encode the menu URL as a PNG,
//! upload it to object storage, record the `qr_codes` row, and flag the menu
//! as published. Each failure is reported with the step that produced it.
//! When a QR row already exists only the final flag update runs, so a retry
//! after a failed flag update never uploads a second image.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::menu::{Menu, NewQrCode, QrCodeListing};
use crate::renderer::{render_png, QrStyle, RenderError, MENU_QR_STYLE, PNG_CONTENT_TYPE};
use crate::storage::{ObjectStorage, StorageError, UploadOptions};
use crate::store::{bounded, MenuStore, QrCodeStore, StoreError};
use crate::DEFAULT_STEP_TIMEOUT;

pub const QR_CODE_PREFIX: &str = "qr-codes";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishStage {
    Validation,
    Storage,
    Database,
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("invalid menu url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("cannot render qr code")]
    Render(#[from] RenderError),
    #[error("menu {0} not found")]
    MenuNotFound(Uuid),
    #[error("cannot load menu")]
    LoadMenu(#[source] StoreError),
    #[error("cannot load qr code")]
    LoadQrCode(#[source] StoreError),
    #[error("cannot upload qr image {key}")]
    Storage {
        key: String,
        #[source]
        source: StorageError,
    },
    #[error("cannot record qr code")]
    RecordQrCode(#[source] StoreError),
    #[error("cannot mark menu as published")]
    MarkPublished(#[source] StoreError),
}

impl PublishError {
    pub fn stage(&self) -> PublishStage {
        match self {
            PublishError::InvalidUrl { .. }
            | PublishError::Render(_)
            | PublishError::MenuNotFound(_) => PublishStage::Validation,
            PublishError::Storage { .. } => PublishStage::Storage,
            PublishError::LoadMenu(_)
            | PublishError::LoadQrCode(_)
            | PublishError::RecordQrCode(_)
            | PublishError::MarkPublished(_) => PublishStage::Database,
        }
    }

    /// The store failure behind a database-stage error.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            PublishError::LoadMenu(e)
            | PublishError::LoadQrCode(e)
            | PublishError::RecordQrCode(e)
            | PublishError::MarkPublished(e) => Some(e),
            _ => None,
        }
    }
}

/// Publication state of a menu as seen from both tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublicationStatus {
    Unpublished,
    Published,
    /// A QR code is recorded but the menu flag was never set.
    RecordedUnpublished,
}

impl PublicationStatus {
    pub fn of(menu: &Menu, has_qr_code: bool) -> Self {
        match (has_qr_code, menu.qr_code_generated) {
            (true, true) => PublicationStatus::Published,
            (true, false) => PublicationStatus::RecordedUnpublished,
            // A flag without a row has no working code behind it.
            (false, _) => PublicationStatus::Unpublished,
        }
    }
}

impl From<PublicationStatus> for qrmenu_proto::menu_service::PublicationStatus {
    fn from(s: PublicationStatus) -> Self {
        match s {
            PublicationStatus::Unpublished => {
                qrmenu_proto::menu_service::PublicationStatus::Unpublished
            }
            PublicationStatus::Published => qrmenu_proto::menu_service::PublicationStatus::Published,
            PublicationStatus::RecordedUnpublished => {
                qrmenu_proto::menu_service::PublicationStatus::RecordedUnpublished
            }
        }
    }
}

/// `qr-codes/<menu_id>-<unix millis>.png`
pub fn object_key(menu_id: Uuid, at: DateTime<Utc>) -> String {
    format!("{}/{}-{}.png", QR_CODE_PREFIX, menu_id, at.timestamp_millis())
}

/// Accepts absolute http(s) URLs with a host.
pub fn validate_menu_url(menu_url: &str) -> Result<(), PublishError> {
    let invalid = |reason: &str| PublishError::InvalidUrl {
        url: menu_url.to_string(),
        reason: reason.to_string(),
    };
    if menu_url.trim().is_empty() {
        return Err(invalid("url is empty"));
    }
    let parsed = reqwest::Url::parse(menu_url).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("url has no host"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct QrPublisher<S, O> {
    store: S,
    storage: O,
    style: QrStyle,
    step_timeout: Duration,
}

impl<S, O> QrPublisher<S, O>
where
    S: MenuStore + QrCodeStore + Sync,
    O: ObjectStorage + Sync,
{
    pub fn new(store: S, storage: O) -> Self {
        Self {
            store,
            storage,
            style: MENU_QR_STYLE,
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    /// Publishes a QR code for `menu_id` pointing at `menu_url` and returns
    /// the public image URL recorded for the menu.
    #[instrument(skip(self))]
    pub async fn generate_qr_code(
        &self,
        menu_id: Uuid,
        menu_url: &str,
    ) -> Result<String, PublishError> {
        validate_menu_url(menu_url)?;

        let menu = self.load_menu(menu_id).await?;
        if let Some(existing) = self.qr_code(menu_id).await? {
            if !menu.qr_code_generated {
                info!("qr code already recorded, repairing published flag");
                self.mark_published(menu_id).await?;
            }
            return Ok(existing);
        }

        let png = render_png(menu_url, &self.style)?;
        let key = object_key(menu_id, Utc::now());
        let public_url = self.persist(&key, png).await?;
        let qr_code_url = self.record(menu_id, &key, public_url).await?;
        self.mark_published(menu_id).await?;

        info!(%qr_code_url, "qr code published");
        Ok(qr_code_url)
    }

    /// Public URL of the menu's QR code, `None` when none was generated yet.
    pub async fn get_qr_code(&self, menu_id: Uuid) -> Result<Option<String>, PublishError> {
        self.qr_code(menu_id).await
    }

    pub async fn publication_status(
        &self,
        menu_id: Uuid,
    ) -> Result<PublicationStatus, PublishError> {
        let (_, status) = self.qr_code_with_status(menu_id).await?;
        Ok(status)
    }

    /// QR code URL and publication status built from a single read of the
    /// menu and a single read of its QR row.
    pub async fn qr_code_with_status(
        &self,
        menu_id: Uuid,
    ) -> Result<(Option<String>, PublicationStatus), PublishError> {
        let menu = self.load_menu(menu_id).await?;
        let qr_code_url = self.qr_code(menu_id).await?;
        let status = PublicationStatus::of(&menu, qr_code_url.is_some());
        Ok((qr_code_url, status))
    }

    /// Sets the published flag of a menu whose QR code is already recorded.
    /// Never renders or uploads.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, menu_id: Uuid) -> Result<PublicationStatus, PublishError> {
        match self.publication_status(menu_id).await? {
            PublicationStatus::RecordedUnpublished => {
                self.mark_published(menu_id).await?;
                info!("published flag repaired");
                Ok(PublicationStatus::Published)
            }
            status => Ok(status),
        }
    }

    pub async fn list_qr_codes_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<QrCodeListing>, PublishError> {
        bounded(self.step_timeout, self.store.qr_codes_by_user(user_id))
            .await
            .map_err(PublishError::LoadQrCode)
    }

    async fn load_menu(&self, menu_id: Uuid) -> Result<Menu, PublishError> {
        bounded(self.step_timeout, self.store.menu_by_id(menu_id))
            .await
            .map_err(PublishError::LoadMenu)?
            .ok_or(PublishError::MenuNotFound(menu_id))
    }

    async fn qr_code(&self, menu_id: Uuid) -> Result<Option<String>, PublishError> {
        let qr_code = bounded(self.step_timeout, self.store.qr_code_by_menu(menu_id))
            .await
            .map_err(PublishError::LoadQrCode)?;
        Ok(qr_code.map(|q| q.qr_code_url))
    }

    async fn persist(&self, key: &str, png: Vec<u8>) -> Result<String, PublishError> {
        let upload = self.storage.upload(
            key,
            png,
            UploadOptions {
                content_type: PNG_CONTENT_TYPE,
                upsert: true,
            },
        );
        let result = match tokio::time::timeout(self.step_timeout, upload).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(self.step_timeout)),
        };
        result.map_err(|source| PublishError::Storage {
            key: key.to_string(),
            source,
        })?;
        Ok(self.storage.public_url(key))
    }

    async fn record(
        &self,
        menu_id: Uuid,
        key: &str,
        public_url: String,
    ) -> Result<String, PublishError> {
        let insert = self.store.insert_qr_code(NewQrCode {
            id: Uuid::new_v4(),
            menu_id,
            qr_code_url: public_url.clone(),
        });
        match bounded(self.step_timeout, insert).await {
            Ok(qr_code) => Ok(qr_code.qr_code_url),
            Err(e) if e.is_unique_violation() => {
                debug!("qr code recorded concurrently, keeping existing row");
                warn!(key, "orphaned qr image left in storage");
                Ok(self.qr_code(menu_id).await?.unwrap_or(public_url))
            }
            Err(e) => {
                warn!(key, error = %e, "orphaned qr image left in storage");
                Err(PublishError::RecordQrCode(e))
            }
        }
    }

    async fn mark_published(&self, menu_id: Uuid) -> Result<(), PublishError> {
        bounded(
            self.step_timeout,
            self.store.set_qr_code_generated(menu_id, true),
        )
        .await
        .map_err(PublishError::MarkPublished)
    }
}

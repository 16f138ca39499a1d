use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;
use serde::Deserialize;
use thiserror::Error;

use crate::storage::{AnyStorage, LocalStorage, SupabaseStorage};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration from environment")]
    Env(#[from] envy::Error),
    #[error("{0} must be set")]
    Missing(&'static str),
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    Supabase,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub database_url: Option<String>,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub storage_backend: StorageBackend,
    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    #[serde(default = "default_local_storage_root")]
    pub local_storage_root: PathBuf,
    #[serde(default = "default_local_public_base_url")]
    pub local_public_base_url: String,
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8101".to_string()
}

fn default_storage_bucket() -> String {
    "menu-files".to_string()
}

fn default_local_storage_root() -> PathBuf {
    PathBuf::from("./storage")
}

fn default_local_public_base_url() -> String {
    "http://localhost:8100/files".to_string()
}

fn default_step_timeout_secs() -> u64 {
    10
}

impl Settings {
    /// Reads settings from the process environment, after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Ok(envy::from_env::<Settings>()?)
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    pub fn object_storage(&self) -> Result<AnyStorage, ConfigError> {
        Ok(match self.storage_backend {
            StorageBackend::Local => AnyStorage::Local(LocalStorage::new(
                self.local_storage_root.clone(),
                self.storage_bucket.clone(),
                self.local_public_base_url.clone(),
            )),
            StorageBackend::Supabase => AnyStorage::Supabase(SupabaseStorage::new(
                self.supabase_url
                    .clone()
                    .ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                self.storage_bucket.clone(),
                self.supabase_service_key
                    .clone()
                    .ok_or(ConfigError::Missing("SUPABASE_SERVICE_KEY"))?,
            )),
        })
    }
}

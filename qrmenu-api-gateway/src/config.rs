use std::path::PathBuf;

use dotenvy::dotenv;
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct GatewayConfig {
    pub menu_service_endpoint: String,
    /// HS256 secret shared with the identity provider that issues user tokens.
    pub secret_key: String,
    pub public_menu_base_url: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Root of the menu service's local object storage, served under `/files`.
    pub local_storage_root: Option<PathBuf>,
    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8100".to_string()
}

fn default_storage_bucket() -> String {
    "menu-files".to_string()
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv().ok();
        envy::from_env::<GatewayConfig>()
    }
}

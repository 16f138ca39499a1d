use jsonwebtoken::DecodingKey;
use qrmenu_proto::menu_service::menu_service_client::MenuServiceClient;
use tracing::info;

mod config;
mod error;
mod handlers;
mod models;

use config::GatewayConfig;
use handlers::{AppState, LocalFiles, app};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env()?;
    let menu_client = MenuServiceClient::connect(config.menu_service_endpoint.clone()).await?;

    let state = AppState {
        menu_client,
        decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
        public_menu_base_url: config.public_menu_base_url.clone(),
        local_files: config.local_storage_root.clone().map(|root| LocalFiles {
            root,
            bucket: config.storage_bucket.clone(),
        }),
    };

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("API Gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state)).await?;

    Ok(())
}

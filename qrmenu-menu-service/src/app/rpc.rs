use std::net::SocketAddr;
use std::time::Duration;

use qrmenu_menu_service::config::Settings;
use qrmenu_menu_service::service::MenuServiceImpl;
use qrmenu_menu_service::storage::ObjectStorage;
use qrmenu_menu_service::store::{MemoryStore, MenuStore, PgStore, QrCodeStore};
use qrmenu_proto::menu_service::menu_service_server::MenuServiceServer;
use tonic::transport::Server;
use tracing::{info, warn};

pub async fn main(memory: bool) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    let storage = settings.object_storage()?;
    let addr: SocketAddr = settings.listen_addr.parse()?;

    if memory {
        warn!("using in-memory store, menus are lost on exit");
        serve(MemoryStore::default(), storage, settings.step_timeout(), addr).await
    } else {
        let store = PgStore::new(settings.database_url()?);
        store.run_migrations().await?;
        serve(store, storage, settings.step_timeout(), addr).await
    }
}

async fn serve<S, O>(
    store: S,
    storage: O,
    step_timeout: Duration,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>>
where
    S: MenuStore + QrCodeStore + Clone + Send + Sync + 'static,
    O: ObjectStorage + Send + Sync + 'static,
{
    let menu_service = MenuServiceImpl::new(store, storage, step_timeout);

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<MenuServiceServer<MenuServiceImpl<S, O>>>()
        .await;

    info!("listening on {}", addr);

    Server::builder()
        .add_service(health_service)
        .add_service(MenuServiceServer::new(menu_service))
        .serve(addr)
        .await?;

    Ok(())
}

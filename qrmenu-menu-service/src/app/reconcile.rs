use qrmenu_menu_service::config::Settings;
use qrmenu_menu_service::publication::QrPublisher;
use qrmenu_menu_service::store::PgStore;
use tracing::info;
use uuid::Uuid;

pub async fn main(menu_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    let publisher = QrPublisher::new(
        PgStore::new(settings.database_url()?),
        settings.object_storage()?,
    )
    .with_step_timeout(settings.step_timeout());

    let status = publisher.reconcile(menu_id).await?;
    info!(%menu_id, ?status, "reconciled");
    Ok(())
}

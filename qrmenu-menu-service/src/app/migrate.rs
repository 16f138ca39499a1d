use qrmenu_menu_service::config::Settings;
use qrmenu_menu_service::store::PgStore;

pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    PgStore::new(settings.database_url()?)
        .run_migrations()
        .await?;
    Ok(())
}

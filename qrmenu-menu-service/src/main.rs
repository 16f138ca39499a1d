use clap::{Parser, Subcommand};

pub mod app;

#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the menu gRPC API.
    RPC {
        /// Keep menus in memory instead of Postgres.
        #[arg(long)]
        memory: bool,
    },
    /// Apply pending database migrations and exit.
    Migrate,
    /// Set the published flag of a menu whose QR code is already recorded.
    Reconcile {
        menu_id: uuid::Uuid,
    },
}

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::RPC { memory } => app::rpc::main(*memory).await,
        Commands::Migrate => app::migrate::main().await,
        Commands::Reconcile { menu_id } => app::reconcile::main(*menu_id).await,
    }
}

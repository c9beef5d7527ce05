use clap::{Parser, Subcommand};
use comfy_table::Table;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// The main entry point for the clinic backend.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from the .env file, if present.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();
    let config = configuration::load_config()?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve => {
            let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
            web_server::run_server(addr, &config).await
        }
        Commands::DbCheck => handle_db_check(&config).await,
    }
}

/// The clinic management backend: REST API plus operational checks.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server.
    Serve,
    /// Probe database connectivity and report per-table row counts.
    DbCheck,
}

/// Connects with the configured settings and prints how many rows each
/// table holds. The connect step itself already logs the full target
/// (host, user, database, port) if it fails.
async fn handle_db_check(config: &configuration::Config) -> anyhow::Result<()> {
    let pool = database::connect(&config.database).await?;
    database::run_migrations(&pool).await?;

    let repo = database::ClinicRepository::new(pool.clone());
    let counts = repo.table_counts().await?;

    let mut table = Table::new();
    table.set_header(vec!["table", "rows"]);
    for (name, count) in &counts {
        table.add_row(vec![name.clone(), count.to_string()]);
    }
    println!("{table}");

    database::close(&pool).await;
    Ok(())
}

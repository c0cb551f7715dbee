use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use vicinity_config::load as load_config;
use vicinity_database::{GeoPoint, UserRepository};
use vicinity_gateway::{create_router, GatewayState};
use vicinity_runtime::{telemetry, BackendServices};

#[derive(Parser)]
#[command(name = "vicinity-server")]
#[command(about = "Vicinity proximity-chat backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP and WebSocket server (default)
    Serve,
    /// Seed the database with demo users for manual testing
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::Seed => seed_data().await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Vicinity backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let state = GatewayState::new(services.db_pool.clone(), config.discovery.clone());
    let app = create_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(vicinity_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn seed_data() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let users = UserRepository::new(services.db_pool.clone());

    // A small cluster around Berlin plus one user with no location, so
    // discovery exercises both the ranked and fallback paths.
    let seeded = [
        ("mitte", Some(GeoPoint::new(13.4050, 52.5200))),
        ("kreuzberg", Some(GeoPoint::new(13.4034, 52.4996))),
        ("spandau", Some(GeoPoint::new(13.2041, 52.5344))),
        ("wanderer", None),
    ];

    for (username, location) in seeded {
        users
            .register(username)
            .await
            .with_context(|| format!("failed to seed user {username}"))?;
        if let Some(location) = location {
            users
                .set_location(username, location)
                .await
                .with_context(|| format!("failed to set location for {username}"))?;
        }
        info!(username, "seeded user");
    }

    info!("seed complete");
    Ok(())
}

use std::sync::Arc;

use dashboard::{config::ServerConfig, create_router, run_server};
use seeder::db::{PgStore, Seeder};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let config = ServerConfig::from_env();

    // Connections are opened per seed request, so an unreachable database
    // surfaces as a failed request instead of a failed startup.
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_lazy(&config.database_url)?;

    let data = config.load_seed_data()?;
    tracing::info!(
        "Loaded seed data: {} users, {} customers, {} invoices, {} revenue rows",
        data.users.len(),
        data.customers.len(),
        data.invoices.len(),
        data.revenue.len()
    );

    let seeder = Seeder::new(PgStore::new(pool), config.seed.clone());

    run_server(create_router(seeder, Arc::new(data)), config.port).await
}

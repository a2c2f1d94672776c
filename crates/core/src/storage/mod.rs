pub mod analysis_history;
pub mod indicators;
pub mod market_metrics;
pub mod prompts;
pub mod region_metrics;

use anyhow::Context;

/// Pool against the hosted Postgres instance. The schema is managed outside this workspace.
pub async fn connect(database_url: &str) -> anyhow::Result<sqlx::PgPool> {
    let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(5);

    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("connect DATABASE_URL failed")
}

//! Admin server: prepares the database and serves the CRUD surface.
//!
//! Run from repo root: `cargo run -p admin-server`

use retail_admin::{app, ensure_database_exists, ensure_tables, AppState, ServerSettings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = ServerSettings::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("retail_admin=info,admin_server=info")),
        )
        .init();

    ensure_database_exists(&settings.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;
    ensure_tables(&pool, &settings.db_schema).await?;

    let state = AppState::new(pool, &settings.db_schema);
    let router = app(state, settings.max_body_bytes);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}

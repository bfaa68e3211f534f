//! Server bootstrap: env config, tracing, pool, DDL, listen.

use rollbook::{app, AppState, Database};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rollbook=info".parse()?))
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://rollbook.db".into());
    let db = Database::connect(&database_url).await?;
    db.apply_schema().await?;

    let state = AppState { db };
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "rollbook listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

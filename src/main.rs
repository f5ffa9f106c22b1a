use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use bookstack::auth::TokenVerifier;
use bookstack::config::Config;
use bookstack::db::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookstack=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env();

    let pool = db::init_pool(&config.database_path)
        .with_context(|| format!("opening database at {}", config.database_path))?;
    let conn = pool.get()?;
    db::init_schema(&conn)?;

    let verifier = TokenVerifier::from_config(&config)?;

    let state = AppState {
        db: pool,
        verifier: Arc::new(verifier),
        auth_strategy: config.auth_strategy,
        mutation_policy: config.mutation_policy,
        auth0: config.auth0.clone(),
        base_url: config.base_url.clone(),
    };

    let app = bookstack::router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

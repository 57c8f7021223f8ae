use anyhow::Context;

mod app;
mod auth;
mod avatars;
mod config;
mod contacts;
mod error;
mod mail;
mod response;
mod state;
mod storage;
mod validation;

#[cfg(test)]
mod testing;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "contactbook=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    for dir in [&config.avatars.tmp_dir, &config.avatars.public_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("create {}", dir.display()))?;
    }
    let addr = config.bind_addr();

    let (app_state, db) = AppState::init(config).await?;
    tracing::info!("database connection successful");

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    app::serve(app::build_app(app_state), &addr).await?;

    db.close().await;
    tracing::info!("database disconnected");
    Ok(())
}

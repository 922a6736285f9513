mod bootstrap;
mod health;
mod interactions;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use hookline_core::config::{AppConfig, LoadOptions};
use hookline_discord::InteractionPipeline;
use tokio::sync::Notify;

fn init_logging(config: &AppConfig) {
    use hookline_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub fn app_router(pipeline: Arc<InteractionPipeline>, application_id: Option<String>) -> Router {
    interactions::router(Arc::clone(&pipeline)).merge(health::router(pipeline, application_id))
}

pub async fn run() -> Result<()> {
    // Logging needs the loaded config, so bootstrap reuses it instead of loading again.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("could not bind interactions listener on {address}"))?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        interactions_path = interactions::INTERACTIONS_PATH,
        health_path = health::HEALTH_PATH,
        "hookline-server listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server_shutdown = Arc::clone(&shutdown);
    let router =
        app_router(Arc::clone(&app.pipeline), app.config.discord.application_id.clone());
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { server_shutdown.notified().await })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result.context("interactions server task panicked")??;
            return Ok(());
        }
        signal = wait_for_shutdown() => signal?,
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_period_secs = app.config.server.graceful_shutdown_secs,
        "hookline-server stopping"
    );
    shutdown.notify_one();

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined.context("interactions server task panicked")??,
        Err(_) => tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            "in-flight requests did not drain before the grace period elapsed"
        ),
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use hookline_core::config::AppConfig;
    use tower::ServiceExt;

    use crate::{app_router, bootstrap::bootstrap_with_config, health::HEALTH_PATH};

    #[tokio::test]
    async fn app_router_serves_health_and_interactions() {
        let app = bootstrap_with_config(AppConfig::default()).expect("bootstrap");
        let router = app_router(app.pipeline, Some("1234".to_string()));

        let health = router
            .clone()
            .oneshot(Request::get(HEALTH_PATH).body(Body::empty()).expect("request"))
            .await
            .expect("health response");
        assert_eq!(health.status(), StatusCode::SERVICE_UNAVAILABLE);

        let interactions = router
            .oneshot(Request::put("/interactions").body(Body::empty()).expect("request"))
            .await
            .expect("interactions response");
        assert_eq!(interactions.status(), StatusCode::BAD_REQUEST);
    }
}

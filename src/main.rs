// src/main.rs

use std::{sync::Arc, time::Duration};

use cogassess::config::Config;
use cogassess::models::question::Catalog;
use cogassess::routes;
use cogassess::services::{LogNotifier, ReminderScheduler};
use cogassess::state::AppState;
use dotenvy::dotenv;
use rand::{SeedableRng, rngs::StdRng};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // The catalog is read once and shared read-only.
    let catalog = match Catalog::load(&config.questions_path) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(
                path = %config.questions_path.display(),
                "Failed to load question catalog: {}",
                e
            );
            std::process::exit(1);
        }
    };
    tracing::info!(questions = catalog.len(), "Question catalog loaded");

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    // Create AppState
    let state = AppState::new(pool, config.clone(), catalog, StdRng::from_os_rng());

    // Background reminder task
    let scheduler = ReminderScheduler::new(
        Arc::new(state.store.clone()),
        Arc::new(LogNotifier),
        config.reminder_interval,
    );
    let _reminders = scheduler.start();

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}

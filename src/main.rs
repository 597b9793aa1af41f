// src/main.rs

use quizdesk::config::Config;
use quizdesk::repositories::PgStore;
use quizdesk::routes;
use quizdesk::services::accounts;
use quizdesk::state::AppState;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load configuration from environment (.env included)
    let config = Config::from_env().expect("Failed to load configuration");

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
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

    let state = match &config.database_url {
        Some(database_url) => {
            // Initialize Database Pool with Retry
            let mut retry_count = 0;
            let pool = loop {
                match PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                {
                    Ok(pool) => break pool,
                    Err(e) => {
                        retry_count += 1;
                        if retry_count > 5 {
                            panic!("Failed to connect to database after 5 retries: {}", e);
                        }
                        tracing::warn!(
                            "Database not ready, retrying in 2s... (Attempt {})",
                            retry_count
                        );
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

            AppState::with_postgres(PgStore::new(pool), config.clone())
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store (data is lost on exit)");
            AppState::in_memory(config.clone())
        }
    };

    // Seed Admin User
    if let Err(e) = accounts::seed_admin(state.users.as_ref(), &config).await {
        tracing::error!("Failed to seed admin user: {}", e);
    }

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}

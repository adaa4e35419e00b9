use std::net::SocketAddr;

use clap::Parser;
use demo_endpoints::{
    AppState,
    cli::Cli,
    config::{AppConfig, ConfigSources, Env, SWAGGER_UI_PATH},
    create_router, startup, tls,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Resolves configuration and the route set once, runs the startup hook, then serves.
#[tokio::main]
async fn main() {
    // 1. Configuration Sources
    // Load the .env file into the process environment (ignored if absent), then
    // layer command-line overrides on top. Nothing is resolved yet.
    dotenv::dotenv().ok();
    let sources = Cli::parse().apply(ConfigSources::from_process_env());

    // 2. Logging Initialization
    // Set up before resolution so its warnings are captured. RUST_LOG takes
    // precedence over the built-in filter; APP_ENV picks pretty or JSON output.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "demo_endpoints=debug,tower_http=info,axum=trace".into());

    match Env::resolve(&sources.clone().into_snapshot()) {
        Env::Local => {
            // Local: human-readable, multi-line output.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // Production: one JSON object per line for log aggregation.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    // 3. Configuration Resolution
    // Select the profile, apply its defaults and read every well-known key. This
    // never fails: unusable values are logged and replaced by their defaults.
    let config = AppConfig::from_sources(sources);
    tracing::info!(profile = %config.profile, "Application starting in {:?} mode", config.env);

    // 4. Route Resolution
    // Filter the catalog to the effective set and partition it into groups. The
    // resulting state is frozen for the life of the process.
    let app_state = AppState::from_config(config);
    for route in app_state.routes.iter() {
        tracing::info!(method = %route.method(), path = route.path(), "endpoint active");
    }
    for group in app_state.groups.groups() {
        tracing::info!(group = %group.name, routes = group.routes.len(), "documentation group");
    }

    // 5. Startup Hook
    // Under the slower setting this blocks before any listener exists, so the
    // port stays closed for the whole delay.
    startup::delay_if_slow(&app_state.config).await;

    let port = app_state.config.port;
    let scheme = app_state.config.scheme();
    let docs_path = app_state.config.api_docs_path.clone();
    let tls_settings = app_state.config.tls.clone();
    let app = create_router(app_state);

    tracing::info!("Listening on 0.0.0.0:{port}");
    tracing::info!("API documentation available at: {scheme}://localhost:{port}{docs_path}");
    tracing::info!("Swagger UI available at: {scheme}://localhost:{port}{SWAGGER_UI_PATH}");

    // 6. Server Startup
    // HTTPS when TLS is enabled (the `ssl` profile), plain HTTP otherwise.
    match tls_settings {
        Some(settings) => {
            let rustls = tls::load_tls_config(&settings)
                .await
                .expect("FATAL: Failed to load TLS certificate or key. Check SERVER_SSL_CERTIFICATE.");
            tls::serve_tls(app, SocketAddr::from(([0, 0, 0, 0], port)), rustls)
                .await
                .expect("FATAL: HTTPS server terminated unexpectedly.");
        }
        None => {
            let listener = TcpListener::bind(("0.0.0.0", port))
                .await
                .expect("FATAL: Failed to bind the HTTP listener. Check SERVER_PORT.");
            axum::serve(listener, app)
                .await
                .expect("FATAL: HTTP server terminated unexpectedly.");
        }
    }
}

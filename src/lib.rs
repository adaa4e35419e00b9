use std::sync::Arc;

use axum::{Router, extract::FromRef, http::HeaderName, routing::get};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Startup resolution: layered configuration, profile selection, startup hook.
pub mod cli;
pub mod config;
pub mod profile;
pub mod startup;

// HTTPS listener used under the `ssl` profile.
pub mod tls;

// Route catalog, activation and grouping.
pub mod grouping;
pub mod routes;

// Documentation export (OpenAPI JSON/YAML, Swagger UI, group listing).
pub mod docs;

// --- Public Re-exports ---

pub use config::{AppConfig, ConfigSnapshot, ConfigSources, ConfigValue};
pub use grouping::{GroupDeclaration, GroupingIndex, PathPattern};
pub use profile::Profile;
pub use routes::registry::{EffectiveRouteSet, RouteDefinition, effective_routes};

/// AppState
///
/// The single, immutable container shared across requests. Every field is resolved
/// before the listener is bound and never mutated afterwards, so handlers read it
/// without locking.
#[derive(Clone)]
pub struct AppState {
    /// The resolved startup configuration.
    pub config: AppConfig,
    /// Routes active for this process, in declaration order.
    pub routes: Arc<EffectiveRouteSet>,
    /// Documentation group membership over `routes`.
    pub groups: Arc<GroupingIndex>,
}

impl AppState {
    /// from_config
    ///
    /// Runs the startup pipeline against the built-in catalog: filter to the effective
    /// set, then partition it into documentation groups.
    pub fn from_config(config: AppConfig) -> Self {
        Self::with_catalog(
            config,
            &routes::catalog::catalog(),
            &routes::catalog::group_declarations(),
        )
    }

    /// Same as [`AppState::from_config`] over an arbitrary catalog. A documentation
    /// path that would shadow one of this catalog's routes falls back to the default.
    pub fn with_catalog(
        mut config: AppConfig,
        catalog: &[RouteDefinition],
        declarations: &[GroupDeclaration],
    ) -> Self {
        let endpoint_paths = catalog.iter().map(|route| route.path);
        if config::docs_path_conflicts(&config.api_docs_path, endpoint_paths) {
            tracing::warn!(
                path = %config.api_docs_path,
                "documentation path collides with an endpoint, using default"
            );
            config.api_docs_path = config::DEFAULT_API_DOCS_PATH.to_string();
        }

        let routes = effective_routes(catalog, &config.snapshot, config.profile);
        let groups = GroupingIndex::build(declarations, &routes, config.profile);
        Self {
            config,
            routes: Arc::new(routes),
            groups: Arc::new(groups),
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for Arc<EffectiveRouteSet> {
    fn from_ref(app_state: &AppState) -> Arc<EffectiveRouteSet> {
        app_state.routes.clone()
    }
}

impl FromRef<AppState> for docs::ServerUrlPolicy {
    fn from_ref(app_state: &AppState) -> docs::ServerUrlPolicy {
        docs::ServerUrlPolicy {
            forward_headers: app_state.config.forward_headers,
            scheme: app_state.config.scheme(),
        }
    }
}

impl FromRef<AppState> for Arc<GroupingIndex> {
    fn from_ref(app_state: &AppState) -> Arc<GroupingIndex> {
        app_state.groups.clone()
    }
}

/// docs_routes
///
/// Documentation endpoints, mounted under the configured base path
/// (`/v3/api-docs` unless overridden).
///
/// The OpenAPI documents are skipped entirely if the base path still collides with
/// an effective endpoint (only possible with a custom catalog that claims the
/// default path), so router construction can never abort startup.
fn docs_routes(state: &AppState) -> Router<AppState> {
    let base = &state.config.api_docs_path;

    // 1. Swagger UI: lists the default document first, then one entry per group.
    let urls: Vec<String> = std::iter::once(base.clone())
        .chain(
            state
                .groups
                .groups()
                .iter()
                .map(|group| format!("{base}/{}", group.name)),
        )
        .collect();

    let router = Router::new()
        // 2. Plain group membership, as consumed by the documentation tool.
        .route(config::GROUPS_EXPORT_PATH, get(docs::groups_export))
        .merge(SwaggerUi::new(config::SWAGGER_UI_PATH).config(utoipa_swagger_ui::Config::new(urls)));

    if config::docs_path_conflicts(base, state.routes.iter().map(|route| route.path())) {
        tracing::warn!(path = %base, "documentation path unavailable, OpenAPI documents not served");
        return router;
    }

    // 3. OpenAPI documents: the whole effective set and one per group, JSON and YAML.
    router
        .route(base, get(docs::api_docs))
        .route(&format!("{base}/{{group}}"), get(docs::group_api_docs))
        .route(&format!("{base}.yaml"), get(docs::api_docs_yaml))
        .route(&format!("{base}.yaml/{{group}}"), get(docs::group_api_docs_yaml))
}

/// create_router
///
/// Assembles the application's entire routing structure, applies the global
/// middleware and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    // The documentation tool and Swagger UI may run on another origin.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Endpoints: only the effective set is bound. Routes filtered out at startup
        // fall through to axum's 404, inactive profiles included.
        .merge(routes::endpoint_routes(&state.routes))
        // Documentation: OpenAPI documents, group export and Swagger UI.
        .merge(docs_routes(&state))
        // Apply the frozen state to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, carrying the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (Applied last)
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: method, URI and the request id, so every log
/// line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}

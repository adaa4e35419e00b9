//! Router Module Index
//!
//! Splits routing into the declarative side (what may exist) and the binding side
//! (what axum actually serves for this process).

/// Route definitions, activation predicates and the effective-set filter.
pub mod registry;

/// The concrete endpoints and documentation groups of the application.
pub mod catalog;

use axum::{
    Router,
    routing::{MethodFilter, MethodRouter},
};

use registry::{EffectiveRoute, EffectiveRouteSet, Method};

fn method_filter(method: Method) -> MethodFilter {
    match method {
        Method::Get => MethodFilter::GET,
        Method::Post => MethodFilter::POST,
        Method::Put => MethodFilter::PUT,
        Method::Patch => MethodFilter::PATCH,
        Method::Delete => MethodFilter::DELETE,
        Method::Head => MethodFilter::HEAD,
        Method::Options => MethodFilter::OPTIONS,
    }
}

/// endpoint_routes
///
/// Binds every effective route onto a router. Routes sharing a path are merged into
/// one `MethodRouter`, since axum rejects registering the same path twice. Anything
/// not in the effective set falls through to axum's 404.
pub fn endpoint_routes<S>(routes: &EffectiveRouteSet) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let mut by_path: Vec<(&'static str, Vec<&EffectiveRoute>)> = Vec::new();
    for route in routes {
        match by_path.iter_mut().find(|(path, _)| *path == route.path()) {
            Some((_, entries)) => entries.push(route),
            None => by_path.push((route.path(), vec![route])),
        }
    }

    by_path
        .into_iter()
        .fold(Router::new(), |router, (path, entries)| {
            let method_router = entries
                .into_iter()
                .fold(MethodRouter::new(), |method_router, route| {
                    let body = route.body().to_string();
                    method_router.on(method_filter(route.method()), move || {
                        let body = body.clone();
                        async move { body }
                    })
                });
            router.route(path, method_router)
        })
}

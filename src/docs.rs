use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::openapi::{
    ContentBuilder, InfoBuilder, OpenApi, OpenApiBuilder, Server,
    path::{HttpMethod, OperationBuilder, PathItemBuilder, PathsBuilder},
    response::ResponseBuilder,
    schema::{ObjectBuilder, Schema, Type},
};

use crate::{
    config::ForwardHeadersStrategy,
    grouping::GroupingIndex,
    routes::registry::{EffectiveRoute, EffectiveRouteSet, Method},
};

const DOCS_TITLE: &str = "demo-endpoints";
const YAML_CONTENT_TYPE: &str = "application/vnd.oai.openapi";

/// DocsError
///
/// Failures while serving a documentation document. None of these affect the
/// route set; they only turn into an error response for the caller.
#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    #[error("unknown documentation group `{0}`")]
    UnknownGroup(String),
    #[error("failed to render JSON document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to render YAML document: {0}")]
    Yaml(String),
}

impl IntoResponse for DocsError {
    fn into_response(self) -> Response {
        let status = match &self {
            DocsError::UnknownGroup(_) => StatusCode::NOT_FOUND,
            DocsError::Json(_) | DocsError::Yaml(_) => {
                tracing::error!(error = %self, "documentation rendering failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

/// ServerUrlPolicy
///
/// How the `servers` entry of a document is derived from the request that asked
/// for it. Without forwarded headers the `Host` header and the listener's own
/// scheme are used; with the `framework` strategy `X-Forwarded-Host`, `-Port` and
/// `-Proto` take precedence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServerUrlPolicy {
    pub forward_headers: ForwardHeadersStrategy,
    pub scheme: &'static str,
}

impl ServerUrlPolicy {
    /// Returns `None` when the request names no host at all.
    pub fn server_url(&self, headers: &HeaderMap) -> Option<String> {
        let framework = self.forward_headers == ForwardHeadersStrategy::Framework;
        let host = forwarded(headers, framework, "x-forwarded-host")
            .or_else(|| header_value(headers, header::HOST.as_str()))?;
        let proto = forwarded(headers, framework, "x-forwarded-proto").unwrap_or(self.scheme);
        let port = forwarded(headers, framework, "x-forwarded-port");
        Some(origin(proto, host, port))
    }
}

/// First entry of a possibly comma-separated header.
fn header_value<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn forwarded<'h>(headers: &'h HeaderMap, framework: bool, name: &str) -> Option<&'h str> {
    if framework { header_value(headers, name) } else { None }
}

fn origin(proto: &str, host: &str, port: Option<&str>) -> String {
    let Some(port) = port else {
        return format!("{proto}://{host}");
    };
    // An explicit port replaces whatever port the host carried.
    let bare_host = match host.rsplit_once(':') {
        Some((name, existing)) if existing.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    };
    let default_port = if proto == "https" { "443" } else { "80" };
    if port == default_port {
        format!("{proto}://{bare_host}")
    } else {
        format!("{proto}://{bare_host}:{port}")
    }
}

fn http_method(method: Method) -> HttpMethod {
    match method {
        Method::Get => HttpMethod::Get,
        Method::Post => HttpMethod::Post,
        Method::Put => HttpMethod::Put,
        Method::Patch => HttpMethod::Patch,
        Method::Delete => HttpMethod::Delete,
        Method::Head => HttpMethod::Head,
        Method::Options => HttpMethod::Options,
    }
}

fn operation_for(route: &EffectiveRoute) -> utoipa::openapi::path::Operation {
    let text = ContentBuilder::new()
        .schema(Some(Schema::Object(
            ObjectBuilder::new().schema_type(Type::String).build(),
        )))
        .build();
    let ok = ResponseBuilder::new()
        .description("OK")
        .content("text/plain", text)
        .build();

    let definition = route.definition();
    let mut operation = OperationBuilder::new()
        .operation_id(Some(definition.operation_id))
        .response("200", ok);
    if let Some(tag) = definition.tag {
        operation = operation.tag(tag);
    }
    operation.build()
}

/// openapi_document
///
/// Builds an OpenAPI document describing `routes`. Operations on the same path are
/// collected under one path item. `server`, when known, becomes the single
/// `servers` entry.
pub fn openapi_document<'a>(
    title: &str,
    routes: impl IntoIterator<Item = &'a EffectiveRoute>,
    server: Option<&str>,
) -> OpenApi {
    let mut items: Vec<(&'static str, PathItemBuilder)> = Vec::new();
    for route in routes {
        let operation = operation_for(route);
        let method = http_method(route.method());
        match items.iter().position(|(path, _)| *path == route.path()) {
            Some(index) => {
                let (path, builder) = items.remove(index);
                items.insert(index, (path, builder.operation(method, operation)));
            }
            None => items.push((route.path(), PathItemBuilder::new().operation(method, operation))),
        }
    }

    let paths = items
        .into_iter()
        .fold(PathsBuilder::new(), |paths, (path, builder)| {
            paths.path(path, builder.build())
        });

    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title(title)
                .version(env!("CARGO_PKG_VERSION"))
                .build(),
        )
        .paths(paths)
        .servers(server.map(|url| vec![Server::new(url)]))
        .build()
}

fn group_document(
    groups: &GroupingIndex,
    name: &str,
    server: Option<&str>,
) -> Result<OpenApi, DocsError> {
    let group = groups
        .group(name)
        .ok_or_else(|| DocsError::UnknownGroup(name.to_string()))?;
    Ok(openapi_document(
        &format!("{DOCS_TITLE} ({})", group.name),
        &group.routes,
        server,
    ))
}

fn json_response(document: &OpenApi) -> Result<Response, DocsError> {
    let body = document.to_pretty_json()?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

fn yaml_response(document: &OpenApi) -> Result<Response, DocsError> {
    let body = document
        .to_yaml()
        .map_err(|error| DocsError::Yaml(error.to_string()))?;
    Ok(([(header::CONTENT_TYPE, YAML_CONTENT_TYPE)], body).into_response())
}

// --- Handlers ---

/// GET {api-docs}
///
/// The default document: every effective route, grouped or not.
pub async fn api_docs(
    State(routes): State<Arc<EffectiveRouteSet>>,
    State(policy): State<ServerUrlPolicy>,
    headers: HeaderMap,
) -> Result<Response, DocsError> {
    let server = policy.server_url(&headers);
    json_response(&openapi_document(DOCS_TITLE, routes.as_ref(), server.as_deref()))
}

/// GET {api-docs}.yaml
pub async fn api_docs_yaml(
    State(routes): State<Arc<EffectiveRouteSet>>,
    State(policy): State<ServerUrlPolicy>,
    headers: HeaderMap,
) -> Result<Response, DocsError> {
    let server = policy.server_url(&headers);
    yaml_response(&openapi_document(DOCS_TITLE, routes.as_ref(), server.as_deref()))
}

/// GET {api-docs}/{group}
pub async fn group_api_docs(
    State(groups): State<Arc<GroupingIndex>>,
    State(policy): State<ServerUrlPolicy>,
    headers: HeaderMap,
    Path(group): Path<String>,
) -> Result<Response, DocsError> {
    let server = policy.server_url(&headers);
    json_response(&group_document(&groups, &group, server.as_deref())?)
}

/// GET {api-docs}.yaml/{group}
pub async fn group_api_docs_yaml(
    State(groups): State<Arc<GroupingIndex>>,
    State(policy): State<ServerUrlPolicy>,
    headers: HeaderMap,
    Path(group): Path<String>,
) -> Result<Response, DocsError> {
    let server = policy.server_url(&headers);
    yaml_response(&group_document(&groups, &group, server.as_deref())?)
}

// --- Plain export ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
}

impl From<&EffectiveRoute> for Endpoint {
    fn from(route: &EffectiveRoute) -> Self {
        Endpoint {
            method: route.method(),
            path: route.path().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupExport {
    pub name: String,
    pub endpoints: Vec<Endpoint>,
}

/// DocsExport
///
/// Group membership as the documentation tool consumes it: each group's
/// `(method, path)` pairs in order, plus the routes no group claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocsExport {
    pub groups: Vec<GroupExport>,
    pub ungrouped: Vec<Endpoint>,
}

impl From<&GroupingIndex> for DocsExport {
    fn from(index: &GroupingIndex) -> Self {
        DocsExport {
            groups: index
                .groups()
                .iter()
                .map(|group| GroupExport {
                    name: group.name.clone(),
                    endpoints: group.routes.iter().map(Endpoint::from).collect(),
                })
                .collect(),
            ungrouped: index.ungrouped().iter().map(Endpoint::from).collect(),
        }
    }
}

/// GET /docs/groups
pub async fn groups_export(State(groups): State<Arc<GroupingIndex>>) -> Json<DocsExport> {
    Json(DocsExport::from(groups.as_ref()))
}

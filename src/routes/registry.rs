use std::fmt;

use serde::Serialize;

use crate::{
    config::{ConfigSnapshot, ConfigValue},
    profile::Profile,
};

/// Method
///
/// HTTP methods a catalog entry can be declared for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `config[key] == expected` clause of an activation predicate.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigCondition {
    pub key: &'static str,
    pub expected: ConfigValue,
}

/// Activation
///
/// Conjunction of an optional profile gate and zero or more configuration clauses.
/// The empty activation is always satisfied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Activation {
    pub profile: Option<Profile>,
    pub conditions: Vec<ConfigCondition>,
}

impl Activation {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn profile(profile: Profile) -> Self {
        Self {
            profile: Some(profile),
            conditions: Vec::new(),
        }
    }

    /// Adds a clause requiring `key` to resolve exactly to `expected`.
    pub fn when(mut self, key: &'static str, expected: impl Into<ConfigValue>) -> Self {
        self.conditions.push(ConfigCondition {
            key,
            expected: expected.into(),
        });
        self
    }

    pub fn is_active(&self, snapshot: &ConfigSnapshot, profile: Profile) -> bool {
        if self.profile.is_some_and(|declared| declared != profile) {
            return false;
        }
        self.conditions
            .iter()
            .all(|condition| snapshot.matches(condition.key, &condition.expected))
    }
}

/// How a route produces its (static) response body.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    Static(&'static str),
    /// The value of a configuration key, or `fallback` when it is not set.
    Config {
        key: &'static str,
        fallback: &'static str,
    },
}

impl ResponseBody {
    pub fn render(&self, snapshot: &ConfigSnapshot) -> String {
        match self {
            ResponseBody::Static(body) => (*body).to_string(),
            ResponseBody::Config { key, fallback } => snapshot.resolve_str(key, fallback),
        }
    }
}

/// RouteDefinition
///
/// One entry of the static catalog. The set of possible routes never changes at
/// runtime; only which of them are effective does.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteDefinition {
    pub method: Method,
    pub path: &'static str,
    /// Stable identifier, used as the OpenAPI `operationId`.
    pub operation_id: &'static str,
    pub response: ResponseBody,
    pub activation: Activation,
    /// Documentation tag. Group membership is decided by path patterns, not by this tag.
    pub tag: Option<&'static str>,
}

impl RouteDefinition {
    pub fn new(method: Method, path: &'static str, operation_id: &'static str) -> Self {
        Self {
            method,
            path,
            operation_id,
            response: ResponseBody::Static(""),
            activation: Activation::always(),
            tag: None,
        }
    }

    pub fn get(path: &'static str, operation_id: &'static str) -> Self {
        Self::new(Method::Get, path, operation_id)
    }

    pub fn responds(mut self, response: ResponseBody) -> Self {
        self.response = response;
        self
    }

    pub fn active_when(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn tagged(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }
}

/// A definition that passed activation, with its body rendered once against the snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveRoute {
    definition: RouteDefinition,
    body: String,
}

impl EffectiveRoute {
    pub fn definition(&self) -> &RouteDefinition {
        &self.definition
    }

    pub fn method(&self) -> Method {
        self.definition.method
    }

    pub fn path(&self) -> &'static str {
        self.definition.path
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// EffectiveRouteSet
///
/// The routes active for this process, in declaration order. Built once at startup
/// and read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectiveRouteSet {
    routes: Vec<EffectiveRoute>,
}

impl EffectiveRouteSet {
    pub fn iter(&self) -> std::slice::Iter<'_, EffectiveRoute> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn find(&self, method: Method, path: &str) -> Option<&EffectiveRoute> {
        self.routes
            .iter()
            .find(|route| route.method() == method && route.path() == path)
    }

    pub fn paths(&self) -> Vec<&'static str> {
        self.routes.iter().map(EffectiveRoute::path).collect()
    }
}

impl<'a> IntoIterator for &'a EffectiveRouteSet {
    type Item = &'a EffectiveRoute;
    type IntoIter = std::slice::Iter<'a, EffectiveRoute>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

/// effective_routes
///
/// Filters `catalog` down to the routes whose activation holds for `snapshot` and
/// `profile`. Output keeps declaration order. When two active entries share a
/// method and path, the later declaration replaces the earlier one and takes its
/// own position in the order. Total: nothing here can fail.
pub fn effective_routes(
    catalog: &[RouteDefinition],
    snapshot: &ConfigSnapshot,
    profile: Profile,
) -> EffectiveRouteSet {
    let mut routes: Vec<EffectiveRoute> = Vec::with_capacity(catalog.len());

    for definition in catalog {
        if !definition.activation.is_active(snapshot, profile) {
            tracing::debug!(
                method = %definition.method,
                path = definition.path,
                %profile,
                "route inactive"
            );
            continue;
        }

        if let Some(position) = routes
            .iter()
            .position(|route| route.method() == definition.method && route.path() == definition.path)
        {
            let replaced = routes.remove(position);
            tracing::warn!(
                method = %definition.method,
                path = definition.path,
                replaced = replaced.definition.operation_id,
                by = definition.operation_id,
                "duplicate route, later declaration wins"
            );
        }

        routes.push(EffectiveRoute {
            body: definition.response.render(snapshot),
            definition: definition.clone(),
        });
    }

    EffectiveRouteSet { routes }
}

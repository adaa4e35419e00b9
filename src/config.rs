use std::{collections::HashMap, env, fmt, path::PathBuf, time::Duration};

use crate::{profile::Profile, routes::catalog};

// --- Well-known keys ---

/// Boolean flag that enables the startup delay hook.
pub const SLOWER_KEY: &str = "slower";
/// Seconds to wait before serving when `slower` is set.
pub const STARTUP_DELAY_KEY: &str = "startup.delay-seconds";
/// TCP port the HTTP listener binds to.
pub const PORT_KEY: &str = "server.port";
/// Base path under which the OpenAPI documents are served.
pub const API_DOCS_PATH_KEY: &str = "api-docs.path";
/// `framework` makes the documentation honour `X-Forwarded-*` request headers.
pub const FORWARD_HEADERS_KEY: &str = "server.forward-headers-strategy";
/// Serve HTTPS instead of plain HTTP.
pub const SSL_ENABLED_KEY: &str = "server.ssl.enabled";
/// PEM certificate chain used when SSL is enabled.
pub const SSL_CERTIFICATE_KEY: &str = "server.ssl.certificate";
/// PEM private key used when SSL is enabled.
pub const SSL_PRIVATE_KEY_KEY: &str = "server.ssl.certificate-private-key";
/// Runtime environment marker (`local` or `production`). Read from `APP_ENV`.
pub const APP_ENV_KEY: &str = "app.env";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_DOCS_PATH: &str = "/v3/api-docs";
pub const DEFAULT_STARTUP_DELAY_SECS: u64 = 40;
pub const DEFAULT_SSL_CERTIFICATE: &str = "certs/server.crt";
pub const DEFAULT_SSL_PRIVATE_KEY: &str = "certs/server.key";

/// Paths owned by the documentation surface itself.
pub const GROUPS_EXPORT_PATH: &str = "/docs/groups";
pub const SWAGGER_UI_PATH: &str = "/swagger-ui";

/// ConfigValue
///
/// A single resolved configuration value. Values coming from the environment or
/// the command line are always `Str`; declared and profile defaults carry their own type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigValue {
    Bool(bool),
    Str(String),
}

impl ConfigValue {
    /// Reads the value as a boolean. Strings are accepted when they spell
    /// `true` or `false` (any case).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(value) => Some(*value),
            ConfigValue::Str(raw) => parse_bool(raw),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(value) => Some(value),
            ConfigValue::Bool(_) => None,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(value) => write!(f, "{value}"),
            ConfigValue::Str(value) => f.write_str(value),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Maps a dotted key onto its environment variable spelling:
/// `some.second.property` becomes `SOME_SECOND_PROPERTY`.
pub fn env_var_name(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '.' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

/// ConfigSources
///
/// The raw, mutable inputs gathered before resolution: explicit overrides
/// (command line) and the process environment. Turned into an immutable
/// [`ConfigSnapshot`] exactly once at startup.
#[derive(Clone, Debug, Default)]
pub struct ConfigSources {
    overrides: HashMap<String, String>,
    environment: HashMap<String, String>,
}

impl ConfigSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current process environment (including anything `dotenv` loaded).
    pub fn from_process_env() -> Self {
        Self {
            overrides: HashMap::new(),
            environment: env::vars().collect(),
        }
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(name.into(), value.into());
        self
    }

    pub fn into_snapshot(self) -> ConfigSnapshot {
        ConfigSnapshot {
            overrides: self.overrides,
            environment: self.environment,
            profile_defaults: HashMap::new(),
        }
    }
}

/// ConfigSnapshot
///
/// Immutable view of every configuration layer, highest precedence first:
/// explicit override, environment, profile default. Declared defaults are
/// supplied by the caller at each `resolve` call.
#[derive(Clone, Debug, Default)]
pub struct ConfigSnapshot {
    overrides: HashMap<String, String>,
    environment: HashMap<String, String>,
    profile_defaults: HashMap<String, ConfigValue>,
}

impl ConfigSnapshot {
    /// Installs the defaults contributed by the active profile.
    pub fn with_profile_defaults(mut self, profile: Profile) -> Self {
        self.profile_defaults = profile
            .defaults()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        self
    }

    /// Returns the highest-precedence value for `key`, or `None` if no layer sets it.
    pub fn lookup(&self, key: &str) -> Option<ConfigValue> {
        if let Some(value) = self.overrides.get(key) {
            return Some(ConfigValue::Str(value.clone()));
        }
        let from_env = self
            .environment
            .get(key)
            .or_else(|| self.environment.get(&env_var_name(key)));
        if let Some(value) = from_env {
            return Some(ConfigValue::Str(value.clone()));
        }
        self.profile_defaults.get(key).cloned()
    }

    /// resolve
    ///
    /// Resolves `key` against the layers, falling back to `default`. The result always
    /// has the default's type: a layered value that cannot be read as that type is
    /// ignored in favour of the default rather than reported.
    pub fn resolve(&self, key: &str, default: impl Into<ConfigValue>) -> ConfigValue {
        let default = default.into();
        let Some(found) = self.lookup(key) else {
            return default;
        };
        match default {
            ConfigValue::Bool(_) => match found.as_bool() {
                Some(value) => ConfigValue::Bool(value),
                None => {
                    tracing::warn!(key, value = %found, "expected a boolean, using default");
                    default
                }
            },
            ConfigValue::Str(_) => match found {
                ConfigValue::Str(value) => ConfigValue::Str(value),
                ConfigValue::Bool(_) => {
                    tracing::warn!(key, value = %found, "expected a string, using default");
                    default
                }
            },
        }
    }

    pub fn resolve_bool(&self, key: &str, default: bool) -> bool {
        self.resolve(key, default).as_bool().unwrap_or(default)
    }

    pub fn resolve_str(&self, key: &str, default: &str) -> String {
        match self.resolve(key, default) {
            ConfigValue::Str(value) => value,
            ConfigValue::Bool(_) => default.to_string(),
        }
    }

    pub fn resolve_u64(&self, key: &str, default: u64) -> u64 {
        let raw = self.resolve_str(key, "");
        if raw.is_empty() {
            return default;
        }
        raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "expected an unsigned integer, using default");
            default
        })
    }

    /// True iff `key` is present and equal to `expected` with no coercion beyond
    /// reading a boolean spelled as a string. An absent key never matches.
    pub fn matches(&self, key: &str, expected: &ConfigValue) -> bool {
        match (self.lookup(key), expected) {
            (Some(found), ConfigValue::Str(expected)) => found.as_str() == Some(expected.as_str()),
            (Some(found), ConfigValue::Bool(expected)) => found.as_bool() == Some(*expected),
            (None, _) => false,
        }
    }
}

/// Env
///
/// Runtime context. Only selects the log output format.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Env {
    pub fn resolve(snapshot: &ConfigSnapshot) -> Env {
        match snapshot.resolve_str(APP_ENV_KEY, "local").as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        }
    }
}

/// ForwardHeadersStrategy
///
/// Whether the server URL advertised in the documentation is taken from the
/// `Host` header alone or from the `X-Forwarded-*` headers set by a proxy.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ForwardHeadersStrategy {
    #[default]
    None,
    Framework,
}

impl ForwardHeadersStrategy {
    pub fn resolve(snapshot: &ConfigSnapshot) -> Self {
        match snapshot.resolve_str(FORWARD_HEADERS_KEY, "none").as_str() {
            "framework" => ForwardHeadersStrategy::Framework,
            "none" => ForwardHeadersStrategy::None,
            other => {
                tracing::warn!(key = FORWARD_HEADERS_KEY, value = %other, "unknown strategy, using none");
                ForwardHeadersStrategy::None
            }
        }
    }
}

/// Certificate and key locations for HTTPS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsSettings {
    pub certificate: PathBuf,
    pub private_key: PathBuf,
}

/// AppConfig
///
/// Everything the process resolves at startup, frozen for its lifetime. Shared with
/// handlers through `FromRef`, the same way the rest of `AppState` is.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Layered configuration, including the active profile's defaults.
    pub snapshot: ConfigSnapshot,
    /// The single active profile.
    pub profile: Profile,
    pub env: Env,
    pub port: u16,
    /// Normalized base path of the documentation endpoints (leading slash, no trailing slash).
    pub api_docs_path: String,
    pub slower: bool,
    pub startup_delay: Duration,
    pub forward_headers: ForwardHeadersStrategy,
    /// Present iff HTTPS is enabled.
    pub tls: Option<TlsSettings>,
}

impl Default for AppConfig {
    /// Resolves against empty sources: profile `none`, every key at its default.
    fn default() -> Self {
        Self::from_sources(ConfigSources::new())
    }
}

impl AppConfig {
    /// load
    ///
    /// Resolves configuration from the process environment alone.
    pub fn load() -> Self {
        Self::from_sources(ConfigSources::from_process_env())
    }

    /// from_sources
    ///
    /// The single resolution pass: pick the profile from the raw layers, then add
    /// that profile's defaults and read every well-known key. Never fails; an unusable
    /// value is logged and replaced by its default.
    pub fn from_sources(sources: ConfigSources) -> Self {
        let base = sources.into_snapshot();
        let profile = Profile::select(&base);
        let snapshot = base.with_profile_defaults(profile);

        let env = Env::resolve(&snapshot);

        let port = u16::try_from(snapshot.resolve_u64(PORT_KEY, u64::from(DEFAULT_PORT)))
            .unwrap_or_else(|_| {
                tracing::warn!(key = PORT_KEY, "port out of range, using default");
                DEFAULT_PORT
            });

        // The docs path becomes part of the router, so it must neither carry route
        // syntax nor shadow an endpoint of the built-in catalog.
        let endpoint_paths: Vec<&str> = catalog::catalog().iter().map(|route| route.path).collect();
        let requested_docs_path =
            normalize_docs_path(&snapshot.resolve_str(API_DOCS_PATH_KEY, DEFAULT_API_DOCS_PATH));
        let api_docs_path = if docs_path_conflicts(&requested_docs_path, endpoint_paths) {
            tracing::warn!(
                key = API_DOCS_PATH_KEY,
                value = %requested_docs_path,
                "documentation path is not usable, using default"
            );
            DEFAULT_API_DOCS_PATH.to_string()
        } else {
            requested_docs_path
        };

        let slower = snapshot.resolve_bool(SLOWER_KEY, false);
        let startup_delay =
            Duration::from_secs(snapshot.resolve_u64(STARTUP_DELAY_KEY, DEFAULT_STARTUP_DELAY_SECS));
        let forward_headers = ForwardHeadersStrategy::resolve(&snapshot);

        let tls = snapshot
            .resolve_bool(SSL_ENABLED_KEY, false)
            .then(|| TlsSettings {
                certificate: PathBuf::from(
                    snapshot.resolve_str(SSL_CERTIFICATE_KEY, DEFAULT_SSL_CERTIFICATE),
                ),
                private_key: PathBuf::from(
                    snapshot.resolve_str(SSL_PRIVATE_KEY_KEY, DEFAULT_SSL_PRIVATE_KEY),
                ),
            });

        Self {
            snapshot,
            profile,
            env,
            port,
            api_docs_path,
            slower,
            startup_delay,
            forward_headers,
            tls,
        }
    }

    /// URL scheme the listener speaks.
    pub fn scheme(&self) -> &'static str {
        if self.tls.is_some() { "https" } else { "http" }
    }
}

fn normalize_docs_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_API_DOCS_PATH.to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// docs_path_conflicts
///
/// True when `path` cannot be mounted as the documentation base: it contains route
/// syntax (`{`, `}`, `*`, a `:` segment) or query/fragment characters, it or its
/// `.yaml` form equals one of `endpoint_paths`, or it overlaps the group export or
/// the Swagger UI.
pub fn docs_path_conflicts<'a>(
    path: &str,
    endpoint_paths: impl IntoIterator<Item = &'a str>,
) -> bool {
    if path.contains(['{', '}', '*', '?', '#']) || path.split('/').any(|s| s.starts_with(':')) {
        return true;
    }
    if path == GROUPS_EXPORT_PATH
        || path == SWAGGER_UI_PATH
        || path.starts_with(&format!("{SWAGGER_UI_PATH}/"))
    {
        return true;
    }
    let yaml = format!("{path}.yaml");
    endpoint_paths
        .into_iter()
        .any(|endpoint| endpoint == path || endpoint == yaml)
}

use demo_endpoints::{
    AppConfig, ConfigSources, ConfigValue, Profile,
    config::{
        DEFAULT_API_DOCS_PATH, DEFAULT_PORT, DEFAULT_SSL_CERTIFICATE, DEFAULT_SSL_PRIVATE_KEY,
        Env, ForwardHeadersStrategy, TlsSettings, docs_path_conflicts, env_var_name,
    },
};
use serial_test::serial;
use std::{env, panic, path::PathBuf, time::Duration};

// --- Setup/Teardown Utilities ---

/// Runs `test` and restores the listed environment variables afterwards.
fn run_with_env<T, R>(test: T, cleanup_vars: Vec<&'static str>) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(String, Option<String>)> = cleanup_vars
        .iter()
        .map(|&var| (var.to_string(), env::var(var).ok()))
        .collect();

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(&key, val);
            } else {
                env::remove_var(&key);
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Layering ---

#[test]
fn test_absent_key_falls_back_to_default() {
    let snapshot = ConfigSources::new().into_snapshot();
    assert_eq!(snapshot.lookup("missing.key"), None);
    assert_eq!(
        snapshot.resolve("missing.key", "fallback"),
        ConfigValue::Str("fallback".into())
    );
    assert!(!snapshot.resolve_bool("missing.flag", false));
    assert!(snapshot.resolve_bool("missing.flag", true));
}

#[test]
fn test_override_beats_environment() {
    let snapshot = ConfigSources::new()
        .with_env("TEST_PROPS", "from-env")
        .with_override("test.props", "from-override")
        .into_snapshot();
    assert_eq!(snapshot.resolve_str("test.props", ""), "from-override");
}

#[test]
fn test_environment_uses_relaxed_key_spelling() {
    assert_eq!(env_var_name("some.second.property"), "SOME_SECOND_PROPERTY");
    assert_eq!(env_var_name("api-docs.path"), "API_DOCS_PATH");

    let snapshot = ConfigSources::new()
        .with_env("SOME_SECOND_PROPERTY", "someValue")
        .into_snapshot();
    assert_eq!(
        snapshot.lookup("some.second.property"),
        Some(ConfigValue::Str("someValue".into()))
    );
}

#[test]
fn test_exact_environment_key_is_preferred() {
    let snapshot = ConfigSources::new()
        .with_env("test.props", "exact")
        .with_env("TEST_PROPS", "relaxed")
        .into_snapshot();
    assert_eq!(snapshot.resolve_str("test.props", ""), "exact");
}

#[test]
fn test_type_mismatch_uses_default() {
    let snapshot = ConfigSources::new()
        .with_override("slower", "maybe")
        .with_override("server.port", "eighty")
        .into_snapshot();
    assert_eq!(snapshot.resolve("slower", false), ConfigValue::Bool(false));
    assert_eq!(snapshot.resolve_u64("server.port", 8080), 8080);
}

#[test]
fn test_boolean_strings_are_read_case_insensitively() {
    let snapshot = ConfigSources::new()
        .with_override("slower", "TRUE")
        .into_snapshot();
    assert!(snapshot.resolve_bool("slower", false));
}

#[test]
fn test_matches_requires_exact_string() {
    let snapshot = ConfigSources::new()
        .with_override("some.second.property", "someValue")
        .into_snapshot();
    assert!(snapshot.matches("some.second.property", &"someValue".into()));
    assert!(!snapshot.matches("some.second.property", &"somevalue".into()));
    assert!(!snapshot.matches("some.second.property", &"someValue ".into()));
    assert!(!snapshot.matches("absent.property", &"someValue".into()));
}

#[test]
fn test_matches_boolean_expectation() {
    let snapshot = ConfigSources::new()
        .with_override("feature.enabled", "true")
        .with_override("feature.label", "yes")
        .into_snapshot();
    assert!(snapshot.matches("feature.enabled", &true.into()));
    assert!(!snapshot.matches("feature.enabled", &false.into()));
    assert!(!snapshot.matches("feature.label", &true.into()));
    // A string expectation never matches a typed boolean default.
    let slower = ConfigSources::new()
        .into_snapshot()
        .with_profile_defaults(Profile::Slower);
    assert!(!slower.matches("slower", &"true".into()));
    assert!(slower.matches("slower", &true.into()));
}

// --- Profile defaults ---

#[test]
fn test_profile_default_ranks_below_environment() {
    let snapshot = ConfigSources::new()
        .with_env("SLOWER", "false")
        .into_snapshot()
        .with_profile_defaults(Profile::Slower);
    assert!(!snapshot.resolve_bool("slower", false));

    let snapshot = ConfigSources::new()
        .into_snapshot()
        .with_profile_defaults(Profile::Slower);
    assert!(snapshot.resolve_bool("slower", false));
}

// --- AppConfig ---

#[test]
fn test_app_config_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.profile, Profile::None);
    assert_eq!(config.env, Env::Local);
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.api_docs_path, DEFAULT_API_DOCS_PATH);
    assert!(!config.slower);
    assert_eq!(config.startup_delay, Duration::from_secs(40));
}

#[test]
fn test_app_config_different_url_profile_moves_docs() {
    let config = AppConfig::from_sources(
        ConfigSources::new().with_override("profiles.active", "different-url"),
    );
    assert_eq!(config.profile, Profile::DifferentUrl);
    assert_eq!(config.api_docs_path, "/secret-api-docs");
}

#[test]
fn test_app_config_explicit_docs_path_is_normalized() {
    let config = AppConfig::from_sources(
        ConfigSources::new().with_override("api-docs.path", "custom-docs/"),
    );
    assert_eq!(config.api_docs_path, "/custom-docs");

    let config =
        AppConfig::from_sources(ConfigSources::new().with_override("api-docs.path", "/"));
    assert_eq!(config.api_docs_path, DEFAULT_API_DOCS_PATH);
}

fn docs_path_for(raw: &str) -> String {
    AppConfig::from_sources(ConfigSources::new().with_override("api-docs.path", raw)).api_docs_path
}

#[test]
fn test_app_config_docs_path_colliding_with_endpoint_uses_default() {
    assert_eq!(docs_path_for("/hello/world"), DEFAULT_API_DOCS_PATH);
    assert_eq!(docs_path_for("hello/world/"), DEFAULT_API_DOCS_PATH);
    // Only an exact match collides.
    assert_eq!(docs_path_for("/hello/world.yaml"), "/hello/world.yaml");
}

#[test]
fn test_app_config_docs_path_with_route_syntax_uses_default() {
    assert_eq!(docs_path_for("/docs{x"), DEFAULT_API_DOCS_PATH);
    assert_eq!(docs_path_for("/docs/{group}"), DEFAULT_API_DOCS_PATH);
    assert_eq!(docs_path_for("/docs/*rest"), DEFAULT_API_DOCS_PATH);
    assert_eq!(docs_path_for("/docs/:id"), DEFAULT_API_DOCS_PATH);
}

#[test]
fn test_app_config_docs_path_overlapping_reserved_routes_uses_default() {
    assert_eq!(docs_path_for("/swagger-ui"), DEFAULT_API_DOCS_PATH);
    assert_eq!(docs_path_for("/swagger-ui/api"), DEFAULT_API_DOCS_PATH);
    assert_eq!(docs_path_for("/docs/groups"), DEFAULT_API_DOCS_PATH);
    assert_eq!(docs_path_for("/docs"), "/docs");
}

#[test]
fn test_docs_path_conflicts_against_endpoint_yaml_form() {
    assert!(docs_path_conflicts("/spec", ["/spec.yaml"]));
    assert!(docs_path_conflicts("/spec", ["/other", "/spec"]));
    assert!(!docs_path_conflicts("/spec", ["/spec/child"]));
}

#[test]
fn test_app_config_slower_profile_enables_delay() {
    let config = AppConfig::from_sources(
        ConfigSources::new()
            .with_override("profiles.active", "slower")
            .with_override("startup.delay-seconds", "3"),
    );
    assert!(config.slower);
    assert_eq!(config.startup_delay, Duration::from_secs(3));
}

#[test]
fn test_app_config_out_of_range_port_uses_default() {
    let config =
        AppConfig::from_sources(ConfigSources::new().with_override("server.port", "70000"));
    assert_eq!(config.port, DEFAULT_PORT);
}

#[test]
fn test_app_config_plain_http_by_default() {
    let config = AppConfig::default();
    assert_eq!(config.tls, None);
    assert_eq!(config.scheme(), "http");
}

#[test]
fn test_app_config_ssl_profile_enables_tls() {
    let config =
        AppConfig::from_sources(ConfigSources::new().with_override("profiles.active", "ssl"));
    assert_eq!(config.profile, Profile::Ssl);
    assert_eq!(config.port, 8081);
    assert_eq!(config.scheme(), "https");
    assert_eq!(
        config.tls,
        Some(TlsSettings {
            certificate: PathBuf::from(DEFAULT_SSL_CERTIFICATE),
            private_key: PathBuf::from(DEFAULT_SSL_PRIVATE_KEY),
        })
    );
}

#[test]
fn test_app_config_tls_paths_and_port_are_overridable() {
    let config = AppConfig::from_sources(
        ConfigSources::new()
            .with_override("profiles.active", "ssl")
            .with_override("server.port", "9443")
            .with_env("SERVER_SSL_CERTIFICATE", "/etc/demo/cert.pem")
            .with_override("server.ssl.certificate-private-key", "/etc/demo/key.pem"),
    );
    assert_eq!(config.port, 9443);
    assert_eq!(
        config.tls,
        Some(TlsSettings {
            certificate: PathBuf::from("/etc/demo/cert.pem"),
            private_key: PathBuf::from("/etc/demo/key.pem"),
        })
    );

    // Explicitly disabling TLS wins over the profile default.
    let config = AppConfig::from_sources(
        ConfigSources::new()
            .with_override("profiles.active", "ssl")
            .with_override("server.ssl.enabled", "false"),
    );
    assert_eq!(config.tls, None);
    assert_eq!(config.port, 8081);
}

#[test]
fn test_forward_headers_strategy_resolution() {
    let strategy_for = |raw: &str| {
        AppConfig::from_sources(
            ConfigSources::new().with_override("server.forward-headers-strategy", raw),
        )
        .forward_headers
    };
    assert_eq!(AppConfig::default().forward_headers, ForwardHeadersStrategy::None);
    assert_eq!(strategy_for("framework"), ForwardHeadersStrategy::Framework);
    assert_eq!(strategy_for("none"), ForwardHeadersStrategy::None);
    assert_eq!(strategy_for("native"), ForwardHeadersStrategy::None);
}

#[test]
#[serial]
fn test_app_config_load_reads_process_environment() {
    let config = run_with_env(
        || {
            unsafe {
                env::set_var("APP_ENV", "production");
                env::set_var("PROFILES_ACTIVE", "multiple-endpoints");
                env::set_var("TEST_PROPS", "from-process-env");
            }
            AppConfig::load()
        },
        vec!["APP_ENV", "PROFILES_ACTIVE", "TEST_PROPS"],
    );

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.profile, Profile::MultipleEndpoints);
    assert_eq!(config.snapshot.resolve_str("test.props", ""), "from-process-env");
}

use std::fmt;

use crate::config::{
    API_DOCS_PATH_KEY, ConfigSnapshot, ConfigValue, PORT_KEY, SLOWER_KEY, SSL_ENABLED_KEY,
};

/// Configuration key holding the requested profile name(s), comma separated.
/// Read from `PROFILES_ACTIVE` in the environment or `--profiles` on the command line.
pub const PROFILES_KEY: &str = "profiles.active";

/// Profile
///
/// The mutually exclusive runtime modes known at build time. Variant order is the
/// universe's declaration order and doubles as the tie-break when several names
/// are requested at once: the earliest declared profile wins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Profile {
    #[default]
    None,
    MultipleEndpoints,
    MultipleGroupedApis,
    Slower,
    DifferentUrl,
    Ssl,
}

impl Profile {
    pub const ALL: [Profile; 6] = [
        Profile::None,
        Profile::MultipleEndpoints,
        Profile::MultipleGroupedApis,
        Profile::Slower,
        Profile::DifferentUrl,
        Profile::Ssl,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Profile::None => "none",
            Profile::MultipleEndpoints => "multiple-endpoints",
            Profile::MultipleGroupedApis => "multiple-grouped-apis",
            Profile::Slower => "slower",
            Profile::DifferentUrl => "different-url",
            Profile::Ssl => "ssl",
        }
    }

    pub fn from_name(name: &str) -> Option<Profile> {
        Self::ALL.into_iter().find(|profile| profile.name() == name)
    }

    /// Reads [`PROFILES_KEY`] once and picks the active profile.
    pub fn select(snapshot: &ConfigSnapshot) -> Profile {
        Self::select_from_list(&snapshot.resolve_str(PROFILES_KEY, ""))
    }

    /// select_from_list
    ///
    /// Parses a comma-separated list of names. Unknown names are dropped; among the
    /// known ones the earliest in [`Profile::ALL`] wins. Nothing known means `none`.
    pub fn select_from_list(raw: &str) -> Profile {
        let requested: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();

        let mut known: Vec<Profile> = Vec::new();
        for name in &requested {
            match Self::from_name(name) {
                Some(profile) => known.push(profile),
                None => tracing::warn!(profile = %name, "unknown profile ignored"),
            }
        }

        let Some(selected) = known.iter().copied().min() else {
            return Profile::None;
        };
        if known.iter().any(|profile| *profile != selected) {
            tracing::warn!(
                requested = %raw,
                selected = selected.name(),
                "several profiles requested, keeping the earliest declared"
            );
        }
        selected
    }

    /// Configuration defaults this profile contributes. They rank below the
    /// environment and explicit overrides but above declared defaults.
    pub fn defaults(self) -> Vec<(&'static str, ConfigValue)> {
        match self {
            Profile::Slower => vec![(SLOWER_KEY, ConfigValue::Bool(true))],
            Profile::DifferentUrl => vec![(API_DOCS_PATH_KEY, "/secret-api-docs".into())],
            Profile::Ssl => vec![
                (PORT_KEY, "8081".into()),
                (SSL_ENABLED_KEY, ConfigValue::Bool(true)),
            ],
            Profile::None | Profile::MultipleEndpoints | Profile::MultipleGroupedApis => Vec::new(),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

use clap::Parser;

use crate::{
    config::{ConfigSources, PORT_KEY},
    profile::PROFILES_KEY,
};

/// Command-line overrides. These take precedence over the environment.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "demo-endpoints", version, about = "Sample application with configuration-dependent endpoints")]
pub struct Cli {
    /// Active profile(s), comma separated. Overrides `PROFILES_ACTIVE`.
    #[arg(long)]
    pub profiles: Option<String>,

    /// Port to listen on. Overrides `SERVER_PORT`.
    #[arg(long)]
    pub port: Option<u16>,

    /// Arbitrary `key=value` override, e.g. `--set some.second.property=someValue`.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub overrides: Vec<(String, String)>,
}

impl Cli {
    /// Layers these arguments over `sources` as explicit overrides.
    pub fn apply(self, sources: ConfigSources) -> ConfigSources {
        let mut sources = self
            .overrides
            .into_iter()
            .fold(sources, |sources, (key, value)| sources.with_override(key, value));
        if let Some(profiles) = self.profiles {
            sources = sources.with_override(PROFILES_KEY, profiles);
        }
        if let Some(port) = self.port {
            sources = sources.with_override(PORT_KEY, port.to_string());
        }
        sources
    }
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

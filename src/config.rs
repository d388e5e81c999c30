//! Layered runtime settings
//!
//! Precedence, lowest first: built-in defaults, the settings file, `FIREWALL_*`
//! environment variables, command-line flags.

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::proxy::{ProxyConfig, TargetUrl};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub use config::ConfigError;

const DEFAULT_SETTINGS_FILE: &str = "config/default";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub rules: RulesSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamSettings {
    pub service_addr: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RulesSettings {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl Settings {
    /// Build the settings from every layer, with `cli` on top
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        let settings = Config::builder()
            .set_default("server.listen_addr", "0.0.0.0:8080")?
            .set_default("upstream.timeout_ms", 30_000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(file)
            .add_source(
                Environment::with_prefix("FIREWALL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("upstream.service_addr", cli.service_addr.clone())?
            .set_override_option(
                "rules.path",
                cli.conf
                    .as_ref()
                    .map(|path| path.to_string_lossy().into_owned()),
            )?
            .set_override_option("server.listen_addr", cli.addr.clone())?
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen_addr
            .parse()
            .map_err(|e| Error::invalid_setting("server.listen_addr", format!("{e}")))
    }

    pub fn target_url(&self) -> Result<TargetUrl> {
        TargetUrl::try_new(self.upstream.service_addr.clone()).map_err(|_| {
            Error::invalid_setting(
                "upstream.service_addr",
                format!(
                    "{:?} is not an http:// base URL",
                    self.upstream.service_addr
                ),
            )
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream.timeout_ms)
    }

    /// Validated proxy configuration derived from these settings
    pub fn proxy_config(&self) -> Result<ProxyConfig> {
        if self.upstream.timeout_ms == 0 {
            return Err(Error::invalid_setting(
                "upstream.timeout_ms",
                "must be greater than zero",
            ));
        }
        Ok(ProxyConfig::new(self.target_url()?).with_upstream_timeout(self.upstream_timeout()))
    }
}

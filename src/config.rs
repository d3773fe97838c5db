//! Client configuration: server variant, defaults, then file and env layering.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    APP_NAME, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_TIMEOUT_SECS, DOCKER_DEFAULT_PORT,
    PIP_DEFAULT_PORT,
};
use crate::error::LettaError;
use crate::util::{env_first, normalize_url};

/// How the Letta server was deployed. The two disagree on default port and
/// on the memory payload they accept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerVariant {
    #[default]
    Pip,
    Docker,
}

impl ServerVariant {
    pub fn default_port(self) -> u16 {
        match self {
            ServerVariant::Pip => PIP_DEFAULT_PORT,
            ServerVariant::Docker => DOCKER_DEFAULT_PORT,
        }
    }

    /// The pip server owns 8333; everything else is assumed to be docker.
    pub fn from_port(port: u16) -> Self {
        if port == PIP_DEFAULT_PORT {
            ServerVariant::Pip
        } else {
            ServerVariant::Docker
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServerVariant::Pip => "pip",
            ServerVariant::Docker => "docker",
        }
    }
}

impl fmt::Display for ServerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerVariant {
    type Err = LettaError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "pip" => Ok(ServerVariant::Pip),
            "docker" => Ok(ServerVariant::Docker),
            other => Err(LettaError::Config(format!(
                "unknown server type {other:?} (expected \"pip\" or \"docker\")"
            ))),
        }
    }
}

/// Fully resolved settings for a [`crate::LettaClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub server_type: ServerVariant,
    pub timeout: Duration,
    /// Sent as a bearer token when the server is password protected.
    pub api_key: Option<String>,
    /// Extra headers sent with every request.
    pub headers: HashMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig::for_host(DEFAULT_HOST, None, None)
    }
}

impl ClientConfig {
    pub fn new(base_url: &str, server_type: ServerVariant) -> Self {
        ClientConfig {
            base_url: normalize_url(base_url),
            server_type,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            api_key: None,
            headers: HashMap::new(),
        }
    }

    /// Build from the host/port/server-type triple.
    ///
    /// A missing port comes from the server type; a missing server type is
    /// inferred from the port.
    pub fn for_host(host: &str, port: Option<u16>, server_type: Option<ServerVariant>) -> Self {
        let server_type = match (server_type, port) {
            (Some(variant), _) => variant,
            (None, Some(port)) => ServerVariant::from_port(port),
            (None, None) => ServerVariant::default(),
        };
        let port = port.unwrap_or_else(|| server_type.default_port());
        ClientConfig::new(&host_url(host, port), server_type)
    }

    /// Build from a base URL, inferring the server type from its port.
    pub fn for_url(base_url: &str) -> Self {
        let mut config = ClientConfig::new(base_url, ServerVariant::default());
        config.set_base_url(base_url);
        config
    }

    /// Point at `base_url`. An explicit port decides the server type;
    /// without one the current server type is kept.
    pub fn set_base_url(&mut self, base_url: &str) {
        self.base_url = normalize_url(base_url);
        if let Some(port) = Url::parse(&self.base_url).ok().and_then(|url| url.port()) {
            self.server_type = ServerVariant::from_port(port);
        }
    }

    /// Replace parts of the current endpoint, keeping the rest.
    ///
    /// A new port re-infers the server type unless one is given. A server
    /// type on its own moves to that variant's default port. A missing host
    /// keeps the current host and scheme.
    pub fn override_endpoint(
        &mut self,
        host: Option<&str>,
        port: Option<u16>,
        server_type: Option<ServerVariant>,
    ) {
        if host.is_none() && port.is_none() && server_type.is_none() {
            return;
        }
        let current = Url::parse(&self.base_url).ok();
        let resolved_type = match (server_type, port) {
            (Some(variant), _) => variant,
            (None, Some(port)) => ServerVariant::from_port(port),
            (None, None) => self.server_type,
        };
        let port = match (port, server_type) {
            (Some(port), _) => port,
            (None, Some(variant)) => variant.default_port(),
            (None, None) => current
                .as_ref()
                .and_then(|url| url.port())
                .unwrap_or_else(|| resolved_type.default_port()),
        };

        self.base_url = match host {
            Some(host) => host_url(host, port),
            None => current
                .and_then(|mut url| {
                    url.set_port(Some(port)).ok()?;
                    Some(url.as_str().trim_end_matches('/').to_string())
                })
                .unwrap_or_else(|| host_url(DEFAULT_HOST, port)),
        };
        self.server_type = resolved_type;
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Resolve configuration from the config file (if any) and the environment.
    pub fn load() -> Result<(Self, ConfigSource)> {
        let (file, source) = ConfigFile::load()?;
        let api_key_env = file.api_key_env.clone();
        let mut config = file.into_config();
        if let Some(var) = api_key_env {
            config.api_key = env_first(&[var.as_str()]);
        }
        config.apply_env_with(env_first)?;
        Ok((config, source))
    }

    /// Overlay `LETTA_*` variables looked up through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&[&str]) -> Option<String>,
    {
        let explicit_type = match lookup(&["LETTA_SERVER_TYPE"]) {
            Some(raw) => Some(raw.parse::<ServerVariant>()?),
            None => None,
        };

        if let Some(url) = lookup(&["LETTA_SERVER_URL", "LETTA_BASE_URL"]) {
            self.set_base_url(&url);
        }
        if let Some(variant) = explicit_type {
            self.server_type = variant;
        }
        if let Some(raw) = lookup(&["LETTA_TIMEOUT_SECS"]) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("parse LETTA_TIMEOUT_SECS={raw:?}"))?;
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(key) = lookup(&["LETTA_API_KEY", "LETTA_SERVER_PASSWORD"]) {
            self.api_key = Some(key);
        }
        Ok(())
    }
}

// ── Config file ──────────────────────────────────────────────────────

/// On-disk `letta.json`. Every field is optional.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub server_type: Option<ServerVariant>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Name of the environment variable holding the server API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Where the configuration was loaded from.
#[derive(Clone, Debug)]
pub enum ConfigSource {
    Defaults,
    File(PathBuf),
}

impl ConfigSource {
    pub fn label(&self) -> String {
        match self {
            ConfigSource::Defaults => "built-in defaults".to_string(),
            ConfigSource::File(path) => path.display().to_string(),
        }
    }
}

impl ConfigFile {
    /// Look in `$LETTA_CONFIG_JSON`, then `./letta.json`, then the user config dir.
    pub fn load() -> Result<(Self, ConfigSource)> {
        if let Ok(path) = env::var("LETTA_CONFIG_JSON") {
            let path = PathBuf::from(path);
            return Ok((Self::load_from_path(&path)?, ConfigSource::File(path)));
        }

        let cwd_path = PathBuf::from(CONFIG_FILE_NAME);
        if cwd_path.exists() {
            return Ok((Self::load_from_path(&cwd_path)?, ConfigSource::File(cwd_path)));
        }

        if let Some(config_path) = config_dir_file(CONFIG_FILE_NAME) {
            if config_path.exists() {
                return Ok((
                    Self::load_from_path(&config_path)?,
                    ConfigSource::File(config_path),
                ));
            }
        }

        Ok((ConfigFile::default(), ConfigSource::Defaults))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read letta config from {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("parse letta config from {}", path.display()))?;
        Ok(config)
    }

    pub fn into_config(self) -> ClientConfig {
        let mut config = match self.base_url {
            Some(url) => {
                let mut config = ClientConfig::for_url(&url);
                if let Some(variant) = self.server_type {
                    config.server_type = variant;
                }
                config
            }
            None => ClientConfig::for_host(
                self.host.as_deref().unwrap_or(DEFAULT_HOST),
                self.port,
                self.server_type,
            ),
        };
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config.headers = self.headers;
        config
    }
}

/// Letta servers speak plain HTTP unless the host names its own scheme.
fn host_url(host: &str, port: u16) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        format!("{host}:{port}")
    } else {
        format!("http://{host}:{port}")
    }
}

fn config_dir_file(filename: &str) -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", APP_NAME, APP_NAME)?;
    Some(proj_dirs.config_dir().join(filename))
}

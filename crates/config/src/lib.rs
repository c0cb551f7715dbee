use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "vicinity.toml",
    "config/vicinity.toml",
    "crates/config/vicinity.toml",
    "../vicinity.toml",
    "../config/vicinity.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://vicinity.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Settings for the proximity discovery query surface.
///
/// ```
/// use vicinity_config::DiscoveryConfig;
///
/// let discovery = DiscoveryConfig::default();
/// assert_eq!(discovery.radius_km, 50.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "DiscoveryConfig::default_radius_km")]
    pub radius_km: f64,
}

impl DiscoveryConfig {
    const fn default_radius_km() -> f64 {
        50.0
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            radius_km: Self::default_radius_km(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use vicinity_config::load;
///
/// std::env::remove_var("VICINITY_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder();
    builder = builder
        .set_default("http.address", defaults.http.address.clone())
        .unwrap()
        .set_default("http.port", i64::from(defaults.http.port))
        .unwrap()
        .set_default("database.url", defaults.database.url.clone())
        .unwrap()
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )
        .unwrap()
        .set_default("discovery.radius_km", defaults.discovery.radius_km)
        .unwrap();

    let environment_overrides = config::Environment::with_prefix("VICINITY").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("VICINITY_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via VICINITY_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(?config, "loaded backend configuration");
    Ok(config)
}

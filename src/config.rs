use config::{Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Scheme used for gateway requests (http or https).
    pub api_scheme: String,
    /// Host of the remote mail gateway.
    pub api_host: String,
    /// Default polling interval for the listener, in milliseconds.
    pub poll_interval_ms: u64,
    pub log: LogConfig,
}

impl Settings {
    pub fn new(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("api_scheme", "https")?
            .set_default("api_host", "api.mail.tm")?
            .set_default("poll_interval_ms", 10_000)?
            .set_default("log.level", "info")?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }

        // e.g. `DROPMAIL__API_HOST=...` overrides `api_host`
        builder = builder.add_source(
            Environment::with_prefix("DROPMAIL")
                .separator("__")
                .ignore_empty(true),
        );

        builder.build()?.try_deserialize()
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_scheme: "https".to_string(),
            api_host: "api.mail.tm".to_string(),
            poll_interval_ms: 10_000,
            log: LogConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied_without_a_config_file() {
        let settings = Settings::new(None).unwrap();
        assert_eq!(settings.api_scheme, "https");
        assert_eq!(settings.api_host, "api.mail.tm");
        assert_eq!(settings.poll_interval_ms, 10_000);
        assert_eq!(settings.log.level, "info");
    }
}

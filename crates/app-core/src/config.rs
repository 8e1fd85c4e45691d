//! Layered configuration: a YAML file overlaid by prefixed environment
//! variables.
//!
//! Keys are dotted paths (`oauth.facebook.client_id`). An environment variable
//! overrides a key by joining the prefix and the upper-cased path segments with
//! `__`, e.g. `APP__OAUTH__FACEBOOK__CLIENT_SECRET`.

use std::path::{Path, PathBuf};

use config::{Config as RawConfig, Environment, File};
use serde::de::DeserializeOwned;
use thiserror::Error;

const DEFAULT_ENV_PREFIX: &str = "APP";
const ENV_SEPARATOR: &str = "__";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load or parse configuration")]
    Load(#[from] config::ConfigError),
}

/// Read-only application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    inner: RawConfig,
}

impl Config {
    pub fn builder<P: AsRef<Path>>(path: P) -> ConfigBuilder {
        ConfigBuilder::new(path.as_ref().to_path_buf())
    }

    #[cfg(feature = "testing")]
    pub fn builder_test() -> test_utils::TestConfigBuilder {
        test_utils::TestConfigBuilder::new()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        self.inner.get(key).map_err(ConfigError::from)
    }

    /// Like [`Config::get`], falling back to `default` when the key is absent
    /// or has the wrong shape.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }
}

pub struct ConfigBuilder {
    path: PathBuf,
    required: bool,
    env_prefix: Option<String>,
}

impl ConfigBuilder {
    fn new(path: PathBuf) -> Self {
        Self { path, required: true, env_prefix: Some(DEFAULT_ENV_PREFIX.to_string()) }
    }

    /// Allows the file to be missing; values then come from the environment only.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let mut builder = RawConfig::builder().add_source(File::from(self.path.as_path()).required(self.required));

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(Environment::with_prefix(prefix).separator(ENV_SEPARATOR));
        }

        let inner = builder.build()?;
        tracing::info!(path = %self.path.display(), env_prefix = ?self.env_prefix, "Configuration loaded");

        Ok(Config { inner })
    }
}

#[cfg(feature = "testing")]
pub mod test_utils {
    use std::collections::HashMap;

    use config::Value;

    use super::*;

    #[derive(Default)]
    pub struct TestConfigBuilder {
        values: HashMap<String, Value>,
    }

    impl TestConfigBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with<T: Into<Value>>(mut self, key: &str, value: T) -> Self {
            self.values.insert(key.to_string(), value.into());
            self
        }

        pub fn build(self) -> Config {
            let mut builder = RawConfig::builder();

            for (key, value) in self.values {
                builder = builder.set_override(key, value).expect("Invalid test config key");
            }

            Config { inner: builder.build().expect("Failed to create config from test values") }
        }
    }
}

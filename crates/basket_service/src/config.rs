//! Service configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `BASKET__*` environment variables (for example
//! `BASKET__PORT=9000` or `BASKET__TRAINING__PARAMS__MIN_SUPPORT=0.03`).

use basket_trainer::TrainingConfig;
use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ServiceError;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "BASKET";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Transaction CSV used for startup training and retrains
    pub data_path: PathBuf,
    /// Model snapshot loaded at startup and rewritten on retrain
    pub model_path: PathBuf,
    pub training: TrainingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            data_path: PathBuf::from("data/transactions.csv"),
            model_path: PathBuf::from("models/recommender_model.json"),
            training: TrainingConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ServiceError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(ConfigFile::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config
            .training
            .validate()
            .map_err(|e| ServiceError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // `load` reads the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_default_layout() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.model_path, PathBuf::from("models/recommender_model.json"));
        assert_eq!(config.training.params.min_support, 0.05);
        assert_eq!(config.training.fallback_min_support, Some(0.02));
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "port = 9100").unwrap();
        writeln!(file, "data_path = \"fixtures/shop.csv\"").unwrap();
        writeln!(file, "[training]").unwrap();
        writeln!(file, "parallel = false").unwrap();
        writeln!(file, "[training.params]").unwrap();
        writeln!(file, "min_support = 0.1").unwrap();
        writeln!(file, "min_confidence = 0.5").unwrap();
        writeln!(file, "min_lift = 1.2").unwrap();
        file.flush().unwrap();

        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let config = ServiceConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.data_path, PathBuf::from("fixtures/shop.csv"));
        assert!(!config.training.parallel);
        assert_eq!(config.training.params.min_support, 0.1);
        assert_eq!(config.training.params.min_lift, 1.2);
    }

    #[test]
    fn out_of_range_thresholds_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[training.params]").unwrap();
        writeln!(file, "min_support = 0.0").unwrap();
        writeln!(file, "min_confidence = 0.3").unwrap();
        writeln!(file, "min_lift = 1.0").unwrap();
        file.flush().unwrap();

        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        assert!(ServiceConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn invalid_fallback_support_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[training]").unwrap();
        writeln!(file, "fallback_min_support = 0.0").unwrap();
        file.flush().unwrap();

        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let err = ServiceConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidConfig(_)));
    }

    #[test]
    fn environment_overrides_file_and_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "port = 9100").unwrap();
        writeln!(file, "host = \"127.0.0.1\"").unwrap();
        file.flush().unwrap();

        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::set_var("BASKET__PORT", "9123");
        std::env::set_var("BASKET__TRAINING__PARAMS__MIN_SUPPORT", "0.03");
        let loaded = ServiceConfig::load(Some(file.path()));
        std::env::remove_var("BASKET__PORT");
        std::env::remove_var("BASKET__TRAINING__PARAMS__MIN_SUPPORT");

        let config = loaded.unwrap();
        assert_eq!(config.port, 9123);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.training.params.min_support, 0.03);
        assert_eq!(config.training.fallback_min_support, Some(0.02));
    }
}

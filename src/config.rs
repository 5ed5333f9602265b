use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

const APP_NAME: &str = "APP_NAME";
const ENVIRONMENT: &str = "ENVIRONMENT";
const LOG_LEVEL: &str = "LOG_LEVEL";
const DISPATCH_TIMEOUT_MS: &str = "DISPATCH_TIMEOUT_MS";
const EVENT_HISTORY: &str = "EVENT_HISTORY";

const DEFAULT_APP_NAME: &str = "financial-api-response-module";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_EVENT_HISTORY: usize = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for environment variable {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app_name: String,
    pub environment: String,
    pub log_level: Level,
    /// Caller-side deadline for dispatches; `None` waits for every handler
    pub dispatch_timeout: Option<Duration>,
    pub event_history: usize,
}

impl Config {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn try_from_env() -> Result<Config, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let app_name = lookup(APP_NAME).unwrap_or(defaults.app_name);
        let environment = lookup(ENVIRONMENT).unwrap_or(defaults.environment);

        let log_level = match lookup(LOG_LEVEL) {
            Some(value) => parse(LOG_LEVEL, value.trim())?,
            None => defaults.log_level,
        };

        let dispatch_timeout = match lookup(DISPATCH_TIMEOUT_MS) {
            Some(value) => Some(Duration::from_millis(parse(DISPATCH_TIMEOUT_MS, value.trim())?)),
            None => defaults.dispatch_timeout,
        };

        let event_history = match lookup(EVENT_HISTORY) {
            Some(value) => parse(EVENT_HISTORY, value.trim())?,
            None => defaults.event_history,
        };

        Ok(Config {
            app_name,
            environment,
            log_level,
            dispatch_timeout,
            event_history,
        })
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app_name: DEFAULT_APP_NAME.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            log_level: Level::INFO,
            dispatch_timeout: None,
            event_history: DEFAULT_EVENT_HISTORY,
        }
    }
}

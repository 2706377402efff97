use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_RELAY_PORT: u16 = 3000;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the document API service.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Object-store bucket holding raw document content.
    pub bucket_name: String,
    /// Key-value table holding document metadata records.
    pub table_name: String,
    /// Inference model identifier passed to the analysis provider.
    pub model_id: String,
    /// Backend used to run document analysis.
    pub analysis_provider: AnalysisProvider,
    /// Base URL of the HTTP inference endpoint, required for [`AnalysisProvider::Http`].
    pub analysis_url: Option<String>,
    /// Optional region override for the AWS clients.
    pub aws_region: Option<String>,
    /// Optional endpoint override for S3/DynamoDB-compatible local stacks.
    pub aws_endpoint_url: Option<String>,
    /// Port the HTTP API listens on.
    pub server_port: u16,
}

/// Supported inference backends for the analysis step.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisProvider {
    /// Managed inference via the Bedrock runtime API.
    Bedrock,
    /// Plain HTTP endpoint accepting the same invocation body.
    Http,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let analysis_provider = match load_env_optional("ANALYSIS_PROVIDER") {
            Some(value) => value
                .parse()
                .map_err(|()| ConfigError::InvalidValue("ANALYSIS_PROVIDER".to_string()))?,
            None => AnalysisProvider::Bedrock,
        };
        let analysis_url = load_env_optional("ANALYSIS_URL");
        if analysis_provider == AnalysisProvider::Http && analysis_url.is_none() {
            return Err(ConfigError::MissingVariable("ANALYSIS_URL".to_string()));
        }

        Ok(Self {
            bucket_name: load_env("BUCKET_NAME")?,
            table_name: load_env("TABLE_NAME")?,
            model_id: load_env("BEDROCK_MODEL_ID")?,
            analysis_provider,
            analysis_url,
            aws_region: load_env_optional("AWS_REGION"),
            aws_endpoint_url: load_env_optional("AWS_ENDPOINT_URL"),
            server_port: parse_port("SERVER_PORT", DEFAULT_SERVER_PORT)?,
        })
    }
}

/// Runtime configuration for the front-end relay.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Upstream API base URL that `/api/*` requests are forwarded to.
    pub api_endpoint: String,
    /// API key injected into every proxied request.
    pub api_key: String,
    /// Port the relay listens on.
    pub port: u16,
    /// Directory served as static content.
    pub static_dir: String,
    /// Deployment environment label reported by `/health`.
    pub environment: String,
}

impl RelayConfig {
    /// Load relay configuration, reporting every missing required variable at once.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(load_env_optional)
    }

    /// Build relay configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_endpoint = lookup("API_ENDPOINT");
        let api_key = lookup("API_KEY");

        let missing: Vec<&str> = [("API_ENDPOINT", &api_endpoint), ("API_KEY", &api_key)]
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect();
        let (Some(api_endpoint), Some(api_key)) = (api_endpoint, api_key) else {
            return Err(ConfigError::MissingVariable(missing.join(", ")));
        };

        let port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".into()))?,
            None => DEFAULT_RELAY_PORT,
        };

        Ok(Self {
            api_endpoint,
            api_key,
            port,
            static_dir: lookup("STATIC_DIR").unwrap_or_else(|| "public".to_string()),
            environment: lookup("DEPLOY_ENV").unwrap_or_else(|| "development".to_string()),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_port(key: &str, default: u16) -> Result<u16, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.into()))
        })
        .transpose()
        .map(|port| port.unwrap_or(default))
}

impl std::str::FromStr for AnalysisProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bedrock" => Ok(Self::Bedrock),
            "http" => Ok(Self::Http),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        bucket = %config.bucket_name,
        table = %config.table_name,
        model_id = %config.model_id,
        analysis_provider = ?config.analysis_provider,
        server_port = config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}

#[cfg(test)]
mod tests {
    use super::{AnalysisProvider, ConfigError, RelayConfig};
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn relay_config_reports_all_missing_variables() {
        let error = RelayConfig::from_lookup(lookup_from(&[])).unwrap_err();
        match error {
            ConfigError::MissingVariable(names) => assert_eq!(names, "API_ENDPOINT, API_KEY"),
            other => panic!("unexpected error: {other:?}"),
        }

        let error = RelayConfig::from_lookup(lookup_from(&[("API_KEY", "secret")])).unwrap_err();
        assert!(error.to_string().ends_with("API_ENDPOINT"));
    }

    #[test]
    fn relay_config_applies_defaults() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("API_ENDPOINT", "https://api.example.org/prod"),
            ("API_KEY", "secret"),
        ]))
        .expect("config");
        assert_eq!(config.port, 3000);
        assert_eq!(config.static_dir, "public");
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn relay_config_rejects_invalid_port() {
        let error = RelayConfig::from_lookup(lookup_from(&[
            ("API_ENDPOINT", "https://api.example.org"),
            ("API_KEY", "secret"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(name) if name == "PORT"));
    }

    #[test]
    fn analysis_provider_parses_case_insensitively() {
        assert_eq!("Bedrock".parse::<AnalysisProvider>(), Ok(AnalysisProvider::Bedrock));
        assert_eq!("HTTP".parse::<AnalysisProvider>(), Ok(AnalysisProvider::Http));
        assert_eq!("ollama".parse::<AnalysisProvider>(), Err(()));
    }
}

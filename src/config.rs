use crate::{format::aws::RHEL_OWNER_ID, index::DEFAULT_PAGE_SIZE, transform::MappingPolicy};
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the transform pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// AWS accounts whose images are accepted by the AWS transformer.
    pub aws_owner_ids: Vec<String>,
    /// Entries per page in the date-sorted listings.
    pub index_page_size: usize,
    /// Handling of AWS records that fail to map.
    pub aws_mapping_policy: MappingPolicy,
    /// Handling of Azure records that fail to map.
    pub azure_mapping_policy: MappingPolicy,
    /// Handling of Google records that fail to map.
    pub google_mapping_policy: MappingPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aws_owner_ids: vec![RHEL_OWNER_ID.to_string()],
            index_page_size: DEFAULT_PAGE_SIZE,
            aws_mapping_policy: MappingPolicy::Abort,
            azure_mapping_policy: MappingPolicy::Skip,
            google_mapping_policy: MappingPolicy::Abort,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults for unset values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            aws_owner_ids: load_env_optional("AWS_RHEL_OWNER_IDS")
                .map(|value| parse_owner_ids(&value))
                .transpose()?
                .unwrap_or(defaults.aws_owner_ids),
            index_page_size: load_env_optional("INDEX_PAGE_SIZE")
                .map(|value| match value.trim().parse::<usize>() {
                    Ok(size) if size > 0 => Ok(size),
                    _ => Err(ConfigError::InvalidValue("INDEX_PAGE_SIZE".into())),
                })
                .transpose()?
                .unwrap_or(defaults.index_page_size),
            aws_mapping_policy: load_policy("AWS_MAPPING_POLICY")?
                .unwrap_or(defaults.aws_mapping_policy),
            azure_mapping_policy: load_policy("AZURE_MAPPING_POLICY")?
                .unwrap_or(defaults.azure_mapping_policy),
            google_mapping_policy: load_policy("GOOGLE_MAPPING_POLICY")?
                .unwrap_or(defaults.google_mapping_policy),
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_policy(key: &str) -> Result<Option<MappingPolicy>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|()| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn parse_owner_ids(value: &str) -> Result<Vec<String>, ConfigError> {
    let ids: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect();
    if ids.is_empty() {
        Err(ConfigError::InvalidValue("AWS_RHEL_OWNER_IDS".into()))
    } else {
        Ok(ids)
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment (and `.env`) and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_preserve_provider_policies() {
        let config = Config::default();
        assert_eq!(config.aws_owner_ids, vec![RHEL_OWNER_ID.to_string()]);
        assert_eq!(config.index_page_size, 50);
        assert_eq!(config.aws_mapping_policy, MappingPolicy::Abort);
        assert_eq!(config.azure_mapping_policy, MappingPolicy::Skip);
        assert_eq!(config.google_mapping_policy, MappingPolicy::Abort);
    }

    #[test]
    fn owner_ids_are_split_and_trimmed() {
        assert_eq!(
            parse_owner_ids(" 309956199498, 123456789012 ,").unwrap(),
            vec!["309956199498".to_string(), "123456789012".to_string()]
        );
        assert!(matches!(
            parse_owner_ids(" , "),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}

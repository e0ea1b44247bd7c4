use std::fmt;

use common::Config;

use crate::error::ConfigurationError;

/// The two secrets an agent needs. Values never appear in Debug output.
#[derive(Clone)]
pub struct Credentials {
    model_api_key: String,
    search_api_key: String,
}

impl Credentials {
    pub fn new(model_api_key: impl Into<String>, search_api_key: impl Into<String>) -> Self {
        Self {
            model_api_key: model_api_key.into(),
            search_api_key: search_api_key.into(),
        }
    }

    /// Read both keys from the env vars named in the config.
    /// Call once at startup, after `.env` has been loaded.
    pub fn from_env(config: &Config) -> Result<Self, ConfigurationError> {
        Self::from_lookup(config, |var| std::env::var(var).ok())
    }

    /// Same as [`Credentials::from_env`] with an injectable variable lookup.
    /// Empty values count as missing.
    pub fn from_lookup<F>(config: &Config, lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |var: &str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigurationError::MissingCredential { var: var.to_string() })
        };

        let model_api_key = require(&config.model.api_key_env)?;
        let search_api_key = require(&config.search.api_key_env)?;

        Ok(Self { model_api_key, search_api_key })
    }

    pub fn model_api_key(&self) -> &str {
        &self.model_api_key
    }

    pub fn search_api_key(&self) -> &str {
        &self.search_api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("model_api_key", &"<redacted>")
            .field("search_api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn both_keys_present() {
        let creds = Credentials::from_lookup(
            &Config::default(),
            lookup(&[("GOOGLE_API_KEY", "g"), ("FIRECRAWL_API_KEY", "f")]),
        )
        .expect("credentials");

        assert_eq!(creds.model_api_key(), "g");
        assert_eq!(creds.search_api_key(), "f");
    }

    #[test]
    fn missing_search_key_is_named() {
        let err = Credentials::from_lookup(&Config::default(), lookup(&[("GOOGLE_API_KEY", "g")]))
            .unwrap_err();

        assert_eq!(err.to_string(), "FIRECRAWL_API_KEY is not set");
    }

    #[test]
    fn empty_model_key_counts_as_missing() {
        let err = Credentials::from_lookup(
            &Config::default(),
            lookup(&[("GOOGLE_API_KEY", ""), ("FIRECRAWL_API_KEY", "f")]),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigurationError::MissingCredential { ref var } if var == "GOOGLE_API_KEY"
        ));
    }

    #[test]
    fn env_var_names_come_from_config() {
        let mut config = Config::default();
        config.model.api_key_env = "OPENAI_API_KEY".to_string();

        let creds = Credentials::from_lookup(
            &config,
            lookup(&[("OPENAI_API_KEY", "o"), ("FIRECRAWL_API_KEY", "f")]),
        )
        .expect("credentials");
        assert_eq!(creds.model_api_key(), "o");
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", Credentials::new("secret-1", "secret-2"));
        assert!(!rendered.contains("secret-1"));
        assert!(!rendered.contains("secret-2"));
    }
}

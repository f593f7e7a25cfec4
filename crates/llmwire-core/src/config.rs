use crate::error::LlmError;
use crate::providers::{ProviderIdentity, identities};
use crate::request::compose_url;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Configuration for one OpenAI-compatible provider
#[derive(Clone)]
pub struct ClientConfig {
    pub identity: ProviderIdentity,
    pub api_key: String,
    /// Overrides the identity's default base URL
    pub base_url: Option<String>,
    pub organization: Option<String>,
    pub project: Option<String>,
    pub timeout_seconds: u64,
    /// Extra headers sent with every request
    pub headers: HashMap<String, String>,
}

impl ClientConfig {
    pub fn new(identity: ProviderIdentity, api_key: impl Into<String>) -> Self {
        Self {
            identity,
            api_key: api_key.into(),
            base_url: None,
            organization: None,
            project: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            headers: HashMap::new(),
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new(identities::OPENAI, api_key)
    }

    pub fn xai(api_key: impl Into<String>) -> Self {
        Self::new(identities::XAI, api_key)
    }

    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new(identities::GROQ, api_key)
    }

    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new(identities::OPENROUTER, api_key)
    }

    pub fn deepseek(api_key: impl Into<String>) -> Self {
        Self::new(identities::DEEPSEEK, api_key)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(self.identity.default_base_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Headers added to every request, excluding authorization
    pub fn headers(&self) -> HashMap<String, String> {
        let mut headers = self.headers.clone();
        if let Some(org) = &self.organization {
            headers.insert("OpenAI-Organization".to_string(), org.clone());
        }
        if let Some(project) = &self.project {
            headers.insert("OpenAI-Project".to_string(), project.clone());
        }
        headers
    }

    /// Validate for direct mode: a key plus a usable endpoint
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::configuration(format!(
                "API key is required (set {})",
                self.identity.env_key
            )));
        }
        self.validate_endpoint()
    }

    /// Validate base URL and timeout only, for proxied mode
    pub fn validate_endpoint(&self) -> Result<(), LlmError> {
        compose_url(self.base_url(), "").map_err(|e| {
            LlmError::configuration(format!("Base URL must be a valid HTTP/HTTPS URL: {e}"))
        })?;
        if self.timeout_seconds == 0 {
            return Err(LlmError::configuration("Timeout must be at least one second"));
        }
        Ok(())
    }

    /// Build from `<PROVIDER>_API_KEY` and optional `<PROVIDER>_BASE_URL`
    pub fn from_env(identity: ProviderIdentity) -> Result<Self, LlmError> {
        Self::from_lookup(identity, |key| std::env::var(key).ok())
    }

    fn from_lookup(
        identity: ProviderIdentity,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LlmError> {
        let api_key = lookup(identity.env_key).ok_or_else(|| {
            LlmError::configuration(format!("{} environment variable not set", identity.env_key))
        })?;

        let mut config = Self::new(identity, api_key);
        if let Some(base_url) = lookup(&identity.base_url_env_key()) {
            config = config.with_base_url(base_url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Read the `[provider]` table of a TOML config file.
    ///
    /// A missing `api_key` falls back to the provider's environment variable.
    pub fn from_toml_file(path: impl AsRef<Path>, provider: &str) -> Result<Self, LlmError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LlmError::configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents, provider)
    }

    pub fn from_toml_str(contents: &str, provider: &str) -> Result<Self, LlmError> {
        Self::from_toml_with_lookup(contents, provider, |key| std::env::var(key).ok())
    }

    fn from_toml_with_lookup(
        contents: &str,
        provider: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LlmError> {
        let identity = identities::find(provider)
            .ok_or_else(|| LlmError::configuration(format!("Unknown provider '{provider}'")))?;

        let mut tables: toml::Table = toml::from_str(contents)
            .map_err(|e| LlmError::configuration(format!("Invalid config file: {e}")))?;
        // Exact name first, then aliases in declared order, then any casing
        let key = std::iter::once(identity.name)
            .chain(identity.aliases.iter().copied())
            .find(|key| tables.contains_key(*key))
            .map(str::to_string)
            .or_else(|| tables.keys().find(|key| identity.matches(key)).cloned())
            .ok_or_else(|| {
                LlmError::configuration(format!("No [{}] section in config file", identity.name))
            })?;
        let section: ProviderSection = match tables.remove(&key) {
            Some(value) => value.try_into().map_err(|e| {
                LlmError::configuration(format!("Invalid [{key}] section: {e}"))
            })?,
            None => ProviderSection::default(),
        };

        let api_key = section
            .api_key
            .or_else(|| lookup(identity.env_key))
            .unwrap_or_default();

        let config = Self {
            identity,
            api_key,
            base_url: section.base_url,
            organization: section.organization,
            project: section.project,
            timeout_seconds: section.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            headers: section.headers,
        };
        config.validate()?;
        Ok(config)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("provider", &self.identity.name)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url())
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// One provider table of a config file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProviderSection {
    api_key: Option<String>,
    base_url: Option<String>,
    organization: Option<String>,
    project: Option<String>,
    timeout_seconds: Option<u64>,
    #[serde(default)]
    headers: HashMap<String, String>,
}

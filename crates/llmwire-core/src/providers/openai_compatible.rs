use crate::utils::sse::DONE_SENTINEL;

/// Provider identity metadata
///
/// Every provider listed here speaks the OpenAI wire format; they differ
/// only in where they live and a few streaming details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderIdentity {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub env_key: &'static str,
    pub default_base_url: &'static str,
    /// Whether streaming chat requests may carry `stream_options`
    pub supports_stream_options: bool,
    /// Payload of the frame that ends an event stream
    pub sentinel: Option<&'static str>,
}

impl ProviderIdentity {
    /// Environment variable that overrides the base URL, e.g. `XAI_BASE_URL`
    pub fn base_url_env_key(&self) -> String {
        format!("{}_BASE_URL", self.name.to_uppercase())
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
    }
}

/// Predefined provider identities for OpenAI-compatible APIs
pub mod identities {
    use super::{DONE_SENTINEL, ProviderIdentity};

    pub const OPENAI: ProviderIdentity = ProviderIdentity {
        name: "openai",
        aliases: &["openai", "gpt"],
        env_key: "OPENAI_API_KEY",
        default_base_url: "https://api.openai.com/v1",
        supports_stream_options: true,
        sentinel: Some(DONE_SENTINEL),
    };

    pub const XAI: ProviderIdentity = ProviderIdentity {
        name: "xai",
        aliases: &["xai", "grok"],
        env_key: "XAI_API_KEY",
        default_base_url: "https://api.x.ai/v1",
        supports_stream_options: true,
        sentinel: Some(DONE_SENTINEL),
    };

    pub const GROQ: ProviderIdentity = ProviderIdentity {
        name: "groq",
        aliases: &["groq"],
        env_key: "GROQ_API_KEY",
        default_base_url: "https://api.groq.com/openai/v1",
        supports_stream_options: false,
        sentinel: Some(DONE_SENTINEL),
    };

    pub const OPENROUTER: ProviderIdentity = ProviderIdentity {
        name: "openrouter",
        aliases: &["openrouter"],
        env_key: "OPENROUTER_API_KEY",
        default_base_url: "https://openrouter.ai/api/v1",
        supports_stream_options: true,
        sentinel: Some(DONE_SENTINEL),
    };

    pub const DEEPSEEK: ProviderIdentity = ProviderIdentity {
        name: "deepseek",
        aliases: &["deepseek"],
        env_key: "DEEPSEEK_API_KEY",
        default_base_url: "https://api.deepseek.com/v1",
        supports_stream_options: true,
        sentinel: Some(DONE_SENTINEL),
    };

    pub const ALL: &[ProviderIdentity] = &[OPENAI, XAI, GROQ, OPENROUTER, DEEPSEEK];

    /// Look up a provider by name or alias, ignoring case
    pub fn find(name: &str) -> Option<ProviderIdentity> {
        ALL.iter().copied().find(|identity| identity.matches(name))
    }
}

//! Provider and credential resolution
//!
//! Credentials may arrive through several channels. Resolution is a strict
//! priority chain: each source is tried in order and the first non-empty
//! value wins. The chain itself is the contract; the storage mechanisms
//! behind each source belong to the deployment environment.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use parking_lot::RwLock;

use crate::config::ProviderSettings;
use crate::error::{Error, Result};

/// Service name used for OS keyring lookups
#[cfg(feature = "os-keyring")]
const KEYRING_SERVICE: &str = "docrag";

/// Resolved provider configuration, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Provider identifier
    pub provider: String,
    /// Chat model name
    pub chat_model: String,
    /// Embedding model name
    pub embedding_model: String,
    /// API base URL
    pub api_base_url: String,
    /// Resolved credential
    pub api_key: String,
}

/// Per-provider model and endpoint defaults
struct ProviderDefaults {
    chat_model: &'static str,
    embedding_model: &'static str,
    api_base_url: &'static str,
}

/// Static defaults table; individual fields are overridable from settings
fn defaults_for(provider: &str) -> ProviderDefaults {
    match provider {
        "deepseek" => ProviderDefaults {
            chat_model: "deepseek-chat",
            embedding_model: "text-embedding-ada-002",
            api_base_url: "https://api.deepseek.com",
        },
        "zhipu" => ProviderDefaults {
            chat_model: "glm-4",
            embedding_model: "embedding-3",
            api_base_url: "https://open.bigmodel.cn/api/paas/v4",
        },
        _ => ProviderDefaults {
            chat_model: "gpt-3.5-turbo",
            embedding_model: "text-embedding-ada-002",
            api_base_url: "https://api.openai.com/v1",
        },
    }
}

/// Resolves provider identity and credentials from configured sources
///
/// Resolution is read-only apart from a memoized cache; `resolve_fresh`
/// bypasses the cache for callers that need to observe rotated settings.
pub struct ProviderResolver {
    settings: ProviderSettings,
    cache: RwLock<Option<ProviderConfig>>,
}

impl ProviderResolver {
    /// Create a resolver over the given settings
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            cache: RwLock::new(None),
        }
    }

    /// Resolve the provider configuration, memoized per resolver instance
    pub fn resolve(&self) -> Result<ProviderConfig> {
        if let Some(cached) = self.cache.read().as_ref() {
            return Ok(cached.clone());
        }
        let config = self.resolve_fresh()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    /// Resolve without consulting or updating the cache
    pub fn resolve_fresh(&self) -> Result<ProviderConfig> {
        let provider = self
            .settings
            .provider
            .clone()
            .unwrap_or_else(|| "openai".to_string());
        let api_key = self.resolve_credential(&provider)?;
        let defaults = defaults_for(&provider);

        Ok(ProviderConfig {
            chat_model: self
                .settings
                .chat_model
                .clone()
                .unwrap_or_else(|| defaults.chat_model.to_string()),
            embedding_model: self
                .settings
                .embedding_model
                .clone()
                .unwrap_or_else(|| defaults.embedding_model.to_string()),
            api_base_url: self
                .settings
                .api_base_url
                .clone()
                .unwrap_or_else(|| defaults.api_base_url.to_string()),
            provider,
            api_key,
        })
    }

    /// Walk the credential sources in priority order; first non-empty wins
    fn resolve_credential(&self, provider: &str) -> Result<String> {
        type Source<'a> = (&'static str, Box<dyn Fn() -> Option<String> + 'a>);

        let sources: Vec<Source<'_>> = vec![
            ("api_key", Box::new(|| self.from_unified_key())),
            ("openai_api_key", Box::new(|| self.from_legacy_key())),
            ("api_key_file", Box::new(|| self.from_key_file())),
            ("api_key_base64", Box::new(|| self.from_base64())),
            ("os_keyring", Box::new(|| self.from_keyring(provider))),
        ];

        for (name, source) in &sources {
            if let Some(key) = source() {
                tracing::debug!(source = name, "credential resolved");
                return Ok(key);
            }
        }

        Err(Error::Config(format!(
            "no API key found for provider '{provider}' in any configured source"
        )))
    }

    fn from_unified_key(&self) -> Option<String> {
        non_empty(self.settings.api_key.clone()?)
    }

    fn from_legacy_key(&self) -> Option<String> {
        non_empty(self.settings.openai_api_key.clone()?)
    }

    /// The key is the first line of the file, trimmed
    fn from_key_file(&self) -> Option<String> {
        let path = self.settings.api_key_file.as_ref()?;
        match std::fs::read_to_string(path) {
            Ok(raw) => non_empty(raw.lines().next().unwrap_or("").trim().to_string()),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read API key file");
                None
            }
        }
    }

    fn from_base64(&self) -> Option<String> {
        let encoded = self.settings.api_key_base64.as_ref()?;
        match BASE64.decode(encoded.trim()) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(decoded) => non_empty(decoded.trim().to_string()),
                Err(e) => {
                    tracing::warn!(error = %e, "base64 API key is not valid UTF-8");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to decode base64 API key");
                None
            }
        }
    }

    #[cfg(feature = "os-keyring")]
    fn from_keyring(&self, provider: &str) -> Option<String> {
        let account = format!("{provider}_api_key");
        match keyring::Entry::new(KEYRING_SERVICE, &account) {
            Ok(entry) => match entry.get_password() {
                Ok(key) => non_empty(key.trim().to_string()),
                Err(keyring::Error::NoEntry) => None,
                Err(e) => {
                    tracing::warn!(account = %account, error = %e, "keyring lookup failed");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to open keyring entry");
                None
            }
        }
    }

    #[cfg(not(feature = "os-keyring"))]
    fn from_keyring(&self, _provider: &str) -> Option<String> {
        None
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

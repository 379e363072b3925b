//! VLM provider registry: provider name → chat-completions endpoint and
//! default vision model.
//!
//! Every endpoint here speaks the OpenAI chat-completions wire format, so the
//! picture-description client only needs one request shape. `azure` and
//! `custom` deployments live at user-specific URLs and therefore have no
//! fixed endpoint; they resolve only when `VLM_API_BASE_URL` is set.

use thiserror::Error;

/// Model used when a provider is unknown or has no specific default.
pub const FALLBACK_MODEL: &str = "gpt-4o";

/// Static description of a known provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderEntry {
    pub name: &'static str,
    /// `None` for deployments that must be configured explicitly.
    pub base_url: Option<&'static str>,
    pub default_model: &'static str,
}

static PROVIDERS: &[ProviderEntry] = &[
    ProviderEntry {
        name: "openai",
        base_url: Some("https://api.openai.com/v1/chat/completions"),
        default_model: "gpt-4o",
    },
    ProviderEntry {
        name: "groq",
        base_url: Some("https://api.groq.com/openai/v1/chat/completions"),
        // the 90b vision preview has been decommissioned
        default_model: "llama-3.2-11b-vision-preview",
    },
    ProviderEntry {
        name: "anthropic",
        base_url: Some("https://api.anthropic.com/v1/chat/completions"),
        default_model: "claude-3-5-sonnet-20241022",
    },
    ProviderEntry {
        name: "google",
        base_url: Some("https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"),
        default_model: "gemini-1.5-pro",
    },
    ProviderEntry {
        name: "mistral",
        base_url: Some("https://api.mistral.ai/v1/chat/completions"),
        default_model: "pixtral-12b-2409",
    },
    ProviderEntry {
        name: "azure",
        base_url: None,
        default_model: "gpt-4o",
    },
    ProviderEntry {
        name: "custom",
        base_url: None,
        default_model: FALLBACK_MODEL,
    },
];

/// Errors from provider resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider name is not in the registry and no override URL was given.
    #[error("Unknown VLM provider '{provider}' and no VLM_API_BASE_URL provided.\nSupported providers: {known}")]
    UnknownProvider { provider: String, known: String },

    /// Provider is known but has no fixed endpoint.
    #[error("VLM provider '{provider}' has no default endpoint.\nSet VLM_API_BASE_URL to your deployment's chat-completions URL.")]
    BaseUrlRequired { provider: String },
}

/// A provider resolved to a concrete endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    pub provider: String,
    pub base_url: String,
    pub default_model: String,
}

/// Look up a provider by (case-insensitive) name.
pub fn lookup(name: &str) -> Option<&'static ProviderEntry> {
    let name = name.trim();
    PROVIDERS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Names of all registered providers, in registry order.
pub fn known_providers() -> Vec<&'static str> {
    PROVIDERS.iter().map(|p| p.name).collect()
}

/// Default vision model for `provider`; [`FALLBACK_MODEL`] when unknown.
pub fn default_model(provider: &str) -> &'static str {
    lookup(provider)
        .map(|p| p.default_model)
        .unwrap_or(FALLBACK_MODEL)
}

/// Resolve a provider to its endpoint.
///
/// Precedence: explicit `base_url_override` > registry URL > error.
/// An unknown provider still resolves when an override is supplied, using
/// [`FALLBACK_MODEL`].
pub fn resolve_provider(
    name: &str,
    base_url_override: Option<&str>,
) -> Result<ResolvedProvider, ProviderError> {
    let provider = name.trim().to_ascii_lowercase();
    let override_url = base_url_override
        .map(str::trim)
        .filter(|u| !u.is_empty());

    match (lookup(&provider), override_url) {
        (Some(entry), Some(url)) => Ok(ResolvedProvider {
            provider,
            base_url: url.to_string(),
            default_model: entry.default_model.to_string(),
        }),
        (Some(entry), None) => match entry.base_url {
            Some(url) => Ok(ResolvedProvider {
                provider,
                base_url: url.to_string(),
                default_model: entry.default_model.to_string(),
            }),
            None => Err(ProviderError::BaseUrlRequired { provider }),
        },
        (None, Some(url)) => Ok(ResolvedProvider {
            provider,
            base_url: url.to_string(),
            default_model: FALLBACK_MODEL.to_string(),
        }),
        (None, None) => Err(ProviderError::UnknownProvider {
            provider,
            known: known_providers().join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_provider_has_a_default_model() {
        for name in known_providers() {
            assert!(!default_model(name).is_empty(), "{name}");
        }
    }

    #[test]
    fn fixed_url_providers_resolve_without_override() {
        for entry in PROVIDERS.iter().filter(|p| p.base_url.is_some()) {
            let resolved = resolve_provider(entry.name, None).unwrap();
            assert!(!resolved.base_url.is_empty());
            assert!(!resolved.default_model.is_empty());
        }
    }

    #[test]
    fn azure_and_custom_need_override() {
        for name in ["azure", "custom"] {
            assert_eq!(
                resolve_provider(name, None),
                Err(ProviderError::BaseUrlRequired {
                    provider: name.to_string()
                })
            );
            let resolved = resolve_provider(name, Some("https://my.endpoint/v1/chat")).unwrap();
            assert_eq!(resolved.base_url, "https://my.endpoint/v1/chat");
        }
    }

    #[test]
    fn blank_override_is_ignored() {
        assert!(resolve_provider("azure", Some("   ")).is_err());
    }

    #[test]
    fn unknown_provider_without_override_fails() {
        let err = resolve_provider("acme", None).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider { .. }));
        assert!(err.to_string().contains("openai"));
    }

    #[test]
    fn unknown_provider_with_override_uses_fallback_model() {
        let resolved = resolve_provider("acme", Some("http://localhost:9000/v1/chat/completions")).unwrap();
        assert_eq!(resolved.default_model, FALLBACK_MODEL);
        assert_eq!(resolved.provider, "acme");
    }

    #[test]
    fn override_wins_over_registry() {
        let resolved = resolve_provider("groq", Some("http://proxy/v1/chat/completions")).unwrap();
        assert_eq!(resolved.base_url, "http://proxy/v1/chat/completions");
        assert_eq!(resolved.default_model, "llama-3.2-11b-vision-preview");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("OpenAI").map(|p| p.name), Some("openai"));
        assert_eq!(default_model("nobody"), FALLBACK_MODEL);
    }
}

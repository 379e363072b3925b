//! Pipeline configuration builder: request options + service settings →
//! immutable [`PipelineConfiguration`].
//!
//! A fresh configuration is built for every request and never shared, so
//! options from one request can never leak into another. The builder itself
//! only borrows the settings and holds no mutable state.

use crate::config::ServiceSettings;
use crate::error::ExtractError;
use crate::options::{ExtractionOptions, VlmMode};
use crate::prompts::effective_prompt;
use crate::providers::{self, ProviderError};
use std::fmt;
use tracing::{debug, info, warn};

/// Vision model served locally when the request names none.
pub const DEFAULT_LOCAL_VLM_MODEL: &str = "HuggingFaceTB/SmolVLM-256M-Instruct";

/// Table-structure recognition quality. Fixed to [`TableMode::Accurate`];
/// not a request option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableMode {
    Fast,
    #[default]
    Accurate,
}

/// Why picture description is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledReason {
    /// The request asked for `vlm_mode = none`.
    NotRequested,
    /// API mode without a resolvable credential.
    MissingCredential,
}

/// Tri-state outcome of VLM resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VlmStatus {
    Enabled,
    Disabled(DisabledReason),
    Failed(ProviderError),
}

/// Which VLM (if any) describes pictures for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct VlmResolution {
    pub mode: VlmMode,
    /// Model id sent to the endpoint; empty when the mode is `none`.
    pub effective_model: String,
    pub provider: Option<String>,
    pub api_url: Option<String>,
    /// `Authorization` header value, e.g. `Bearer sk-…`.
    pub auth_header: Option<String>,
    pub prompt: String,
    pub status: VlmStatus,
}

impl VlmResolution {
    pub fn enabled(&self) -> bool {
        self.status == VlmStatus::Enabled
    }
}

impl fmt::Debug for VlmResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VlmResolution")
            .field("mode", &self.mode)
            .field("effective_model", &self.effective_model)
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("auth_header", &self.auth_header.as_ref().map(|_| "<redacted>"))
            .field("status", &self.status)
            .finish()
    }
}

/// Where picture descriptions come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PictureDescriptionKind {
    /// Locally hosted model identified by its repository id.
    Local { repo_id: String },
    /// Remote provider from the registry.
    Api { provider: String },
}

/// Picture-description settings handed to the engine.
#[derive(Clone, PartialEq)]
pub struct PictureDescriptionOptions {
    pub kind: PictureDescriptionKind,
    /// Chat-completions endpoint.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub model: String,
    pub prompt: String,
    /// Minimum fraction of the page a picture must cover to be described.
    /// `0.0` describes every picture regardless of size.
    pub picture_area_threshold: f32,
}

impl fmt::Debug for PictureDescriptionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("PictureDescriptionOptions")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("headers", &header_names)
            .field("model", &self.model)
            .field("picture_area_threshold", &self.picture_area_threshold)
            .finish()
    }
}

/// Immutable configuration for one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfiguration {
    pub do_ocr: bool,
    pub do_table_structure: bool,
    pub table_mode: TableMode,
    /// Whether the engine may call out to remote services.
    pub enable_remote_services: bool,
    /// `None` when picture description is disabled.
    pub picture_description: Option<PictureDescriptionOptions>,
    pub vlm: VlmResolution,
}

impl PipelineConfiguration {
    pub fn describes_pictures(&self) -> bool {
        self.picture_description.is_some()
    }
}

/// Builds [`PipelineConfiguration`]s from request options.
#[derive(Debug, Clone, Copy)]
pub struct PipelineBuilder<'a> {
    settings: &'a ServiceSettings,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(settings: &'a ServiceSettings) -> Self {
        Self { settings }
    }

    /// Resolve the VLM settings for `options`. Never fails: provider errors
    /// are reported as [`VlmStatus::Failed`].
    pub fn resolve_vlm(&self, options: &ExtractionOptions) -> VlmResolution {
        let prompt = effective_prompt(&self.settings.vlm_prompt).to_string();
        let disabled = |reason: DisabledReason| VlmResolution {
            mode: options.vlm_mode,
            effective_model: String::new(),
            provider: None,
            api_url: None,
            auth_header: None,
            prompt: prompt.clone(),
            status: VlmStatus::Disabled(reason),
        };

        match options.vlm_mode {
            VlmMode::None => {
                debug!("VLM mode is none, skipping picture description");
                disabled(DisabledReason::NotRequested)
            }
            VlmMode::Local => {
                let model = options
                    .explicit_model_id()
                    .unwrap_or(DEFAULT_LOCAL_VLM_MODEL)
                    .to_string();
                info!("Local VLM mode: model {} at {}", model, self.settings.vlm_local_url);
                VlmResolution {
                    mode: VlmMode::Local,
                    effective_model: model,
                    provider: None,
                    api_url: Some(self.settings.vlm_local_url.clone()),
                    auth_header: None,
                    prompt,
                    status: VlmStatus::Enabled,
                }
            }
            VlmMode::Api => {
                let provider = self.settings.vlm_api_provider.trim().to_ascii_lowercase();
                let Some(api_key) = self.settings.vlm_credential() else {
                    warn!(
                        "VLM API mode requested but VLM_API_KEY/OPENAI_API_KEY is not set. Skipping image description."
                    );
                    return VlmResolution {
                        provider: Some(provider),
                        ..disabled(DisabledReason::MissingCredential)
                    };
                };

                let resolved = match providers::resolve_provider(
                    &provider,
                    self.settings.vlm_api_base_url.as_deref(),
                ) {
                    Ok(resolved) => resolved,
                    Err(e) => {
                        return VlmResolution {
                            mode: VlmMode::Api,
                            effective_model: String::new(),
                            provider: Some(provider),
                            api_url: None,
                            auth_header: None,
                            prompt,
                            status: VlmStatus::Failed(e),
                        }
                    }
                };

                let model = match options.explicit_model_id() {
                    Some(id) => id.to_string(),
                    None => {
                        info!(
                            "Using default model for {}: {}",
                            resolved.provider, resolved.default_model
                        );
                        resolved.default_model.clone()
                    }
                };
                info!("Using {} VLM provider at: {}", resolved.provider, resolved.base_url);

                VlmResolution {
                    mode: VlmMode::Api,
                    effective_model: model,
                    provider: Some(resolved.provider),
                    api_url: Some(resolved.base_url),
                    auth_header: Some(format!("Bearer {api_key}")),
                    prompt,
                    status: VlmStatus::Enabled,
                }
            }
        }
    }

    /// Build the configuration for one request.
    ///
    /// # Errors
    /// [`ExtractError::Provider`] when API mode has a credential but the
    /// provider cannot be resolved to an endpoint. A missing credential is
    /// not an error.
    pub fn build(&self, options: &ExtractionOptions) -> Result<PipelineConfiguration, ExtractError> {
        debug!(
            "Building pipeline: ocr={}, tables={}, vlm_mode={}, vlm_model_id={:?}",
            options.ocr_enabled, options.table_extraction_enabled, options.vlm_mode, options.vlm_model_id
        );

        let vlm = self.resolve_vlm(options);
        if let VlmStatus::Failed(ref e) = vlm.status {
            return Err(ExtractError::Provider(e.clone()));
        }

        let picture_description = match (&vlm.status, &vlm.api_url) {
            (VlmStatus::Enabled, Some(url)) => {
                let kind = match (vlm.mode, &vlm.provider) {
                    (VlmMode::Api, Some(provider)) => PictureDescriptionKind::Api {
                        provider: provider.clone(),
                    },
                    _ => PictureDescriptionKind::Local {
                        repo_id: vlm.effective_model.clone(),
                    },
                };
                let headers = vlm
                    .auth_header
                    .as_ref()
                    .map(|h| vec![("Authorization".to_string(), h.clone())])
                    .unwrap_or_default();
                Some(PictureDescriptionOptions {
                    kind,
                    url: url.clone(),
                    headers,
                    model: vlm.effective_model.clone(),
                    prompt: vlm.prompt.clone(),
                    picture_area_threshold: 0.0,
                })
            }
            _ => None,
        };

        let enable_remote_services = matches!(
            picture_description,
            Some(PictureDescriptionOptions {
                kind: PictureDescriptionKind::Api { .. },
                ..
            })
        );

        Ok(PipelineConfiguration {
            do_ocr: options.ocr_enabled,
            do_table_structure: options.table_extraction_enabled,
            table_mode: TableMode::Accurate,
            enable_remote_services,
            picture_description,
            vlm,
        })
    }
}

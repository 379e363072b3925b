//! Process-wide service settings.
//!
//! Everything the service reads from its environment lives in
//! [`ServiceSettings`]. It is loaded once at startup, wrapped in an `Arc`,
//! and handed to the pipeline builder and the orchestrator explicitly, so no
//! orchestration code ever reads ambient global state.
//!
//! Sources, later ones winning:
//!
//! 1. built-in defaults
//! 2. `config/default.toml`, then `config/local.toml` (both optional)
//! 3. bare environment variables: `STORAGE_DIR`, `VLM_API_PROVIDER`,
//!    `VLM_API_KEY`, `OPENAI_API_KEY`, `VLM_API_BASE_URL`, `VLM_PROMPT`, …

use crate::error::ExtractError;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Sentinel value of `VLM_PROMPT` meaning "use the built-in prompt".
pub const DEFAULT_PROMPT_SENTINEL: &str = "default";

/// Immutable process-wide settings.
///
/// Built via [`ServiceSettings::builder()`], [`ServiceSettings::load()`] or
/// [`ServiceSettings::default()`].
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Directory `/extract-and-save` writes into. Default: `storage`.
    pub storage_dir: PathBuf,

    /// Registry name of the VLM API provider. Default: `openai`.
    pub vlm_api_provider: String,

    /// Credential for the VLM API provider.
    pub vlm_api_key: Option<String>,

    /// Deprecated alias of `vlm_api_key`, consulted only when that is unset.
    pub openai_api_key: Option<String>,

    /// Explicit chat-completions URL; wins over the registry.
    pub vlm_api_base_url: Option<String>,

    /// Picture-description prompt, or `"default"` for the built-in one.
    pub vlm_prompt: String,

    /// Chat-completions endpoint of the locally hosted VLM server.
    pub vlm_local_url: String,

    /// Timeout for a single picture-description call. Default: 20.
    pub vlm_api_timeout_secs: u64,

    /// Tesseract language code used for OCR. Default: `eng`.
    pub ocr_language: String,

    /// Explicit path to the pdfium shared library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Prefix every extraction route is mounted under. Default: `/api/v1`.
    #[serde(rename = "api_v1_str")]
    pub api_prefix: String,

    /// CORS allow-list; `*` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Maximum multipart request body, in megabytes. Default: 100.
    pub max_upload_mb: usize,

    /// Enables debug-level logging in the binary.
    pub debug: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("storage"),
            vlm_api_provider: "openai".to_string(),
            vlm_api_key: None,
            openai_api_key: None,
            vlm_api_base_url: None,
            vlm_prompt: DEFAULT_PROMPT_SENTINEL.to_string(),
            vlm_local_url: "http://localhost:11434/v1/chat/completions".to_string(),
            vlm_api_timeout_secs: 20,
            ocr_language: "eng".to_string(),
            pdfium_lib_path: None,
            api_prefix: "/api/v1".to_string(),
            allowed_origins: vec!["*".to_string()],
            max_upload_mb: 100,
            debug: false,
        }
    }
}

impl fmt::Debug for ServiceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceSettings")
            .field("storage_dir", &self.storage_dir)
            .field("vlm_api_provider", &self.vlm_api_provider)
            .field("vlm_api_key", &self.vlm_api_key.as_ref().map(|_| "<redacted>"))
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("vlm_api_base_url", &self.vlm_api_base_url)
            .field("vlm_prompt", &self.vlm_prompt)
            .field("vlm_local_url", &self.vlm_local_url)
            .field("vlm_api_timeout_secs", &self.vlm_api_timeout_secs)
            .field("ocr_language", &self.ocr_language)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("api_prefix", &self.api_prefix)
            .field("allowed_origins", &self.allowed_origins)
            .field("max_upload_mb", &self.max_upload_mb)
            .field("debug", &self.debug)
            .finish()
    }
}

impl ServiceSettings {
    /// Create a new builder starting from the defaults.
    pub fn builder() -> ServiceSettingsBuilder {
        ServiceSettingsBuilder {
            settings: Self::default(),
        }
    }

    /// Load settings from config files and the environment.
    pub fn load() -> Result<Self, ExtractError> {
        let raw = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_origins"),
            )
            .build()
            .map_err(|e| ExtractError::InvalidConfig(e.to_string()))?;

        let settings: Self = raw
            .try_deserialize()
            .map_err(|e| ExtractError::InvalidConfig(e.to_string()))?;
        settings.validate()
    }

    /// The credential to use for API mode: primary key, else the deprecated
    /// alias. Blank values count as unset.
    pub fn vlm_credential(&self) -> Option<&str> {
        [&self.vlm_api_key, &self.openai_api_key]
            .into_iter()
            .filter_map(|key| key.as_deref())
            .find(|key| !key.trim().is_empty())
    }

    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    fn validate(self) -> Result<Self, ExtractError> {
        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err(ExtractError::InvalidConfig(format!(
                "api_v1_str must start with '/', got '{}'",
                self.api_prefix
            )));
        }
        if self.max_upload_mb == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_upload_mb must be ≥ 1".into(),
            ));
        }
        Ok(self)
    }
}

/// Builder for [`ServiceSettings`].
#[derive(Debug)]
pub struct ServiceSettingsBuilder {
    settings: ServiceSettings,
}

impl ServiceSettingsBuilder {
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.storage_dir = dir.into();
        self
    }

    pub fn vlm_api_provider(mut self, provider: impl Into<String>) -> Self {
        self.settings.vlm_api_provider = provider.into();
        self
    }

    pub fn vlm_api_key(mut self, key: impl Into<String>) -> Self {
        self.settings.vlm_api_key = Some(key.into());
        self
    }

    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.settings.openai_api_key = Some(key.into());
        self
    }

    pub fn vlm_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.settings.vlm_api_base_url = Some(url.into());
        self
    }

    pub fn vlm_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.settings.vlm_prompt = prompt.into();
        self
    }

    pub fn vlm_local_url(mut self, url: impl Into<String>) -> Self {
        self.settings.vlm_local_url = url.into();
        self
    }

    pub fn vlm_api_timeout_secs(mut self, secs: u64) -> Self {
        self.settings.vlm_api_timeout_secs = secs.max(1);
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.settings.ocr_language = lang.into();
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.settings.api_prefix = prefix.into();
        self
    }

    pub fn allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.settings.allowed_origins = origins;
        self
    }

    pub fn max_upload_mb(mut self, mb: usize) -> Self {
        self.settings.max_upload_mb = mb;
        self
    }

    pub fn debug(mut self, v: bool) -> Self {
        self.settings.debug = v;
        self
    }

    /// Build the settings, validating constraints.
    pub fn build(self) -> Result<ServiceSettings, ExtractError> {
        self.settings.validate()
    }
}

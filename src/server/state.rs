use crate::config::ServiceSettings;
use crate::extract::Extractor;
use std::sync::Arc;

/// Shared handler state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ServiceSettings>,
    pub extractor: Extractor,
}

impl AppState {
    /// State backed by the bundled engine.
    pub fn new(settings: Arc<ServiceSettings>) -> Self {
        let extractor = Extractor::new(settings.clone());
        Self {
            settings,
            extractor,
        }
    }

    pub fn with_extractor(extractor: Extractor) -> Self {
        Self {
            settings: Arc::new(extractor.settings().clone()),
            extractor,
        }
    }
}

//! Pipeline stages owned by the orchestration layer.
//!
//! ## Data Flow
//!
//! ```text
//! options ──▶ builder ──▶ engine ──▶ postprocess
//! (request)  (config)    (external)  (page headers)
//! ```
//!
//! 1. [`builder`]    : resolve OCR/table/VLM settings into an immutable
//!    [`PipelineConfiguration`]; the only stage that consults the provider
//!    registry
//! 2. the engine     : see [`crate::engine`]; not part of this module
//! 3. [`postprocess`]: rewrite page-break placeholders into `## Page N`

pub mod builder;
pub mod postprocess;

pub use builder::{
    DisabledReason, PictureDescriptionKind, PictureDescriptionOptions, PipelineBuilder,
    PipelineConfiguration, TableMode, VlmResolution, VlmStatus, DEFAULT_LOCAL_VLM_MODEL,
};
pub use postprocess::{rewrite_page_markers, PAGE_BREAK_MARKER, PAGE_BREAK_PLACEHOLDER};

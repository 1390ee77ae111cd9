//! Report AI abstraction layer for turning bug report artifacts into structured insight.
//!
//! This crate provides the provider-agnostic pieces of the AI pipeline:
//! - Chat, video analysis, transcription and frame-extraction provider traits
//! - The report data model and the typed insight results
//! - Recovery of JSON documents from free-form model output
//! - Bounded prompt construction from report fields and logs
//! - Rate-limit aware retry with exponential backoff
//!
//! Concrete vendors live outside this crate, so applications can swap between
//! backends (Gemini, Groq, OpenRouter, ...) without changing the pipeline.

pub mod context;
pub mod error;
pub mod parser;
pub mod retry;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use context::build_context;
pub use error::{Error, ParseError};
pub use parser::{decode, extract_json, ParsePolicy};
pub use retry::{RetryPolicy, MAX_RETRIES};
pub use types::insight::InsightKind;
pub use types::report::ReportContext;
pub use types::video::VideoAnalysisResult;

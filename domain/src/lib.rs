//! This crate wires the provider-agnostic pieces of `report_ai` to concrete vendors.
//!
//! Consumers should not need to depend on `report_ai` directly for everyday work, so the
//! types that show up in this crate's public signatures are re-exported here alongside
//! the vendor backends, the recording analysis entry point and the insight engine.
pub use report_ai::types::insight::{InsightKind, InsightResult};
pub use report_ai::types::report::{CandidateReport, ReportContext, ThreadComment};
pub use report_ai::{RetryPolicy, VideoAnalysisResult};

pub mod error;
pub mod frame_sampler;
pub mod insight;
pub mod provider;
pub mod transcriber;
pub mod video;

pub mod gateway;

pub use insight::InsightEngine;
pub use provider::{ProviderFactory, ProviderSet};

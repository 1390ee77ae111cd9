//! Process-level infrastructure for the report insights pipeline: configuration
//! and logging. Nothing in here knows about AI vendors beyond their settings.

pub mod config;
pub mod logging;

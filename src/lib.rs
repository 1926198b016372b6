//! # Precis
//!
//! Fetch a webpage, pull out its main text, and have an LLM summarise it.
//!
//! ## Features
//!
//! - **Readable extraction**: boilerplate is stripped and the main content region is picked by
//!   an ordered list of selectors
//! - **Two summary styles**: a one or two sentence takeaway, or a few detailed paragraphs
//! - **Provider agnostic**: Gemini and OpenAI-compatible endpoints
//! - **Injectable collaborators**: page fetching and the model sit behind traits

pub mod agent;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod scraper;
pub mod summary;
pub mod ui;
pub mod validate;

pub use config::Config;
pub use pipeline::{Pipeline, PipelineError};
pub use crate::scraper::ExtractedDocument;
pub use summary::{SummaryMode, SummaryResult};

//! URL to summary orchestration.
//!
//! Validation, extraction and summarisation run strictly in sequence; the first failure is
//! returned as is. Collaborators are injected so nothing here holds global client state.

use crate::agent::{self, AgentError, LanguageModel};
use crate::config::{AgentConfig, Config, ExtractionConfig};
use crate::fetch::{FetchError, HttpFetcher, PageFetcher};
use crate::scraper::{self, ExtractedDocument, ScraperError};
use crate::summary::{SummaryMode, SummaryResult};
use crate::validate::{validate_url, InputError};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Extraction(#[from] ScraperError),
    #[error("summarisation failed: {0}")]
    Service(#[from] AgentError),
}

/// Failure to build the HTTP and model clients
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("failed to build HTTP client: {0}")]
    Fetcher(#[from] FetchError),
    #[error(transparent)]
    Model(#[from] AgentError),
}

/// Coarse error categories surfaced to users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingInput,
    MalformedScheme,
    FetchError,
    ExtractionError,
    ServiceError,
}

/// Text for an error card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    pub headline: &'static str,
    pub message: &'static str,
    /// Underlying error detail, when there is one worth showing
    pub detail: Option<String>,
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.headline, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Input(InputError::MissingInput) => ErrorKind::MissingInput,
            PipelineError::Input(InputError::MalformedScheme(_)) => ErrorKind::MalformedScheme,
            PipelineError::Extraction(ScraperError::Fetch(_)) => ErrorKind::FetchError,
            PipelineError::Extraction(_) => ErrorKind::ExtractionError,
            PipelineError::Service(_) => ErrorKind::ServiceError,
        }
    }

    /// Convert to something a person can act on
    pub fn user_message(&self) -> UserMessage {
        match self.kind() {
            ErrorKind::MissingInput => UserMessage {
                headline: "Missing URL",
                message: "Please enter a valid URL to summarize.",
                detail: None,
            },
            ErrorKind::MalformedScheme => UserMessage {
                headline: "Invalid URL Format",
                message: "Please enter a complete URL starting with http:// or https://",
                detail: None,
            },
            ErrorKind::FetchError => UserMessage {
                headline: "Failed to fetch content",
                message: "Could not retrieve content from the provided URL.",
                detail: Some(self.to_string()),
            },
            ErrorKind::ExtractionError | ErrorKind::ServiceError => UserMessage {
                headline: "Error occurred",
                message: "Something went wrong while processing your request.",
                detail: Some(self.to_string()),
            },
        }
    }
}

/// Summarises web pages with a fetcher and a model.
pub struct Pipeline {
    fetcher: Box<dyn PageFetcher>,
    model: Box<dyn LanguageModel>,
    extraction: ExtractionConfig,
    agent: AgentConfig,
}

impl Pipeline {
    pub fn new(
        fetcher: Box<dyn PageFetcher>,
        model: Box<dyn LanguageModel>,
        extraction: ExtractionConfig,
        agent: AgentConfig,
    ) -> Self {
        Self {
            fetcher,
            model,
            extraction,
            agent,
        }
    }

    /// Wire up the HTTP fetcher and the configured model provider
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        let fetcher = HttpFetcher::from_config(&config.extraction)?;
        let model = agent::from_config(config)?;
        Ok(Self::new(
            Box::new(fetcher),
            model,
            config.extraction.clone(),
            config.agent.clone(),
        ))
    }

    /// Validate `url` and extract its content without summarising
    pub async fn extract(&self, url: &str) -> Result<ExtractedDocument, PipelineError> {
        let url = validate_url(url)?;
        Ok(scraper::extract(self.fetcher.as_ref(), url, &self.extraction).await?)
    }

    /// Validate, fetch, extract and summarise a single URL
    pub async fn summarize_url(
        &self,
        url: &str,
        mode: SummaryMode,
    ) -> Result<SummaryResult, PipelineError> {
        let result = self.run(url, mode).await;
        if let Err(e) = &result {
            warn!(url, kind = ?e.kind(), error = %e, "summarisation failed");
        }
        result
    }

    async fn run(&self, url: &str, mode: SummaryMode) -> Result<SummaryResult, PipelineError> {
        let document = self.extract(url).await?;
        info!(
            url,
            chars = document.body_text.chars().count(),
            truncated = document.truncated,
            "summarising extracted content"
        );

        let summary =
            agent::summarize(self.model.as_ref(), &document.body_text, mode, &self.agent).await?;

        Ok(SummaryResult {
            title: document.title,
            summary,
            content_preview: document.preview_text,
        })
    }
}

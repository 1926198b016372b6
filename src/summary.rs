//! Summary types shared by the pipeline and the shells that render it.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Style of summary to request from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMode {
    /// One or two sentences capturing the main takeaway
    #[default]
    #[value(name = "one_line", alias = "one-line")]
    OneLine,
    /// Two to three paragraphs following the original's flow
    #[value(name = "detailed")]
    Detailed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown summary mode {0:?}, expected \"one_line\" or \"detailed\"")]
pub struct ModeParseError(pub String);

impl SummaryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryMode::OneLine => "one_line",
            SummaryMode::Detailed => "detailed",
        }
    }

    /// Human readable label for menus
    pub fn label(&self) -> &'static str {
        match self {
            SummaryMode::OneLine => "Quick Summary (1-2 sentences)",
            SummaryMode::Detailed => "Detailed Summary (2-3 paragraphs)",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            SummaryMode::OneLine => SummaryMode::Detailed,
            SummaryMode::Detailed => SummaryMode::OneLine,
        }
    }
}

impl fmt::Display for SummaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_line" => Ok(SummaryMode::OneLine),
            "detailed" => Ok(SummaryMode::Detailed),
            other => Err(ModeParseError(other.to_string())),
        }
    }
}

/// What a single summarisation request hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Page title, never empty
    pub title: String,
    /// Model output, verbatim
    pub summary: String,
    /// Short excerpt of the extracted text
    pub content_preview: String,
}

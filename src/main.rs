//! Precis CLI - summarise a webpage from the terminal
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use precis::fetch::HttpFetcher;
use precis::pipeline::PipelineError;
use precis::validate::validate_url;
use precis::{logging, scraper, ui, Config, ExtractedDocument, Pipeline, SummaryMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "precis")]
#[command(author, version, about = "Summarise a webpage from the terminal", long_about = None)]
struct Cli {
    /// Config file to use instead of ./precis.toml or ~/.config/precis/precis.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Write debug logs
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise a webpage by URL
    Summarise {
        /// URL to summarise
        url: String,
        /// Summary style
        #[arg(short, long, value_enum, default_value_t = SummaryMode::OneLine)]
        mode: SummaryMode,
        /// Show raw extracted text instead of summary
        #[arg(long)]
        raw: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if atty::isnt(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }

    match cli.command {
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "precis", &mut std::io::stdout());
        }
        Some(Commands::Summarise {
            url,
            mode,
            raw,
            json,
        }) => {
            let config = load_config(cli.config.as_ref())?;
            init_logging(cli.verbose);

            if raw {
                match extract_only(&url, &config).await {
                    Ok(document) => print_document(&document, json)?,
                    Err(e) => exit_with(&e),
                }
                return Ok(());
            }

            // Reject bad input before asking for credentials
            if let Err(e) = validate_url(&url) {
                exit_with(&e.into());
            }

            let pipeline = Pipeline::from_config(&config)?;
            println!("Fetching: {}", url);

            match pipeline.summarize_url(&url, mode).await {
                Ok(result) if json => println!("{}", serde_json::to_string_pretty(&result)?),
                Ok(result) => {
                    println!("\n=== {} ===\n", result.title.bold());
                    println!("💡 {}", "Summary:".bold());
                    println!("{}\n", result.summary.trim());
                    println!("👀 {}", "Extracted content preview:".dimmed());
                    println!("{}", result.content_preview.dimmed());
                }
                Err(e) => exit_with(&e),
            }
        }
        None => {
            let config = load_config(cli.config.as_ref())?;
            init_logging(cli.verbose);

            // Default: Launch the TUI
            ui::run(&config).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    Ok(match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    })
}

fn init_logging(verbose: bool) {
    if let Err(e) = logging::init(verbose) {
        eprintln!("Warning: logging disabled: {}", e);
    }
}

/// Fetch and extract without touching the model
async fn extract_only(url: &str, config: &Config) -> Result<ExtractedDocument, PipelineError> {
    let url = validate_url(url)?;
    let fetcher = HttpFetcher::from_config(&config.extraction).map_err(scraper::ScraperError::from)?;
    Ok(scraper::extract(&fetcher, url, &config.extraction).await?)
}

fn print_document(document: &ExtractedDocument, json: bool) -> anyhow::Result<()> {
    if json {
        let value = serde_json::json!({
            "url": document.url,
            "title": document.title,
            "body_text": document.body_text,
            "truncated": document.truncated,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("\n=== {} ===\n", document.title.bold());
    println!("{}", document.body_text);
    let note = if document.truncated { " (truncated)" } else { "" };
    println!(
        "\n--- Extracted {} characters{} ---",
        document.body_text.chars().count(),
        note
    );
    Ok(())
}

/// Print an error card and exit non-zero
fn exit_with(err: &PipelineError) -> ! {
    let message = err.user_message();
    eprintln!("{} {}", "❌".red(), message.headline.red().bold());
    eprintln!("   {}", message.message);
    if let Some(detail) = message.detail {
        eprintln!("   {}", detail.dimmed());
    }
    std::process::exit(1);
}

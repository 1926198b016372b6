//! Web scraping module for content extraction.
//!
//! Pages come in through a [`PageFetcher`] and are parsed with `scraper`. Boilerplate regions
//! are dropped, the main content region is picked by an ordered list of selectors (first hit
//! wins, no scoring), and its text is normalised and capped.

use crate::config::ExtractionConfig;
use crate::fetch::{FetchError, PageFetcher};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};

/// Appended to body text cut at the configured cap
pub const TRUNCATION_MARKER: &str = "...[content truncated]";

/// Appended to a preview cut at the configured cap
pub const PREVIEW_MARKER: &str = "...";

/// Title used when a page offers none
pub const PLACEHOLDER_TITLE: &str = "Content";

/// Elements that never carry article text.
pub const REMOVED_ELEMENTS: [&str; 7] = [
    "script",
    "style",
    "nav",
    "footer",
    "header",
    "aside",
    "advertisement",
];

/// Main content selectors, highest priority first.
pub const DEFAULT_CONTENT_SELECTORS: [&str; 9] = [
    "article",
    "[role=\"main\"]",
    ".post-content",
    ".article-content",
    ".entry-content",
    ".content",
    "main",
    ".blog-post",
    ".post-body",
];

lazy_static! {
    static ref REMOVED_SELECTOR: Selector = Selector::parse(&REMOVED_ELEMENTS.join(", ")).unwrap();
    static ref OG_TITLE_SELECTOR: Selector =
        Selector::parse(r#"meta[property="og:title"]"#).unwrap();
    static ref TITLE_SELECTOR: Selector = Selector::parse("title").unwrap();
    static ref BODY_SELECTOR: Selector = Selector::parse("body").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n\s*\n").unwrap();
    static ref SPACE_RUNS: Regex = Regex::new(r" +").unwrap();
}

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("failed to fetch URL: {0}")]
    Fetch(#[from] FetchError),
    #[error("invalid content selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("no content found at URL")]
    NoContent,
}

/// Text extracted from a single page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// The original URL
    pub url: String,
    /// Page title, never empty
    pub title: String,
    /// Normalised main text, capped at `max_chars` plus the truncation marker
    pub body_text: String,
    /// Short prefix of `body_text` for display
    pub preview_text: String,
    /// Whether `body_text` was cut
    pub truncated: bool,
}

/// Fetch a page and extract its title and main text.
///
/// The page is fetched once and both title and body come from the same document, unless
/// `refetch_title` is set, in which case the title is looked up with a second request.
pub async fn extract(
    fetcher: &dyn PageFetcher,
    url: &str,
    config: &ExtractionConfig,
) -> Result<ExtractedDocument, ScraperError> {
    let html = fetcher.fetch(url).await?;
    let mut document = parse_page(&html, url, config)?;

    if config.refetch_title {
        document.title = fetch_title(fetcher, url).await;
    }

    debug!(
        url,
        title = %document.title,
        chars = document.body_text.chars().count(),
        truncated = document.truncated,
        "content extracted"
    );
    Ok(document)
}

/// Look up a page title with its own request. Never fails: any error yields the placeholder.
pub async fn fetch_title(fetcher: &dyn PageFetcher, url: &str) -> String {
    match fetcher.fetch(url).await {
        Ok(html) => extract_title(&Html::parse_document(&html)),
        Err(e) => {
            warn!(url, error = %e, "title lookup failed, using placeholder");
            PLACEHOLDER_TITLE.to_string()
        }
    }
}

/// Parse already fetched markup into an [`ExtractedDocument`]
pub fn parse_page(
    html: &str,
    url: &str,
    config: &ExtractionConfig,
) -> Result<ExtractedDocument, ScraperError> {
    let selectors = compile_selectors(&config.content_selectors)?;
    let mut document = Html::parse_document(html);

    let title = extract_title(&document);

    strip_non_content(&mut document);
    let region = find_main_content(&document, &selectors)
        .or_else(|| {
            document
                .root_element()
                .select(&BODY_SELECTOR)
                .next()
                .filter(has_text)
        })
        .unwrap_or_else(|| document.root_element());

    let text = normalize_whitespace(&extract_text(region));
    if text.is_empty() {
        return Err(ScraperError::NoContent);
    }

    let (body_text, truncated) = truncate_chars(&text, config.max_chars, TRUNCATION_MARKER);
    let preview_text = preview(&body_text, config.preview_chars);

    Ok(ExtractedDocument {
        url: url.to_string(),
        title,
        body_text,
        preview_text,
        truncated,
    })
}

/// Compile CSS selectors, keeping their order
pub fn compile_selectors<S: AsRef<str>>(selectors: &[S]) -> Result<Vec<Selector>, ScraperError> {
    selectors
        .iter()
        .map(|css| {
            let css = css.as_ref();
            Selector::parse(css).map_err(|e| ScraperError::InvalidSelector {
                selector: css.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Detach every boilerplate element from the tree
fn strip_non_content(document: &mut Html) {
    let ids: Vec<_> = document
        .root_element()
        .select(&REMOVED_SELECTOR)
        .map(|element| element.id())
        .collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// First selector whose first match holds visible text
pub fn find_main_content<'a>(document: &'a Html, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|selector| {
        document
            .root_element()
            .select(selector)
            .next()
            .filter(has_text)
    })
}

/// The parser always synthesises a `<body>`, so an empty one means the text lives elsewhere
fn has_text(element: &ElementRef<'_>) -> bool {
    element.text().any(|t| !t.trim().is_empty())
}

/// Trimmed text nodes of `element`, one per line
pub fn extract_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse blank-line runs into one blank line and space runs into one space
pub fn normalize_whitespace(text: &str) -> String {
    let text = BLANK_LINES.replace_all(text, "\n\n");
    SPACE_RUNS.replace_all(&text, " ").trim().to_string()
}

/// Cut `text` to `max` characters and append `marker` if anything was dropped
pub fn truncate_chars(text: &str, max: usize, marker: &str) -> (String, bool) {
    match text.char_indices().nth(max) {
        Some((idx, _)) => (format!("{}{}", &text[..idx], marker), true),
        None => (text.to_string(), false),
    }
}

/// Preview of at most `max` characters, with [`PREVIEW_MARKER`] when cut
pub fn preview(text: &str, max: usize) -> String {
    truncate_chars(text, max, PREVIEW_MARKER).0
}

/// Page title from og:title, then `<title>`, then the placeholder
pub fn extract_title(document: &Html) -> String {
    let root = document.root_element();

    let og_title = root
        .select(&OG_TITLE_SELECTOR)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty());
    if let Some(title) = og_title {
        return title.to_string();
    }

    if let Some(element) = root.select(&TITLE_SELECTOR).next() {
        let title: String = element.text().collect();
        if !title.trim().is_empty() {
            return title.trim().to_string();
        }
    }

    PLACEHOLDER_TITLE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const URL: &str = "https://example.com/post";

    fn parse(html: &str) -> ExtractedDocument {
        parse_page(html, URL, &ExtractionConfig::default()).unwrap()
    }

    fn title_of(html: &str) -> String {
        extract_title(&Html::parse_document(html))
    }

    #[test]
    fn article_text_excludes_page_chrome() {
        let html = r#"<html><head><title>Ignored</title></head><body>
            <nav>Home About</nav>
            <article><h1>Big News</h1><p>First paragraph.</p><p>Second   paragraph   here.</p><aside>Related links</aside><script>var x = 1;</script></article>
            <footer>Copyright 2024</footer>
        </body></html>"#;

        let doc = parse(html);
        assert_eq!(
            doc.body_text,
            "Big News\nFirst paragraph.\nSecond paragraph here."
        );
        assert!(!doc.body_text.contains("Home About"));
        assert!(!doc.body_text.contains("Copyright"));
        assert!(!doc.body_text.contains("Related"));
        assert!(!doc.truncated);
    }

    #[test]
    fn selector_priority_beats_document_order() {
        let html = r#"<body>
            <div class="content"><p>Generic content block</p></div>
            <div role="main"><p>Main region</p></div>
        </body>"#;

        assert_eq!(parse(html).body_text, "Main region");
    }

    #[test]
    fn empty_match_falls_through_to_next_selector() {
        let html = r#"<body>
            <article>   </article>
            <main><p>Real text</p></main>
        </body>"#;

        assert_eq!(parse(html).body_text, "Real text");
    }

    #[test]
    fn match_inside_removed_element_is_ignored() {
        let html = r#"<body>
            <header><div class="content">Site tagline</div></header>
            <main><p>Story body</p></main>
        </body>"#;

        assert_eq!(parse(html).body_text, "Story body");
    }

    #[test]
    fn falls_back_to_body_without_content_region() {
        let html = r#"<html><head><title>T</title></head><body>
            <nav>Menu</nav><div><p>Loose paragraph</p><span>and a span</span></div>
        </body></html>"#;

        assert_eq!(parse(html).body_text, "Loose paragraph\nand a span");
    }

    #[test]
    fn bare_text_lands_in_the_synthesised_body() {
        let doc = parse("Just some bare text");
        assert_eq!(doc.body_text, "Just some bare text");
    }

    #[test]
    fn falls_back_to_whole_document_when_body_is_empty() {
        let doc = parse("<html><head><title>Only heading text</title></head></html>");
        assert_eq!(doc.body_text, "Only heading text");
        assert_eq!(doc.title, "Only heading text");

        let doc = parse("<html><head><noscript>Enable JavaScript</noscript></head></html>");
        assert_eq!(doc.body_text, "Enable JavaScript");
    }

    #[test]
    fn empty_page_is_no_content() {
        let result = parse_page(
            "<html><body><script>x()</script></body></html>",
            URL,
            &ExtractionConfig::default(),
        );
        assert!(matches!(result, Err(ScraperError::NoContent)));
    }

    #[test]
    fn invalid_custom_selector_is_reported() {
        let config = ExtractionConfig {
            content_selectors: vec!["article".to_string(), "[[nope".to_string()],
            ..ExtractionConfig::default()
        };
        let result = parse_page("<p>text</p>", URL, &config);
        assert!(matches!(
            result,
            Err(ScraperError::InvalidSelector { selector, .. }) if selector == "[[nope"
        ));
    }

    #[test]
    fn long_text_is_capped_with_marker() {
        let html = format!("<article><p>{}</p></article>", "a".repeat(15_010));
        let doc = parse(&html);

        assert!(doc.truncated);
        assert_eq!(
            doc.body_text.chars().count(),
            15_000 + TRUNCATION_MARKER.chars().count()
        );
        assert!(doc.body_text.ends_with(TRUNCATION_MARKER));
        assert_eq!(doc.preview_text, format!("{}...", "a".repeat(500)));
    }

    #[test]
    fn text_at_cap_is_not_marked() {
        let html = format!("<article><p>{}</p></article>", "b".repeat(15_000));
        let doc = parse(&html);

        assert!(!doc.truncated);
        assert_eq!(doc.body_text.len(), 15_000);
    }

    #[test]
    fn short_body_preview_is_identical() {
        let doc = parse("<article><p>Short and sweet.</p></article>");
        assert_eq!(doc.preview_text, doc.body_text);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let (cut, truncated) = truncate_chars(&"é".repeat(20), 10, "…");
        assert!(truncated);
        assert_eq!(cut, format!("{}…", "é".repeat(10)));
    }

    #[test]
    fn whitespace_is_normalised() {
        assert_eq!(
            normalize_whitespace("one   two\n\n\n\nthree\n \nfour"),
            "one two\n\nthree\n\nfour"
        );
    }

    #[test]
    fn title_prefers_open_graph() {
        let html = r#"<head><meta property="og:title" content=" OG Title "><title>Plain</title></head>"#;
        assert_eq!(title_of(html), "OG Title");
    }

    #[test]
    fn title_falls_back_to_title_element() {
        let html = r#"<head><meta property="og:title" content=""><title> Plain Title </title></head>"#;
        assert_eq!(title_of(html), "Plain Title");
    }

    #[test]
    fn title_placeholder_when_missing() {
        assert_eq!(title_of("<body><p>No title here</p></body>"), PLACEHOLDER_TITLE);
        assert_eq!(title_of("<title>   </title>"), PLACEHOLDER_TITLE);
    }

    struct DownFetcher;

    #[async_trait::async_trait]
    impl PageFetcher for DownFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            Err(FetchError::Status {
                status: 500,
                url: url.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn title_lookup_swallows_fetch_failures() {
        assert_eq!(fetch_title(&DownFetcher, URL).await, PLACEHOLDER_TITLE);
    }

    #[tokio::test]
    async fn extract_propagates_fetch_failures() {
        let result = extract(&DownFetcher, URL, &ExtractionConfig::default()).await;
        assert!(matches!(
            result,
            Err(ScraperError::Fetch(FetchError::Status { status: 500, .. }))
        ));
    }

    #[test]
    fn title_survives_header_removal() {
        let doc = parse(r#"<head><title>Kept</title></head><body><header>Top</header><p>Body</p></body>"#);
        assert_eq!(doc.title, "Kept");
        assert_eq!(doc.body_text, "Body");
    }
}

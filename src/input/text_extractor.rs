//! Text extraction from resumes and job offers
//!
//! PDF text goes through an ordered list of [`PdfTextStrategy`] values. The
//! first strategy that succeeds wins; every failure is logged so the order in
//! which extractors were tried can be read back from the log.

use crate::error::{Result, ResumeMatcherError};
use anyhow::{anyhow, Context};
use log::{debug, warn};
use pulldown_cmark::{Event, Parser, Tag};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tokio::fs;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// One way of turning PDF bytes into text
pub trait PdfTextStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, bytes: &[u8]) -> anyhow::Result<String>;
}

/// Layout-aware extraction through `pdf-extract`
pub struct LayoutStrategy;

impl PdfTextStrategy for LayoutStrategy {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn extract(&self, bytes: &[u8]) -> anyhow::Result<String> {
        // pdf-extract panics on some malformed font tables
        let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
            .map_err(|_| anyhow!("pdf-extract panicked while reading the document"))?;
        let text = result.map_err(|e| anyhow!("pdf-extract failed: {}", e))?;
        Ok(text)
    }
}

/// Plain page-by-page extraction through `lopdf`
pub struct PageStrategy;

impl PdfTextStrategy for PageStrategy {
    fn name(&self) -> &'static str {
        "pages"
    }

    fn extract(&self, bytes: &[u8]) -> anyhow::Result<String> {
        let doc = lopdf::Document::load_mem(bytes).context("lopdf could not load the document")?;

        let mut pages = Vec::new();
        for (page_num, _page_id) in doc.get_pages() {
            let text = doc
                .extract_text(&[page_num])
                .with_context(|| format!("lopdf could not read page {}", page_num))?;
            pages.push(text);
        }
        Ok(pages.join("\n"))
    }
}

/// Basic facts about a PDF, checked before extraction
#[derive(Debug, Clone, PartialEq)]
pub struct PdfInfo {
    pub page_count: usize,
    pub encrypted: bool,
    pub size_bytes: usize,
}

pub fn inspect_pdf(bytes: &[u8]) -> Result<PdfInfo> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| ResumeMatcherError::PdfExtraction(format!("Invalid PDF: {}", e)))?;
    let page_count = doc.get_pages().len();
    if page_count == 0 {
        return Err(ResumeMatcherError::PdfExtraction("The PDF has no pages".to_string()));
    }
    Ok(PdfInfo {
        page_count,
        encrypted: doc.is_encrypted(),
        size_bytes: bytes.len(),
    })
}

pub struct PdfExtractor {
    strategies: Vec<Box<dyn PdfTextStrategy>>,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::with_strategies(vec![Box::new(LayoutStrategy), Box::new(PageStrategy)])
    }
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategies(strategies: Vec<Box<dyn PdfTextStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the strategies in order and return the first successful text.
    /// Fails only when every strategy fails.
    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<String> {
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            match strategy.extract(bytes) {
                Ok(text) => {
                    debug!("PDF text extracted with '{}' strategy", strategy.name());
                    return Ok(normalize_text(&text));
                }
                Err(e) => {
                    warn!("PDF extraction strategy '{}' failed: {:#}", strategy.name(), e);
                    failures.push(format!("{}: {:#}", strategy.name(), e));
                }
            }
        }

        if failures.is_empty() {
            return Err(ResumeMatcherError::PdfExtraction(
                "No extraction strategy configured".to_string(),
            ));
        }
        Err(ResumeMatcherError::PdfExtraction(format!(
            "All extractors failed ({})",
            failures.join("; ")
        )))
    }
}

impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).await?;
        self.extract_bytes(&bytes).map_err(|e| match e {
            ResumeMatcherError::PdfExtraction(msg) => {
                ResumeMatcherError::PdfExtraction(format!("'{}': {}", path.display(), msg))
            }
            other => other,
        })
    }
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let content = fs::read_to_string(path).await?;
        Ok(content.trim().to_string())
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let markdown_content = fs::read_to_string(path).await?;
        Ok(markdown_to_text(&markdown_content))
    }
}

/// Flatten markdown into plain lines, dropping all markup
pub fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(Tag::Paragraph)
            | Event::End(Tag::Heading(..))
            | Event::End(Tag::Item)
            | Event::End(Tag::CodeBlock(_)) => text.push('\n'),
            _ => {}
        }
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn blank_run_regex() -> &'static Regex {
    static BLANK_RUN: OnceLock<Regex> = OnceLock::new();
    BLANK_RUN.get_or_init(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+\n").expect("blank line pattern is valid"))
}

/// Collapse runs of blank lines and trim the result
fn normalize_text(text: &str) -> String {
    blank_run_regex().replace_all(text.trim(), "\n\n").into_owned()
}

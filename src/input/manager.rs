//! Input manager: resolves files to text and applies the upload rules

use crate::config::InputConfig;
use crate::error::{Result, ResumeMatcherError};
use crate::input::text_extractor::{
    inspect_pdf, MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor,
};
use log::{info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileKind {
    Pdf,
    Text,
    Markdown,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ResumeMatcherError::InvalidInput(format!("File has no extension: {}", path.display()))
            })?;

        match ext.to_lowercase().as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "txt" => Ok(FileKind::Text),
            "md" | "markdown" => Ok(FileKind::Markdown),
            other => Err(ResumeMatcherError::UnsupportedFormat(format!(
                ".{} ({})",
                other,
                path.display()
            ))),
        }
    }
}

/// A resume that passed extraction and the readability gate
#[derive(Debug, Clone)]
pub struct ResumeText {
    pub name: String,
    pub text: String,
}

pub struct InputManager {
    limits: InputConfig,
    pdf_extractor: PdfExtractor,
    cache: HashMap<PathBuf, String>,
}

impl InputManager {
    pub fn new(limits: InputConfig) -> Self {
        Self {
            limits,
            pdf_extractor: PdfExtractor::new(),
            cache: HashMap::new(),
        }
    }

    pub fn with_pdf_extractor(mut self, extractor: PdfExtractor) -> Self {
        self.pdf_extractor = extractor;
        self
    }

    /// Load a resume: PDF only, size ceiling enforced, text length gated by
    /// `min_chars` so that no paid request is made for an unreadable file.
    pub async fn load_resume(&mut self, path: &Path, min_chars: usize) -> Result<ResumeText> {
        if FileKind::from_path(path)? != FileKind::Pdf {
            return Err(ResumeMatcherError::UnsupportedFormat(format!(
                "resumes must be PDF files: {}",
                path.display()
            )));
        }
        self.check_size(path).await?;

        let text = match self.cache.get(path) {
            Some(cached) => {
                info!("Using cached text for: {}", path.display());
                cached.clone()
            }
            None => {
                let bytes = tokio::fs::read(path).await?;
                let pdf_info = inspect_pdf(&bytes)?;
                info!(
                    "Extracting text from PDF: {} ({} pages, {} bytes)",
                    path.display(),
                    pdf_info.page_count,
                    pdf_info.size_bytes
                );
                if pdf_info.encrypted {
                    warn!("{} is encrypted, extraction may return little text", path.display());
                }
                let text = self.pdf_extractor.extract_bytes(&bytes)?;
                self.cache.insert(path.to_path_buf(), text.clone());
                text
            }
        };

        let chars = text.chars().count();
        if chars < min_chars {
            return Err(ResumeMatcherError::UnreadableResume { chars, min: min_chars });
        }

        Ok(ResumeText {
            name: display_name(path),
            text,
        })
    }

    /// Load several resumes for ranking. Unreadable files are skipped with a
    /// warning; other errors abort the whole batch.
    pub async fn load_resume_batch(&mut self, paths: &[PathBuf]) -> Result<Vec<ResumeText>> {
        let min_chars = self.limits.min_batch_resume_chars;
        let mut resumes = Vec::with_capacity(paths.len());

        for path in paths {
            match self.load_resume(path, min_chars).await {
                Ok(resume) => resumes.push(resume),
                Err(ResumeMatcherError::UnreadableResume { chars, .. }) => {
                    warn!("{} looks empty or unreadable ({} characters), skipping", path.display(), chars);
                }
                Err(e) => return Err(e),
            }
        }

        if resumes.is_empty() {
            return Err(ResumeMatcherError::InvalidInput(
                "No readable resume to analyze".to_string(),
            ));
        }
        Ok(resumes)
    }

    /// Read a job offer from a text, markdown or PDF file
    pub async fn load_job_offer(&mut self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(ResumeMatcherError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let text = match FileKind::from_path(path)? {
            FileKind::Pdf => {
                self.check_size(path).await?;
                self.pdf_extractor.extract(path).await?
            }
            FileKind::Text => PlainTextExtractor.extract(path).await?,
            FileKind::Markdown => MarkdownExtractor.extract(path).await?,
        };

        if text.trim().is_empty() {
            return Err(ResumeMatcherError::InvalidInput(format!(
                "Job offer is empty: {}",
                path.display()
            )));
        }
        Ok(text)
    }

    pub fn min_resume_chars(&self) -> usize {
        self.limits.min_resume_chars
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    async fn check_size(&self, path: &Path) -> Result<()> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            ResumeMatcherError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let limit = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > limit {
            return Err(ResumeMatcherError::InvalidInput(format!(
                "{} is {} bytes, the limit is {} MB",
                path.display(),
                metadata.len(),
                self.limits.max_file_size_mb
            )));
        }
        Ok(())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_detection() {
        assert_eq!(FileKind::from_path(Path::new("cv.PDF")).unwrap(), FileKind::Pdf);
        assert_eq!(FileKind::from_path(Path::new("job.md")).unwrap(), FileKind::Markdown);
        assert_eq!(FileKind::from_path(Path::new("job.txt")).unwrap(), FileKind::Text);
        assert!(matches!(
            FileKind::from_path(Path::new("cv.docx")),
            Err(ResumeMatcherError::UnsupportedFormat(_))
        ));
        assert!(FileKind::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn test_display_name_uses_file_name() {
        assert_eq!(display_name(Path::new("/tmp/cvs/jane_doe.pdf")), "jane_doe.pdf");
    }
}

//! Report structures assembled from session results

use crate::error::{Result, ResumeMatcherError};
use crate::history::HistoryEntry;
use crate::llm::parser::Suggestions;
use crate::llm::records::{AnalysisRecord, CandidateRanking};
use crate::session::Session;
use chrono::{DateTime, Local};
use serde::Serialize;

/// Coarse band of a 0-100 match score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchLevel {
    Excellent,
    Good,
    Average,
    Weak,
}

impl MatchLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => MatchLevel::Excellent,
            60..=79 => MatchLevel::Good,
            40..=59 => MatchLevel::Average,
            _ => MatchLevel::Weak,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchLevel::Excellent => "Excellent match",
            MatchLevel::Good => "Good match",
            MatchLevel::Average => "Average match",
            MatchLevel::Weak => "Weak match",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            MatchLevel::Excellent => "score-excellent",
            MatchLevel::Good => "score-good",
            MatchLevel::Average => "score-fair",
            MatchLevel::Weak => "score-poor",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Local>,
    pub version: String,
    pub model: String,
    pub resume_file: String,
    pub job_file: String,
    pub processing_time_ms: u64,
}

impl ReportMetadata {
    pub fn new(model: &str, resume_file: &str, job_file: &str, processing_time_ms: u64) -> Self {
        Self {
            generated_at: Local::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            model: model.to_string(),
            resume_file: resume_file.to_string(),
            job_file: job_file.to_string(),
            processing_time_ms,
        }
    }
}

/// Single-candidate report: the analysis plus anything derived from it
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub level: MatchLevel,
    pub analysis: AnalysisRecord,
    pub cover_letter: Option<String>,
    pub suggestions: Option<Suggestions>,
}

impl AnalysisReport {
    pub fn new(metadata: ReportMetadata, analysis: AnalysisRecord) -> Self {
        Self {
            level: MatchLevel::from_score(analysis.global_score),
            metadata,
            analysis,
            cover_letter: None,
            suggestions: None,
        }
    }

    /// Build from the current state of a session
    pub fn from_session(session: &Session, job_file: &str, processing_time_ms: u64) -> Result<Self> {
        let analysis = session.analysis().ok_or(ResumeMatcherError::NoAnalysis)?;
        let resume_file = session.resume().map(|r| r.name.as_str()).unwrap_or_default();

        let mut report = Self::new(
            ReportMetadata::new(session.model(), resume_file, job_file, processing_time_ms),
            analysis.clone(),
        );
        report.cover_letter = session.cover_letter().map(str::to_string);
        report.suggestions = session.suggestions().cloned();
        Ok(report)
    }

    /// Rebuild a report for an analysis stored in history
    pub fn from_history(entry: &HistoryEntry) -> Self {
        let mut metadata = ReportMetadata::new("", &entry.cv_name, "", 0);
        metadata.generated_at = entry.timestamp;
        Self::new(metadata, entry.analysis.clone())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingReport {
    pub metadata: ReportMetadata,
    pub ranking: CandidateRanking,
    pub candidates_submitted: usize,
}

impl RankingReport {
    pub fn new(metadata: ReportMetadata, ranking: CandidateRanking, candidates_submitted: usize) -> Self {
        Self { metadata, ranking, candidates_submitted }
    }
}

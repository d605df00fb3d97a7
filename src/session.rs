//! Per-invocation session state
//!
//! A [`Session`] owns the analyzer and everything produced during one run:
//! the loaded inputs, the current analysis and the documents derived from
//! it. Loading new inputs or calling [`Session::clear`] drops the results.

use crate::error::{Result, ResumeMatcherError};
use crate::input::ResumeText;
use crate::llm::analyzer::{Analyzer, StreamEvent};
use crate::llm::parser::Suggestions;
use crate::llm::records::{AnalysisRecord, CandidateRanking};
use futures::StreamExt;

pub struct Session {
    analyzer: Analyzer,
    resume: Option<ResumeText>,
    job_offer: Option<String>,
    analysis: Option<AnalysisRecord>,
    cover_letter: Option<String>,
    suggestions: Option<Suggestions>,
    ranking: Option<CandidateRanking>,
}

impl Session {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            resume: None,
            job_offer: None,
            analysis: None,
            cover_letter: None,
            suggestions: None,
            ranking: None,
        }
    }

    pub fn model(&self) -> &str {
        self.analyzer.model()
    }

    /// Set the resume and job offer, discarding results computed from older inputs
    pub fn load_inputs(&mut self, resume: ResumeText, job_offer: String) {
        self.clear();
        self.resume = Some(resume);
        self.job_offer = Some(job_offer);
    }

    pub fn resume(&self) -> Option<&ResumeText> {
        self.resume.as_ref()
    }

    pub fn job_offer(&self) -> Option<&str> {
        self.job_offer.as_deref()
    }

    pub fn analysis(&self) -> Option<&AnalysisRecord> {
        self.analysis.as_ref()
    }

    pub fn cover_letter(&self) -> Option<&str> {
        self.cover_letter.as_deref()
    }

    pub fn suggestions(&self) -> Option<&Suggestions> {
        self.suggestions.as_ref()
    }

    pub fn ranking(&self) -> Option<&CandidateRanking> {
        self.ranking.as_ref()
    }

    fn inputs(&self) -> Result<(&str, &str)> {
        match (&self.resume, &self.job_offer) {
            (Some(resume), Some(job)) => Ok((resume.text.as_str(), job.as_str())),
            _ => Err(ResumeMatcherError::InvalidInput(
                "Load a resume and a job offer first".to_string(),
            )),
        }
    }

    pub async fn analyze(&mut self) -> Result<&AnalysisRecord> {
        let (resume, job) = self.inputs()?;
        let record = self.analyzer.analyze(resume, job).await?;
        self.set_analysis(record);
        self.current_analysis()
    }

    /// Streamed analysis; `on_chunk` sees the reply text as it arrives
    pub async fn analyze_streaming<F>(&mut self, mut on_chunk: F) -> Result<&AnalysisRecord>
    where
        F: FnMut(&str),
    {
        let (resume, job) = self.inputs()?;
        let mut events = Box::pin(self.analyzer.analyze_streaming(resume, job));

        let mut outcome = None;
        while let Some(event) = events.next().await {
            match event {
                StreamEvent::Chunk(text) => on_chunk(&text),
                StreamEvent::Done(result) => outcome = Some(result),
            }
        }

        let record = outcome.unwrap_or_else(|| {
            Err(ResumeMatcherError::InvalidInput("Stream ended without a result".to_string()))
        })?;
        self.set_analysis(record);
        self.current_analysis()
    }

    pub async fn generate_cover_letter(&mut self) -> Result<&str> {
        let analysis = self.analysis.as_ref().ok_or(ResumeMatcherError::NoAnalysis)?;
        let (resume, job) = self.inputs()?;
        let letter = self.analyzer.cover_letter(resume, job, analysis).await?;
        Ok(self.cover_letter.insert(letter).as_str())
    }

    pub async fn generate_suggestions(&mut self) -> Result<&Suggestions> {
        let analysis = self.analysis.as_ref().ok_or(ResumeMatcherError::NoAnalysis)?;
        let (resume, job) = self.inputs()?;
        let suggestions = self.analyzer.suggestions(resume, job, analysis).await?;
        Ok(self.suggestions.insert(suggestions))
    }

    /// Ranking works on its own inputs and does not touch the single-resume state
    pub async fn rank(&mut self, resumes: &[ResumeText], job_offer: &str) -> Result<&CandidateRanking> {
        let ranking = self.analyzer.rank(resumes, job_offer).await?;
        Ok(self.ranking.insert(ranking))
    }

    /// Drop inputs and every result of this session
    pub fn clear(&mut self) {
        self.resume = None;
        self.job_offer = None;
        self.analysis = None;
        self.cover_letter = None;
        self.suggestions = None;
        self.ranking = None;
    }

    fn set_analysis(&mut self, record: AnalysisRecord) {
        self.analysis = Some(record);
        self.cover_letter = None;
        self.suggestions = None;
    }

    fn current_analysis(&self) -> Result<&AnalysisRecord> {
        self.analysis.as_ref().ok_or(ResumeMatcherError::NoAnalysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::client::{ChatBackend, ChatRequest, ChunkStream};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EchoScore;

    #[async_trait]
    impl ChatBackend for EchoScore {
        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            if request.prompt.contains("cover letter") {
                Ok("Dear team".to_string())
            } else {
                Ok(r#"{"score_global": 61, "points_amelioration": ["Add numbers"]}"#.to_string())
            }
        }

        async fn stream(&self, _request: &ChatRequest) -> Result<ChunkStream> {
            let chunks = vec![Ok("{\"score_global\"".to_string()), Ok(": 44}".to_string())];
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    fn session() -> Session {
        let analyzer = Analyzer::new(Arc::new(EchoScore), "llama-3.3-70b-versatile", &Config::default());
        Session::new(analyzer)
    }

    fn resume() -> ResumeText {
        ResumeText { name: "cv.pdf".to_string(), text: "Rust developer".to_string() }
    }

    #[tokio::test]
    async fn test_cover_letter_requires_analysis() {
        let mut session = session();
        session.load_inputs(resume(), "Job".to_string());
        assert!(matches!(
            session.generate_cover_letter().await,
            Err(ResumeMatcherError::NoAnalysis)
        ));
    }

    #[tokio::test]
    async fn test_analyze_requires_inputs() {
        let mut session = session();
        assert!(matches!(session.analyze().await, Err(ResumeMatcherError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_full_flow_then_clear() {
        let mut session = session();
        session.load_inputs(resume(), "Job".to_string());

        assert_eq!(session.analyze().await.unwrap().global_score, 61);
        assert_eq!(session.generate_cover_letter().await.unwrap(), "Dear team");
        let suggestions = session.generate_suggestions().await.unwrap();
        assert_eq!(suggestions.items, vec!["Add numbers"]);

        session.clear();
        assert!(session.analysis().is_none());
        assert!(session.cover_letter().is_none());
        assert!(session.resume().is_none());
    }

    #[tokio::test]
    async fn test_streaming_collects_chunks() {
        let mut session = session();
        session.load_inputs(resume(), "Job".to_string());

        let mut seen = String::new();
        let record = session.analyze_streaming(|chunk| seen.push_str(chunk)).await.unwrap();
        assert_eq!(record.global_score, 44);
        assert_eq!(seen, "{\"score_global\": 44}");
    }

    #[tokio::test]
    async fn test_new_inputs_discard_previous_results() {
        let mut session = session();
        session.load_inputs(resume(), "Job".to_string());
        session.analyze().await.unwrap();

        session.load_inputs(resume(), "Other job".to_string());
        assert!(session.analysis().is_none());
        assert_eq!(session.job_offer(), Some("Other job"));
    }
}

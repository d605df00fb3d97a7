//! Orchestration of the four LLM operations over a [`ChatBackend`]

use crate::config::{Config, GenerationConfig, SamplingConfig};
use crate::error::{Result, ResumeMatcherError};
use crate::input::ResumeText;
use crate::llm::client::{ChatBackend, ChatRequest};
use crate::llm::parser::{parse_list, parse_object, Suggestions};
use crate::llm::prompts::{PromptFormatter, SYSTEM_PROMPT};
use crate::llm::records::{AnalysisRecord, CandidateRanking};
use async_stream::stream;
use futures::{Stream, StreamExt};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;

/// Events of a streamed analysis: text as it arrives, then one terminal result
#[derive(Debug)]
pub enum StreamEvent {
    Chunk(String),
    Done(Result<AnalysisRecord>),
}

/// Decode an analysis reply into a validated record
pub fn decode_analysis(raw: &str) -> Result<AnalysisRecord> {
    let value = parse_object(raw)?;
    let record = AnalysisRecord::from_value(&value)?;

    let overlap = record.overlapping_skills();
    if !overlap.is_empty() {
        warn!("Skills listed as both present and missing: {}", overlap.join(", "));
    }
    Ok(record)
}

/// Decode a ranking reply, keeping the order the model chose
pub fn decode_ranking(raw: &str) -> Result<CandidateRanking> {
    let value = parse_object(raw)?;
    let ranking = CandidateRanking::from_value(&value)?;

    if !ranking.is_score_descending() {
        warn!("Ranking order returned by the model is not sorted by score");
    }
    Ok(ranking)
}

pub struct Analyzer {
    backend: Arc<dyn ChatBackend>,
    model: String,
    generation: GenerationConfig,
    prompts: PromptFormatter,
}

impl Analyzer {
    /// `model` is the backend identifier sent with every request
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>, config: &Config) -> Self {
        Self {
            backend,
            model: model.into(),
            generation: config.generation.clone(),
            prompts: PromptFormatter::new(config.prompts.clone()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, prompt: String, sampling: SamplingConfig) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            prompt,
            sampling,
        }
    }

    pub async fn analyze(&self, resume: &str, job: &str) -> Result<AnalysisRecord> {
        let start = Instant::now();
        let request = self.request(self.prompts.analysis(resume, job), self.generation.analysis);

        let raw = self.backend.complete(&request).await?;
        debug!("Analysis reply received ({} chars)", raw.len());

        let record = decode_analysis(&raw)?;
        info!(
            "Analysis completed in {:.2}s, global score {}",
            start.elapsed().as_secs_f64(),
            record.global_score
        );
        Ok(record)
    }

    /// Stream the analysis reply. The accumulated text is parsed once, after
    /// the backend reports the end of the stream; a transport error ends the
    /// stream with an error and no partial record.
    pub fn analyze_streaming(&self, resume: &str, job: &str) -> impl Stream<Item = StreamEvent> + Send + 'static {
        let request = self.request(self.prompts.analysis(resume, job), self.generation.analysis);
        let backend = Arc::clone(&self.backend);

        stream! {
            let mut chunks = match backend.stream(&request).await {
                Ok(chunks) => chunks,
                Err(e) => {
                    yield StreamEvent::Done(Err(e));
                    return;
                }
            };

            let mut accumulated = String::new();
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(text) => {
                        accumulated.push_str(&text);
                        yield StreamEvent::Chunk(text);
                    }
                    Err(e) => {
                        warn!("Stream interrupted after {} chars", accumulated.len());
                        yield StreamEvent::Done(Err(e));
                        return;
                    }
                }
            }

            debug!("Stream complete ({} chars), parsing", accumulated.len());
            yield StreamEvent::Done(decode_analysis(&accumulated));
        }
    }

    pub async fn cover_letter(&self, resume: &str, job: &str, analysis: &AnalysisRecord) -> Result<String> {
        let request = self.request(
            self.prompts.cover_letter(resume, job, analysis),
            self.generation.cover_letter,
        );
        let letter = self.backend.complete(&request).await?;
        Ok(letter.trim().to_string())
    }

    /// Improvement suggestions. A reply without a usable list falls back to
    /// the improvement points of `analysis`.
    pub async fn suggestions(&self, resume: &str, job: &str, analysis: &AnalysisRecord) -> Result<Suggestions> {
        let request = self.request(
            self.prompts.suggestions(resume, job, analysis),
            self.generation.suggestions,
        );
        let raw = self.backend.complete(&request).await?;
        Ok(parse_list(&raw, &analysis.improvements))
    }

    /// Rank several candidates in a single request
    pub async fn rank(&self, resumes: &[ResumeText], job: &str) -> Result<CandidateRanking> {
        if resumes.is_empty() {
            return Err(ResumeMatcherError::InvalidInput(
                "At least one resume is required for ranking".to_string(),
            ));
        }

        info!("Ranking {} candidates", resumes.len());
        let request = self.request(self.prompts.ranking(resumes, job), self.generation.ranking);
        let raw = self.backend.complete(&request).await?;
        decode_ranking(&raw)
    }
}

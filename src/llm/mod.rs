//! LLM integration module

pub mod analyzer;
pub mod client;
pub mod parser;
pub mod prompts;
pub mod records;

pub use analyzer::{Analyzer, StreamEvent};
pub use client::{ChatBackend, ChatRequest, GroqClient};
pub use parser::{SuggestionSource, Suggestions};
pub use records::{AnalysisRecord, CandidateRanking, Recommendation};

//! Prompt templates for the four LLM operations
//!
//! Templates are filled by plain substitution. The JSON layouts embedded in
//! the analysis and ranking templates are the response contract decoded by
//! [`crate::llm::records`].

use crate::config::PromptConfig;
use crate::input::ResumeText;
use crate::llm::records::AnalysisRecord;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

pub const SYSTEM_PROMPT: &str = "You are a senior HR expert and recruiter with 15 years of experience in resume analysis and job matching.
You specialise in objective skill assessment and in identifying gaps.
Your analyses are precise, constructive and actionable.";

pub const CANDIDATE_SEPARATOR: &str = "\n\n=== SEPARATION ===\n\n";

const ANALYSIS_TEMPLATE: &str = r#"Analyse this resume against the job offer below.

**CANDIDATE RESUME:**
{resume}

**JOB OFFER:**
{job}

**TASK:**
Return a detailed analysis as JSON with exactly this structure:

{
  "score_global": <number between 0 and 100>,
  "competences_techniques": {
    "presentes": [<technical skills of the candidate that match the offer>],
    "manquantes": [<required technical skills the candidate lacks>],
    "score": <number between 0 and 100>
  },
  "experience": {
    "annees_experience": <estimated years of experience>,
    "pertinence": "<short text on how relevant the experience is>",
    "score": <number between 0 and 100>
  },
  "formation": {
    "niveau": "<education level of the candidate>",
    "adequation": "<short text on how the education fits the role>",
    "score": <number between 0 and 100>
  },
  "soft_skills": {
    "identifies": [<soft skills found in the resume>],
    "manquantes": [<desired soft skills not mentioned>]
  },
  "points_forts": [<3-5 strengths of the candidate for this role>],
  "points_amelioration": [<3-5 concrete suggestions to improve the resume>],
  "synthese": "<summary paragraph of 3-4 sentences>"
}

Answer ONLY with the JSON, no text before or after."#;

const COVER_LETTER_TEMPLATE: &str = r#"Write a professional, personalised cover letter.

**CANDIDATE RESUME:**
{resume}

**JOB OFFER:**
{job}

**MATCH ANALYSIS:**
Global score: {score}/100
Strengths: {strengths}

**INSTRUCTIONS:**
- Professional but warm tone
- Classic structure: introduction, body (2-3 paragraphs), conclusion
- Highlight the matching skills
- Show enthusiasm for the role
- Stay concise (250-300 words max)
- Use concrete examples from the resume
- Do NOT mention the score

Write the letter in {language}, ready to be sent."#;

const SUGGESTIONS_TEMPLATE: &str = r#"As an HR expert, give 5 concrete, actionable suggestions to improve this resume for this specific role.

**CURRENT RESUME:**
{resume}

**JOB OFFER:**
{job}

**ANALYSIS:**
Missing skills: {missing_skills}
Current score: {score}/100

**FORMAT:**
Return a JSON array of 5 strings. Each suggestion must:
- Start with an action verb
- Be specific and actionable
- Aim at raising the match score
- Be realistic (no lying)

Example: ["Add a 'Projects' section with 2-3 concrete Python achievements", ...]

Answer ONLY with the JSON array, no extra text."#;

const RANKING_TEMPLATE: &str = r#"As a recruiter, analyse these resumes against the job offer.

**JOB OFFER:**
{job}

**CANDIDATE RESUMES:**
{resumes}

**TASK:**
Rank the candidates from most to least relevant and return JSON:

{
  "classement": [
    {
      "candidat": "<name or CV1, CV2, etc>",
      "score": <0-100>,
      "points_forts": [<2-3 strengths>],
      "reserves": [<2-3 concerns>],
      "recommandation": "<Recommandé/À considérer/Non retenu>"
    }
  ],
  "synthese": "<comparative paragraph>"
}

Answer ONLY with the JSON."#;

#[derive(Debug, Clone)]
pub struct PromptFormatter {
    settings: PromptConfig,
}

impl PromptFormatter {
    pub fn new(settings: PromptConfig) -> Self {
        Self { settings }
    }

    pub fn analysis(&self, resume: &str, job: &str) -> String {
        fill(ANALYSIS_TEMPLATE, &[("resume", resume), ("job", job)])
    }

    pub fn cover_letter(&self, resume: &str, job: &str, analysis: &AnalysisRecord) -> String {
        let strengths = truncate_graphemes(&analysis.strengths.join(", "), self.settings.strengths_max_chars);
        let score = analysis.global_score.to_string();

        fill(
            COVER_LETTER_TEMPLATE,
            &[
                ("resume", resume),
                ("job", job),
                ("score", &score),
                ("strengths", &strengths),
                ("language", &self.settings.letter_language),
            ],
        )
    }

    pub fn suggestions(&self, resume: &str, job: &str, analysis: &AnalysisRecord) -> String {
        let missing: Vec<&str> = analysis
            .technical_skills
            .missing
            .iter()
            .take(self.settings.suggestions_missing_skills)
            .map(String::as_str)
            .collect();
        let missing = missing.join(", ");
        let score = analysis.global_score.to_string();

        fill(
            SUGGESTIONS_TEMPLATE,
            &[("resume", resume), ("job", job), ("missing_skills", &missing), ("score", &score)],
        )
    }

    pub fn ranking(&self, resumes: &[ResumeText], job: &str) -> String {
        let candidates = format_candidates(resumes);
        fill(RANKING_TEMPLATE, &[("job", job), ("resumes", &candidates)])
    }
}

/// Substitute `{name}` placeholders in one pass. Inserted values are never
/// scanned again, and unknown names are left as written.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let pattern = PLACEHOLDER.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

    pattern
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Render each resume under a candidate heading, separated by a fixed marker
pub fn format_candidates(resumes: &[ResumeText]) -> String {
    resumes
        .iter()
        .map(|r| format!("**CANDIDATE: {}**\n{}", r.name, r.text))
        .collect::<Vec<_>>()
        .join(CANDIDATE_SEPARATOR)
}

/// Keep at most `max` user-perceived characters
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    text.graphemes(true).take(max).collect()
}

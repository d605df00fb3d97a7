//! Integration tests for the resume matcher

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use resume_matcher::config::{Config, InputConfig, OutputFormat};
use resume_matcher::error::{Result, ResumeMatcherError};
use resume_matcher::history::HistoryStore;
use resume_matcher::input::text_extractor::{PageStrategy, PdfExtractor};
use resume_matcher::input::InputManager;
use resume_matcher::llm::client::{ChatBackend, ChatRequest, ChunkStream};
use resume_matcher::llm::{Analyzer, GroqClient, SuggestionSource};
use resume_matcher::output::{AnalysisReport, ReportGenerator};
use resume_matcher::session::Session;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Write a one-page PDF with one text line per entry of `lines`
fn write_pdf(path: &Path, lines: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 11.into()]),
        Operation::new("TL", vec![14.into()]),
        Operation::new("Td", vec![50.into(), 780.into()]),
    ];
    for line in lines {
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

const RESUME_LINES: &[&str] = &[
    "Jane Doe",
    "Senior Software Engineer",
    "Six years building backend services in Rust and Go.",
    "Skills: Rust, tokio, PostgreSQL, Docker, Linux, gRPC.",
    "Education: MSc Computer Science, Universite de Lyon.",
];

fn readable_resume(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    write_pdf(&path, RESUME_LINES);
    path
}

fn input_manager() -> InputManager {
    InputManager::new(Config::default().input)
}

#[tokio::test]
async fn test_job_offer_from_markdown() {
    let text = input_manager()
        .load_job_offer(Path::new("tests/fixtures/job_offer.md"))
        .await
        .unwrap();

    assert!(text.contains("Senior Backend Engineer"));
    assert!(text.contains("Rust and tokio"));
    assert!(!text.contains("**"));
    assert!(!text.contains("##"));
}

#[tokio::test]
async fn test_job_offer_from_text() {
    let text = input_manager()
        .load_job_offer(Path::new("tests/fixtures/job_offer.txt"))
        .await
        .unwrap();
    assert!(text.starts_with("Data Engineer"));
}

#[tokio::test]
async fn test_unsupported_job_offer_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("offer.docx");
    std::fs::write(&path, "binary").unwrap();

    let result = input_manager().load_job_offer(&path).await;
    assert!(matches!(result, Err(ResumeMatcherError::UnsupportedFormat(_))));
}

#[tokio::test]
async fn test_nonexistent_job_offer() {
    let result = input_manager().load_job_offer(Path::new("tests/fixtures/missing.md")).await;
    assert!(matches!(result, Err(ResumeMatcherError::InvalidInput(_))));
}

#[tokio::test]
async fn test_resume_must_be_pdf() {
    let result = input_manager()
        .load_resume(Path::new("tests/fixtures/job_offer.txt"), 100)
        .await;
    assert!(matches!(result, Err(ResumeMatcherError::UnsupportedFormat(_))));
}

#[tokio::test]
async fn test_resume_pdf_extraction_and_cache() {
    let dir = TempDir::new().unwrap();
    let path = readable_resume(&dir, "jane_doe.pdf");
    let mut manager = input_manager();

    let first = manager.load_resume(&path, 100).await.unwrap();
    assert_eq!(first.name, "jane_doe.pdf");
    assert!(first.text.contains("Jane Doe"));
    assert!(first.text.chars().count() >= 100);
    assert_eq!(manager.cache_size(), 1);

    let second = manager.load_resume(&path, 100).await.unwrap();
    assert_eq!(first.text, second.text);
    assert_eq!(manager.cache_size(), 1);
}

#[tokio::test]
async fn test_page_strategy_alone_reads_resume() {
    let dir = TempDir::new().unwrap();
    let path = readable_resume(&dir, "pages_only.pdf");
    let extractor = PdfExtractor::with_strategies(vec![Box::new(PageStrategy)]);
    let mut manager = input_manager().with_pdf_extractor(extractor);

    let resume = manager.load_resume(&path, 100).await.unwrap();
    assert!(resume.text.contains("Senior Software Engineer"));
}

#[tokio::test]
async fn test_short_resume_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.pdf");
    write_pdf(&path, &["Jane Doe"]);

    let result = input_manager().load_resume(&path, 100).await;
    assert!(matches!(result, Err(ResumeMatcherError::UnreadableResume { min: 100, .. })));
}

#[tokio::test]
async fn test_corrupt_pdf_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("corrupt.pdf");
    std::fs::write(&path, b"%PDF-1.4 this is not really a pdf").unwrap();

    let result = input_manager().load_resume(&path, 100).await;
    assert!(matches!(result, Err(ResumeMatcherError::PdfExtraction(_))));
}

#[tokio::test]
async fn test_size_ceiling_enforced() {
    let dir = TempDir::new().unwrap();
    let path = readable_resume(&dir, "big.pdf");
    let mut manager = InputManager::new(InputConfig {
        min_resume_chars: 100,
        min_batch_resume_chars: 50,
        max_file_size_mb: 0,
    });

    let result = manager.load_resume(&path, 100).await;
    assert!(matches!(result, Err(ResumeMatcherError::InvalidInput(_))));
}

#[tokio::test]
async fn test_batch_skips_unreadable_resumes() {
    let dir = TempDir::new().unwrap();
    let good = readable_resume(&dir, "good.pdf");
    let blank = dir.path().join("blank.pdf");
    write_pdf(&blank, &["CV"]);

    let resumes = input_manager().load_resume_batch(&[good, blank.clone()]).await.unwrap();
    assert_eq!(resumes.len(), 1);
    assert_eq!(resumes[0].name, "good.pdf");

    let result = input_manager().load_resume_batch(&[blank]).await;
    assert!(matches!(result, Err(ResumeMatcherError::InvalidInput(_))));
}

#[tokio::test]
async fn test_malformed_credential_never_connects() {
    let err = GroqClient::connect("abc123", &Config::default().api, "llama-3.3-70b-versatile")
        .await
        .unwrap_err();
    assert!(matches!(err, ResumeMatcherError::Credential(_)));
}

/// Backend that answers each kind of prompt with a canned reply
struct ScriptedBackend;

const ANALYSIS_REPLY: &str = r#"Here is my analysis:
{
  "score_global": 74,
  "competences_techniques": {"presentes": ["Rust", "PostgreSQL"], "manquantes": ["Kubernetes", "Kafka"], "score": 70},
  "experience": {"annees_experience": 6, "pertinence": "Backend services at scale", "score": 80},
  "formation": {"niveau": "MSc", "adequation": "Matches the role", "score": 75},
  "soft_skills": {"identifies": ["Autonomy"], "manquantes": ["Written communication"]},
  "points_forts": ["Rust expertise", "Database work", "Production experience"],
  "points_amelioration": ["Mention Kubernetes exposure", "Quantify results", "Add a projects section"],
  "synthese": "A strong backend profile with a gap on orchestration."
}
Let me know if you need more."#;

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        if request.prompt.contains("cover letter") {
            Ok("Dear hiring manager,\n\nI would love to join your team.".to_string())
        } else if request.prompt.contains("JSON array") {
            Ok("I would suggest working on your profile.".to_string())
        } else {
            Ok(ANALYSIS_REPLY.to_string())
        }
    }

    async fn stream(&self, _request: &ChatRequest) -> Result<ChunkStream> {
        let chunks: Vec<Result<String>> = ANALYSIS_REPLY
            .as_bytes()
            .chunks(40)
            .map(|c| Ok(String::from_utf8_lossy(c).to_string()))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

#[tokio::test]
async fn test_end_to_end_session_with_history() {
    let dir = TempDir::new().unwrap();
    let resume_path = readable_resume(&dir, "jane_doe.pdf");
    let config = Config::default();

    let mut manager = InputManager::new(config.input.clone());
    let resume = manager.load_resume(&resume_path, config.input.min_resume_chars).await.unwrap();
    let job = manager.load_job_offer(Path::new("tests/fixtures/job_offer.md")).await.unwrap();

    let analyzer = Analyzer::new(Arc::new(ScriptedBackend), "llama-3.3-70b-versatile", &config);
    let mut session = Session::new(analyzer);
    session.load_inputs(resume, job);

    let mut streamed = String::new();
    let analysis = session.analyze_streaming(|chunk| streamed.push_str(chunk)).await.unwrap();
    assert_eq!(analysis.global_score, 74);
    assert_eq!(streamed, ANALYSIS_REPLY);

    let letter = session.generate_cover_letter().await.unwrap();
    assert!(letter.starts_with("Dear hiring manager"));

    let suggestions = session.generate_suggestions().await.unwrap();
    assert_eq!(suggestions.source, SuggestionSource::PriorAnalysis);
    assert_eq!(suggestions.items.len(), 3);

    let store = HistoryStore::new(dir.path().join("history"));
    let report = AnalysisReport::from_session(&session, "job_offer.md", 10).unwrap();
    let id = store.save(&report.metadata.resume_file, &report.analysis).unwrap();

    let entries = store.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id);
    assert_eq!(entries[0].cv_name, "jane_doe.pdf");
    assert_eq!(entries[0].score, 74);

    let generator = ReportGenerator::with_options(false, true, true, true, true);
    let markdown = generator.generate_analysis(&report, OutputFormat::Markdown).unwrap();
    assert!(markdown.contains("- Kubernetes"));
    assert!(markdown.contains("## Cover Letter"));

    let restored = AnalysisReport::from_history(&store.load(&id).unwrap());
    let html = generator.generate_analysis(&restored, OutputFormat::Html).unwrap();
    assert!(html.contains("74/100"));
}

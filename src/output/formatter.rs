//! Output formatters: console, JSON, Markdown and HTML

use crate::config::{OutputConfig, OutputFormat};
use crate::error::{Result, ResumeMatcherError};
use crate::llm::parser::SuggestionSource;
use crate::llm::records::Recommendation;
use crate::output::report::*;
use askama::Template;
use colored::{Color, Colorize};
use std::path::Path;

/// Formats analysis and ranking reports into one output format
pub trait OutputFormatter {
    fn format_analysis(&self, report: &AnalysisReport) -> Result<String>;
    fn format_ranking(&self, report: &RankingReport) -> Result<String>;
}

/// Console formatter with colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

pub struct HtmlFormatter {
    include_styles: bool,
}

/// Report generator that coordinates the formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    html_formatter: HtmlFormatter,
}

const HTML_STYLES: &str = r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 900px;
            margin: 0 auto;
            padding: 20px;
            background: #f8f9fa;
        }
        .container { background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        .header { text-align: center; margin-bottom: 30px; border-bottom: 3px solid #007acc; padding-bottom: 20px; }
        .score-badge { display: inline-block; padding: 8px 16px; border-radius: 20px; font-weight: bold; color: white; margin-left: 10px; }
        .score-excellent { background: #28a745; }
        .score-good { background: #17a2b8; }
        .score-fair { background: #ffc107; color: #000; }
        .score-poor { background: #dc3545; }
        .section h2 { color: #007acc; border-bottom: 2px solid #e9ecef; padding-bottom: 10px; }
        .score-breakdown { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 15px; margin: 20px 0; }
        .score-item { background: #f8f9fa; padding: 15px; border-radius: 6px; border-left: 4px solid #007acc; }
        .strengths, .improvements { background: #f8f9fa; padding: 15px; border-radius: 6px; margin: 10px 0; }
        .strengths { border-left: 4px solid #28a745; }
        .improvements { border-left: 4px solid #ffc107; }
        .letter { white-space: pre-wrap; background: #fff; border: 1px solid #e9ecef; padding: 20px; border-radius: 6px; }
        table { border-collapse: collapse; width: 100%; }
        th, td { text-align: left; padding: 8px; border-bottom: 1px solid #e9ecef; vertical-align: top; }
        .metadata { background: #e9ecef; padding: 15px; border-radius: 6px; margin-top: 30px; font-size: 0.9em; color: #6c757d; }
"#;

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Resume Match Report</title>
    {% if include_styles %}<style>{{ styles|safe }}</style>{% endif %}
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Resume Match Report</h1>
            <p>Generated: {{ generated_at }}{% if !model.is_empty() %} | Model: {{ model }}{% endif %}</p>
        </div>

        <div class="section">
            <h2>Summary</h2>
            <h3>Global score: {{ global_score }}/100 <span class="score-badge {{ score_class }}">{{ score_label }}</span></h3>
            <p>{{ summary }}</p>
            <div class="score-breakdown">
                <div class="score-item"><h4>Technical skills</h4><p><strong>{{ technical_score }}/100</strong></p></div>
                <div class="score-item"><h4>Experience</h4><p><strong>{{ experience_score }}/100</strong> ({{ years }} years)</p><p>{{ relevance }}</p></div>
                <div class="score-item"><h4>Education</h4><p><strong>{{ education_score }}/100</strong> ({{ education_level }})</p><p>{{ education_fit }}</p></div>
            </div>
        </div>

        <div class="section">
            <h2>Technical skills</h2>
            <div class="strengths"><h4>Present</h4><ul>{% for skill in skills_present %}<li>{{ skill }}</li>{% endfor %}</ul></div>
            <div class="improvements"><h4>Missing</h4><ul>{% for skill in skills_missing %}<li>{{ skill }}</li>{% endfor %}</ul></div>
        </div>

        <div class="section">
            <h2>Soft skills</h2>
            <div class="strengths"><h4>Identified</h4><ul>{% for skill in soft_identified %}<li>{{ skill }}</li>{% endfor %}</ul></div>
            <div class="improvements"><h4>Missing</h4><ul>{% for skill in soft_missing %}<li>{{ skill }}</li>{% endfor %}</ul></div>
        </div>

        <div class="section">
            <h2>Strengths</h2>
            <div class="strengths"><ul>{% for item in strengths %}<li>{{ item }}</li>{% endfor %}</ul></div>
        </div>

        <div class="section">
            <h2>Areas for improvement</h2>
            <div class="improvements"><ul>{% for item in improvements %}<li>{{ item }}</li>{% endfor %}</ul></div>
        </div>

        {% if !suggestions.is_empty() %}
        <div class="section">
            <h2>Suggestions</h2>
            <ol>{% for item in suggestions %}<li>{{ item }}</li>{% endfor %}</ol>
        </div>
        {% endif %}

        {% if !cover_letter.is_empty() %}
        <div class="section">
            <h2>Cover letter</h2>
            <div class="letter">{{ cover_letter }}</div>
        </div>
        {% endif %}

        <div class="metadata">
            <p><strong>Generated by resume-matcher v{{ version }}</strong></p>
            <p><strong>Resume:</strong> {{ resume_file }}{% if !job_file.is_empty() %} | <strong>Job:</strong> {{ job_file }}{% endif %}</p>
        </div>
    </div>
</body>
</html>"#, ext = "html")]
struct AnalysisHtml<'a> {
    include_styles: bool,
    styles: &'a str,
    generated_at: String,
    model: &'a str,
    global_score: u8,
    score_class: &'a str,
    score_label: &'a str,
    summary: &'a str,
    technical_score: u8,
    experience_score: u8,
    years: f32,
    relevance: &'a str,
    education_score: u8,
    education_level: &'a str,
    education_fit: &'a str,
    skills_present: &'a [String],
    skills_missing: &'a [String],
    soft_identified: &'a [String],
    soft_missing: &'a [String],
    strengths: &'a [String],
    improvements: &'a [String],
    suggestions: &'a [String],
    cover_letter: &'a str,
    version: &'a str,
    resume_file: &'a str,
    job_file: &'a str,
}

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Candidate Ranking</title>
    {% if include_styles %}<style>{{ styles|safe }}</style>{% endif %}
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Candidate Ranking</h1>
            <p>Generated: {{ generated_at }} | Model: {{ model }} | Candidates: {{ candidates_submitted }}</p>
        </div>

        <div class="section">
            <table>
                <tr><th>#</th><th>Candidate</th><th>Score</th><th>Strengths</th><th>Concerns</th><th>Recommendation</th></tr>
                {% for row in rows %}
                <tr>
                    <td>{{ row.position }}</td>
                    <td>{{ row.name }}</td>
                    <td><span class="score-badge {{ row.score_class }}">{{ row.score }}</span></td>
                    <td><ul>{% for item in row.strengths %}<li>{{ item }}</li>{% endfor %}</ul></td>
                    <td><ul>{% for item in row.concerns %}<li>{{ item }}</li>{% endfor %}</ul></td>
                    <td>{{ row.recommendation }}</td>
                </tr>
                {% endfor %}
            </table>
        </div>

        <div class="section">
            <h2>Comparison</h2>
            <p>{{ summary }}</p>
        </div>

        <div class="metadata">
            <p><strong>Generated by resume-matcher v{{ version }}</strong></p>
            <p><strong>Job:</strong> {{ job_file }}</p>
        </div>
    </div>
</body>
</html>"#, ext = "html")]
struct RankingHtml<'a> {
    include_styles: bool,
    styles: &'a str,
    generated_at: String,
    model: &'a str,
    candidates_submitted: usize,
    rows: Vec<RankingRow<'a>>,
    summary: &'a str,
    version: &'a str,
    job_file: &'a str,
}

struct RankingRow<'a> {
    position: usize,
    name: &'a str,
    score: u8,
    score_class: &'static str,
    strengths: &'a [String],
    concerns: &'a [String],
    recommendation: &'static str,
}

fn suggestion_source_label(source: SuggestionSource) -> &'static str {
    match source {
        SuggestionSource::Reply => "generated",
        SuggestionSource::PriorAnalysis => "from the analysis (the reply held no usable list)",
        SuggestionSource::Empty => "none available",
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: u8) -> String {
        let level = MatchLevel::from_score(score);
        let color = match level {
            MatchLevel::Excellent => Color::Green,
            MatchLevel::Good => Color::Cyan,
            MatchLevel::Average => Color::Yellow,
            MatchLevel::Weak => Color::Red,
        };

        if self.use_colors {
            format!("[{}]", level.label().to_uppercase().color(color).bold())
        } else {
            format!("[{}]", level.label().to_uppercase())
        }
    }

    fn format_recommendation(&self, recommendation: Recommendation) -> String {
        let color = match recommendation {
            Recommendation::Recommended => Color::Green,
            Recommendation::Consider => Color::Yellow,
            Recommendation::Rejected => Color::Red,
        };
        self.colorize(recommendation.label(), color)
    }

    fn format_list(&self, output: &mut String, items: &[String], color: Color) {
        if items.is_empty() {
            output.push_str("  (none)\n");
        }
        for item in items {
            output.push_str(&format!("  • {}\n", self.colorize(item, color)));
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_analysis(&self, report: &AnalysisReport) -> Result<String> {
        let analysis = &report.analysis;
        let mut output = String::new();

        output.push_str(&self.format_header("RESUME MATCH ANALYSIS", 1));
        output.push_str(&format!(
            "Generated: {} | Resume: {}\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S"),
            report.metadata.resume_file
        ));

        output.push_str(&self.format_header("Summary", 2));
        output.push_str(&format!(
            "Global score: {}/100 {}\n",
            analysis.global_score,
            self.format_score_badge(analysis.global_score)
        ));
        if !analysis.summary.is_empty() {
            output.push_str(&format!("{}\n", self.colorize(&analysis.summary, Color::Cyan)));
        }

        output.push_str(&self.format_header("Score Breakdown", 3));
        output.push_str(&format!("Technical skills: {}/100\n", analysis.technical_skills.score));
        output.push_str(&format!(
            "Experience: {}/100 ({} years)\n",
            analysis.experience.score, analysis.experience.years
        ));
        output.push_str(&format!(
            "Education: {}/100 ({})\n",
            analysis.education.score, analysis.education.level
        ));

        if self.detailed {
            if !analysis.experience.relevance.is_empty() {
                output.push_str(&format!("  Experience: {}\n", analysis.experience.relevance));
            }
            if !analysis.education.fit.is_empty() {
                output.push_str(&format!("  Education: {}\n", analysis.education.fit));
            }
        }

        output.push_str(&self.format_header("Technical Skills", 3));
        output.push_str("Present:\n");
        self.format_list(&mut output, &analysis.technical_skills.present, Color::Green);
        output.push_str("Missing:\n");
        self.format_list(&mut output, &analysis.technical_skills.missing, Color::Red);

        if self.detailed {
            output.push_str(&self.format_header("Soft Skills", 3));
            output.push_str("Identified:\n");
            self.format_list(&mut output, &analysis.soft_skills.identified, Color::Green);
            output.push_str("Missing:\n");
            self.format_list(&mut output, &analysis.soft_skills.missing, Color::Yellow);
        }

        output.push_str(&self.format_header("Strengths", 3));
        self.format_list(&mut output, &analysis.strengths, Color::Green);

        output.push_str(&self.format_header("Areas for Improvement", 3));
        self.format_list(&mut output, &analysis.improvements, Color::Yellow);

        if let Some(suggestions) = &report.suggestions {
            output.push_str(&self.format_header("Suggestions", 2));
            output.push_str(&format!("Source: {}\n", suggestion_source_label(suggestions.source)));
            for (i, item) in suggestions.items.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, item));
            }
        }

        if let Some(letter) = &report.cover_letter {
            output.push_str(&self.format_header("Cover Letter", 2));
            output.push_str(letter);
            output.push('\n');
        }

        if !report.metadata.model.is_empty() {
            output.push_str(&format!(
                "\n{}\n",
                self.colorize(
                    &format!("Model: {} | {} ms", report.metadata.model, report.metadata.processing_time_ms),
                    Color::BrightBlack
                )
            ));
        }

        Ok(output)
    }

    fn format_ranking(&self, report: &RankingReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("CANDIDATE RANKING", 1));
        output.push_str(&format!(
            "Generated: {} | Candidates: {}\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S"),
            report.candidates_submitted
        ));

        for (i, entry) in report.ranking.entries.iter().enumerate() {
            output.push_str(&self.format_header(
                &format!("{}. {} ({}/100)", i + 1, entry.candidate_name, entry.score),
                2,
            ));
            output.push_str(&format!(
                "Recommendation: {} {}\n",
                self.format_recommendation(entry.recommendation),
                self.format_score_badge(entry.score)
            ));
            output.push_str("Strengths:\n");
            self.format_list(&mut output, &entry.strengths, Color::Green);
            output.push_str("Concerns:\n");
            self.format_list(&mut output, &entry.concerns, Color::Yellow);
        }

        if !report.ranking.summary.is_empty() {
            output.push_str(&self.format_header("Comparison", 2));
            output.push_str(&format!("{}\n", report.ranking.summary));
        }

        Ok(output)
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_analysis(&self, report: &AnalysisReport) -> Result<String> {
        self.to_json(report)
    }

    fn format_ranking(&self, report: &RankingReport) -> Result<String> {
        self.to_json(report)
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn markdown_score_badge(score: u8) -> &'static str {
        match MatchLevel::from_score(score) {
            MatchLevel::Excellent => "🟢 Excellent",
            MatchLevel::Good => "🟡 Good",
            MatchLevel::Average => "🟠 Average",
            MatchLevel::Weak => "🔴 Weak",
        }
    }

    fn bullet_list(items: &[String]) -> String {
        if items.is_empty() {
            return "_None_\n\n".to_string();
        }
        let mut output: String = items.iter().map(|item| format!("- {}\n", item)).collect();
        output.push('\n');
        output
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_analysis(&self, report: &AnalysisReport) -> Result<String> {
        let analysis = &report.analysis;
        let mut output = String::new();

        output.push_str("# Resume Match Report\n\n");

        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Model:** {}\n",
                report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S"),
                report.metadata.model
            ));
            output.push_str(&format!(
                "**Resume:** `{}` | **Job:** `{}`\n\n",
                report.metadata.resume_file, report.metadata.job_file
            ));
        }

        output.push_str("## Summary\n\n");
        output.push_str(&format!(
            "**Global score:** {}/100 {}\n\n",
            analysis.global_score,
            Self::markdown_score_badge(analysis.global_score)
        ));
        if !analysis.summary.is_empty() {
            output.push_str(&format!("{}\n\n", analysis.summary));
        }

        output.push_str("### Score Breakdown\n\n");
        output.push_str("| Component | Score | Details |\n");
        output.push_str("|-----------|-------|---------|\n");
        output.push_str(&format!("| Technical skills | {}/100 | |\n", analysis.technical_skills.score));
        output.push_str(&format!(
            "| Experience | {}/100 | {} years. {} |\n",
            analysis.experience.score, analysis.experience.years, analysis.experience.relevance
        ));
        output.push_str(&format!(
            "| Education | {}/100 | {}. {} |\n\n",
            analysis.education.score, analysis.education.level, analysis.education.fit
        ));

        output.push_str("## Technical Skills\n\n### Present\n\n");
        output.push_str(&Self::bullet_list(&analysis.technical_skills.present));
        output.push_str("### Missing\n\n");
        output.push_str(&Self::bullet_list(&analysis.technical_skills.missing));

        output.push_str("## Soft Skills\n\n### Identified\n\n");
        output.push_str(&Self::bullet_list(&analysis.soft_skills.identified));
        output.push_str("### Missing\n\n");
        output.push_str(&Self::bullet_list(&analysis.soft_skills.missing));

        output.push_str("## Strengths\n\n");
        output.push_str(&Self::bullet_list(&analysis.strengths));
        output.push_str("## Areas for Improvement\n\n");
        output.push_str(&Self::bullet_list(&analysis.improvements));

        if let Some(suggestions) = &report.suggestions {
            output.push_str("## Suggestions\n\n");
            output.push_str(&format!("_Source: {}_\n\n", suggestion_source_label(suggestions.source)));
            for (i, item) in suggestions.items.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, item));
            }
            output.push('\n');
        }

        if let Some(letter) = &report.cover_letter {
            output.push_str("## Cover Letter\n\n");
            output.push_str(letter);
            output.push_str("\n\n");
        }

        output.push_str(&format!("---\n*Generated by resume-matcher v{}*\n", report.metadata.version));
        Ok(output)
    }

    fn format_ranking(&self, report: &RankingReport) -> Result<String> {
        let mut output = String::new();

        output.push_str("# Candidate Ranking\n\n");
        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Model:** {} | **Job:** `{}`\n\n",
                report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S"),
                report.metadata.model,
                report.metadata.job_file
            ));
        }

        output.push_str("| # | Candidate | Score | Recommendation |\n");
        output.push_str("|---|-----------|-------|----------------|\n");
        for (i, entry) in report.ranking.entries.iter().enumerate() {
            output.push_str(&format!(
                "| {} | {} | {}/100 {} | {} |\n",
                i + 1,
                entry.candidate_name,
                entry.score,
                Self::markdown_score_badge(entry.score),
                entry.recommendation.label()
            ));
        }
        output.push('\n');

        for entry in &report.ranking.entries {
            output.push_str(&format!("## {}\n\n**Strengths**\n\n", entry.candidate_name));
            output.push_str(&Self::bullet_list(&entry.strengths));
            output.push_str("**Concerns**\n\n");
            output.push_str(&Self::bullet_list(&entry.concerns));
        }

        if !report.ranking.summary.is_empty() {
            output.push_str(&format!("## Comparison\n\n{}\n\n", report.ranking.summary));
        }

        output.push_str(&format!("---\n*Generated by resume-matcher v{}*\n", report.metadata.version));
        Ok(output)
    }
}

impl HtmlFormatter {
    pub fn new(include_styles: bool) -> Self {
        Self { include_styles }
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_analysis(&self, report: &AnalysisReport) -> Result<String> {
        let analysis = &report.analysis;
        let suggestions: &[String] = report
            .suggestions
            .as_ref()
            .map(|s| s.items.as_slice())
            .unwrap_or_default();

        let template = AnalysisHtml {
            include_styles: self.include_styles,
            styles: HTML_STYLES,
            generated_at: report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            model: &report.metadata.model,
            global_score: analysis.global_score,
            score_class: report.level.css_class(),
            score_label: report.level.label(),
            summary: &analysis.summary,
            technical_score: analysis.technical_skills.score,
            experience_score: analysis.experience.score,
            years: analysis.experience.years,
            relevance: &analysis.experience.relevance,
            education_score: analysis.education.score,
            education_level: &analysis.education.level,
            education_fit: &analysis.education.fit,
            skills_present: &analysis.technical_skills.present,
            skills_missing: &analysis.technical_skills.missing,
            soft_identified: &analysis.soft_skills.identified,
            soft_missing: &analysis.soft_skills.missing,
            strengths: &analysis.strengths,
            improvements: &analysis.improvements,
            suggestions,
            cover_letter: report.cover_letter.as_deref().unwrap_or_default(),
            version: &report.metadata.version,
            resume_file: &report.metadata.resume_file,
            job_file: &report.metadata.job_file,
        };

        template
            .render()
            .map_err(|e| ResumeMatcherError::OutputFormatting(e.to_string()))
    }

    fn format_ranking(&self, report: &RankingReport) -> Result<String> {
        let rows = report
            .ranking
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| RankingRow {
                position: i + 1,
                name: &entry.candidate_name,
                score: entry.score,
                score_class: MatchLevel::from_score(entry.score).css_class(),
                strengths: &entry.strengths,
                concerns: &entry.concerns,
                recommendation: entry.recommendation.label(),
            })
            .collect();

        let template = RankingHtml {
            include_styles: self.include_styles,
            styles: HTML_STYLES,
            generated_at: report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            model: &report.metadata.model,
            candidates_submitted: report.candidates_submitted,
            rows,
            summary: &report.ranking.summary,
            version: &report.metadata.version,
            job_file: &report.metadata.job_file,
        };

        template
            .render()
            .map_err(|e| ResumeMatcherError::OutputFormatting(e.to_string()))
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, false, true, true, true)
    }

    pub fn with_options(
        use_colors: bool,
        detailed: bool,
        pretty_json: bool,
        include_metadata: bool,
        include_html_styles: bool,
    ) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
            html_formatter: HtmlFormatter::new(include_html_styles),
        }
    }

    pub fn from_config(output: &OutputConfig) -> Self {
        Self::with_options(output.color_output, output.detailed, true, true, true)
    }

    /// Same settings without terminal colors, for writing to files
    pub fn for_file(output: &OutputConfig) -> Self {
        Self::with_options(false, output.detailed, true, true, true)
    }

    fn formatter(&self, format: OutputFormat) -> &dyn OutputFormatter {
        match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
            OutputFormat::Html => &self.html_formatter,
        }
    }

    pub fn generate_analysis(&self, report: &AnalysisReport, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_analysis(report)
    }

    pub fn generate_ranking(&self, report: &RankingReport, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_ranking(report)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

pub fn suggest_filename(format: OutputFormat, resume_name: &str, timestamp: bool) -> String {
    let base_name = Path::new(resume_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    let extension = match format {
        OutputFormat::Console => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
        OutputFormat::Html => "html",
    };
    format!("{}_analysis{}.{}", base_name, timestamp_suffix, extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::parser::Suggestions;
    use crate::llm::records::{AnalysisRecord, CandidateRanking};
    use serde_json::json;

    fn report() -> AnalysisReport {
        let record = AnalysisRecord::from_value(&json!({
            "score_global": 83,
            "competences_techniques": {"presentes": ["Rust"], "manquantes": ["<Kafka>"], "score": 80},
            "experience": {"annees_experience": 6, "pertinence": "Backend", "score": 85},
            "formation": {"niveau": "MSc", "adequation": "Fits", "score": 70},
            "points_forts": ["Systems work"],
            "points_amelioration": ["Quantify impact"],
            "synthese": "Strong profile."
        }))
        .unwrap();
        let mut report = AnalysisReport::new(ReportMetadata::new("llama", "jane.pdf", "job.md", 1200), record);
        report.suggestions = Some(Suggestions {
            items: vec!["Add a Kafka side project".to_string()],
            source: SuggestionSource::Reply,
        });
        report.cover_letter = Some("Dear team,\nI am applying.".to_string());
        report
    }

    fn ranking_report() -> RankingReport {
        let ranking = CandidateRanking::from_value(&json!({
            "classement": [
                {"candidat": "alice.pdf", "score": 88, "points_forts": ["Rust"], "reserves": [], "recommandation": "Recommandé"},
                {"candidat": "bob.pdf", "score": 35, "points_forts": [], "reserves": ["No backend"], "recommandation": "Non retenu"}
            ],
            "synthese": "Alice leads."
        }))
        .unwrap();
        RankingReport::new(ReportMetadata::new("llama", "", "job.md", 900), ranking, 3)
    }

    #[test]
    fn test_plain_console_output() {
        let output = ConsoleFormatter::new(false, true).format_analysis(&report()).unwrap();
        assert!(output.contains("Global score: 83/100 [EXCELLENT MATCH]"));
        assert!(output.contains("  • Rust"));
        assert!(output.contains("Dear team,"));
        assert!(output.contains("  1. Add a Kafka side project"));
        assert!(output.contains("Experience: Backend"));
    }

    #[test]
    fn test_json_output_keeps_wire_names() {
        let output = JsonFormatter::new(false).format_analysis(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["analysis"]["score_global"], 83);
        assert_eq!(value["level"], "Excellent");
        assert_eq!(value["suggestions"]["source"], "Reply");
    }

    #[test]
    fn test_markdown_output() {
        let output = MarkdownFormatter::new(true).format_analysis(&report()).unwrap();
        assert!(output.contains("**Global score:** 83/100 🟢 Excellent"));
        assert!(output.contains("| Experience | 85/100 | 6 years. Backend |"));
        assert!(output.contains("## Cover Letter"));
    }

    #[test]
    fn test_html_output_escapes_model_text() {
        let output = HtmlFormatter::new(false).format_analysis(&report()).unwrap();
        assert!(output.contains("score-excellent"));
        assert!(output.contains("&#60;Kafka&#62;"));
        assert!(!output.contains("<Kafka>"));
        assert!(!output.contains("<style>"));
    }

    #[test]
    fn test_ranking_formats() {
        let generator = ReportGenerator::with_options(false, false, true, true, true);
        let report = ranking_report();

        let console = generator.generate_ranking(&report, OutputFormat::Console).unwrap();
        assert!(console.contains("1. alice.pdf (88/100)"));
        assert!(console.contains("Recommendation: Rejected"));

        let markdown = generator.generate_ranking(&report, OutputFormat::Markdown).unwrap();
        assert!(markdown.contains("| 2 | bob.pdf | 35/100 🔴 Weak | Rejected |"));

        let html = generator.generate_ranking(&report, OutputFormat::Html).unwrap();
        assert!(html.contains("<td>alice.pdf</td>"));
        assert!(html.contains("Candidates: 3"));
    }

    #[test]
    fn test_suggest_filename() {
        assert_eq!(suggest_filename(OutputFormat::Markdown, "cvs/jane.pdf", false), "jane_analysis.md");
        assert_eq!(suggest_filename(OutputFormat::Console, "jane.pdf", false), "jane_analysis.txt");
    }
}

//! CLI interface for the resume matcher

use crate::config::OutputFormat;
use crate::error::{Result, ResumeMatcherError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "resume-matcher")]
#[command(about = "AI-powered resume to job offer matching assistant")]
#[command(long_about = "Score a resume against a job offer with a hosted LLM, generate cover letters and improvement suggestions, and rank several candidates")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// API key (defaults to the environment variable named in the configuration)
    #[arg(long, global = true)]
    pub api_key: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze one resume against a job offer
    Analyze {
        /// Path to the resume (PDF)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to the job offer (TXT, MD or PDF)
        #[arg(short, long)]
        job: PathBuf,

        /// Model to use (see `models list`)
        #[arg(short, long)]
        model: Option<String>,

        /// Print the model reply as it is generated
        #[arg(long)]
        stream: bool,

        /// Also generate a cover letter
        #[arg(long)]
        cover_letter: bool,

        /// Also generate improvement suggestions
        #[arg(long)]
        suggestions: bool,

        /// Output format: console, json, markdown, html
        #[arg(short, long)]
        output: Option<String>,

        /// Save the report to a file (a directory gets a generated file name)
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Show every section of the analysis
        #[arg(short, long)]
        detailed: bool,

        /// Do not record this analysis in the history
        #[arg(long)]
        no_history: bool,
    },

    /// Rank several resumes against one job offer
    Rank {
        /// Path to the job offer (TXT, MD or PDF)
        #[arg(short, long)]
        job: PathBuf,

        /// Resumes to compare (PDF)
        #[arg(short, long, required = true, num_args = 1..)]
        resumes: Vec<PathBuf>,

        /// Model to use (see `models list`)
        #[arg(short, long)]
        model: Option<String>,

        /// Output format: console, json, markdown, html
        #[arg(short, long)]
        output: Option<String>,

        /// Save the ranking to a file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Saved analyses
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Model commands
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List saved analyses, newest first
    List,

    /// Show one saved analysis
    Show {
        /// Entry id
        id: String,

        /// Output format: console, json, markdown, html
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Delete one saved analysis
    Delete {
        /// Entry id
        id: String,
    },

    /// Delete every saved analysis
    Clear,
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List available models
    List,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> std::result::Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        "html" => Ok(OutputFormat::Html),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown, html", format)),
    }
}

/// The `--output` flag when given, otherwise the configured default
pub fn resolve_output_format(flag: Option<&str>, default: OutputFormat) -> Result<OutputFormat> {
    match flag {
        Some(format) => parse_output_format(format).map_err(ResumeMatcherError::InvalidInput),
        None => Ok(default),
    }
}

/// The `--api-key` flag when given, otherwise the named environment variable
pub fn resolve_api_key(flag: Option<String>, env_name: &str) -> Result<String> {
    if let Some(key) = flag {
        return Ok(key);
    }
    std::env::var(env_name).map_err(|_| {
        ResumeMatcherError::Credential(format!("set {} or pass --api-key", env_name))
    })
}

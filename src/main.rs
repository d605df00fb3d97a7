//! Resume matcher: AI-powered resume to job offer matching assistant

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use resume_matcher::cli::{self, Cli, Commands, ConfigAction, HistoryAction, ModelAction};
use resume_matcher::config::Config;
use resume_matcher::error::{Result, ResumeMatcherError};
use resume_matcher::history::HistoryStore;
use resume_matcher::input::InputManager;
use resume_matcher::llm::{Analyzer, GroqClient};
use resume_matcher::output::{
    save_report_to_file, suggest_filename, AnalysisReport, RankingReport, ReportGenerator,
    ReportMetadata,
};
use resume_matcher::session::Session;
use std::io::Write;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, cli.api_key, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, api_key: Option<String>, mut config: Config) -> Result<()> {
    match command {
        Commands::Analyze {
            resume,
            job,
            model,
            stream,
            cover_letter,
            suggestions,
            output,
            save,
            detailed,
            no_history,
        } => {
            let format = cli::resolve_output_format(output.as_deref(), config.output.format)?;
            if detailed {
                config.output.detailed = true;
            }
            let model = config.resolve_model(model.as_deref())?.clone();

            // Inputs are checked before any paid request
            let mut input_manager = InputManager::new(config.input.clone());
            let min_chars = input_manager.min_resume_chars();
            let resume_text = input_manager.load_resume(&resume, min_chars).await?;
            let job_text = input_manager.load_job_offer(&job).await?;
            info!(
                "Resume: {} chars, job offer: {} chars",
                resume_text.text.chars().count(),
                job_text.chars().count()
            );

            let mut session = connect_session(api_key, &config, &model.backend_id).await?;
            session.load_inputs(resume_text, job_text);
            let start = Instant::now();

            if stream {
                eprintln!("{}", "Streaming analysis...".cyan());
                session
                    .analyze_streaming(|chunk| {
                        eprint!("{}", chunk.dimmed());
                        let _ = std::io::stderr().flush();
                    })
                    .await?;
                eprintln!();
            } else {
                let spinner = spinner(&format!("Analyzing with {}...", model.name));
                let result = session.analyze().await.map(|_| ());
                spinner.finish_and_clear();
                result?;
            }

            if cover_letter {
                let spinner = spinner("Writing cover letter...");
                let result = session.generate_cover_letter().await.map(|_| ());
                spinner.finish_and_clear();
                result?;
            }

            if suggestions {
                let spinner = spinner("Generating suggestions...");
                let result = session.generate_suggestions().await.map(|_| ());
                spinner.finish_and_clear();
                result?;
            }

            let elapsed_ms = start.elapsed().as_millis() as u64;
            let report = AnalysisReport::from_session(&session, &file_name(&job), elapsed_ms)?;

            if config.history.enabled && !no_history {
                let store = HistoryStore::new(&config.history.dir);
                let id = store.save(&report.metadata.resume_file, &report.analysis)?;
                info!("Saved to history as {}", id);
            }

            let generator = ReportGenerator::from_config(&config.output);
            println!("{}", generator.generate_analysis(&report, format)?);

            if let Some(path) = save {
                let content = ReportGenerator::for_file(&config.output).generate_analysis(&report, format)?;
                let path = if path.is_dir() {
                    path.join(suggest_filename(format, &report.metadata.resume_file, true))
                } else {
                    path
                };
                save_report(&content, &path)?;
            }
        }

        Commands::Rank {
            job,
            resumes,
            model,
            output,
            save,
        } => {
            let format = cli::resolve_output_format(output.as_deref(), config.output.format)?;
            let model = config.resolve_model(model.as_deref())?.clone();

            let mut input_manager = InputManager::new(config.input.clone());
            let candidates = input_manager.load_resume_batch(&resumes).await?;
            let job_text = input_manager.load_job_offer(&job).await?;
            if candidates.len() < resumes.len() {
                println!(
                    "{}",
                    format!("{} of {} resumes skipped as unreadable", resumes.len() - candidates.len(), resumes.len())
                        .yellow()
                );
            }

            let mut session = connect_session(api_key, &config, &model.backend_id).await?;
            let start = Instant::now();

            let spinner = spinner(&format!("Ranking {} candidates...", candidates.len()));
            let result = session.rank(&candidates, &job_text).await.map(|ranking| ranking.clone());
            spinner.finish_and_clear();
            let ranking = result?;

            let metadata = ReportMetadata::new(
                session.model(),
                "",
                &file_name(&job),
                start.elapsed().as_millis() as u64,
            );
            let report = RankingReport::new(metadata, ranking, candidates.len());

            let generator = ReportGenerator::from_config(&config.output);
            println!("{}", generator.generate_ranking(&report, format)?);

            if let Some(path) = save {
                let content = ReportGenerator::for_file(&config.output).generate_ranking(&report, format)?;
                save_report(&content, &path)?;
            }
        }

        Commands::History { action } => {
            let store = HistoryStore::new(&config.history.dir);
            match action {
                HistoryAction::List => {
                    let entries = store.list()?;
                    if entries.is_empty() {
                        println!("No saved analyses in {}", store.dir().display());
                    }
                    for entry in entries {
                        println!(
                            "{}  {}  {:>3}/100  {}",
                            entry.id.bold(),
                            entry.timestamp.format("%Y-%m-%d %H:%M"),
                            entry.score,
                            entry.cv_name
                        );
                    }
                }
                HistoryAction::Show { id, output } => {
                    let format = cli::resolve_output_format(output.as_deref(), config.output.format)?;
                    let entry = store.load(&id)?;
                    let report = AnalysisReport::from_history(&entry);
                    let generator = ReportGenerator::from_config(&config.output);
                    println!("{}", generator.generate_analysis(&report, format)?);
                }
                HistoryAction::Delete { id } => {
                    if store.delete(&id)? {
                        println!("Deleted {}", id);
                    } else {
                        println!("No history entry '{}'", id);
                    }
                }
                HistoryAction::Clear => {
                    let removed = store.clear()?;
                    println!("Removed {} saved analyses", removed);
                }
            }
        }

        Commands::Models { action } => match action {
            ModelAction::List => {
                println!("{}", "Available models:".bold());
                for model in &config.models.available_models {
                    let marker = if model.name == config.models.default_model { " (default)" } else { "" };
                    println!(
                        "  • {}{} [{}]\n    {}",
                        model.name.green(),
                        marker,
                        model.backend_id,
                        model.description
                    );
                }
            }
        },

        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => {
                let content = toml::to_string_pretty(&config).map_err(|e| {
                    ResumeMatcherError::Configuration(format!("Failed to serialize config: {}", e))
                })?;
                println!("# {}\n{}", Config::config_path().display(), content);
            }
            ConfigAction::Reset => {
                Config::default().save()?;
                println!("Configuration reset: {}", Config::config_path().display());
            }
            ConfigAction::Path => println!("{}", Config::config_path().display()),
        },
    }

    Ok(())
}

async fn connect_session(api_key: Option<String>, config: &Config, backend_id: &str) -> Result<Session> {
    let key = cli::resolve_api_key(api_key, &config.api.key_env)?;

    let spinner = spinner("Connecting to the LLM provider...");
    let client = GroqClient::connect(&key, &config.api, backend_id).await;
    spinner.finish_and_clear();

    let analyzer = Analyzer::new(Arc::new(client?), backend_id, config);
    Ok(Session::new(analyzer))
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn save_report(content: &str, path: &Path) -> Result<()> {
    save_report_to_file(content, path)?;
    println!("{} {}", "Report saved to".green(), path.display());
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

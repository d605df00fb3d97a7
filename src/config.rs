//! Configuration management for the resume matcher

use crate::error::{Result, ResumeMatcherError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub models: ModelConfig,
    pub generation: GenerationConfig,
    pub input: InputConfig,
    pub prompts: PromptConfig,
    pub history: HistoryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of an OpenAI-compatible chat completion API
    pub base_url: String,
    /// Environment variable holding the credential
    pub key_env: String,
    /// Literal prefix every valid credential starts with
    pub key_prefix: String,
    /// Request timeout; unset means the transport default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub default_model: String,
    pub available_models: Vec<AvailableModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableModel {
    pub name: String,
    pub backend_id: String,
    pub description: String,
}

/// Sampling settings for a single kind of request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub analysis: SamplingConfig,
    pub cover_letter: SamplingConfig,
    pub suggestions: SamplingConfig,
    pub ranking: SamplingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub min_resume_chars: usize,
    pub min_batch_resume_chars: usize,
    pub max_file_size_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub letter_language: String,
    pub strengths_max_chars: usize,
    pub suggestions_missing_skills: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub dir: PathBuf,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Html,
}

impl Default for Config {
    fn default() -> Self {
        let history_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("resume-matcher")
            .join("history");

        Self {
            api: ApiConfig {
                base_url: "https://api.groq.com/openai/v1".to_string(),
                key_env: "GROQ_API_KEY".to_string(),
                key_prefix: "gsk_".to_string(),
                timeout_secs: None,
            },
            models: ModelConfig {
                default_model: "llama-3.3-70b".to_string(),
                available_models: vec![
                    AvailableModel {
                        name: "llama-3.3-70b".to_string(),
                        backend_id: "llama-3.3-70b-versatile".to_string(),
                        description: "Llama 3.3 70B (recommended)".to_string(),
                    },
                    AvailableModel {
                        name: "llama-3.1-70b".to_string(),
                        backend_id: "llama-3.1-70b-versatile".to_string(),
                        description: "Llama 3.1 70B".to_string(),
                    },
                    AvailableModel {
                        name: "mixtral-8x7b".to_string(),
                        backend_id: "mixtral-8x7b-32768".to_string(),
                        description: "Mixtral 8x7B, 32k context".to_string(),
                    },
                ],
            },
            generation: GenerationConfig {
                analysis: SamplingConfig { temperature: 0.3, max_tokens: 4000 },
                cover_letter: SamplingConfig { temperature: 0.7, max_tokens: 1500 },
                suggestions: SamplingConfig { temperature: 0.5, max_tokens: 4000 },
                ranking: SamplingConfig { temperature: 0.3, max_tokens: 4000 },
            },
            input: InputConfig {
                min_resume_chars: 100,
                min_batch_resume_chars: 50,
                max_file_size_mb: 10,
            },
            prompts: PromptConfig {
                letter_language: "French".to_string(),
                strengths_max_chars: 200,
                suggestions_missing_skills: 5,
            },
            history: HistoryConfig {
                dir: history_dir,
                enabled: true,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| ResumeMatcherError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ResumeMatcherError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-matcher")
            .join("config.toml")
    }

    /// Reject settings that would make every request fail
    pub fn validate(&self) -> Result<()> {
        if self.models.available_models.is_empty() {
            return Err(ResumeMatcherError::Configuration(
                "models.available_models must list at least one model".to_string(),
            ));
        }
        if self.get_model_by_name(&self.models.default_model).is_none() {
            return Err(ResumeMatcherError::Configuration(format!(
                "models.default_model '{}' is not one of the available models",
                self.models.default_model
            )));
        }
        if self.api.key_prefix.is_empty() {
            return Err(ResumeMatcherError::Configuration(
                "api.key_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_model_by_name(&self, name: &str) -> Option<&AvailableModel> {
        self.models.available_models.iter().find(|m| m.name == name)
    }

    /// Resolve a model name (or the default when `None`) to its backend identifier
    pub fn resolve_model(&self, name: Option<&str>) -> Result<&AvailableModel> {
        let name = name.unwrap_or(&self.models.default_model);
        self.get_model_by_name(name).ok_or_else(|| {
            let known: Vec<&str> = self.models.available_models.iter().map(|m| m.name.as_str()).collect();
            ResumeMatcherError::InvalidInput(format!(
                "Unknown model '{}'. Available: {}",
                name,
                known.join(", ")
            ))
        })
    }
}

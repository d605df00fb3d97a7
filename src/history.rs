//! File-backed history of saved analyses, one JSON file per entry

use crate::error::{Result, ResumeMatcherError};
use crate::llm::records::AnalysisRecord;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const ENTRY_KIND: &str = "candidate";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Local>,
    #[serde(rename = "type")]
    pub kind: String,
    pub cv_name: String,
    pub score: u8,
    pub analysis: AnalysisRecord,
}

pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist an analysis and return the new entry id
    pub fn save(&self, cv_name: &str, analysis: &AnalysisRecord) -> Result<String> {
        fs::create_dir_all(&self.dir)?;

        let timestamp = Local::now();
        let entry = HistoryEntry {
            id: new_entry_id(&timestamp),
            timestamp,
            kind: ENTRY_KIND.to_string(),
            cv_name: cv_name.to_string(),
            score: analysis.global_score,
            analysis: analysis.clone(),
        };

        let path = self.entry_path(&entry.id)?;
        fs::write(&path, serde_json::to_string_pretty(&entry)?)?;
        info!("Analysis saved to history: {}", path.display());
        Ok(entry.id)
    }

    /// All readable entries, newest first
    pub fn list(&self) -> Result<Vec<HistoryEntry>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_entry(&path) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping unreadable history file {}: {}", path.display(), e),
            }
        }

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!("Loaded {} history entries", entries.len());
        Ok(entries)
    }

    pub fn load(&self, id: &str) -> Result<HistoryEntry> {
        let path = self.entry_path(id)?;
        if !path.exists() {
            return Err(ResumeMatcherError::History(format!("No history entry '{}'", id)));
        }
        read_entry(&path)
    }

    /// Remove one entry; `false` when it did not exist
    pub fn delete(&self, id: &str) -> Result<bool> {
        let path = self.entry_path(id)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        info!("Deleted history entry {}", id);
        Ok(true)
    }

    /// Remove every entry and return how many were removed
    pub fn clear(&self) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        info!("Cleared {} history entries", removed);
        Ok(removed)
    }

    fn entry_path(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ResumeMatcherError::History(format!("Invalid history id '{}'", id)));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }
}

fn new_entry_id(timestamp: &DateTime<Local>) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("analysis_{}_{}", timestamp.format("%Y%m%d_%H%M%S"), suffix)
}

/// RFC 3339 timestamps, or naive ISO 8601 ones read as local time
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = String::deserialize(deserializer)?;
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(timestamp.with_timezone(&Local));
    }

    let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f").map_err(D::Error::custom)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| D::Error::custom(format!("local time {} does not exist", raw)))
}

fn read_entry(path: &Path) -> Result<HistoryEntry> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        ResumeMatcherError::History(format!("Invalid history file {}: {}", path.display(), e))
    })
}

//! Typed records decoded from LLM replies
//!
//! Field names on the wire are the ones the prompt templates ask the model
//! to produce. Decoding goes through [`FieldReader`], which tracks the path
//! of the value being read so that schema errors name the exact field.

use crate::error::{Result, ResumeMatcherError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(rename = "score_global")]
    pub global_score: u8,
    #[serde(rename = "competences_techniques", default)]
    pub technical_skills: TechnicalSkills,
    #[serde(default)]
    pub experience: Experience,
    #[serde(rename = "formation", default)]
    pub education: Education,
    #[serde(default)]
    pub soft_skills: SoftSkills,
    #[serde(rename = "points_forts", default)]
    pub strengths: Vec<String>,
    #[serde(rename = "points_amelioration", default)]
    pub improvements: Vec<String>,
    #[serde(rename = "synthese", default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSkills {
    #[serde(rename = "presentes", default)]
    pub present: Vec<String>,
    #[serde(rename = "manquantes", default)]
    pub missing: Vec<String>,
    #[serde(default)]
    pub score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(rename = "annees_experience", default)]
    pub years: f32,
    #[serde(rename = "pertinence", default)]
    pub relevance: String,
    #[serde(default)]
    pub score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(rename = "niveau", default)]
    pub level: String,
    #[serde(rename = "adequation", default)]
    pub fit: String,
    #[serde(default)]
    pub score: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftSkills {
    #[serde(rename = "identifies", default)]
    pub identified: Vec<String>,
    #[serde(rename = "manquantes", default)]
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Recommended,
    Consider,
    Rejected,
}

impl Recommendation {
    /// Map the free-text label the model writes ("Recommandé", "À considérer",
    /// "Non retenu", or their English forms) onto the enum.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        if label.starts_with("non ")
            || label.starts_with("not ")
            || label.contains("reject")
            || label.contains("retenu")
        {
            Some(Recommendation::Rejected)
        } else if label.contains("consid") {
            Some(Recommendation::Consider)
        } else if label.contains("recommand") || label.contains("recommend") {
            Some(Recommendation::Recommended)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::Recommended => "Recommended",
            Recommendation::Consider => "Consider",
            Recommendation::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub candidate_name: String,
    pub score: u8,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRanking {
    /// Entries in the order the model emitted them
    pub entries: Vec<RankedCandidate>,
    pub summary: String,
}

impl AnalysisRecord {
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = FieldReader::root(value)?;

        let technical_skills = match root.optional_object("competences_techniques")? {
            Some(obj) => TechnicalSkills {
                present: obj.strings_or_empty("presentes")?,
                missing: obj.strings_or_empty("manquantes")?,
                score: obj.score_or_zero("score")?,
            },
            None => TechnicalSkills::default(),
        };

        let experience = match root.optional_object("experience")? {
            Some(obj) => Experience {
                years: obj.number_or_zero("annees_experience")?,
                relevance: obj.text_or_empty("pertinence")?,
                score: obj.score_or_zero("score")?,
            },
            None => Experience::default(),
        };

        let education = match root.optional_object("formation")? {
            Some(obj) => Education {
                level: obj.text_or_empty("niveau")?,
                fit: obj.text_or_empty("adequation")?,
                score: obj.score_or_zero("score")?,
            },
            None => Education::default(),
        };

        let soft_skills = match root.optional_object("soft_skills")? {
            Some(obj) => SoftSkills {
                identified: obj.strings_or_empty("identifies")?,
                missing: obj.strings_or_empty("manquantes")?,
            },
            None => SoftSkills::default(),
        };

        Ok(Self {
            global_score: root.score("score_global")?,
            technical_skills,
            experience,
            education,
            soft_skills,
            strengths: root.strings_or_empty("points_forts")?,
            improvements: root.strings_or_empty("points_amelioration")?,
            summary: root.text_or_empty("synthese")?,
        })
    }

    /// Skills listed as both present and missing, compared case-insensitively
    pub fn overlapping_skills(&self) -> Vec<String> {
        let present: HashSet<String> = self
            .technical_skills
            .present
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect();

        self.technical_skills
            .missing
            .iter()
            .filter(|s| present.contains(&s.trim().to_lowercase()))
            .cloned()
            .collect()
    }
}

impl CandidateRanking {
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = FieldReader::root(value)?;

        let mut entries = Vec::new();
        for (index, item) in root.array("classement")?.iter().enumerate() {
            let entry = root.nested(&format!("classement[{}]", index), item)?;
            let label = entry.text("recommandation")?;
            let recommendation = Recommendation::from_label(&label).ok_or_else(|| {
                ResumeMatcherError::schema(
                    entry.path_of("recommandation"),
                    format!("unknown recommendation '{}'", label),
                )
            })?;

            entries.push(RankedCandidate {
                candidate_name: entry.text("candidat")?,
                score: entry.score("score")?,
                strengths: entry.strings_or_empty("points_forts")?,
                concerns: entry.strings_or_empty("reserves")?,
                recommendation,
            });
        }

        Ok(Self {
            entries,
            summary: root.text_or_empty("synthese")?,
        })
    }

    pub fn is_score_descending(&self) -> bool {
        self.entries.windows(2).all(|pair| pair[0].score >= pair[1].score)
    }
}

/// Reads typed fields out of a JSON object while remembering where it is
struct FieldReader<'a> {
    path: String,
    object: &'a Map<String, Value>,
}

impl<'a> FieldReader<'a> {
    fn root(value: &'a Value) -> Result<Self> {
        match value {
            Value::Object(object) => Ok(Self { path: String::new(), object }),
            other => Err(ResumeMatcherError::schema(
                "$",
                format!("expected an object, found {}", kind_of(other)),
            )),
        }
    }

    fn nested(&self, path: &str, value: &'a Value) -> Result<FieldReader<'a>> {
        match value {
            Value::Object(object) => Ok(FieldReader { path: path.to_string(), object }),
            other => Err(ResumeMatcherError::schema(
                path,
                format!("expected an object, found {}", kind_of(other)),
            )),
        }
    }

    fn path_of(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key).filter(|v| !v.is_null())
    }

    fn required(&self, key: &str) -> Result<&'a Value> {
        self.get(key)
            .ok_or_else(|| ResumeMatcherError::schema(self.path_of(key), "missing field"))
    }

    fn optional_object(&self, key: &str) -> Result<Option<FieldReader<'a>>> {
        match self.get(key) {
            Some(value) => self.nested(&self.path_of(key), value).map(Some),
            None => Ok(None),
        }
    }

    fn array(&self, key: &str) -> Result<&'a Vec<Value>> {
        match self.required(key)? {
            Value::Array(items) => Ok(items),
            other => Err(ResumeMatcherError::schema(
                self.path_of(key),
                format!("expected an array, found {}", kind_of(other)),
            )),
        }
    }

    fn score(&self, key: &str) -> Result<u8> {
        let value = self.required(key)?;
        score_from(value).ok_or_else(|| {
            ResumeMatcherError::schema(
                self.path_of(key),
                format!("expected a number between 0 and 100, found {}", value),
            )
        })
    }

    fn score_or_zero(&self, key: &str) -> Result<u8> {
        match self.get(key) {
            Some(_) => self.score(key),
            None => Ok(0),
        }
    }

    fn number_or_zero(&self, key: &str) -> Result<f32> {
        match self.get(key) {
            None => Ok(0.0),
            Some(Value::Number(n)) => n.as_f64().filter(|v| *v >= 0.0).map(|v| v as f32).ok_or_else(|| {
                ResumeMatcherError::schema(self.path_of(key), format!("expected a positive number, found {}", n))
            }),
            Some(Value::String(s)) => s.trim().parse::<f32>().ok().filter(|v| *v >= 0.0).ok_or_else(|| {
                ResumeMatcherError::schema(self.path_of(key), format!("expected a number, found \"{}\"", s))
            }),
            Some(other) => Err(ResumeMatcherError::schema(
                self.path_of(key),
                format!("expected a number, found {}", kind_of(other)),
            )),
        }
    }

    fn text(&self, key: &str) -> Result<String> {
        match self.required(key)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(ResumeMatcherError::schema(
                self.path_of(key),
                format!("expected a string, found {}", kind_of(other)),
            )),
        }
    }

    fn text_or_empty(&self, key: &str) -> Result<String> {
        match self.get(key) {
            Some(_) => self.text(key),
            None => Ok(String::new()),
        }
    }

    fn strings_or_empty(&self, key: &str) -> Result<Vec<String>> {
        let items = match self.get(key) {
            None => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ResumeMatcherError::schema(
                    self.path_of(key),
                    format!("expected an array of strings, found {}", kind_of(other)),
                ))
            }
        };

        items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(ResumeMatcherError::schema(
                    format!("{}[{}]", self.path_of(key), i),
                    format!("expected a string, found {}", kind_of(other)),
                )),
            })
            .collect()
    }
}

fn score_from(value: &Value) -> Option<u8> {
    let n = value.as_f64()?;
    if (0.0..=100.0).contains(&n) {
        Some(n.round() as u8)
    } else {
        None
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_analysis() -> Value {
        json!({
            "score_global": 72,
            "competences_techniques": {
                "presentes": ["Rust", "SQL"],
                "manquantes": ["Kubernetes"],
                "score": 70
            },
            "experience": {"annees_experience": 5, "pertinence": "Relevant backend work", "score": 80},
            "formation": {"niveau": "Master", "adequation": "Good fit", "score": 65},
            "soft_skills": {"identifies": ["Teamwork"], "manquantes": ["Leadership"]},
            "points_forts": ["A", "B", "C"],
            "points_amelioration": ["X", "Y", "Z"],
            "synthese": "Solid candidate."
        })
    }

    #[test]
    fn test_decode_full_analysis() {
        let record = AnalysisRecord::from_value(&full_analysis()).unwrap();
        assert_eq!(record.global_score, 72);
        assert_eq!(record.technical_skills.present, vec!["Rust", "SQL"]);
        assert_eq!(record.experience.years, 5.0);
        assert_eq!(record.education.level, "Master");
        assert_eq!(record.soft_skills.missing, vec!["Leadership"]);
        assert_eq!(record.summary, "Solid candidate.");
    }

    #[test]
    fn test_minimal_analysis_defaults_missing_sections() {
        let record = AnalysisRecord::from_value(&json!({"score_global": 80})).unwrap();
        assert_eq!(record.global_score, 80);
        assert!(record.strengths.is_empty());
        assert_eq!(record.technical_skills, TechnicalSkills::default());
    }

    #[test]
    fn test_missing_global_score_names_field() {
        let err = AnalysisRecord::from_value(&json!({"synthese": "x"})).unwrap_err();
        match err {
            ResumeMatcherError::Schema { field, reason } => {
                assert_eq!(field, "score_global");
                assert_eq!(reason, "missing field");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_nested_score_names_path() {
        let mut value = full_analysis();
        value["competences_techniques"]["score"] = json!(140);
        match AnalysisRecord::from_value(&value).unwrap_err() {
            ResumeMatcherError::Schema { field, .. } => assert_eq!(field, "competences_techniques.score"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_string_list_item_names_index() {
        let mut value = full_analysis();
        value["points_forts"] = json!(["A", 3]);
        match AnalysisRecord::from_value(&value).unwrap_err() {
            ResumeMatcherError::Schema { field, .. } => assert_eq!(field, "points_forts[1]"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_fractional_score_is_rounded() {
        let record = AnalysisRecord::from_value(&json!({"score_global": 72.6})).unwrap();
        assert_eq!(record.global_score, 73);
    }

    #[test]
    fn test_overlapping_skills_detected() {
        let mut value = full_analysis();
        value["competences_techniques"]["manquantes"] = json!(["rust", "Docker"]);
        let record = AnalysisRecord::from_value(&value).unwrap();
        assert_eq!(record.overlapping_skills(), vec!["rust"]);
    }

    #[test]
    fn test_serialized_record_uses_wire_names() {
        let record = AnalysisRecord::from_value(&full_analysis()).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["score_global"], json!(72));
        assert_eq!(value["points_forts"], json!(["A", "B", "C"]));
        let back: AnalysisRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_recommendation_labels() {
        assert_eq!(Recommendation::from_label("Recommandé"), Some(Recommendation::Recommended));
        assert_eq!(Recommendation::from_label("À considérer"), Some(Recommendation::Consider));
        assert_eq!(Recommendation::from_label("Non retenu"), Some(Recommendation::Rejected));
        assert_eq!(Recommendation::from_label("Not recommended"), Some(Recommendation::Rejected));
        assert_eq!(Recommendation::from_label("Recommended"), Some(Recommendation::Recommended));
        assert_eq!(Recommendation::from_label("maybe"), None);
    }

    #[test]
    fn test_ranking_preserves_model_order() {
        let value = json!({
            "classement": [
                {"candidat": "b.pdf", "score": 60, "points_forts": ["x"], "reserves": [], "recommandation": "À considérer"},
                {"candidat": "a.pdf", "score": 85, "points_forts": ["y"], "reserves": ["z"], "recommandation": "Recommandé"}
            ],
            "synthese": "Two candidates."
        });
        let ranking = CandidateRanking::from_value(&value).unwrap();
        assert_eq!(ranking.entries[0].candidate_name, "b.pdf");
        assert_eq!(ranking.entries[1].recommendation, Recommendation::Recommended);
        assert!(!ranking.is_score_descending());
    }

    #[test]
    fn test_ranking_unknown_recommendation_names_entry() {
        let value = json!({
            "classement": [
                {"candidat": "a.pdf", "score": 85, "recommandation": "Recommandé"},
                {"candidat": "b.pdf", "score": 40, "recommandation": "???"}
            ]
        });
        match CandidateRanking::from_value(&value).unwrap_err() {
            ResumeMatcherError::Schema { field, .. } => assert_eq!(field, "classement[1].recommandation"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

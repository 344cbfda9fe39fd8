use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categorical fitness label. Derived solely from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    High,
    Medium,
    Low,
}

impl Verdict {
    /// score ≥ 80 → High, 60–79 → Medium, below 60 → Low.
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Verdict::High,
            60..=79 => Verdict::Medium,
            _ => Verdict::Low,
        }
    }
}

/// One decoded resume handed to the analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeInput {
    pub file_name: String,
    #[serde(default)]
    pub text: String,
    /// Set by the ingestion layer when the source document could not be decoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
}

impl ResumeInput {
    pub fn new(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            text: text.into(),
            decode_error: None,
        }
    }
}

/// Fitness assessment for a single resume. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: u32,
    pub candidate_name: String,
    pub file_name: String,
    pub score: u8,
    pub verdict: Verdict,
    pub analyzed_at: DateTime<Utc>,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub recommendations: Vec<String>,
    pub experience: String,
    pub education: String,
    /// True only for fallback records synthesized after an extraction fault.
    pub manual_review: bool,
}

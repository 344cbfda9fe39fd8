//! Text extraction — best-effort identity, experience and education signals
//! from free-form resume text.
//!
//! Every extractor is a pure function of its input and never fails: when
//! nothing recognizable is found a fixed sentinel string comes back instead.
//! Unusable input is rejected up front by [`ensure_usable`], which is the only
//! place an [`ExtractionFault`] originates from text.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::analysis::ResumeInput;

pub const UNKNOWN_CANDIDATE: &str = "Unknown Candidate";
pub const EXPERIENCE_UNSPECIFIED: &str = "Experience details not clearly specified";
pub const EXPERIENCE_AVAILABLE: &str = "Professional experience available";
pub const EDUCATION_UNSPECIFIED: &str = "Education details not clearly specified";

const NAME_SCAN_LINES: usize = 10;
const EDUCATION_MAX_CHARS: usize = 100;

const NAME_SKIP_WORDS: &[&str] = &["resume", "curriculum vitae", "cv"];
const NAME_HEADER_WORDS: &[&str] = &[
    "contact",
    "phone",
    "email",
    "address",
    "objective",
    "summary",
    "profile",
];
const WORK_HISTORY_MARKERS: &[&str] = &["work experience", "professional experience", "employment"];
const EDUCATION_KEYWORDS: &[&str] = &[
    "education",
    "academic",
    "qualification",
    "degree",
    "university",
    "college",
    "institute",
];
const EDUCATION_STOP_WORDS: &[&str] = &["experience", "skills"];

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-zA-Z\s]{2,49}$").expect("name pattern compiles"));

/// Numeric-years patterns, highest priority first.
static EXPERIENCE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(\d+)\+?\s*years?\s*(?:of\s*)?(?:experience|exp)",
        r"(?i)experience[:\s]*(\d+)\+?\s*years?",
        r"(?i)(\d+)\+?\s*years?\s*in",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("experience pattern compiles"))
    .collect()
});

/// Why a resume could not be analyzed. Always recovered into a fallback record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFault {
    #[error("resume text is empty")]
    EmptyText,

    #[error("document could not be decoded: {0}")]
    Undecodable(String),

    #[error("analysis worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("batch deadline passed before analysis started")]
    DeadlineExceeded,
}

/// Signals pulled from a single resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedProfile {
    pub candidate_name: String,
    pub experience: String,
    pub education: String,
}

/// Rejects input the rest of the pipeline cannot make sense of.
pub fn ensure_usable(input: &ResumeInput) -> Result<&str, ExtractionFault> {
    if let Some(reason) = &input.decode_error {
        return Err(ExtractionFault::Undecodable(reason.clone()));
    }
    if input.text.trim().is_empty() {
        return Err(ExtractionFault::EmptyText);
    }
    Ok(&input.text)
}

pub fn extract_profile(text: &str) -> ExtractedProfile {
    ExtractedProfile {
        candidate_name: extract_candidate_name(text),
        experience: extract_experience(text),
        education: extract_education(text),
    }
}

/// Guesses the candidate's name from the top of the document.
///
/// Heuristic only: the first short title-like line that is not a section
/// header wins. Falls back to the first non-blank line.
pub fn extract_candidate_name(text: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    for line in lines.iter().take(NAME_SCAN_LINES) {
        let lower = line.to_lowercase();
        if line.chars().count() < 3 || NAME_SKIP_WORDS.iter().any(|w| lower.contains(w)) {
            continue;
        }

        let word_count = line.split_whitespace().count();
        if (2..=4).contains(&word_count)
            && NAME_PATTERN.is_match(line)
            && !NAME_HEADER_WORDS.iter().any(|h| lower.contains(h))
        {
            return line.to_string();
        }
    }

    lines
        .first()
        .map(|l| l.to_string())
        .unwrap_or_else(|| UNKNOWN_CANDIDATE.to_string())
}

pub fn extract_experience(text: &str) -> String {
    for pattern in EXPERIENCE_PATTERNS.iter() {
        if let Some(years) = pattern.captures(text).and_then(|c| c.get(1)) {
            return format!("{}+ years experience", years.as_str());
        }
    }

    let lower = text.to_lowercase();
    if WORK_HISTORY_MARKERS.iter().any(|m| lower.contains(m)) {
        return EXPERIENCE_AVAILABLE.to_string();
    }

    EXPERIENCE_UNSPECIFIED.to_string()
}

/// Collects the lines following the first education-looking heading.
pub fn extract_education(text: &str) -> String {
    let mut section = String::new();
    let mut in_section = false;

    for line in text.lines() {
        let lower = line.to_lowercase();

        if !in_section {
            in_section = EDUCATION_KEYWORDS.iter().any(|k| lower.contains(k));
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if EDUCATION_STOP_WORDS.iter().any(|w| lower.contains(w)) {
            break;
        }

        section.push_str(trimmed);
        section.push(' ');
        if section.chars().count() > EDUCATION_MAX_CHARS {
            break;
        }
    }

    let section = section.trim();
    if section.is_empty() {
        EDUCATION_UNSPECIFIED.to_string()
    } else {
        section.to_string()
    }
}

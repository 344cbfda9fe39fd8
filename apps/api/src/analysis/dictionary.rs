//! Skill dictionary — the single authoritative vocabulary consumed by the matcher.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

/// Built-in technology vocabulary. Order is display order only.
const DEFAULT_TERMS: &[&str] = &[
    "javascript",
    "typescript",
    "react",
    "angular",
    "vue",
    "node.js",
    "express",
    "python",
    "java",
    "c++",
    "c#",
    "go",
    "rust",
    "php",
    "ruby",
    "html",
    "css",
    "sass",
    "less",
    "tailwind",
    "bootstrap",
    "mongodb",
    "mysql",
    "postgresql",
    "sqlite",
    "redis",
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "terraform",
    "git",
    "github",
    "gitlab",
    "jenkins",
    "ci/cd",
    "machine learning",
    "ai",
    "tensorflow",
    "pytorch",
    "pandas",
    "numpy",
    "figma",
    "sketch",
    "photoshop",
    "illustrator",
    "agile",
    "scrum",
    "jira",
    "confluence",
];

/// Raised when the vocabulary cannot be built. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigurationFault {
    #[error("skill vocabulary is empty")]
    EmptyVocabulary,

    #[error("skill vocabulary entry {index} is blank")]
    EmptyTerm { index: usize },

    #[error("cannot read skill vocabulary {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("skill vocabulary {path} is not a JSON array of strings: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Ordered, de-duplicated set of lowercase skill terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillDictionary {
    terms: Vec<String>,
}

impl SkillDictionary {
    /// Builds a dictionary from arbitrary terms.
    /// Terms are trimmed and lowercased; later duplicates are dropped.
    pub fn from_terms<I, S>(terms: I) -> Result<Self, ConfigurationFault>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut normalized = Vec::new();

        for (index, term) in terms.into_iter().enumerate() {
            let term = term.as_ref().trim().to_lowercase();
            if term.is_empty() {
                return Err(ConfigurationFault::EmptyTerm { index });
            }
            if seen.insert(term.clone()) {
                normalized.push(term);
            }
        }

        if normalized.is_empty() {
            return Err(ConfigurationFault::EmptyVocabulary);
        }

        Ok(Self { terms: normalized })
    }

    /// Loads a vocabulary from a JSON array of strings.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigurationFault> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigurationFault::Unreadable {
            path: display.clone(),
            source,
        })?;
        let terms: Vec<String> =
            serde_json::from_str(&raw).map_err(|source| ConfigurationFault::Malformed {
                path: display,
                source,
            })?;
        Self::from_terms(terms)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms that occur in `text`, compared case-insensitively as substrings.
    pub fn terms_in<'a>(&'a self, text: &str) -> impl Iterator<Item = &'a String> + 'a {
        let haystack = text.to_lowercase();
        self.terms
            .iter()
            .filter(move |term| haystack.contains(term.as_str()))
    }
}

impl Default for SkillDictionary {
    fn default() -> Self {
        Self {
            terms: DEFAULT_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

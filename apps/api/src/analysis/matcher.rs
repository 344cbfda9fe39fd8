//! Skill matcher — required skills from the job description, partitioned per candidate.

use std::collections::HashSet;
use std::sync::Arc;

use crate::analysis::dictionary::SkillDictionary;

/// Vocabulary terms named by the job description. Fixed for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredSkillSet(Vec<String>);

/// Vocabulary terms found in one resume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSkillSet(HashSet<String>);

/// Required skills split by whether the candidate has them. Both halves keep
/// vocabulary order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillPartition {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

impl RequiredSkillSet {
    pub fn terms(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl CandidateSkillSet {
    pub fn contains(&self, term: &str) -> bool {
        self.0.contains(term)
    }
}

#[derive(Debug, Clone)]
pub struct SkillMatcher {
    dictionary: Arc<SkillDictionary>,
}

impl SkillMatcher {
    pub fn new(dictionary: Arc<SkillDictionary>) -> Self {
        Self { dictionary }
    }

    pub fn dictionary(&self) -> &SkillDictionary {
        &self.dictionary
    }

    pub fn required_skills(&self, job_text: &str) -> RequiredSkillSet {
        RequiredSkillSet(self.dictionary.terms_in(job_text).cloned().collect())
    }

    pub fn candidate_skills(&self, resume_text: &str) -> CandidateSkillSet {
        CandidateSkillSet(self.dictionary.terms_in(resume_text).cloned().collect())
    }

    pub fn partition(
        &self,
        required: &RequiredSkillSet,
        candidate: &CandidateSkillSet,
    ) -> SkillPartition {
        let (matched, missing): (Vec<String>, Vec<String>) = required
            .terms()
            .iter()
            .cloned()
            .partition(|term| candidate.contains(term));
        SkillPartition { matched, missing }
    }
}

//! Fit scoring — turns a matched/missing skill partition into a bounded score
//! and a verdict.
//!
//! The analyzer holds an `Arc<dyn FitScorer>`. The default backend,
//! `SkillCoverageScorer`, is the share of required skills the candidate
//! covers. Experience and education are descriptive only and never weighted.

use serde::{Deserialize, Serialize};

use crate::analysis::matcher::SkillPartition;
use crate::models::analysis::Verdict;

/// Score attached to fallback records. Sits inside the Medium band.
pub const NEUTRAL_SCORE: u8 = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitScore {
    pub score: u8, // 0 – 100
    pub verdict: Verdict,
}

impl FitScore {
    pub fn new(score: u8) -> Self {
        let score = score.min(100);
        Self {
            score,
            verdict: Verdict::from_score(score),
        }
    }
}

/// Implement this to swap scoring backends without touching the analyzer.
pub trait FitScorer: Send + Sync {
    fn score(&self, partition: &SkillPartition) -> FitScore;

    /// Short label for logs.
    fn backend(&self) -> &'static str;
}

/// Deterministic coverage scorer.
///
/// Algorithm:
/// 1. ratio = |matched| / max(|matched| + |missing|, 1)
/// 2. score = round(ratio × 100), halves rounding up
/// 3. verdict from the threshold table in `Verdict::from_score`
pub struct SkillCoverageScorer;

impl FitScorer for SkillCoverageScorer {
    fn score(&self, partition: &SkillPartition) -> FitScore {
        FitScore::new(coverage_score(
            partition.matched.len(),
            partition.missing.len(),
        ))
    }

    fn backend(&self) -> &'static str {
        "skill-coverage"
    }
}

/// Integer form of round(matched / total × 100) so equal inputs always give
/// equal scores.
fn coverage_score(matched: usize, missing: usize) -> u8 {
    let total = (matched + missing).max(1);
    let rounded = (matched * 200 + total) / (total * 2);
    rounded.min(100) as u8
}

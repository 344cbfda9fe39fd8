#![allow(dead_code)]
//! Batch analysis — runs every resume of a batch through extraction, matching,
//! scoring and recommendations, then ranks the results.
//!
//! Flow: required_skills(job) once → per resume (on the worker pool):
//!       ensure_usable → extract_profile → candidate_skills → partition →
//!       score → recommendations → AnalysisRecord.
//!
//! A resume that faults (unusable text, worker panic, missed deadline) is
//! replaced by a fallback record flagged for manual review. A batch never
//! aborts as a whole and always yields exactly one record per input.
//!
//! Worker panics are caught per item, but the process panic hook still runs
//! first, so an isolated panic prints its default stderr line before the
//! `warn!` that records the fallback.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::dictionary::SkillDictionary;
use crate::analysis::extractor::{
    ensure_usable, extract_profile, ExtractionFault, UNKNOWN_CANDIDATE,
};
use crate::analysis::matcher::{RequiredSkillSet, SkillMatcher};
use crate::analysis::recommendations::{build_recommendations, MANUAL_REVIEW_ADVICE};
use crate::analysis::scoring::{FitScore, FitScorer, SkillCoverageScorer, NEUTRAL_SCORE};
use crate::models::analysis::{AnalysisRecord, ResumeInput};

const FALLBACK_MATCHED: &str = "Basic qualifications assumed";
const FALLBACK_MISSING: &str = "Manual review needed";
const FALLBACK_EXPERIENCE: &str = "Experience details need verification";
const FALLBACK_EDUCATION: &str = "Education details need verification";

static DOCUMENT_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(pdf|docx)$").expect("extension pattern compiles"));

// ────────────────────────────────────────────────────────────────────────────
// Clock
// ────────────────────────────────────────────────────────────────────────────

/// Source of `analyzed_at` timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant. Makes batch output reproducible in tests.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Batch report
// ────────────────────────────────────────────────────────────────────────────

/// Idle → Running → Completed. There is no paused or cancelled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Idle,
    Running,
    Completed,
}

impl BatchState {
    fn advance(self) -> Self {
        match self {
            BatchState::Idle => BatchState::Running,
            BatchState::Running | BatchState::Completed => BatchState::Completed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub state: BatchState,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub required_skills: Vec<String>,
    /// Sorted by score descending, then id ascending.
    pub records: Vec<AnalysisRecord>,
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer
// ────────────────────────────────────────────────────────────────────────────

pub struct BatchAnalyzer {
    matcher: SkillMatcher,
    scorer: Arc<dyn FitScorer>,
    clock: Arc<dyn Clock>,
    pool: rayon::ThreadPool,
}

impl BatchAnalyzer {
    /// Creates an analyzer backed by a pool of `workers` threads (minimum 1).
    pub fn new(
        dictionary: Arc<SkillDictionary>,
        workers: usize,
    ) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("screener-worker-{i}"))
            .build()?;

        Ok(Self {
            matcher: SkillMatcher::new(dictionary),
            scorer: Arc::new(SkillCoverageScorer),
            clock: Arc::new(SystemClock),
            pool,
        })
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn FitScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn dictionary(&self) -> &SkillDictionary {
        self.matcher.dictionary()
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn analyze_batch(&self, job_text: &str, resumes: &[ResumeInput]) -> BatchReport {
        self.analyze_batch_until(job_text, resumes, None)
    }

    /// Like [`analyze_batch`](Self::analyze_batch), but resumes whose analysis
    /// has not started by `deadline` resolve to fallback records.
    pub fn analyze_batch_until(
        &self,
        job_text: &str,
        resumes: &[ResumeInput],
        deadline: Option<Instant>,
    ) -> BatchReport {
        let batch_id = Uuid::new_v4();
        let mut state = BatchState::Idle;
        let started_at = self.clock.now();

        let required = self.matcher.required_skills(job_text);
        state = state.advance();
        info!(
            "Batch {batch_id} {state:?}: {} resume(s), {} required skill(s), scorer {}, {} worker(s)",
            resumes.len(),
            required.len(),
            self.scorer.backend(),
            self.workers()
        );
        if required.is_empty() {
            warn!("Batch {batch_id}: job description names no known skills; every candidate scores 0");
        }

        let mut records: Vec<AnalysisRecord> = self.pool.install(|| {
            resumes
                .par_iter()
                .enumerate()
                .map(|(index, input)| {
                    self.analyze_item(index as u32 + 1, input, &required, deadline)
                })
                .collect()
        });

        rank(&mut records);

        state = state.advance();
        let fallbacks = records.iter().filter(|r| r.manual_review).count();
        info!(
            "Batch {batch_id} {state:?}: {} record(s), {fallbacks} flagged for manual review",
            records.len()
        );

        BatchReport {
            batch_id,
            state,
            started_at,
            completed_at: self.clock.now(),
            required_skills: required.terms().to_vec(),
            records,
        }
    }

    /// Per-resume fault boundary: every outcome becomes a record.
    fn analyze_item(
        &self,
        id: u32,
        input: &ResumeInput,
        required: &RequiredSkillSet,
        deadline: Option<Instant>,
    ) -> AnalysisRecord {
        let outcome = if deadline.is_some_and(|d| Instant::now() >= d) {
            Err(ExtractionFault::DeadlineExceeded)
        } else {
            panic::catch_unwind(AssertUnwindSafe(|| self.analyze_resume(id, input, required)))
                .unwrap_or_else(|payload| {
                    Err(ExtractionFault::WorkerPanicked(panic_message(&*payload)))
                })
        };

        match outcome {
            Ok(record) => record,
            Err(fault) => {
                warn!("Resume #{id} ({}) needs manual review: {fault}", input.file_name);
                fallback_record(id, &input.file_name, self.clock.now())
            }
        }
    }

    fn analyze_resume(
        &self,
        id: u32,
        input: &ResumeInput,
        required: &RequiredSkillSet,
    ) -> Result<AnalysisRecord, ExtractionFault> {
        let text = ensure_usable(input)?;

        let profile = extract_profile(text);
        let candidate = self.matcher.candidate_skills(text);
        let partition = self.matcher.partition(required, &candidate);
        let FitScore { score, verdict } = self.scorer.score(&partition);
        let recommendations = build_recommendations(&partition.missing);

        debug!(
            "Resume #{id} ({}): {}/{} required skills, score {score} ({verdict:?})",
            input.file_name,
            partition.matched.len(),
            required.len()
        );

        Ok(AnalysisRecord {
            id,
            candidate_name: profile.candidate_name,
            file_name: input.file_name.clone(),
            score,
            verdict,
            analyzed_at: self.clock.now(),
            matched_skills: partition.matched,
            missing_skills: partition.missing,
            recommendations,
            experience: profile.experience,
            education: profile.education,
            manual_review: false,
        })
    }
}

/// Score descending; equal scores keep input order.
fn rank(records: &mut [AnalysisRecord]) {
    records.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
}

fn fallback_record(id: u32, file_name: &str, analyzed_at: DateTime<Utc>) -> AnalysisRecord {
    let fit = FitScore::new(NEUTRAL_SCORE);
    AnalysisRecord {
        id,
        candidate_name: name_from_file(file_name),
        file_name: file_name.to_string(),
        score: fit.score,
        verdict: fit.verdict,
        analyzed_at,
        matched_skills: vec![FALLBACK_MATCHED.to_string()],
        missing_skills: vec![FALLBACK_MISSING.to_string()],
        recommendations: MANUAL_REVIEW_ADVICE.iter().map(|s| s.to_string()).collect(),
        experience: FALLBACK_EXPERIENCE.to_string(),
        education: FALLBACK_EDUCATION.to_string(),
        manual_review: true,
    }
}

/// "jane_doe-resume.pdf" → "jane doe resume"
fn name_from_file(file_name: &str) -> String {
    let stem = DOCUMENT_EXTENSION.replace(file_name, "");
    let name = stem.replace(|c: char| c == '-' || c == '_', " ");
    let name = name.trim();
    if name.is_empty() {
        UNKNOWN_CANDIDATE.to_string()
    } else {
        name.to_string()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::matcher::SkillPartition;
    use crate::models::analysis::Verdict;
    use chrono::TimeZone;
    use std::collections::HashSet;

    const JOB: &str = "React Node.js AWS Docker";

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn analyzer(workers: usize) -> BatchAnalyzer {
        BatchAnalyzer::new(Arc::new(SkillDictionary::default()), workers)
            .unwrap()
            .with_clock(Arc::new(FixedClock(fixed_time())))
    }

    fn sample_batch() -> Vec<ResumeInput> {
        vec![
            ResumeInput::new("alex.pdf", "Alex Morgan\n5 years React and AWS experience"),
            ResumeInput::new("blank.pdf", ""),
            ResumeInput::new(
                "sam.docx",
                "Sam Patel\nReact, Node.js, AWS and Docker\nEducation\nBSc Computing",
            ),
            ResumeInput::new("kim.pdf", "Kim Ng\nReact and Docker on AWS"),
            ResumeInput::new("lee.pdf", "Lee Park\nReact, AWS"),
        ]
    }

    /// Panics whenever the candidate knows docker.
    struct DockerAllergicScorer;

    impl FitScorer for DockerAllergicScorer {
        fn score(&self, partition: &SkillPartition) -> FitScore {
            if partition.matched.iter().any(|s| s == "docker") {
                panic!("scorer blew up");
            }
            SkillCoverageScorer.score(partition)
        }

        fn backend(&self) -> &'static str {
            "docker-allergic"
        }
    }

    #[test]
    fn test_half_matched_candidate_scores_fifty_low() {
        let resumes = vec![ResumeInput::new("a.pdf", "5 years React and AWS experience")];
        let report = analyzer(1).analyze_batch(JOB, &resumes);
        let record = &report.records[0];

        assert_eq!(report.required_skills, vec!["react", "node.js", "aws", "docker"]);
        assert_eq!(record.matched_skills, vec!["react", "aws"]);
        assert_eq!(record.missing_skills, vec!["node.js", "docker"]);
        assert_eq!(record.score, 50);
        assert_eq!(record.verdict, Verdict::Low);
        assert!(!record.manual_review);
        assert_eq!(record.recommendations[0], "Consider developing skills in: node.js, docker");
    }

    #[test]
    fn test_empty_resume_becomes_fallback_record() {
        let resumes = vec![ResumeInput::new("jane_doe-resume.pdf", "  ")];
        let report = analyzer(1).analyze_batch(JOB, &resumes);
        let record = &report.records[0];

        assert!(record.manual_review);
        assert_eq!(record.verdict, Verdict::Medium);
        assert_eq!(record.score, NEUTRAL_SCORE);
        assert_eq!(record.matched_skills, vec![FALLBACK_MATCHED]);
        assert_eq!(record.missing_skills, vec![FALLBACK_MISSING]);
        assert_eq!(
            record.recommendations,
            vec!["Manual review recommended", "Verify qualifications directly"]
        );
        assert_eq!(record.candidate_name, "jane doe resume");
        assert_eq!(record.file_name, "jane_doe-resume.pdf");
    }

    #[test]
    fn test_decode_error_becomes_fallback_record() {
        let resumes = vec![ResumeInput {
            file_name: "scan.pdf".to_string(),
            text: String::new(),
            decode_error: Some("no text layer".to_string()),
        }];
        let report = analyzer(1).analyze_batch(JOB, &resumes);
        assert!(report.records[0].manual_review);
        assert_eq!(report.records[0].candidate_name, "scan");
    }

    #[test]
    fn test_job_without_known_skills_scores_everyone_zero() {
        let report = analyzer(2).analyze_batch("Looking for a cheerful barista", &sample_batch());
        assert!(report.required_skills.is_empty());
        for record in report.records.iter().filter(|r| !r.manual_review) {
            assert_eq!(record.score, 0);
            assert_eq!(record.verdict, Verdict::Low);
            assert!(record.matched_skills.is_empty());
            assert!(record.missing_skills.is_empty());
        }
    }

    #[test]
    fn test_one_record_per_input_with_unique_ids() {
        let resumes = sample_batch();
        let report = analyzer(4).analyze_batch(JOB, &resumes);
        assert_eq!(report.records.len(), resumes.len());
        let ids: HashSet<u32> = report.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, (1..=resumes.len() as u32).collect());
        assert_eq!(report.state, BatchState::Completed);
    }

    #[test]
    fn test_records_sorted_by_score_then_id() {
        let report = analyzer(4).analyze_batch(JOB, &sample_batch());
        let order: Vec<(u32, u8)> = report.records.iter().map(|r| (r.id, r.score)).collect();
        // sam 100, kim 75 (3/4), blank fallback 65, alex 50, lee 50
        assert_eq!(order, vec![(3, 100), (4, 75), (2, 65), (1, 50), (5, 50)]);
    }

    #[test]
    fn test_partition_invariants_hold_for_every_record() {
        let a = analyzer(3);
        let report = a.analyze_batch(JOB, &sample_batch());
        let required: HashSet<&String> = report.required_skills.iter().collect();

        for record in report.records.iter().filter(|r| !r.manual_review) {
            let matched: HashSet<&String> = record.matched_skills.iter().collect();
            let missing: HashSet<&String> = record.missing_skills.iter().collect();
            assert!(matched.is_disjoint(&missing));
            let union: HashSet<&String> = matched.union(&missing).copied().collect();
            assert_eq!(union, required);
            assert!(record.score <= 100);
            assert_eq!(record.verdict, Verdict::from_score(record.score));
            assert!(!record.recommendations.is_empty());
            assert!(!record.candidate_name.is_empty());
        }
    }

    #[test]
    fn test_identical_inputs_give_identical_records() {
        let resumes = sample_batch();
        let first = analyzer(4).analyze_batch(JOB, &resumes);
        let second = analyzer(1).analyze_batch(JOB, &resumes);
        assert_eq!(first.records, second.records);
    }

    #[test]
    fn test_panicking_item_is_isolated() {
        let a = analyzer(2).with_scorer(Arc::new(DockerAllergicScorer));
        let report = a.analyze_batch(JOB, &sample_batch());

        assert_eq!(report.records.len(), 5);
        let by_id = |id: u32| report.records.iter().find(|r| r.id == id).unwrap();
        // sam and kim know docker and hit the panic
        assert!(by_id(3).manual_review);
        assert!(by_id(4).manual_review);
        // the others are scored normally
        assert!(!by_id(1).manual_review);
        assert_eq!(by_id(1).score, 50);
        assert!(!by_id(5).manual_review);
    }

    #[test]
    fn test_passed_deadline_turns_items_into_fallbacks() {
        let report = analyzer(2).analyze_batch_until(JOB, &sample_batch(), Some(Instant::now()));
        assert_eq!(report.records.len(), 5);
        assert!(report.records.iter().all(|r| r.manual_review));
        let ids: Vec<u32> = report.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_empty_batch_completes() {
        let report = analyzer(1).analyze_batch(JOB, &[]);
        assert!(report.records.is_empty());
        assert_eq!(report.state, BatchState::Completed);
    }

    #[test]
    fn test_extracted_fields_flow_into_record() {
        let resumes = vec![ResumeInput::new(
            "x.pdf",
            "Sam Patel\n7 years of experience with React\nEducation\nBSc Computing\n",
        )];
        let record = &analyzer(1).analyze_batch(JOB, &resumes).records[0];
        assert_eq!(record.candidate_name, "Sam Patel");
        assert_eq!(record.experience, "7+ years experience");
        assert_eq!(record.education, "BSc Computing");
        assert_eq!(record.analyzed_at, fixed_time());
    }

    #[test]
    fn test_name_from_file() {
        assert_eq!(name_from_file("john-smith_cv.PDF"), "john smith cv");
        assert_eq!(name_from_file("notes.txt"), "notes.txt");
        assert_eq!(name_from_file(".docx"), UNKNOWN_CANDIDATE);
    }

    #[test]
    fn test_batch_state_advances_to_completed() {
        assert_eq!(BatchState::Idle.advance(), BatchState::Running);
        assert_eq!(BatchState::Running.advance(), BatchState::Completed);
        assert_eq!(BatchState::Completed.advance(), BatchState::Completed);
    }
}

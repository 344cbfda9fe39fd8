//! Recommendation generator — fixed, ordered advice derived from missing skills.

const MAX_NAMED_SKILLS: usize = 2;

const GAP_ADVICE: &[&str] = &[
    "Highlight relevant project experience in portfolio",
    "Consider adding industry certifications",
];

const STRENGTH_ADVICE: &[&str] = &[
    "Excellent skill match - focus on showcasing project outcomes",
    "Consider highlighting leadership and team collaboration experience",
    "Strong technical background - emphasize problem-solving achievements",
];

pub const MANUAL_REVIEW_ADVICE: &[&str] =
    &["Manual review recommended", "Verify qualifications directly"];

/// Builds the suggestion list for one candidate. Never empty.
pub fn build_recommendations(missing: &[String]) -> Vec<String> {
    if missing.is_empty() {
        return STRENGTH_ADVICE.iter().map(|s| s.to_string()).collect();
    }

    let named: Vec<&str> = missing
        .iter()
        .take(MAX_NAMED_SKILLS)
        .map(String::as_str)
        .collect();

    let mut recommendations = Vec::with_capacity(1 + GAP_ADVICE.len());
    recommendations.push(format!(
        "Consider developing skills in: {}",
        named.join(", ")
    ));
    recommendations.extend(GAP_ADVICE.iter().map(|s| s.to_string()));
    recommendations
}

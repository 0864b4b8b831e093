//! Matcher: pluggable, trait-based scorer that measures a candidate inventory
//! against a role's requirement list.
//!
//! Default: `WeightedSkillMatcher` (pure, deterministic, fully testable).
//!
//! `AppState` holds an `Arc<dyn SkillMatcher>`. Inputs are expected to be
//! canonicalized already (see `matching::synonyms`); names are only folded for
//! case-insensitive comparison here.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::matching::synonyms::{fold_key, level_index};
use crate::models::skill::{
    validate_requirements, CandidateProfile, Requirement, RequirementKind, Tier, TierWeights,
};

/// Attribute score used when the upstream extractor supplied none.
pub const NEUTRAL_ATTRIBUTE_SCORE: f64 = 50.0;
/// A met requirement at or above this level counts as a standout skill.
pub const STANDOUT_LEVEL: u8 = 4;

// ────────────────────────────────────────────────────────────────────────────
// Weights
// ────────────────────────────────────────────────────────────────────────────

/// Convex weights for the overall score. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub technical: f64,
    pub experience: f64,
    pub education: f64,
    pub soft: f64,
    pub cultural_fit: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            technical: 0.40,
            experience: 0.25,
            education: 0.0,
            soft: 0.20,
            cultural_fit: 0.15,
        }
    }
}

impl ScoreWeights {
    pub fn validate(&self) -> Result<(), EngineError> {
        let parts = [
            self.technical,
            self.experience,
            self.education,
            self.soft,
            self.cultural_fit,
        ];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EngineError::validation(
                "score_weights",
                "weights must be non-negative numbers",
            ));
        }
        let sum: f64 = parts.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(EngineError::validation(
                "score_weights",
                format!("weights must sum to 1.0, got {sum}"),
            ));
        }
        Ok(())
    }

    /// overall = Σ weight × category score, clamped to [0, 100]
    pub fn combine(&self, scores: &CategoryScores) -> f64 {
        (self.technical * scores.technical
            + self.experience * scores.experience
            + self.education * scores.education
            + self.soft * scores.soft
            + self.cultural_fit * scores.cultural_fit)
            .clamp(0.0, 100.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

/// Per-category scores, each 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub technical: f64,
    pub experience: f64,
    pub education: f64,
    pub soft: f64,
    pub cultural_fit: f64,
}

/// How the candidate stands against one requirement. Kept in requirement order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementAssessment {
    pub skill_name: String,
    pub tier: Tier,
    pub kind: RequirementKind,
    pub required_level: u8,
    pub candidate_level: u8,
    pub met: bool,
}

/// A requirement the candidate meets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedSkill {
    pub skill_name: String,
    pub tier: Tier,
    pub candidate_level: u8,
    pub required_level: u8,
    /// share of the total requirement weight this skill carries (0.0-1.0)
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// 0-100. Reported as 0 when `score_defined` is false.
    pub overall_score: f64,
    /// False when the requirement list was empty.
    pub score_defined: bool,
    pub category_scores: CategoryScores,
    pub required_coverage: f64,
    pub preferred_coverage: f64,
    pub matched_skills: Vec<MatchedSkill>,
    pub average_skill_level: f64,
    /// met requirements where the candidate is at level 4 or above
    pub standout_skills: Vec<String>,
    /// required-tier requirements exceeded by at least one level
    pub unique_strengths: Vec<String>,
    pub assessments: Vec<RequirementAssessment>,
}

impl MatchResult {
    pub fn standout_skill_count(&self) -> usize {
        self.standout_skills.len()
    }

    pub fn unique_strength_count(&self) -> usize {
        self.unique_strengths.len()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The matcher trait. Implement this to swap scoring backends without touching
/// the workflow or handler code.
pub trait SkillMatcher: Send + Sync {
    fn score(
        &self,
        candidate: &CandidateProfile,
        requirements: &[Requirement],
    ) -> Result<MatchResult, EngineError>;

    /// Short label for logs.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// WeightedSkillMatcher: default implementation
// ────────────────────────────────────────────────────────────────────────────

/// Tier-weighted coverage matcher.
///
/// Algorithm:
/// 1. Resolve the candidate level for each requirement (0 when absent)
/// 2. A requirement is met when candidate level ≥ min_level
/// 3. Coverage per tier = met / total (1.0 over an empty tier)
/// 4. technical = 100 × Σ(weight × met) / Σ weight over technical requirements
/// 5. overall = convex combination of category scores (`ScoreWeights`)
#[derive(Debug, Clone, Default)]
pub struct WeightedSkillMatcher {
    pub score_weights: ScoreWeights,
    pub tier_weights: TierWeights,
}

impl WeightedSkillMatcher {
    pub fn new(score_weights: ScoreWeights, tier_weights: TierWeights) -> Self {
        Self {
            score_weights,
            tier_weights,
        }
    }
}

impl SkillMatcher for WeightedSkillMatcher {
    fn score(
        &self,
        candidate: &CandidateProfile,
        requirements: &[Requirement],
    ) -> Result<MatchResult, EngineError> {
        candidate.validate()?;
        validate_requirements(requirements)?;
        Ok(compute_weighted_match(
            candidate,
            requirements,
            &self.score_weights,
            &self.tier_weights,
        ))
    }

    fn backend(&self) -> &'static str {
        "weighted"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core algorithm
// ────────────────────────────────────────────────────────────────────────────

fn compute_weighted_match(
    candidate: &CandidateProfile,
    requirements: &[Requirement],
    score_weights: &ScoreWeights,
    tier_weights: &TierWeights,
) -> MatchResult {
    let attribute = |v: Option<f64>| v.unwrap_or(NEUTRAL_ATTRIBUTE_SCORE);

    if requirements.is_empty() {
        return MatchResult {
            overall_score: 0.0,
            score_defined: false,
            category_scores: CategoryScores {
                technical: 0.0,
                experience: attribute(candidate.experience),
                education: attribute(candidate.education),
                soft: attribute(candidate.soft),
                cultural_fit: attribute(candidate.cultural_fit),
            },
            required_coverage: 1.0,
            preferred_coverage: 1.0,
            matched_skills: vec![],
            average_skill_level: 0.0,
            standout_skills: vec![],
            unique_strengths: vec![],
            assessments: vec![],
        };
    }

    let levels = level_index(&candidate.skills);

    let mut assessments = Vec::with_capacity(requirements.len());
    let (mut required_total, mut required_met) = (0usize, 0usize);
    let (mut preferred_total, mut preferred_met) = (0usize, 0usize);
    let (mut technical_weight, mut technical_met_weight) = (0.0_f64, 0.0_f64);
    let mut total_weight = 0.0_f64;
    let mut level_sum = 0u32;

    for requirement in requirements {
        let candidate_level = levels
            .get(&fold_key(&requirement.skill_name))
            .copied()
            .unwrap_or(0);
        let met = candidate_level >= requirement.min_level;
        let weight = requirement.weight(tier_weights);

        match requirement.tier {
            Tier::Required => {
                required_total += 1;
                required_met += usize::from(met);
            }
            Tier::Preferred => {
                preferred_total += 1;
                preferred_met += usize::from(met);
            }
        }

        if requirement.kind == RequirementKind::Technical {
            technical_weight += weight;
            if met {
                technical_met_weight += weight;
            }
        }

        total_weight += weight;
        level_sum += u32::from(candidate_level);

        assessments.push(RequirementAssessment {
            skill_name: requirement.skill_name.clone(),
            tier: requirement.tier,
            kind: requirement.kind,
            required_level: requirement.min_level,
            candidate_level,
            met,
        });
    }

    let technical = if technical_weight > 0.0 {
        100.0 * technical_met_weight / technical_weight
    } else {
        100.0
    };

    let category_scores = CategoryScores {
        technical,
        experience: attribute(candidate.experience),
        education: attribute(candidate.education),
        soft: attribute(candidate.soft),
        cultural_fit: attribute(candidate.cultural_fit),
    };

    let mut matched_skills: Vec<MatchedSkill> = assessments
        .iter()
        .filter(|a| a.met)
        .map(|a| MatchedSkill {
            skill_name: a.skill_name.clone(),
            tier: a.tier,
            candidate_level: a.candidate_level,
            required_level: a.required_level,
            contribution: tier_weights.for_tier(a.tier) / total_weight,
        })
        .collect();
    matched_skills.sort_by(compare_matched);

    let standout_skills = assessments
        .iter()
        .filter(|a| a.met && a.candidate_level >= STANDOUT_LEVEL)
        .map(|a| a.skill_name.clone())
        .collect();

    let unique_strengths = assessments
        .iter()
        .filter(|a| a.tier == Tier::Required && a.candidate_level > a.required_level)
        .map(|a| a.skill_name.clone())
        .collect();

    MatchResult {
        overall_score: score_weights.combine(&category_scores),
        score_defined: true,
        category_scores,
        required_coverage: coverage(required_met, required_total),
        preferred_coverage: coverage(preferred_met, preferred_total),
        matched_skills,
        average_skill_level: f64::from(level_sum) / requirements.len() as f64,
        standout_skills,
        unique_strengths,
        assessments,
    }
}

/// Fraction met; vacuously 1.0 over an empty set.
fn coverage(met: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        met as f64 / total as f64
    }
}

/// Descending contribution, then descending candidate level, then name.
fn compare_matched(a: &MatchedSkill, b: &MatchedSkill) -> Ordering {
    b.contribution
        .partial_cmp(&a.contribution)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.candidate_level.cmp(&a.candidate_level))
        .then_with(|| fold_key(&a.skill_name).cmp(&fold_key(&b.skill_name)))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::skill::Skill;

    fn candidate(skills: &[(&str, u8)]) -> CandidateProfile {
        CandidateProfile::from_skills(
            skills
                .iter()
                .map(|(name, level)| Skill::new(name, *level))
                .collect(),
        )
    }

    fn score(skills: &[(&str, u8)], reqs: &[Requirement]) -> MatchResult {
        WeightedSkillMatcher::default()
            .score(&candidate(skills), reqs)
            .unwrap()
    }

    #[test]
    fn test_scenario_half_required_coverage() {
        let reqs = vec![
            Requirement::new("Python", 5, Tier::Required),
            Requirement::new("Go", 5, Tier::Required),
        ];
        let result = score(&[("Python", 5), ("Go", 3)], &reqs);
        assert!((result.required_coverage - 0.5).abs() < f64::EPSILON);
        assert!((result.preferred_coverage - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.matched_skills.len(), 1);
        assert_eq!(result.matched_skills[0].skill_name, "Python");
    }

    #[test]
    fn test_empty_requirements_flags_undefined_score() {
        let result = score(&[("Rust", 5)], &[]);
        assert_eq!(result.required_coverage, 1.0);
        assert_eq!(result.preferred_coverage, 1.0);
        assert_eq!(result.overall_score, 0.0);
        assert!(!result.score_defined);
        assert!(result.matched_skills.is_empty());
    }

    #[test]
    fn test_absent_skill_is_level_zero() {
        let reqs = vec![Requirement::new("Kafka", 2, Tier::Preferred)];
        let result = score(&[("Rust", 5)], &reqs);
        assert_eq!(result.assessments[0].candidate_level, 0);
        assert_eq!(result.preferred_coverage, 0.0);
        assert_eq!(result.required_coverage, 1.0);
    }

    #[test]
    fn test_names_compare_case_insensitively() {
        let reqs = vec![Requirement::new("RUST", 3, Tier::Required)];
        let result = score(&[("rust", 3)], &reqs);
        assert_eq!(result.required_coverage, 1.0);
    }

    #[test]
    fn test_overall_is_convex_combination() {
        let reqs = vec![Requirement::new("Rust", 3, Tier::Required)];
        let profile = CandidateProfile {
            skills: vec![Skill::new("Rust", 4)],
            experience: Some(80.0),
            education: Some(10.0),
            soft: Some(60.0),
            cultural_fit: Some(40.0),
        };
        let result = WeightedSkillMatcher::default()
            .score(&profile, &reqs)
            .unwrap();
        // 0.40*100 + 0.25*80 + 0.20*60 + 0.15*40 = 40 + 20 + 12 + 6 = 78
        assert!((result.overall_score - 78.0).abs() < 1e-9, "got {}", result.overall_score);
        assert_eq!(result.category_scores.education, 10.0);
    }

    #[test]
    fn test_missing_attributes_default_to_neutral() {
        let reqs = vec![Requirement::new("Rust", 3, Tier::Required)];
        let result = score(&[], &reqs);
        assert_eq!(result.category_scores.technical, 0.0);
        assert_eq!(result.category_scores.experience, NEUTRAL_ATTRIBUTE_SCORE);
        // 0.25*50 + 0.20*50 + 0.15*50 = 30
        assert!((result.overall_score - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_technical_score_is_tier_weighted() {
        let reqs = vec![
            Requirement::new("Rust", 3, Tier::Required),
            Requirement::new("Kafka", 3, Tier::Preferred),
        ];
        let result = score(&[("Kafka", 3)], &reqs);
        // 0.6 / 1.6 = 37.5%
        assert!((result.category_scores.technical - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_configured_tier_weights_drive_technical_score() {
        let reqs = vec![
            Requirement::new("Rust", 3, Tier::Required),
            Requirement::new("Kafka", 3, Tier::Preferred),
        ];
        let matcher = WeightedSkillMatcher::new(
            ScoreWeights::default(),
            TierWeights {
                required: 1.0,
                preferred: 0.25,
            },
        );
        let result = matcher.score(&candidate(&[("Kafka", 3)]), &reqs).unwrap();
        // 0.25 / 1.25 = 20%
        assert!((result.category_scores.technical - 20.0).abs() < 1e-9);
        assert!((result.matched_skills[0].contribution - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_soft_requirements_do_not_feed_technical() {
        let mut mentoring = Requirement::new("Mentoring", 3, Tier::Required);
        mentoring.kind = RequirementKind::Soft;
        let reqs = vec![Requirement::new("Rust", 3, Tier::Required), mentoring];
        let result = score(&[("Rust", 3)], &reqs);
        assert_eq!(result.category_scores.technical, 100.0);
        assert_eq!(result.required_coverage, 0.5);
    }

    #[test]
    fn test_matched_skills_ordering_and_tie_breaks() {
        let reqs = vec![
            Requirement::new("Kafka", 2, Tier::Preferred),
            Requirement::new("Zig", 2, Tier::Required),
            Requirement::new("Go", 2, Tier::Required),
            Requirement::new("Ada", 2, Tier::Required),
        ];
        let result = score(&[("Kafka", 5), ("Zig", 3), ("Go", 4), ("Ada", 3)], &reqs);
        let names: Vec<_> = result
            .matched_skills
            .iter()
            .map(|m| m.skill_name.as_str())
            .collect();
        assert_eq!(names, vec!["Go", "Ada", "Zig", "Kafka"]);
    }

    #[test]
    fn test_standouts_and_unique_strengths() {
        let reqs = vec![
            Requirement::new("Rust", 3, Tier::Required),
            Requirement::new("Go", 4, Tier::Required),
            Requirement::new("Kafka", 2, Tier::Preferred),
        ];
        let result = score(&[("Rust", 5), ("Go", 4), ("Kafka", 4)], &reqs);
        assert_eq!(result.standout_skills, vec!["Rust", "Go", "Kafka"]);
        // Kafka is preferred-tier, Go only meets its level.
        assert_eq!(result.unique_strengths, vec!["Rust"]);
        assert!((result.average_skill_level - 13.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_coverages_stay_in_unit_interval() {
        let reqs = vec![
            Requirement::new("A", 1, Tier::Required),
            Requirement::new("B", 5, Tier::Required),
            Requirement::new("C", 3, Tier::Preferred),
        ];
        for level in 0..=5u8 {
            let result = score(&[("A", level), ("B", level), ("C", level)], &reqs);
            assert!((0.0..=1.0).contains(&result.required_coverage));
            assert!((0.0..=1.0).contains(&result.preferred_coverage));
            assert!((0.0..=100.0).contains(&result.overall_score));
        }
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let reqs = vec![
            Requirement::new("Rust", 4, Tier::Required),
            Requirement::new("Go", 2, Tier::Preferred),
        ];
        let first = score(&[("Rust", 3), ("Go", 5)], &reqs);
        let second = score(&[("Rust", 3), ("Go", 5)], &reqs);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let err = WeightedSkillMatcher::default()
            .score(&candidate(&[("Rust", 9)]), &[Requirement::new("Rust", 3, Tier::Required)])
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
    }

    #[test]
    fn test_score_weights_must_sum_to_one() {
        let weights = ScoreWeights {
            technical: 0.5,
            ..ScoreWeights::default()
        };
        assert!(weights.validate().is_err());
        assert!(ScoreWeights::default().validate().is_ok());
    }
}

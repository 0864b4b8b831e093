//! Gap analysis: turns unmet requirements into a prioritized learning backlog.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::matching::matcher::MatchResult;
use crate::matching::synonyms::{fold_key, level_index};
use crate::models::skill::{CandidateProfile, Requirement, Tier, TierWeights, MAX_LEVEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapCategory {
    Critical,
    Important,
    NiceToHave,
}

/// A requirement the candidate does not yet meet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub skill_name: String,
    pub current_level: u8,
    pub required_level: u8,
    /// required_level - current_level, always ≥ 1
    pub level_delta: u8,
    pub tier: Tier,
    pub category: GapCategory,
    /// 0-100
    pub priority: u8,
    pub estimated_hours: u32,
}

impl Gap {
    /// Checks a gap supplied from outside the analyzer for internal consistency.
    /// Priority is only bounded, since it depends on the configured tier weights.
    pub fn validate(&self, field: &str) -> Result<(), EngineError> {
        if self.skill_name.trim().is_empty() {
            return Err(EngineError::validation(
                format!("{field}.skill_name"),
                "gap skill name cannot be empty",
            ));
        }
        if self.current_level >= self.required_level || self.required_level > MAX_LEVEL {
            return Err(EngineError::validation(
                format!("{field}.required_level"),
                format!(
                    "required_level must be above current_level and at most {MAX_LEVEL}, got {} -> {}",
                    self.current_level, self.required_level
                ),
            ));
        }
        if self.level_delta != self.required_level - self.current_level {
            return Err(EngineError::validation(
                format!("{field}.level_delta"),
                format!(
                    "level_delta must equal required_level - current_level ({}), got {}",
                    self.required_level - self.current_level,
                    self.level_delta
                ),
            ));
        }
        if self.category != categorize(self.tier, self.level_delta) {
            return Err(EngineError::validation(
                format!("{field}.category"),
                format!(
                    "category {:?} does not follow from tier {} and delta {}",
                    self.category,
                    self.tier.as_str(),
                    self.level_delta
                ),
            ));
        }
        if self.priority > 100 {
            return Err(EngineError::validation(
                format!("{field}.priority"),
                format!("priority must be within 0-100, got {}", self.priority),
            ));
        }
        let ceiling = hours_between(0, MAX_LEVEL);
        if self.estimated_hours > ceiling {
            return Err(EngineError::validation(
                format!("{field}.estimated_hours"),
                format!(
                    "estimated_hours must be at most {ceiling}, got {}",
                    self.estimated_hours
                ),
            ));
        }
        Ok(())
    }
}

/// Hours to climb into each level, indexed by the target level.
/// 0→1 awareness, 1→2 beginner, 2→3 intermediate, 3→4 advanced, 4→5 expert.
const STEP_HOURS: [(u8, u32); 5] = [(1, 8), (2, 12), (3, 20), (4, 30), (5, 50)];

/// Sum of step costs from `from` up to `to`. Zero when `to <= from`.
pub fn hours_between(from: u8, to: u8) -> u32 {
    let to = to.min(MAX_LEVEL);
    STEP_HOURS
        .iter()
        .filter(|(target, _)| *target > from && *target <= to)
        .map(|(_, hours)| hours)
        .sum()
}

/// Category is a pure function of tier and delta.
pub fn categorize(tier: Tier, level_delta: u8) -> GapCategory {
    match (tier, level_delta) {
        (Tier::Required, d) if d >= 2 => GapCategory::Critical,
        (Tier::Required, _) => GapCategory::Important,
        (Tier::Preferred, d) if d >= 2 => GapCategory::Important,
        (Tier::Preferred, _) => GapCategory::NiceToHave,
    }
}

/// priority = round(100 × (delta / 4) × tier_weight), clamped to [0, 100]
pub fn priority(level_delta: u8, tier_weight: f64) -> u8 {
    (100.0 * (f64::from(level_delta) / 4.0) * tier_weight)
        .round()
        .clamp(0.0, 100.0) as u8
}

/// Derives the ordered gap backlog.
///
/// Sorted by priority desc, then estimated hours desc, then name; identical inputs
/// always give an identical list. Yields nothing when the match had no requirements.
pub fn analyze_gaps(
    candidate: &CandidateProfile,
    requirements: &[Requirement],
    match_result: &MatchResult,
    tier_weights: &TierWeights,
) -> Vec<Gap> {
    if !match_result.score_defined {
        return vec![];
    }

    let levels = level_index(&candidate.skills);

    let mut gaps: Vec<Gap> = requirements
        .iter()
        .filter_map(|requirement| {
            let current_level = levels
                .get(&fold_key(&requirement.skill_name))
                .copied()
                .unwrap_or(0);
            if current_level >= requirement.min_level {
                return None;
            }
            let level_delta = requirement.min_level - current_level;
            Some(Gap {
                skill_name: requirement.skill_name.clone(),
                current_level,
                required_level: requirement.min_level,
                level_delta,
                tier: requirement.tier,
                category: categorize(requirement.tier, level_delta),
                priority: priority(level_delta, requirement.weight(tier_weights)),
                estimated_hours: hours_between(current_level, requirement.min_level),
            })
        })
        .collect();

    sort_backlog(&mut gaps);

    debug_assert!(gaps.iter().all(|g| !match_result
        .matched_skills
        .iter()
        .any(|m| fold_key(&m.skill_name) == fold_key(&g.skill_name))));

    gaps
}

/// Backlog order: priority desc, estimated hours desc, name asc.
pub fn sort_backlog(gaps: &mut [Gap]) {
    gaps.sort_by(compare_gaps);
}

fn compare_gaps(a: &Gap, b: &Gap) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.estimated_hours.cmp(&a.estimated_hours))
        .then_with(|| fold_key(&a.skill_name).cmp(&fold_key(&b.skill_name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::matcher::{SkillMatcher, WeightedSkillMatcher};
    use crate::models::skill::Skill;

    fn run(skills: &[(&str, u8)], reqs: &[Requirement]) -> Vec<Gap> {
        let candidate = CandidateProfile::from_skills(
            skills.iter().map(|(n, l)| Skill::new(n, *l)).collect(),
        );
        let result = WeightedSkillMatcher::default()
            .score(&candidate, reqs)
            .unwrap();
        analyze_gaps(&candidate, reqs, &result, &TierWeights::default())
    }

    #[test]
    fn test_scenario_go_gap_is_critical() {
        let reqs = vec![
            Requirement::new("Python", 5, Tier::Required),
            Requirement::new("Go", 5, Tier::Required),
        ];
        let gaps = run(&[("Python", 5), ("Go", 3)], &reqs);
        assert_eq!(gaps.len(), 1);
        let gap = &gaps[0];
        assert_eq!(gap.skill_name, "Go");
        assert_eq!(gap.current_level, 3);
        assert_eq!(gap.required_level, 5);
        assert_eq!(gap.level_delta, 2);
        assert_eq!(gap.category, GapCategory::Critical);
        assert_eq!(gap.priority, 50);
        assert_eq!(gap.estimated_hours, 80);
    }

    #[test]
    fn test_empty_requirements_produce_no_gaps() {
        assert!(run(&[("Rust", 2)], &[]).is_empty());
    }

    #[test]
    fn test_category_table() {
        assert_eq!(categorize(Tier::Required, 3), GapCategory::Critical);
        assert_eq!(categorize(Tier::Required, 2), GapCategory::Critical);
        assert_eq!(categorize(Tier::Required, 1), GapCategory::Important);
        assert_eq!(categorize(Tier::Preferred, 2), GapCategory::Important);
        assert_eq!(categorize(Tier::Preferred, 1), GapCategory::NiceToHave);
    }

    #[test]
    fn test_priority_formula() {
        assert_eq!(priority(1, 1.0), 25);
        assert_eq!(priority(4, 1.0), 100);
        assert_eq!(priority(5, 1.0), 100); // clamped
        assert_eq!(priority(2, 0.6), 30);
        assert_eq!(priority(1, 0.6), 15);
    }

    #[test]
    fn test_hours_are_additive_per_step() {
        assert_eq!(hours_between(2, 5), 20 + 30 + 50);
        assert_eq!(hours_between(0, 1), 8);
        assert_eq!(hours_between(3, 3), 0);
        assert_eq!(hours_between(4, 2), 0);
    }

    #[test]
    fn test_sorted_by_priority_then_hours() {
        let reqs = vec![
            Requirement::new("Kafka", 3, Tier::Preferred), // delta 3 → 45
            Requirement::new("Rust", 2, Tier::Required),   // delta 1 → 25, 12h
            Requirement::new("Go", 5, Tier::Required),     // delta 1 → 25, 50h
            Requirement::new("Zig", 4, Tier::Required),    // delta 4 → 100
        ];
        let gaps = run(&[("Rust", 1), ("Go", 4)], &reqs);
        let names: Vec<_> = gaps.iter().map(|g| g.skill_name.as_str()).collect();
        assert_eq!(names, vec!["Zig", "Kafka", "Go", "Rust"]);
    }

    #[test]
    fn test_met_requirements_produce_no_gap() {
        let reqs = vec![Requirement::new("Rust", 3, Tier::Required)];
        assert!(run(&[("Rust", 4)], &reqs).is_empty());
    }

    #[test]
    fn test_raising_level_never_raises_priority_or_hours() {
        for tier in [Tier::Required, Tier::Preferred] {
            let reqs = vec![Requirement::new("Rust", 5, tier)];
            let mut previous: Option<(u8, u32)> = None;
            for level in 0..=5u8 {
                let gaps = run(&[("Rust", level)], &reqs);
                let current = gaps
                    .first()
                    .map(|g| (g.priority, g.estimated_hours))
                    .unwrap_or((0, 0));
                if let Some((p, h)) = previous {
                    assert!(current.0 <= p, "priority rose at level {level}");
                    assert!(current.1 <= h, "hours rose at level {level}");
                }
                previous = Some(current);
            }
        }
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let reqs = vec![
            Requirement::new("A", 3, Tier::Required),
            Requirement::new("B", 3, Tier::Required),
            Requirement::new("C", 4, Tier::Preferred),
        ];
        assert_eq!(run(&[], &reqs), run(&[], &reqs));
    }

    #[test]
    fn test_analyzer_gaps_pass_validation() {
        let candidate = CandidateProfile::from_skills(vec![Skill::new("Go", 1)]);
        let reqs = vec![
            Requirement::new("Go", 5, Tier::Required),
            Requirement::new("Kafka", 2, Tier::Preferred),
        ];
        let result = WeightedSkillMatcher::default().score(&candidate, &reqs).unwrap();
        let gaps = analyze_gaps(&candidate, &reqs, &result, &TierWeights::default());
        for (i, gap) in gaps.iter().enumerate() {
            assert!(gap.validate(&format!("gaps[{i}]")).is_ok(), "{gap:?}");
        }
    }

    #[test]
    fn test_inconsistent_gaps_rejected() {
        let good = Gap {
            skill_name: "Go".to_string(),
            current_level: 3,
            required_level: 5,
            level_delta: 2,
            tier: Tier::Required,
            category: GapCategory::Critical,
            priority: 50,
            estimated_hours: 80,
        };
        assert!(good.validate("gap").is_ok());

        let bad = [
            Gap { estimated_hours: u32::MAX, ..good.clone() },
            Gap { level_delta: 1, ..good.clone() },
            Gap { category: GapCategory::NiceToHave, ..good.clone() },
            Gap { priority: 101, ..good.clone() },
            Gap { required_level: 6, level_delta: 3, ..good.clone() },
            Gap { current_level: 5, level_delta: 0, ..good.clone() },
        ];
        for gap in bad {
            assert!(matches!(
                gap.validate("gap"),
                Err(EngineError::Validation { .. })
            ), "{gap:?}");
        }
    }
}

//! Quality gates: three ordered readiness rubrics checked against a match result.
//!
//! # Default rubrics
//! - foundational: required coverage ≥ 0.80, average level ≥ 2.0
//! - competitive: required ≥ 0.90, preferred ≥ 0.50, average ≥ 3.0, ≥ 2 standout skills
//! - excellence: required ≥ 1.00, preferred ≥ 0.75, average ≥ 3.5, ≥ 1 standout skill,
//!   ≥ 2 unique strengths
//!
//! Every gate is evaluated independently; a higher gate failing never affects a lower one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::matching::gaps::{Gap, GapCategory};
use crate::matching::matcher::MatchResult;

const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateName {
    Foundational,
    Competitive,
    Excellence,
}

impl GateName {
    pub const ALL: [GateName; 3] = [
        GateName::Foundational,
        GateName::Competitive,
        GateName::Excellence,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMetric {
    RequiredCoverage,
    PreferredCoverage,
    AverageSkillLevel,
    StandoutSkills,
    UniqueStrengths,
    CriticalGaps,
}

/// Threshold vector for one gate. `None` means the dimension is not checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateThresholds {
    pub min_required_coverage: f64,
    pub min_preferred_coverage: Option<f64>,
    pub min_average_level: f64,
    pub min_standout_skills: Option<usize>,
    pub min_unique_strengths: Option<usize>,
    /// upper bound on critical gaps
    pub max_critical_gaps: Option<usize>,
}

impl GateThresholds {
    pub fn foundational() -> Self {
        Self {
            min_required_coverage: 0.80,
            min_preferred_coverage: None,
            min_average_level: 2.0,
            min_standout_skills: None,
            min_unique_strengths: None,
            max_critical_gaps: None,
        }
    }

    pub fn competitive() -> Self {
        Self {
            min_required_coverage: 0.90,
            min_preferred_coverage: Some(0.50),
            min_average_level: 3.0,
            min_standout_skills: Some(2),
            min_unique_strengths: None,
            max_critical_gaps: None,
        }
    }

    pub fn excellence() -> Self {
        Self {
            min_required_coverage: 1.00,
            min_preferred_coverage: Some(0.75),
            min_average_level: 3.5,
            min_standout_skills: Some(1),
            min_unique_strengths: Some(2),
            max_critical_gaps: None,
        }
    }

    fn apply(&mut self, o: &GateThresholdOverride) {
        if let Some(v) = o.min_required_coverage {
            self.min_required_coverage = v;
        }
        if let Some(v) = o.min_preferred_coverage {
            self.min_preferred_coverage = Some(v);
        }
        if let Some(v) = o.min_average_level {
            self.min_average_level = v;
        }
        if let Some(v) = o.min_standout_skills {
            self.min_standout_skills = Some(v);
        }
        if let Some(v) = o.min_unique_strengths {
            self.min_unique_strengths = Some(v);
        }
        if let Some(v) = o.max_critical_gaps {
            self.max_critical_gaps = Some(v);
        }
    }
}

/// Partial override for one gate, as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateThresholdOverride {
    #[serde(default)]
    pub min_required_coverage: Option<f64>,
    #[serde(default)]
    pub min_preferred_coverage: Option<f64>,
    #[serde(default)]
    pub min_average_level: Option<f64>,
    #[serde(default)]
    pub min_standout_skills: Option<usize>,
    #[serde(default)]
    pub min_unique_strengths: Option<usize>,
    #[serde(default)]
    pub max_critical_gaps: Option<usize>,
}

/// The three rubrics in gate order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSet {
    pub foundational: GateThresholds,
    pub competitive: GateThresholds,
    pub excellence: GateThresholds,
}

impl Default for GateSet {
    fn default() -> Self {
        Self {
            foundational: GateThresholds::foundational(),
            competitive: GateThresholds::competitive(),
            excellence: GateThresholds::excellence(),
        }
    }
}

impl GateSet {
    pub fn with_overrides(overrides: &BTreeMap<GateName, GateThresholdOverride>) -> Self {
        let mut set = Self::default();
        for (gate, o) in overrides {
            set.get_mut(*gate).apply(o);
        }
        set
    }

    pub fn get(&self, gate: GateName) -> &GateThresholds {
        match gate {
            GateName::Foundational => &self.foundational,
            GateName::Competitive => &self.competitive,
            GateName::Excellence => &self.excellence,
        }
    }

    fn get_mut(&mut self, gate: GateName) -> &mut GateThresholds {
        match gate {
            GateName::Foundational => &mut self.foundational,
            GateName::Competitive => &mut self.competitive,
            GateName::Excellence => &mut self.excellence,
        }
    }

    /// Coverages stay within [0, 1], each gate is at least as strict as the one below
    /// it on required coverage and average level, and every higher gate dominates
    /// foundational on every dimension it checks.
    ///
    /// Excellence may ask for fewer standout skills than competitive (it asks for
    /// unique strengths instead), so full dominance is only required over foundational.
    pub fn validate(&self) -> Result<(), EngineError> {
        for gate in GateName::ALL {
            let t = self.get(gate);
            let coverages = [Some(t.min_required_coverage), t.min_preferred_coverage];
            if coverages
                .iter()
                .flatten()
                .any(|c| !c.is_finite() || !(0.0..=1.0).contains(c))
            {
                return Err(EngineError::validation(
                    format!("gate_thresholds.{}", gate_key(gate)),
                    "coverage thresholds must be within 0-1",
                ));
            }
            if !t.min_average_level.is_finite() || !(0.0..=5.0).contains(&t.min_average_level) {
                return Err(EngineError::validation(
                    format!("gate_thresholds.{}.min_average_level", gate_key(gate)),
                    "average level threshold must be within 0-5",
                ));
            }
        }
        for pair in GateName::ALL.windows(2) {
            let (lower, higher) = (self.get(pair[0]), self.get(pair[1]));
            if higher.min_required_coverage < lower.min_required_coverage
                || higher.min_average_level < lower.min_average_level
            {
                return Err(EngineError::validation(
                    format!("gate_thresholds.{}", gate_key(pair[1])),
                    format!(
                        "{} must be at least as strict as {}",
                        gate_key(pair[1]),
                        gate_key(pair[0])
                    ),
                ));
            }
        }
        let base = self.get(GateName::Foundational);
        for gate in [GateName::Competitive, GateName::Excellence] {
            if let Some(metric) = weaker_dimension(self.get(gate), base) {
                return Err(EngineError::validation(
                    format!("gate_thresholds.{}", gate_key(gate)),
                    format!(
                        "{} must be at least as strict as foundational on {}",
                        gate_key(gate),
                        metric_key(metric)
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// First dimension on which `higher` accepts something `lower` rejects.
fn weaker_dimension(higher: &GateThresholds, lower: &GateThresholds) -> Option<GateMetric> {
    fn min_weaker<T: PartialOrd>(higher: Option<T>, lower: Option<T>) -> bool {
        match (lower, higher) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(l), Some(h)) => h < l,
        }
    }

    if higher.min_required_coverage < lower.min_required_coverage {
        return Some(GateMetric::RequiredCoverage);
    }
    if min_weaker(higher.min_preferred_coverage, lower.min_preferred_coverage) {
        return Some(GateMetric::PreferredCoverage);
    }
    if higher.min_average_level < lower.min_average_level {
        return Some(GateMetric::AverageSkillLevel);
    }
    if min_weaker(higher.min_standout_skills, lower.min_standout_skills) {
        return Some(GateMetric::StandoutSkills);
    }
    if min_weaker(higher.min_unique_strengths, lower.min_unique_strengths) {
        return Some(GateMetric::UniqueStrengths);
    }
    match (lower.max_critical_gaps, higher.max_critical_gaps) {
        (Some(_), None) => Some(GateMetric::CriticalGaps),
        (Some(l), Some(h)) if h > l => Some(GateMetric::CriticalGaps),
        _ => None,
    }
}

fn metric_key(metric: GateMetric) -> &'static str {
    match metric {
        GateMetric::RequiredCoverage => "min_required_coverage",
        GateMetric::PreferredCoverage => "min_preferred_coverage",
        GateMetric::AverageSkillLevel => "min_average_level",
        GateMetric::StandoutSkills => "min_standout_skills",
        GateMetric::UniqueStrengths => "min_unique_strengths",
        GateMetric::CriticalGaps => "max_critical_gaps",
    }
}

fn gate_key(gate: GateName) -> &'static str {
    match gate {
        GateName::Foundational => "foundational",
        GateName::Competitive => "competitive",
        GateName::Excellence => "excellence",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Verdicts
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmetThreshold {
    pub metric: GateMetric,
    pub required: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateVerdict {
    pub gate: GateName,
    pub passed: bool,
    pub unmet: Vec<UnmetThreshold>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateReport {
    pub foundational: GateVerdict,
    pub competitive: GateVerdict,
    pub excellence: GateVerdict,
}

impl GateReport {
    /// Highest gate passed, if any.
    pub fn readiness(&self) -> Option<GateName> {
        [&self.excellence, &self.competitive, &self.foundational]
            .into_iter()
            .find(|v| v.passed)
            .map(|v| v.gate)
    }
}

/// Evaluates all three gates. No short-circuiting.
pub fn evaluate_gates(result: &MatchResult, gaps: &[Gap], gates: &GateSet) -> GateReport {
    let critical_gaps = gaps
        .iter()
        .filter(|g| g.category == GapCategory::Critical)
        .count();

    let verdict = |gate: GateName| check_gate(gate, gates.get(gate), result, critical_gaps);

    GateReport {
        foundational: verdict(GateName::Foundational),
        competitive: verdict(GateName::Competitive),
        excellence: verdict(GateName::Excellence),
    }
}

fn check_gate(
    gate: GateName,
    t: &GateThresholds,
    result: &MatchResult,
    critical_gaps: usize,
) -> GateVerdict {
    let mut unmet = Vec::new();

    let mut at_least = |metric: GateMetric, required: Option<f64>, actual: f64| {
        if let Some(required) = required {
            if actual + TOLERANCE < required {
                unmet.push(UnmetThreshold {
                    metric,
                    required,
                    actual,
                });
            }
        }
    };

    at_least(
        GateMetric::RequiredCoverage,
        Some(t.min_required_coverage),
        result.required_coverage,
    );
    at_least(
        GateMetric::PreferredCoverage,
        t.min_preferred_coverage,
        result.preferred_coverage,
    );
    at_least(
        GateMetric::AverageSkillLevel,
        Some(t.min_average_level),
        result.average_skill_level,
    );
    at_least(
        GateMetric::StandoutSkills,
        t.min_standout_skills.map(|n| n as f64),
        result.standout_skill_count() as f64,
    );
    at_least(
        GateMetric::UniqueStrengths,
        t.min_unique_strengths.map(|n| n as f64),
        result.unique_strength_count() as f64,
    );

    if let Some(max) = t.max_critical_gaps {
        if critical_gaps > max {
            unmet.push(UnmetThreshold {
                metric: GateMetric::CriticalGaps,
                required: max as f64,
                actual: critical_gaps as f64,
            });
        }
    }

    GateVerdict {
        gate,
        passed: unmet.is_empty(),
        unmet,
    }
}

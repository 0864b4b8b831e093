use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Highest proficiency level (expert). Level 0 means the skill is absent.
pub const MAX_LEVEL: u8 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillSource {
    #[default]
    Cv,
    Job,
}

/// A single skill in a candidate inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// 0 = none, 5 = expert
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_years: Option<f64>,
    #[serde(default)]
    pub source: SkillSource,
}

impl Skill {
    pub fn new(name: &str, level: u8) -> Self {
        Self {
            name: name.to_string(),
            level,
            evidence_years: None,
            source: SkillSource::Cv,
        }
    }

    pub fn validate(&self, field: &str) -> Result<(), EngineError> {
        if self.name.trim().is_empty() {
            return Err(EngineError::validation(
                format!("{field}.name"),
                "skill name cannot be empty",
            ));
        }
        if self.level > MAX_LEVEL {
            return Err(EngineError::validation(
                format!("{field}.level"),
                format!("level must be within 0-{MAX_LEVEL}, got {}", self.level),
            ));
        }
        if let Some(years) = self.evidence_years {
            if !years.is_finite() || years < 0.0 {
                return Err(EngineError::validation(
                    format!("{field}.evidence_years"),
                    format!("evidence_years must be a non-negative number, got {years}"),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Required,
    Preferred,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Required => "required",
            Tier::Preferred => "preferred",
        }
    }
}

/// Per-tier weights. Required must always outweigh preferred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierWeights {
    pub required: f64,
    pub preferred: f64,
}

impl Default for TierWeights {
    fn default() -> Self {
        Self {
            required: 1.0,
            preferred: 0.6,
        }
    }
}

impl TierWeights {
    pub fn for_tier(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Required => self.required,
            Tier::Preferred => self.preferred,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let in_range = |w: f64| w.is_finite() && w > 0.0 && w <= 1.0;
        if !in_range(self.required) || !in_range(self.preferred) {
            return Err(EngineError::validation(
                "tier_weights",
                "tier weights must be within (0, 1]",
            ));
        }
        if self.required <= self.preferred {
            return Err(EngineError::validation(
                "tier_weights",
                format!(
                    "required weight ({}) must exceed preferred weight ({})",
                    self.required, self.preferred
                ),
            ));
        }
        Ok(())
    }
}

/// Which category score a requirement feeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    #[default]
    Technical,
    Soft,
}

/// A skill the target role asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub skill_name: String,
    /// 1-5
    pub min_level: u8,
    pub tier: Tier,
    #[serde(default)]
    pub kind: RequirementKind,
}

impl Requirement {
    pub fn new(skill_name: &str, min_level: u8, tier: Tier) -> Self {
        Self {
            skill_name: skill_name.to_string(),
            min_level,
            tier,
            kind: RequirementKind::Technical,
        }
    }

    pub fn weight(&self, tier_weights: &TierWeights) -> f64 {
        tier_weights.for_tier(self.tier)
    }

    pub fn validate(&self, field: &str) -> Result<(), EngineError> {
        if self.skill_name.trim().is_empty() {
            return Err(EngineError::validation(
                format!("{field}.skill_name"),
                "requirement name cannot be empty",
            ));
        }
        if !(1..=MAX_LEVEL).contains(&self.min_level) {
            return Err(EngineError::validation(
                format!("{field}.min_level"),
                format!("min_level must be within 1-{MAX_LEVEL}, got {}", self.min_level),
            ));
        }
        Ok(())
    }
}

/// Structured candidate input: skill inventory plus already-normalized 0-100
/// attribute scores produced upstream. Missing attributes score a neutral 50.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub skills: Vec<Skill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_fit: Option<f64>,
}

impl CandidateProfile {
    pub fn from_skills(skills: Vec<Skill>) -> Self {
        Self {
            skills,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (i, skill) in self.skills.iter().enumerate() {
            skill.validate(&format!("skills[{i}]"))?;
        }
        let attributes = [
            ("experience", self.experience),
            ("education", self.education),
            ("soft", self.soft),
            ("cultural_fit", self.cultural_fit),
        ];
        for (field, value) in attributes {
            if let Some(v) = value {
                if !v.is_finite() || !(0.0..=100.0).contains(&v) {
                    return Err(EngineError::validation(
                        field,
                        format!("attribute score must be within 0-100, got {v}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Structured job input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub requirements: Vec<Requirement>,
}

impl JobProfile {
    pub fn validate(&self) -> Result<(), EngineError> {
        validate_requirements(&self.requirements)
    }
}

pub fn validate_requirements(requirements: &[Requirement]) -> Result<(), EngineError> {
    for (i, requirement) in requirements.iter().enumerate() {
        requirement.validate(&format!("requirements[{i}]"))?;
    }
    Ok(())
}

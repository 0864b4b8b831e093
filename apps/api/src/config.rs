use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::matching::gates::{GateName, GateSet, GateThresholdOverride};
use crate::matching::matcher::ScoreWeights;
use crate::matching::synonyms::SynonymMap;
use crate::models::skill::TierWeights;
use crate::planning::plan::{DEFAULT_HOURS_PER_WEEK, DEFAULT_SPRINT_WEEKS};

/// Application configuration loaded from environment variables.
/// Fails at startup if the engine configuration is unreadable or inconsistent.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let mut engine = match std::env::var("UPSKILL_CONFIG") {
            Ok(path) => EngineConfig::from_file(&path)?,
            Err(_) => EngineConfig::default(),
        };
        engine.apply_env(|key| std::env::var(key).ok())?;
        engine.validate()?;

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            engine,
        })
    }
}

/// Tunables for matching, gates and planning. Every field has a default, so an
/// empty JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub hours_per_week: f64,
    pub sprint_weeks: u32,
    pub gate_thresholds: BTreeMap<GateName, GateThresholdOverride>,
    /// canonical name → aliases; merged over the built-in table
    pub skill_synonyms: BTreeMap<String, Vec<String>>,
    pub score_weights: ScoreWeights,
    pub tier_weights: TierWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hours_per_week: DEFAULT_HOURS_PER_WEEK,
            sprint_weeks: DEFAULT_SPRINT_WEEKS,
            gate_thresholds: BTreeMap::new(),
            skill_synonyms: BTreeMap::new(),
            score_weights: ScoreWeights::default(),
            tier_weights: TierWeights::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config '{}'", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Engine config '{}' is not valid", path.display()))
    }

    /// HOURS_PER_WEEK and SPRINT_WEEKS win over the file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("HOURS_PER_WEEK") {
            self.hours_per_week = raw
                .trim()
                .parse::<f64>()
                .context("HOURS_PER_WEEK must be a number")?;
        }
        if let Some(raw) = lookup("SPRINT_WEEKS") {
            self.sprint_weeks = raw
                .trim()
                .parse::<u32>()
                .context("SPRINT_WEEKS must be a whole number of weeks")?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.hours_per_week.is_finite() || self.hours_per_week <= 0.0 {
            return Err(EngineError::validation(
                "hours_per_week",
                format!("must be a positive number, got {}", self.hours_per_week),
            ));
        }
        if self.sprint_weeks == 0 {
            return Err(EngineError::validation("sprint_weeks", "must be at least 1"));
        }
        self.score_weights.validate()?;
        self.tier_weights.validate()?;
        self.gate_set().validate()
    }

    pub fn gate_set(&self) -> GateSet {
        GateSet::with_overrides(&self.gate_thresholds)
    }

    pub fn synonym_map(&self) -> SynonymMap {
        SynonymMap::from_config(&self.skill_synonyms)
    }
}

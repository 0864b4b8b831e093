use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matching::gaps::Gap;
use crate::matching::gates::GateReport;
use crate::matching::matcher::MatchResult;
use crate::models::skill::{CandidateProfile, Requirement};
use crate::planning::plan::Plan;

pub const SCHEMA_VERSION: u32 = 1;
/// A sprint auto-completes once this many days have been logged.
pub const SPRINT_DAYS: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintStatus {
    Active,
    Completed,
}

/// One logged study day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedDay {
    pub hours: f64,
    pub concepts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Evidence that a sprint was finished early by delivering a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub project_url: String,
    #[serde(default)]
    pub test_scores: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    /// 1-based, sequential
    pub id: u32,
    pub status: SprintStatus,
    /// index into the plan the sprint was started from (0-based)
    pub template_index: usize,
    pub started_at: DateTime<Utc>,
    pub target_skills: Vec<Gap>,
    pub logged_days: Vec<LoggedDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<Completion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Sprint {
    pub fn is_active(&self) -> bool {
        self.status == SprintStatus::Active
    }

    pub fn hours_logged(&self) -> f64 {
        self.logged_days.iter().map(|d| d.hours).sum()
    }

    pub fn days_remaining(&self) -> usize {
        SPRINT_DAYS.saturating_sub(self.logged_days.len())
    }
}

/// Job requirements as they were last analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub requirements: Vec<Requirement>,
    pub analyzed_at: DateTime<Utc>,
}

/// Process-wide persisted aggregate. Loaded, transformed by exactly one operation,
/// and handed back whole on every invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cv: CandidateProfile,
    /// one entry per job title, most recently analyzed last
    pub jobs: Vec<JobSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_result: Option<MatchResult>,
    pub gaps: Vec<Gap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gates: Option<GateReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    /// next unconsumed sprint template in `plan`
    pub plan_cursor: usize,
    /// append-only
    pub sprints: Vec<Sprint>,
    pub current_sprint_id: Option<u32>,
}

impl WorkflowState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created_at: now,
            updated_at: now,
            cv: CandidateProfile::default(),
            jobs: vec![],
            match_result: None,
            gaps: vec![],
            gates: None,
            plan: None,
            plan_cursor: 0,
            sprints: vec![],
            current_sprint_id: None,
        }
    }

    pub fn active_sprint(&self) -> Option<&Sprint> {
        let id = self.current_sprint_id?;
        self.sprints.iter().find(|s| s.id == id && s.is_active())
    }

    pub fn active_sprint_mut(&mut self) -> Option<&mut Sprint> {
        let id = self.current_sprint_id?;
        self.sprints.iter_mut().find(|s| s.id == id && s.is_active())
    }

    pub fn latest_job(&self) -> Option<&JobSnapshot> {
        self.jobs.last()
    }

    /// Sprint templates in the current plan that have not been started yet.
    pub fn remaining_templates(&self) -> usize {
        self.plan
            .as_ref()
            .map(|p| p.sprints.len().saturating_sub(self.plan_cursor))
            .unwrap_or(0)
    }

    pub fn next_sprint_id(&self) -> u32 {
        self.sprints.len() as u32 + 1
    }
}

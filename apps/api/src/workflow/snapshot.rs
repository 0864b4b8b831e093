//! Snapshot load/save for `WorkflowState`.
//!
//! Loading never repairs anything: a snapshot that fails to deserialize or breaks an
//! invariant is reported as `DataIntegrity` with the exact problem, and the caller
//! gets nothing to work with. Saving is deterministic; every map in the state is
//! ordered and nothing is regenerated on read, so load → save reproduces the input
//! byte for byte.

use std::collections::HashSet;

use serde_json::Value;

use crate::errors::EngineError;
use crate::models::workflow::{SprintStatus, WorkflowState, SCHEMA_VERSION, SPRINT_DAYS};

pub fn from_json(raw: &str) -> Result<WorkflowState, EngineError> {
    let state: WorkflowState = serde_json::from_str(raw)
        .map_err(|e| EngineError::integrity(format!("snapshot does not deserialize: {e}")))?;
    check_integrity(&state)?;
    Ok(state)
}

pub fn from_value(value: Value) -> Result<WorkflowState, EngineError> {
    let state: WorkflowState = serde_json::from_value(value)
        .map_err(|e| EngineError::integrity(format!("snapshot does not deserialize: {e}")))?;
    check_integrity(&state)?;
    Ok(state)
}

/// Pretty-printed JSON, stable field order.
pub fn to_json(state: &WorkflowState) -> Result<String, EngineError> {
    serde_json::to_string_pretty(state)
        .map_err(|e| EngineError::integrity(format!("snapshot does not serialize: {e}")))
}

/// Verifies every persisted invariant of the aggregate.
pub fn check_integrity(state: &WorkflowState) -> Result<(), EngineError> {
    if state.schema_version != SCHEMA_VERSION {
        return Err(EngineError::integrity(format!(
            "unsupported schema_version {} (expected {SCHEMA_VERSION})",
            state.schema_version
        )));
    }

    for (i, sprint) in state.sprints.iter().enumerate() {
        let expected_id = i as u32 + 1;
        if sprint.id != expected_id {
            return Err(EngineError::integrity(format!(
                "sprints[{i}] has id {} but ids must be sequential from 1 (expected {expected_id})",
                sprint.id
            )));
        }
        if sprint.logged_days.len() > SPRINT_DAYS {
            return Err(EngineError::integrity(format!(
                "sprint {} has {} logged days (max {SPRINT_DAYS})",
                sprint.id,
                sprint.logged_days.len()
            )));
        }
        if let Some(day) = sprint
            .logged_days
            .iter()
            .position(|d| !d.hours.is_finite() || d.hours < 0.0)
        {
            return Err(EngineError::integrity(format!(
                "sprint {} logged_days[{day}] has invalid hours",
                sprint.id
            )));
        }
        match sprint.status {
            SprintStatus::Active => {
                if sprint.completion.is_some() || sprint.completed_at.is_some() {
                    return Err(EngineError::integrity(format!(
                        "sprint {} is active but carries completion data",
                        sprint.id
                    )));
                }
                if sprint.logged_days.len() == SPRINT_DAYS {
                    return Err(EngineError::integrity(format!(
                        "sprint {} is active with {SPRINT_DAYS} logged days",
                        sprint.id
                    )));
                }
            }
            SprintStatus::Completed => {
                let by_duration = sprint.logged_days.len() == SPRINT_DAYS;
                if !by_duration && sprint.completion.is_none() {
                    return Err(EngineError::integrity(format!(
                        "sprint {} is completed with {} logged days and no completion",
                        sprint.id,
                        sprint.logged_days.len()
                    )));
                }
                if sprint.completed_at.is_none() {
                    return Err(EngineError::integrity(format!(
                        "sprint {} is completed but has no completed_at",
                        sprint.id
                    )));
                }
            }
        }
    }

    let active: Vec<u32> = state
        .sprints
        .iter()
        .filter(|s| s.is_active())
        .map(|s| s.id)
        .collect();
    if active.len() > 1 {
        return Err(EngineError::integrity(format!(
            "{} sprints are marked active ({active:?}); at most one is allowed",
            active.len()
        )));
    }
    if state.current_sprint_id != active.first().copied() {
        return Err(EngineError::integrity(format!(
            "current_sprint_id is {:?} but the active sprint is {:?}",
            state.current_sprint_id,
            active.first()
        )));
    }

    let templates = state.plan.as_ref().map(|p| p.sprints.len()).unwrap_or(0);
    if state.plan_cursor > templates {
        return Err(EngineError::integrity(format!(
            "plan_cursor {} points past the {templates} planned sprints",
            state.plan_cursor
        )));
    }

    let mut titles = HashSet::new();
    for job in &state.jobs {
        let key = job.title.as_deref().unwrap_or("").to_lowercase();
        if !titles.insert(key) {
            return Err(EngineError::integrity(format!(
                "job snapshot {:?} appears more than once",
                job.title
            )));
        }
    }

    Ok(())
}

//! Learning plan: packs the gap backlog into fixed-length sprints.
//!
//! Pure planning step. It never creates or mutates sprint state; it only produces
//! the templates `planning::lifecycle::start_sprint` consumes.

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::matching::gaps::{sort_backlog, Gap};

pub const DEFAULT_HOURS_PER_WEEK: f64 = 12.0;
pub const DEFAULT_SPRINT_WEEKS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintTemplate {
    /// 1-based position in the plan
    pub index: usize,
    /// priority order preserved
    pub target_skills: Vec<Gap>,
    pub estimated_hours: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub hours_per_week: f64,
    pub sprint_weeks: u32,
    /// hours_per_week × sprint_weeks
    pub budget_hours: f64,
    pub total_hours: u64,
    pub sprints: Vec<SprintTemplate>,
}

/// Greedy packing in priority order.
///
/// A sprint keeps taking gaps until the next one would push it over budget, then a
/// new sprint starts. A gap that alone exceeds the budget sits in a sprint of its
/// own; gaps are never split.
pub fn generate_plan(
    gaps: &[Gap],
    hours_per_week: f64,
    sprint_weeks: u32,
) -> Result<Plan, EngineError> {
    if !hours_per_week.is_finite() || hours_per_week <= 0.0 {
        return Err(EngineError::validation(
            "hours_per_week",
            format!("must be a positive number, got {hours_per_week}"),
        ));
    }
    if sprint_weeks == 0 {
        return Err(EngineError::validation(
            "sprint_weeks",
            "must be at least 1",
        ));
    }

    for (i, gap) in gaps.iter().enumerate() {
        gap.validate(&format!("gaps[{i}]"))?;
    }

    let budget_hours = hours_per_week * f64::from(sprint_weeks);

    let mut backlog = gaps.to_vec();
    sort_backlog(&mut backlog);

    let mut buckets: Vec<Vec<Gap>> = Vec::new();
    let mut current: Vec<Gap> = Vec::new();
    let mut current_hours = 0u64;

    for gap in backlog {
        let hours = u64::from(gap.estimated_hours);
        if !current.is_empty() && (current_hours + hours) as f64 > budget_hours {
            buckets.push(std::mem::take(&mut current));
            current_hours = 0;
        }
        current_hours += hours;
        current.push(gap);
        // An oversized gap never shares its sprint.
        if hours as f64 > budget_hours {
            buckets.push(std::mem::take(&mut current));
            current_hours = 0;
        }
    }
    if !current.is_empty() {
        buckets.push(current);
    }

    let sprints: Vec<SprintTemplate> = buckets
        .into_iter()
        .enumerate()
        .map(|(i, target_skills)| SprintTemplate {
            index: i + 1,
            estimated_hours: target_skills
                .iter()
                .map(|g| u64::from(g.estimated_hours))
                .sum(),
            target_skills,
        })
        .collect();

    Ok(Plan {
        hours_per_week,
        sprint_weeks,
        budget_hours,
        total_hours: sprints.iter().map(|s| s.estimated_hours).sum(),
        sprints,
    })
}

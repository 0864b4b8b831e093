//! Sprint lifecycle: the state machine that tracks learning progress across
//! independent, non-interactive invocations.
//!
//! # Phases
//! - `NoActiveSprint`: nothing running; `start_sprint` is the only valid move
//! - `Active`: one sprint running; `log_daily` and `end_sprint` are valid
//!
//! A sprint's `completed` status is terminal for that sprint; the workflow returns to
//! `NoActiveSprint` and the next sprint can start.
//!
//! Every transition reads the state it is given, validates, and returns a fresh state
//! plus the events that fired. On error the caller's state is untouched.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::EngineError;
use crate::models::workflow::{
    Completion, LoggedDay, Sprint, SprintStatus, WorkflowState, SPRINT_DAYS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SprintPhase {
    NoActiveSprint,
    Active { sprint_id: u32 },
}

impl SprintPhase {
    pub fn of(state: &WorkflowState) -> Self {
        match state.active_sprint() {
            Some(sprint) => SprintPhase::Active {
                sprint_id: sprint.id,
            },
            None => SprintPhase::NoActiveSprint,
        }
    }

    fn describe(&self) -> String {
        match self {
            SprintPhase::NoActiveSprint => "no active sprint".to_string(),
            SprintPhase::Active { sprint_id } => format!("sprint {sprint_id} active"),
        }
    }
}

/// Which transition fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SprintEvent {
    Started { sprint_id: u32, template_index: usize },
    Logged { sprint_id: u32, day: usize },
    Completed { sprint_id: u32 },
    AutoCompletedByDuration { sprint_id: u32 },
}

/// Result of a transition: the new state and the events in the order they fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: WorkflowState,
    pub events: Vec<SprintEvent>,
}

impl Transition {
    pub fn phase(&self) -> SprintPhase {
        SprintPhase::of(&self.state)
    }

    pub fn last_event(&self) -> Option<&SprintEvent> {
        self.events.last()
    }
}

/// A daily log submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub hours: f64,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// defaults to the invocation time
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl DailyEntry {
    fn validate(&self) -> Result<(), EngineError> {
        if !self.hours.is_finite() || self.hours < 0.0 {
            return Err(EngineError::validation(
                "entry.hours",
                format!("hours must be a non-negative number, got {}", self.hours),
            ));
        }
        Ok(())
    }
}

fn validate_completion(completion: &Completion) -> Result<(), EngineError> {
    if completion.project_url.trim().is_empty() {
        return Err(EngineError::validation(
            "completion.project_url",
            "a project URL is required to end a sprint early",
        ));
    }
    if let Some((name, score)) = completion
        .test_scores
        .iter()
        .find(|(_, score)| !score.is_finite())
    {
        return Err(EngineError::validation(
            format!("completion.test_scores.{name}"),
            format!("score must be a finite number, got {score}"),
        ));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Transitions
// ────────────────────────────────────────────────────────────────────────────

/// NoActiveSprint → Active. Consumes the next plan template.
pub fn start_sprint(state: &WorkflowState, now: DateTime<Utc>) -> Result<Transition, EngineError> {
    let phase = SprintPhase::of(state);
    if phase != SprintPhase::NoActiveSprint {
        return Err(EngineError::invalid_state(
            "start_sprint",
            "no active sprint",
            phase.describe(),
        ));
    }

    let plan = state.plan.as_ref().ok_or_else(|| {
        EngineError::invalid_state(
            "start_sprint",
            "a learning plan with unstarted sprints",
            "no plan has been generated",
        )
    })?;
    let template = plan.sprints.get(state.plan_cursor).ok_or_else(|| {
        EngineError::invalid_state(
            "start_sprint",
            "a learning plan with unstarted sprints",
            format!("all {} planned sprints already started", plan.sprints.len()),
        )
    })?;

    let mut next = state.clone();
    let sprint_id = next.next_sprint_id();
    let template_index = next.plan_cursor;

    next.sprints.push(Sprint {
        id: sprint_id,
        status: SprintStatus::Active,
        template_index,
        started_at: now,
        target_skills: template.target_skills.clone(),
        logged_days: vec![],
        completion: None,
        completed_at: None,
    });
    next.plan_cursor += 1;
    next.current_sprint_id = Some(sprint_id);
    next.updated_at = now;

    info!(
        "Started sprint {sprint_id} from template {} ({} skills, {}h)",
        template.index,
        template.target_skills.len(),
        template.estimated_hours
    );

    Ok(Transition {
        state: next,
        events: vec![SprintEvent::Started {
            sprint_id,
            template_index,
        }],
    })
}

/// Active → Active, or Active → NoActiveSprint on the 14th entry.
pub fn log_daily(
    state: &WorkflowState,
    entry: DailyEntry,
    now: DateTime<Utc>,
) -> Result<Transition, EngineError> {
    let phase = SprintPhase::of(state);
    let SprintPhase::Active { sprint_id } = phase else {
        return Err(EngineError::invalid_state(
            "log_daily",
            "an active sprint",
            phase.describe(),
        ));
    };
    entry.validate()?;

    let mut next = state.clone();
    let sprint = next
        .active_sprint_mut()
        .ok_or_else(|| EngineError::integrity(format!("active sprint {sprint_id} vanished")))?;

    sprint.logged_days.push(LoggedDay {
        hours: entry.hours,
        concepts: entry.concepts,
        notes: entry.notes,
        timestamp: entry.timestamp.unwrap_or(now),
    });
    let day = sprint.logged_days.len();
    let mut events = vec![SprintEvent::Logged { sprint_id, day }];
    debug!("Logged day {day}/{SPRINT_DAYS} for sprint {sprint_id}");

    if day >= SPRINT_DAYS {
        sprint.status = SprintStatus::Completed;
        sprint.completed_at = Some(now);
        next.current_sprint_id = None;
        events.push(SprintEvent::AutoCompletedByDuration { sprint_id });
        info!("Sprint {sprint_id} auto-completed after {SPRINT_DAYS} logged days");
    }
    next.updated_at = now;

    Ok(Transition {
        state: next,
        events,
    })
}

/// Active → NoActiveSprint, regardless of days logged.
pub fn end_sprint(
    state: &WorkflowState,
    completion: Completion,
    now: DateTime<Utc>,
) -> Result<Transition, EngineError> {
    let phase = SprintPhase::of(state);
    let SprintPhase::Active { sprint_id } = phase else {
        return Err(EngineError::invalid_state(
            "end_sprint",
            "an active sprint",
            phase.describe(),
        ));
    };
    validate_completion(&completion)?;

    let mut next = state.clone();
    let sprint = next
        .active_sprint_mut()
        .ok_or_else(|| EngineError::integrity(format!("active sprint {sprint_id} vanished")))?;

    info!(
        "Sprint {sprint_id} completed after {} logged days ({})",
        sprint.logged_days.len(),
        completion.project_url
    );
    sprint.status = SprintStatus::Completed;
    sprint.completion = Some(completion);
    sprint.completed_at = Some(now);
    next.current_sprint_id = None;
    next.updated_at = now;

    Ok(Transition {
        state: next,
        events: vec![SprintEvent::Completed { sprint_id }],
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Auto cycle
// ────────────────────────────────────────────────────────────────────────────

/// Input for `auto_cycle`. Its shape decides the transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleInput {
    #[serde(default)]
    pub hours: Option<f64>,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub project_url: Option<String>,
    #[serde(default)]
    pub test_scores: BTreeMap<String, f64>,
}

impl CycleInput {
    pub fn log(entry: DailyEntry) -> Self {
        Self {
            hours: Some(entry.hours),
            concepts: entry.concepts,
            notes: entry.notes,
            timestamp: entry.timestamp,
            ..Default::default()
        }
    }

    pub fn complete(completion: Completion) -> Self {
        Self {
            project_url: Some(completion.project_url),
            test_scores: completion.test_scores,
            ..Default::default()
        }
    }

    fn shape(&self) -> InputShape {
        if self
            .project_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
        {
            InputShape::Completion
        } else if self.hours.is_some() {
            InputShape::DailyEntry
        } else {
            InputShape::Empty
        }
    }

    fn into_entry(self) -> Result<DailyEntry, EngineError> {
        let hours = self.hours.ok_or_else(|| {
            EngineError::validation(
                "entry.hours",
                "an active sprint needs either a daily entry or a project_url",
            )
        })?;
        Ok(DailyEntry {
            hours,
            concepts: self.concepts,
            notes: self.notes,
            timestamp: self.timestamp,
        })
    }

    fn into_completion(self) -> Completion {
        Completion {
            project_url: self.project_url.unwrap_or_default(),
            test_scores: self.test_scores,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseKind {
    NoActiveSprint,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputShape {
    Empty,
    DailyEntry,
    Completion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleAction {
    Start,
    Log,
    EndThenStart,
}

/// Current phase × input shape → action. `None` matches any shape; first rule wins.
const CYCLE_RULES: &[(PhaseKind, Option<InputShape>, CycleAction)] = &[
    (PhaseKind::NoActiveSprint, None, CycleAction::Start),
    (
        PhaseKind::Active,
        Some(InputShape::Completion),
        CycleAction::EndThenStart,
    ),
    (PhaseKind::Active, Some(InputShape::DailyEntry), CycleAction::Log),
    // An empty input falls through to logging, which rejects the missing hours.
    (PhaseKind::Active, Some(InputShape::Empty), CycleAction::Log),
];

fn resolve_action(phase: PhaseKind, shape: InputShape) -> CycleAction {
    CYCLE_RULES
        .iter()
        .find(|(p, s, _)| {
            *p == phase
                && match s {
                    Some(s) => *s == shape,
                    None => true,
                }
        })
        .map(|(_, _, action)| *action)
        .unwrap_or(CycleAction::Log)
}

/// Infers the next transition from the persisted phase and the input's shape alone.
pub fn auto_cycle(
    state: &WorkflowState,
    input: CycleInput,
    now: DateTime<Utc>,
) -> Result<Transition, EngineError> {
    let phase = match SprintPhase::of(state) {
        SprintPhase::NoActiveSprint => PhaseKind::NoActiveSprint,
        SprintPhase::Active { .. } => PhaseKind::Active,
    };
    let shape = input.shape();
    let action = resolve_action(phase, shape);
    debug!("auto_cycle: {phase:?} × {shape:?} → {action:?}");

    match action {
        CycleAction::Start => {
            if shape != InputShape::Empty {
                warn!("auto_cycle: no active sprint, ignoring supplied {shape:?} input");
            }
            start_sprint(state, now)
        }
        CycleAction::Log => log_daily(state, input.into_entry()?, now),
        CycleAction::EndThenStart => {
            let ended = end_sprint(state, input.into_completion(), now)?;
            if ended.state.remaining_templates() == 0 {
                info!("auto_cycle: plan exhausted, no further sprint to start");
                return Ok(ended);
            }
            let started = start_sprint(&ended.state, now)?;
            let mut events = ended.events;
            events.extend(started.events);
            Ok(Transition {
                state: started.state,
                events,
            })
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Progress report
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintProgress {
    pub phase: SprintPhase,
    pub sprints_started: usize,
    pub sprints_completed: usize,
    pub remaining_templates: usize,
    pub active: Option<ActiveSprintProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSprintProgress {
    pub sprint_id: u32,
    pub days_logged: usize,
    pub days_remaining: usize,
    pub hours_logged: f64,
    /// distinct, in first-seen order
    pub concepts: Vec<String>,
    pub target_skills: Vec<String>,
}

/// Read-only summary of where the workflow stands.
pub fn progress(state: &WorkflowState) -> SprintProgress {
    let active = state.active_sprint().map(|sprint| {
        let mut concepts: Vec<String> = Vec::new();
        for concept in sprint.logged_days.iter().flat_map(|d| &d.concepts) {
            if !concepts.iter().any(|c| c.eq_ignore_ascii_case(concept)) {
                concepts.push(concept.clone());
            }
        }
        ActiveSprintProgress {
            sprint_id: sprint.id,
            days_logged: sprint.logged_days.len(),
            days_remaining: sprint.days_remaining(),
            hours_logged: sprint.hours_logged(),
            concepts,
            target_skills: sprint
                .target_skills
                .iter()
                .map(|g| g.skill_name.clone())
                .collect(),
        }
    });

    SprintProgress {
        phase: SprintPhase::of(state),
        sprints_started: state.sprints.len(),
        sprints_completed: state
            .sprints
            .iter()
            .filter(|s| s.status == SprintStatus::Completed)
            .count(),
        remaining_templates: state.remaining_templates(),
        active,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

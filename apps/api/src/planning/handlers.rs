use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::matching::gaps::Gap;
use crate::models::workflow::{Completion, WorkflowState};
use crate::planning::lifecycle::{
    auto_cycle, end_sprint, log_daily, progress, start_sprint, CycleInput, DailyEntry,
    SprintEvent, SprintPhase, SprintProgress, Transition,
};
use crate::planning::plan::{generate_plan, Plan};
use crate::state::AppState;
use crate::workflow::snapshot;

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub gaps: Vec<Gap>,
    #[serde(default)]
    pub hours_per_week: Option<f64>,
    #[serde(default)]
    pub sprint_weeks: Option<u32>,
}

/// The prior snapshot travels as raw JSON so that a broken blob surfaces as a data
/// integrity error instead of a generic body rejection.
#[derive(Debug, Deserialize)]
pub struct StateRequest {
    pub state: Value,
}

#[derive(Debug, Deserialize)]
pub struct LogRequest {
    pub state: Value,
    pub entry: DailyEntry,
}

#[derive(Debug, Deserialize)]
pub struct EndRequest {
    pub state: Value,
    pub completion: Completion,
}

#[derive(Debug, Deserialize)]
pub struct CycleRequest {
    pub state: Value,
    #[serde(default)]
    pub input: CycleInput,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub state: WorkflowState,
    pub phase: SprintPhase,
    pub events: Vec<SprintEvent>,
}

impl From<Transition> for TransitionResponse {
    fn from(t: Transition) -> Self {
        Self {
            phase: t.phase(),
            state: t.state,
            events: t.events,
        }
    }
}

/// POST /api/v1/plan
pub async fn handle_plan(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PlanRequest>,
) -> Result<Json<Plan>, AppError> {
    let engine = &state.config.engine;
    let plan = generate_plan(
        &req.gaps,
        req.hours_per_week.unwrap_or(engine.hours_per_week),
        req.sprint_weeks.unwrap_or(engine.sprint_weeks),
    )?;
    Ok(Json(plan))
}

/// POST /api/v1/sprints/start
pub async fn handle_start(
    ApiJson(req): ApiJson<StateRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let current = snapshot::from_value(req.state)?;
    Ok(Json(start_sprint(&current, Utc::now())?.into()))
}

/// POST /api/v1/sprints/log
pub async fn handle_log(
    ApiJson(req): ApiJson<LogRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let current = snapshot::from_value(req.state)?;
    Ok(Json(log_daily(&current, req.entry, Utc::now())?.into()))
}

/// POST /api/v1/sprints/end
pub async fn handle_end(
    ApiJson(req): ApiJson<EndRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let current = snapshot::from_value(req.state)?;
    Ok(Json(end_sprint(&current, req.completion, Utc::now())?.into()))
}

/// POST /api/v1/sprints/cycle
pub async fn handle_cycle(
    ApiJson(req): ApiJson<CycleRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    let current = snapshot::from_value(req.state)?;
    Ok(Json(auto_cycle(&current, req.input, Utc::now())?.into()))
}

/// POST /api/v1/sprints/status
pub async fn handle_status(
    ApiJson(req): ApiJson<StateRequest>,
) -> Result<Json<SprintProgress>, AppError> {
    let current = snapshot::from_value(req.state)?;
    Ok(Json(progress(&current)))
}

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::models::skill::{CandidateProfile, JobProfile};
use crate::state::AppState;
use crate::workflow::analysis::{run_analysis, AnalysisInput, AnalysisOutcome, AnalysisParams};
use crate::workflow::snapshot;

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    /// prior snapshot; absent or null on the first run
    #[serde(default)]
    pub state: Option<Value>,
    pub cv: CandidateProfile,
    pub job: JobProfile,
}

/// POST /api/v1/analysis
pub async fn handle_analysis(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AnalysisRequest>,
) -> Result<Json<AnalysisOutcome>, AppError> {
    let prior = match req.state {
        Some(Value::Null) | None => None,
        Some(value) => Some(snapshot::from_value(value)?),
    };

    let outcome = run_analysis(
        prior,
        AnalysisInput {
            cv: req.cv,
            job: req.job,
        },
        AnalysisParams {
            matcher: state.matcher.as_ref(),
            synonyms: &state.synonyms,
            config: &state.config.engine,
            gates: &state.gates,
        },
        Utc::now(),
    )?;
    Ok(Json(outcome))
}

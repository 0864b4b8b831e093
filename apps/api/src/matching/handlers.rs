use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extract::ApiJson;
use crate::matching::gaps::Gap;
use crate::matching::gates::{GateName, GateReport};
use crate::matching::matcher::MatchResult;
use crate::models::skill::{CandidateProfile, JobProfile};
use crate::state::AppState;
use crate::workflow::analysis::{assess, AnalysisParams};

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub cv: CandidateProfile,
    pub job: JobProfile,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub match_result: MatchResult,
    pub gaps: Vec<Gap>,
    pub gates: GateReport,
    pub readiness: Option<GateName>,
}

/// POST /api/v1/match
/// Stateless scoring: no workflow state in, none out.
pub async fn handle_match(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    req.cv.validate()?;
    req.job.validate()?;

    let cv = state.synonyms.normalize_profile(&req.cv);
    let job = JobProfile {
        title: req.job.title,
        requirements: state.synonyms.normalize_requirements(&req.job.requirements),
    };

    let params = AnalysisParams {
        matcher: state.matcher.as_ref(),
        synonyms: &state.synonyms,
        config: &state.config.engine,
        gates: &state.gates,
    };
    let (match_result, gaps, gates) = assess(&cv, &job, &params)?;

    Ok(Json(MatchResponse {
        readiness: gates.readiness(),
        match_result,
        gaps,
        gates,
    }))
}

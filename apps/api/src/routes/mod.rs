pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers as matching;
use crate::planning::handlers as planning;
use crate::state::AppState;
use crate::workflow::handlers as workflow;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Stateless scoring
        .route("/api/v1/match", post(matching::handle_match))
        .route("/api/v1/plan", post(planning::handle_plan))
        // Workflow state in, workflow state out
        .route("/api/v1/analysis", post(workflow::handle_analysis))
        .route("/api/v1/sprints/start", post(planning::handle_start))
        .route("/api/v1/sprints/log", post(planning::handle_log))
        .route("/api/v1/sprints/end", post(planning::handle_end))
        .route("/api/v1/sprints/cycle", post(planning::handle_cycle))
        .route("/api/v1/sprints/status", post(planning::handle_status))
        .with_state(state)
}

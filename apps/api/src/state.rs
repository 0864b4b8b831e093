use std::sync::Arc;

use crate::config::Config;
use crate::matching::gates::GateSet;
use crate::matching::matcher::SkillMatcher;
use crate::matching::synonyms::SynonymMap;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Built once from config; names are canonicalized at ingestion.
    pub synonyms: Arc<SynonymMap>,
    pub gates: Arc<GateSet>,
    /// Pluggable matcher. Default: WeightedSkillMatcher.
    pub matcher: Arc<dyn SkillMatcher>,
}

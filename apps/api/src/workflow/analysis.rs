//! Analysis pass: CV + job in, refreshed workflow state out.
//!
//! Pipeline: validate → canonicalize names → match → gaps → gates → plan → fold into
//! the state. The first analysis creates the state; later ones update it in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::matching::gaps::{analyze_gaps, Gap};
use crate::matching::gates::{evaluate_gates, GateReport, GateSet};
use crate::matching::matcher::{MatchResult, SkillMatcher};
use crate::matching::synonyms::SynonymMap;
use crate::models::skill::{CandidateProfile, JobProfile};
use crate::models::workflow::{JobSnapshot, WorkflowState};
use crate::planning::plan::{generate_plan, Plan};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub cv: CandidateProfile,
    pub job: JobProfile,
}

/// Collaborators for one analysis pass.
pub struct AnalysisParams<'a> {
    pub matcher: &'a dyn SkillMatcher,
    pub synonyms: &'a SynonymMap,
    pub config: &'a EngineConfig,
    pub gates: &'a GateSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub state: WorkflowState,
    pub match_result: MatchResult,
    pub gaps: Vec<Gap>,
    pub gates: GateReport,
    pub plan: Plan,
}

/// Stateless assessment: match, gaps and gate verdicts for already-canonical input.
pub fn assess(
    cv: &CandidateProfile,
    job: &JobProfile,
    params: &AnalysisParams<'_>,
) -> Result<(MatchResult, Vec<Gap>, GateReport), EngineError> {
    let match_result = params.matcher.score(cv, &job.requirements)?;
    let gaps = analyze_gaps(
        cv,
        &job.requirements,
        &match_result,
        &params.config.tier_weights,
    );
    let gates = evaluate_gates(&match_result, &gaps, params.gates);
    Ok((match_result, gaps, gates))
}

/// Runs a full analysis and folds the results into the (possibly new) state.
///
/// A fresh plan always restarts at its first template. An active sprint keeps its
/// own copy of target skills and is left running.
pub fn run_analysis(
    prior: Option<WorkflowState>,
    input: AnalysisInput,
    params: AnalysisParams<'_>,
    now: DateTime<Utc>,
) -> Result<AnalysisOutcome, EngineError> {
    input.cv.validate()?;
    input.job.validate()?;

    let cv = params.synonyms.normalize_profile(&input.cv);
    let job = JobProfile {
        title: input.job.title.clone(),
        requirements: params
            .synonyms
            .normalize_requirements(&input.job.requirements),
    };

    let (match_result, gaps, gates) = assess(&cv, &job, &params)?;
    let plan = generate_plan(
        &gaps,
        params.config.hours_per_week,
        params.config.sprint_weeks,
    )?;

    info!(
        "Analysis via {} matcher: overall {:.1}, required coverage {:.2}, {} gaps, {} planned sprints",
        params.matcher.backend(),
        match_result.overall_score,
        match_result.required_coverage,
        gaps.len(),
        plan.sprints.len()
    );

    let mut state = prior.unwrap_or_else(|| WorkflowState::new(now));
    state.cv = cv;
    upsert_job(
        &mut state.jobs,
        JobSnapshot {
            title: job.title,
            requirements: job.requirements,
            analyzed_at: now,
        },
    );
    state.match_result = Some(match_result.clone());
    state.gaps = gaps.clone();
    state.gates = Some(gates.clone());
    state.plan = Some(plan.clone());
    state.plan_cursor = 0;
    state.updated_at = now;

    Ok(AnalysisOutcome {
        state,
        match_result,
        gaps,
        gates,
        plan,
    })
}

/// Replaces the snapshot with the same title (case-insensitive) and moves it to the
/// end; otherwise appends.
fn upsert_job(jobs: &mut Vec<JobSnapshot>, snapshot: JobSnapshot) {
    let key = |title: &Option<String>| title.as_deref().unwrap_or("").to_lowercase();
    let wanted = key(&snapshot.title);
    jobs.retain(|j| key(&j.title) != wanted);
    jobs.push(snapshot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::gaps::GapCategory;
    use crate::matching::gates::GateName;
    use crate::matching::matcher::WeightedSkillMatcher;
    use crate::models::skill::{Requirement, Skill, Tier};
    use crate::planning::lifecycle::{auto_cycle, CycleInput, SprintEvent, SprintPhase};
    use crate::workflow::snapshot;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 2, 7, 0, 0).unwrap()
    }

    fn input(skills: &[(&str, u8)], reqs: Vec<Requirement>, title: &str) -> AnalysisInput {
        AnalysisInput {
            cv: CandidateProfile::from_skills(
                skills.iter().map(|(n, l)| Skill::new(n, *l)).collect(),
            ),
            job: JobProfile {
                title: Some(title.to_string()),
                requirements: reqs,
            },
        }
    }

    fn analyze(prior: Option<WorkflowState>, input: AnalysisInput) -> Result<AnalysisOutcome, EngineError> {
        let config = EngineConfig::default();
        let synonyms = SynonymMap::from_config(&config.skill_synonyms);
        let gates = config.gate_set();
        let matcher = WeightedSkillMatcher::default();
        run_analysis(
            prior,
            input,
            AnalysisParams {
                matcher: &matcher,
                synonyms: &synonyms,
                config: &config,
                gates: &gates,
            },
            now(),
        )
    }

    #[test]
    fn test_first_analysis_creates_state() {
        let reqs = vec![
            Requirement::new("Python", 5, Tier::Required),
            Requirement::new("Go", 5, Tier::Required),
        ];
        let outcome = analyze(None, input(&[("python", 5), ("golang", 3)], reqs, "Backend")).unwrap();

        assert_eq!(outcome.match_result.required_coverage, 0.5);
        assert_eq!(outcome.gaps.len(), 1);
        assert_eq!(outcome.gaps[0].skill_name, "Go");
        assert_eq!(outcome.gaps[0].category, GapCategory::Critical);
        assert_eq!(outcome.plan.sprints.len(), 1);
        assert_eq!(outcome.state.created_at, now());
        assert_eq!(outcome.state.cv.skills[1].name, "Go");
        assert_eq!(outcome.state.jobs.len(), 1);
        assert!(outcome.state.match_result.is_some());
        assert_eq!(outcome.gates.readiness(), None);
    }

    #[test]
    fn test_empty_requirements_yield_no_gaps_and_empty_plan() {
        let outcome = analyze(None, input(&[("Rust", 4)], vec![], "Anything")).unwrap();
        assert_eq!(outcome.match_result.required_coverage, 1.0);
        assert_eq!(outcome.match_result.preferred_coverage, 1.0);
        assert!(!outcome.match_result.score_defined);
        assert!(outcome.gaps.is_empty());
        assert!(outcome.plan.sprints.is_empty());
    }

    #[test]
    fn test_invalid_input_rejected_before_state_changes() {
        let prior = analyze(None, input(&[("Rust", 3)], vec![Requirement::new("Rust", 3, Tier::Required)], "A"))
            .unwrap()
            .state;
        let bad = input(&[("Rust", 8)], vec![], "A");
        let err = analyze(Some(prior.clone()), bad).unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
    }

    #[test]
    fn test_reanalysis_replaces_same_title_and_resets_cursor() {
        let reqs = vec![Requirement::new("Rust", 4, Tier::Required)];
        let first = analyze(None, input(&[("Rust", 2)], reqs.clone(), "Platform")).unwrap();
        let started = auto_cycle(&first.state, CycleInput::default(), now()).unwrap();
        assert_eq!(started.state.plan_cursor, 1);

        let second = analyze(Some(started.state), input(&[("Rust", 3)], reqs, "platform")).unwrap();
        assert_eq!(second.state.jobs.len(), 1);
        assert_eq!(
            second.state.latest_job().and_then(|j| j.title.as_deref()),
            Some("platform")
        );
        assert_eq!(second.state.plan_cursor, 0);
        // The running sprint survives re-analysis.
        assert_eq!(
            SprintPhase::of(&second.state),
            SprintPhase::Active { sprint_id: 1 }
        );
        assert_eq!(second.state.gaps[0].current_level, 3);
    }

    #[test]
    fn test_new_title_appends_job_snapshot() {
        let reqs = vec![Requirement::new("Rust", 4, Tier::Required)];
        let first = analyze(None, input(&[], reqs.clone(), "A")).unwrap();
        let second = analyze(Some(first.state), input(&[], reqs, "B")).unwrap();
        let titles: Vec<_> = second
            .state
            .jobs
            .iter()
            .map(|j| j.title.clone().unwrap())
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_strong_candidate_reaches_excellence() {
        let reqs = vec![
            Requirement::new("Rust", 3, Tier::Required),
            Requirement::new("Go", 3, Tier::Required),
            Requirement::new("Kafka", 2, Tier::Preferred),
        ];
        let outcome = analyze(None, input(&[("Rust", 5), ("Go", 4), ("Kafka", 3)], reqs, "Staff")).unwrap();
        assert_eq!(outcome.gates.readiness(), Some(GateName::Excellence));
    }

    #[test]
    fn test_full_cycle_survives_serialization_between_runs() {
        let reqs = vec![
            Requirement::new("Rust", 5, Tier::Required),
            Requirement::new("Kubernetes", 4, Tier::Required),
            Requirement::new("Kafka", 3, Tier::Preferred),
        ];
        let outcome = analyze(None, input(&[("Rust", 2), ("k8s", 1)], reqs, "SRE")).unwrap();
        assert!(outcome.plan.sprints.len() >= 2);

        // Each run: load, apply one transition, persist.
        let mut persisted = snapshot::to_json(&outcome.state).unwrap();
        let run = |persisted: &str, input: CycleInput| {
            let state = snapshot::from_json(persisted).unwrap();
            let t = auto_cycle(&state, input, now()).unwrap();
            (snapshot::to_json(&t.state).unwrap(), t.events)
        };

        let (next, events) = run(&persisted, CycleInput::default());
        assert_eq!(
            events,
            vec![SprintEvent::Started {
                sprint_id: 1,
                template_index: 0
            }]
        );
        persisted = next;

        for _ in 0..14 {
            let entry = CycleInput {
                hours: Some(1.5),
                concepts: vec!["borrowck".to_string()],
                ..Default::default()
            };
            let (next, _) = run(&persisted, entry);
            persisted = next;
        }
        let state = snapshot::from_json(&persisted).unwrap();
        assert_eq!(SprintPhase::of(&state), SprintPhase::NoActiveSprint);
        assert_eq!(state.sprints[0].logged_days.len(), 14);

        // Reload and re-save without changes: identical bytes.
        assert_eq!(snapshot::to_json(&state).unwrap(), persisted);
    }
}

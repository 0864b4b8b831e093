//! Skill name normalization.
//!
//! Every skill and requirement name is resolved to its canonical form once, at
//! ingestion. Downstream code (matcher, gap analyzer, planner) only ever compares
//! canonical names through [`fold_key`], never aliases.

use std::collections::{BTreeMap, HashMap};

use crate::models::skill::{CandidateProfile, Requirement, Skill, Tier};

/// Built-in alias table. Canonical name first, aliases after.
const DEFAULT_SYNONYMS: &[(&str, &[&str])] = &[
    ("Amazon Web Services", &["aws"]),
    ("C++", &["cpp", "c plus plus"]),
    ("C#", &["csharp", "c sharp"]),
    ("CI/CD", &["ci", "cd", "continuous integration", "continuous delivery"]),
    ("Docker", &["containers", "containerization"]),
    ("Go", &["golang"]),
    ("Google Cloud Platform", &["gcp", "google cloud"]),
    ("JavaScript", &["js", "ecmascript", "es6"]),
    ("Kubernetes", &["k8s", "kube"]),
    ("Machine Learning", &["ml"]),
    ("Microsoft Azure", &["azure"]),
    ("Node.js", &["node", "nodejs"]),
    ("PostgreSQL", &["postgres", "psql"]),
    ("Python", &["py", "python3"]),
    ("React", &["react.js", "reactjs"]),
    ("Rust", &["rustlang"]),
    ("SQL", &["structured query language"]),
    ("TypeScript", &["ts"]),
];

/// Case-insensitive comparison key: trimmed, lowercased, inner whitespace collapsed.
pub fn fold_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Mapping from canonical name to alias set, compiled into a flat lookup.
///
/// Resolution is deterministic: canonical names always resolve to themselves, and an
/// alias claimed by several canonical entries resolves to the first one registered.
#[derive(Debug, Clone, Default)]
pub struct SynonymMap {
    lookup: HashMap<String, String>,
}

impl SynonymMap {
    pub fn new<I, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, A)>,
        A: IntoIterator<Item = String>,
    {
        let entries: Vec<(String, Vec<String>)> = entries
            .into_iter()
            .map(|(canonical, aliases)| (canonical, aliases.into_iter().collect()))
            .collect();

        let mut lookup = HashMap::new();
        for (canonical, _) in &entries {
            let display = tidy(canonical);
            lookup.entry(fold_key(canonical)).or_insert(display);
        }
        for (canonical, aliases) in &entries {
            let display = tidy(canonical);
            for alias in aliases {
                lookup
                    .entry(fold_key(alias))
                    .or_insert_with(|| display.clone());
            }
        }
        Self { lookup }
    }

    /// The built-in alias table only.
    pub fn with_defaults() -> Self {
        Self::new(default_entries())
    }

    /// Configured entries take precedence over the built-in table.
    pub fn from_config(overrides: &BTreeMap<String, Vec<String>>) -> Self {
        let entries = overrides
            .iter()
            .map(|(canonical, aliases)| (canonical.clone(), aliases.clone()))
            .chain(default_entries());
        Self::new(entries)
    }

    /// Resolves a raw name to its canonical display form. Unknown names are kept
    /// as written, minus stray whitespace.
    pub fn canonical(&self, name: &str) -> String {
        self.lookup
            .get(&fold_key(name))
            .cloned()
            .unwrap_or_else(|| tidy(name))
    }

    /// Canonicalizes a skill inventory. Duplicates collapse onto the first occurrence,
    /// keeping the highest level and the longest evidence.
    pub fn normalize_skills(&self, skills: &[Skill]) -> Vec<Skill> {
        let mut merged: Vec<Skill> = Vec::with_capacity(skills.len());
        let mut positions: HashMap<String, usize> = HashMap::new();

        for skill in skills {
            let name = self.canonical(&skill.name);
            let key = fold_key(&name);
            match positions.get(&key) {
                Some(&idx) => {
                    let existing = &mut merged[idx];
                    existing.level = existing.level.max(skill.level);
                    existing.evidence_years = match (existing.evidence_years, skill.evidence_years) {
                        (Some(a), Some(b)) => Some(a.max(b)),
                        (a, b) => a.or(b),
                    };
                }
                None => {
                    positions.insert(key, merged.len());
                    merged.push(Skill {
                        name,
                        ..skill.clone()
                    });
                }
            }
        }
        merged
    }

    /// Canonicalizes a requirement list. Duplicates collapse onto the first occurrence
    /// with the strongest tier and the highest minimum level.
    pub fn normalize_requirements(&self, requirements: &[Requirement]) -> Vec<Requirement> {
        let mut merged: Vec<Requirement> = Vec::with_capacity(requirements.len());
        let mut positions: HashMap<String, usize> = HashMap::new();

        for requirement in requirements {
            let skill_name = self.canonical(&requirement.skill_name);
            let key = fold_key(&skill_name);
            match positions.get(&key) {
                Some(&idx) => {
                    let existing = &mut merged[idx];
                    existing.min_level = existing.min_level.max(requirement.min_level);
                    if requirement.tier == Tier::Required {
                        existing.tier = Tier::Required;
                    }
                }
                None => {
                    positions.insert(key, merged.len());
                    merged.push(Requirement {
                        skill_name,
                        ..requirement.clone()
                    });
                }
            }
        }
        merged
    }

    pub fn normalize_profile(&self, profile: &CandidateProfile) -> CandidateProfile {
        CandidateProfile {
            skills: self.normalize_skills(&profile.skills),
            ..profile.clone()
        }
    }
}

/// Candidate level per canonical key. Assumes names are already canonical;
/// duplicate keys keep the highest level.
pub fn level_index(skills: &[Skill]) -> HashMap<String, u8> {
    let mut index: HashMap<String, u8> = HashMap::with_capacity(skills.len());
    for skill in skills {
        let level = index.entry(fold_key(&skill.name)).or_insert(0);
        *level = (*level).max(skill.level);
    }
    index
}

fn default_entries() -> impl Iterator<Item = (String, Vec<String>)> {
    DEFAULT_SYNONYMS.iter().map(|(canonical, aliases)| {
        (
            canonical.to_string(),
            aliases.iter().map(|a| a.to_string()).collect(),
        )
    })
}

fn tidy(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_resolves_to_canonical() {
        let map = SynonymMap::with_defaults();
        assert_eq!(map.canonical("golang"), "Go");
        assert_eq!(map.canonical("K8S"), "Kubernetes");
        assert_eq!(map.canonical("  node   js "), "node js");
        assert_eq!(map.canonical("NodeJS"), "Node.js");
    }

    #[test]
    fn test_canonical_is_case_insensitive() {
        let map = SynonymMap::with_defaults();
        assert_eq!(map.canonical("postgresql"), "PostgreSQL");
        assert_eq!(map.canonical("PYTHON"), "Python");
    }

    #[test]
    fn test_unknown_name_is_kept_tidy() {
        let map = SynonymMap::with_defaults();
        assert_eq!(map.canonical("  Apache   Kafka "), "Apache Kafka");
    }

    #[test]
    fn test_first_canonical_entry_wins_for_shared_alias() {
        let map = SynonymMap::new(vec![
            ("Amazon Web Services".to_string(), vec!["cloud".to_string()]),
            ("Google Cloud Platform".to_string(), vec!["cloud".to_string()]),
        ]);
        assert_eq!(map.canonical("cloud"), "Amazon Web Services");
    }

    #[test]
    fn test_canonical_name_beats_alias_of_other_entry() {
        let map = SynonymMap::new(vec![
            ("Scripting".to_string(), vec!["python".to_string()]),
            ("Python".to_string(), vec![]),
        ]);
        assert_eq!(map.canonical("python"), "Python");
    }

    #[test]
    fn test_configured_entries_take_precedence() {
        let overrides = BTreeMap::from([("Golang Services".to_string(), vec!["golang".to_string()])]);
        let map = SynonymMap::from_config(&overrides);
        assert_eq!(map.canonical("golang"), "Golang Services");
        // Built-ins still resolve.
        assert_eq!(map.canonical("k8s"), "Kubernetes");
    }

    #[test]
    fn test_duplicate_skills_merge_to_highest_level() {
        let map = SynonymMap::with_defaults();
        let skills = vec![Skill::new("golang", 2), Skill::new("Rust", 4), Skill::new("Go", 3)];
        let normalized = map.normalize_skills(&skills);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].name, "Go");
        assert_eq!(normalized[0].level, 3);
        assert_eq!(normalized[1].name, "Rust");
    }

    #[test]
    fn test_duplicate_requirements_merge_to_strongest() {
        let map = SynonymMap::with_defaults();
        let reqs = vec![
            Requirement::new("k8s", 2, Tier::Preferred),
            Requirement::new("Kubernetes", 4, Tier::Required),
        ];
        let normalized = map.normalize_requirements(&reqs);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].skill_name, "Kubernetes");
        assert_eq!(normalized[0].min_level, 4);
        assert_eq!(normalized[0].tier, Tier::Required);
    }

    #[test]
    fn test_level_index_is_case_insensitive() {
        let index = level_index(&[Skill::new("Go", 3)]);
        assert_eq!(index.get(&fold_key("GO")), Some(&3));
    }
}

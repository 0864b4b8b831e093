// Skill matching: synonym normalization, weighted matcher, gap backlog, quality gates.
// Everything here is a pure function of its inputs; state lives in `workflow`.

pub mod gaps;
pub mod gates;
pub mod handlers;
pub mod matcher;
pub mod synonyms;

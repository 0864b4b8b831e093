// Persisted workflow aggregate: snapshot load/save with integrity checks, and the
// analysis pass that refreshes match, gaps, gates and plan inside it.

pub mod analysis;
pub mod handlers;
pub mod snapshot;

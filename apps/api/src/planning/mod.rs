// Learning plan generation and the sprint lifecycle state machine.
// Transitions are pure: state in, new state plus events out.

pub mod handlers;
pub mod lifecycle;
pub mod plan;

pub mod skill;
pub mod workflow;

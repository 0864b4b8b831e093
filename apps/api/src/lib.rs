pub mod config;
pub mod errors;
pub mod extract;
pub mod matching;
pub mod models;
pub mod planning;
pub mod routes;
pub mod state;
pub mod workflow;

pub mod detector;
pub mod errors;
pub mod events;
pub mod models;
pub mod reachability;
pub mod scanner;
pub mod scheduler;
pub mod state;
pub mod strategy;

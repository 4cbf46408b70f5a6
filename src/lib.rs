pub mod candidate;
pub mod cli;
pub mod gap_tracker;
pub mod history;
pub mod recipe_features;
pub mod suggest;

pub mod assistant;
pub mod commands;
pub mod configuration;
pub mod debounce;
pub mod error;
pub mod interpreter;
pub mod listening;
pub mod logging;
pub mod preferences;
pub mod recognition;
pub mod recognizer;
pub mod session;
pub mod speech;

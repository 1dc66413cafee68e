//! different utility modules used throughout the project
/// solver configuration, optionally read from a TOML file
pub mod config;
/// terminal logger setup, elapsed time and statistics tables
pub mod logger;

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod sample;
pub mod scoring;
#[cfg(test)]
mod tests;

pub use config::{Config, MetricPoint};
pub use engine::{EventResult, ScoringEngine, Status};
pub use error::{ConfigError, ConfigResult};
pub use history::BoundedHistory;
pub use sample::Sample;

pub mod assertions;
pub mod cleanup;
pub mod client;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod models;
pub mod runner;
pub mod scenarios;

#[cfg(test)]
mod tests;

pub use config::HarnessConfig;
pub use error::{HarnessError, HarnessResult};
pub use runner::{Harness, Outcome, ScenarioReport, SuiteReport};
pub use scenarios::Scenario;

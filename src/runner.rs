use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::cleanup::Teardown;
use crate::client::ApiClient;
use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::scenarios::{Scenario, ScenarioContext};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: &'static str,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub cleanup_failures: usize,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub base_url: String,
    pub started_at: String,
    pub scenarios: Vec<ScenarioReport>,
    pub passed: usize,
    pub failed: usize,
}

impl SuiteReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Runs scenarios one after another against a single backend.
pub struct Harness {
    client: ApiClient,
    config: HarnessConfig,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> HarnessResult<Self> {
        let client = ApiClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// Executes one scenario body, then its teardown whatever the outcome.
    pub async fn run_scenario(&self, scenario: Scenario) -> ScenarioReport {
        let name = scenario.name();
        info!(scenario = name, "scenario started");
        let started = Instant::now();

        let ctx = ScenarioContext {
            client: &self.client,
            config: &self.config,
        };
        let mut teardown = Teardown::new();
        let result = scenario.execute(&ctx, &mut teardown).await;
        let cleanup_failures = teardown.run(&self.client, name).await;

        let outcome = match result {
            Ok(()) => {
                info!(scenario = name, "scenario passed");
                Outcome::Passed
            }
            Err(err) => {
                error!(scenario = name, error = %err, "scenario failed");
                Outcome::Failed {
                    message: err.to_string(),
                }
            }
        };

        ScenarioReport {
            name,
            outcome,
            duration_ms: started.elapsed().as_millis() as u64,
            cleanup_failures,
        }
    }

    pub async fn run(&self, scenarios: &[Scenario]) -> SuiteReport {
        let started_at = Utc::now().to_rfc3339();
        let mut reports = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            reports.push(self.run_scenario(*scenario).await);
        }

        let passed = reports.iter().filter(|report| report.passed()).count();
        let failed = reports.len() - passed;
        info!(passed, failed, "suite finished");

        SuiteReport {
            base_url: self.config.base_url.to_string(),
            started_at,
            scenarios: reports,
            passed,
            failed,
        }
    }
}

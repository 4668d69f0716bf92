use std::io::{self, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use contract_harness::{Harness, HarnessConfig, HarnessResult, Outcome, Scenario, SuiteReport};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "contract-harness", about = "Run contract scenarios against the social backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run scenarios sequentially and report the outcome.
    Run {
        /// Backend root URL (overrides `CONTRACT_BASE_URL`).
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
        /// Per-request timeout in seconds (overrides `CONTRACT_TIMEOUT_SECS`).
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Scenario to run; repeat to select several. Defaults to all.
        #[arg(long = "scenario", value_name = "NAME")]
        scenarios: Vec<String>,
        /// Print the suite report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the available scenarios.
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::List => {
            for scenario in Scenario::ALL {
                println!("{:<28} {}", scenario.name(), scenario.description());
            }
            ExitCode::SUCCESS
        }
        Commands::Run {
            base_url,
            timeout_secs,
            scenarios,
            json,
        } => {
            let prepared = prepare(base_url.as_deref(), timeout_secs, &scenarios);
            let (harness, selection) = match prepared {
                Ok(prepared) => prepared,
                Err(err) => {
                    eprintln!("configuration error: {err}");
                    return ExitCode::from(2);
                }
            };

            let report = harness.run(&selection).await;
            if let Err(err) = print_report(&report, json) {
                eprintln!("failed to write report: {err}");
            }
            if report.all_passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn prepare(
    base_url: Option<&str>,
    timeout_secs: Option<u64>,
    names: &[String],
) -> HarnessResult<(Harness, Vec<Scenario>)> {
    let mut config = HarnessConfig::from_env()?;
    if let Some(base_url) = base_url {
        config = config.with_base_url(base_url)?;
    }
    if let Some(secs) = timeout_secs {
        config = config.with_timeout_secs(secs)?;
    }
    let selection = Scenario::select(names)?;
    Ok((Harness::new(config)?, selection))
}

fn print_report(report: &SuiteReport, json: bool) -> HarnessResult<()> {
    let mut out = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, report)?;
        writeln!(out)?;
        return Ok(());
    }

    for scenario in &report.scenarios {
        match &scenario.outcome {
            Outcome::Passed => {
                writeln!(out, "PASS {} ({} ms)", scenario.name, scenario.duration_ms)?
            }
            Outcome::Failed { message } => writeln!(
                out,
                "FAIL {} ({} ms): {message}",
                scenario.name, scenario.duration_ms
            )?,
        }
        if scenario.cleanup_failures > 0 {
            writeln!(out, "     {} cleanup action(s) failed", scenario.cleanup_failures)?;
        }
    }
    writeln!(
        out,
        "{} passed, {} failed against {}",
        report.passed, report.failed, report.base_url
    )?;
    Ok(())
}

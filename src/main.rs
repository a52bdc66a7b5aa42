//! resy-cancel command line.
//!
//! ```text
//! resy-cancel [--config FILE] check
//!     → load + validate config, print the effective retry schedule
//!
//! resy-cancel [--config FILE] simulate --reservation T --auth T [--fault KIND]...
//!     → run one cancellation against the in-memory platform, print the result
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use resy_cancel::cancellation::{CancellationClient, Fault, InMemoryPlatform};
use resy_cancel::config::{load_config, ClientConfig, ConfigError};
use resy_cancel::observability::{logging, metrics};
use resy_cancel::resilience::RetryPolicy;

#[derive(Parser)]
#[command(name = "resy-cancel")]
#[command(about = "Resilient reservation cancellation client", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the retry schedule
    Check,
    /// Cancel a reservation on an in-memory platform with injected faults
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct SimulateArgs {
    #[arg(long)]
    reservation: String,

    #[arg(long)]
    auth: String,

    /// Fault for the next platform call, in order; repeatable
    #[arg(long = "fault", value_enum)]
    faults: Vec<FaultKind>,

    /// How long a `stall` fault holds the call
    #[arg(long, default_value_t = 30_000)]
    stall_ms: u64,

    /// Seed the reservation as already cancelled
    #[arg(long, conflicts_with = "unknown")]
    already_cancelled: bool,

    /// Do not seed the reservation at all
    #[arg(long)]
    unknown: bool,

    /// Overall deadline for the call
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Serve Prometheus metrics on this address while running
    #[arg(long)]
    metrics_address: Option<SocketAddr>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FaultKind {
    Timeout,
    ConnectionReset,
    ServiceUnavailable,
    LostResponse,
    Stall,
}

impl FaultKind {
    fn into_fault(self, stall: Duration) -> Fault {
        match self {
            FaultKind::Timeout => Fault::Timeout,
            FaultKind::ConnectionReset => Fault::ConnectionReset,
            FaultKind::ServiceUnavailable => Fault::ServiceUnavailable,
            FaultKind::LostResponse => Fault::LostResponse,
            FaultKind::Stall => Fault::Stall(stall),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    logging::init_logging(&config.observability);

    match cli.command {
        Commands::Check => check(&config)?,
        Commands::Simulate(args) => {
            if !simulate(&config, args).await? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn check(config: &ClientConfig) -> Result<(), ConfigError> {
    let report = policy_report(config)?;
    println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    Ok(())
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Effective retry policy, its backoff schedule and the worst-case call time.
fn policy_report(config: &ClientConfig) -> Result<serde_json::Value, ConfigError> {
    let policy = RetryPolicy::new(&config.retries, &config.timeouts)?;
    let schedule: Vec<u64> = policy.schedule().into_iter().map(millis).collect();
    let worst_case_ms = schedule
        .iter()
        .fold(0u64, |total, ms| total.saturating_add(*ms))
        .saturating_add(
            u64::from(policy.max_attempts()).saturating_mul(millis(policy.attempt_timeout())),
        );

    Ok(json!({
        "max_attempts": policy.max_attempts(),
        "attempt_timeout_ms": millis(policy.attempt_timeout()),
        "call_deadline_ms": config.timeouts.call_deadline_ms,
        "jitter_ratio": config.retries.jitter_ratio,
        "backoff_schedule_ms": schedule,
        "worst_case_ms": worst_case_ms,
    }))
}

/// Returns whether the reservation ended up cancelled.
async fn simulate(config: &ClientConfig, args: SimulateArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let metrics_address = match args.metrics_address {
        Some(addr) => Some(addr),
        None if config.observability.metrics_enabled => {
            Some(config.observability.metrics_address.parse()?)
        }
        None => None,
    };
    if let Some(addr) = metrics_address {
        metrics::init_metrics(addr);
    }

    let platform = InMemoryPlatform::new();
    if args.already_cancelled {
        platform.add_cancelled_reservation(&args.reservation);
    } else if !args.unknown {
        platform.add_reservation(&args.reservation);
    }
    let stall = Duration::from_millis(args.stall_ms);
    platform.inject_faults(args.faults.iter().map(|kind| kind.into_fault(stall)));

    let client = CancellationClient::new(Arc::new(platform.clone()), config)?;
    let result = match args.deadline_ms {
        Some(ms) => {
            client
                .cancel_within(&args.reservation, &args.auth, Duration::from_millis(ms))
                .await
        }
        None => client.cancel(&args.reservation, &args.auth).await,
    };

    let report = json!({
        "result": result,
        "platform_calls": platform.call_count(),
        "cancellations_applied": platform.cancellations_applied(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(result.is_success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_kinds_map_to_faults() {
        let stall = Duration::from_millis(750);
        assert_eq!(FaultKind::Timeout.into_fault(stall), Fault::Timeout);
        assert_eq!(FaultKind::ConnectionReset.into_fault(stall), Fault::ConnectionReset);
        assert_eq!(FaultKind::ServiceUnavailable.into_fault(stall), Fault::ServiceUnavailable);
        assert_eq!(FaultKind::LostResponse.into_fault(stall), Fault::LostResponse);
        assert_eq!(FaultKind::Stall.into_fault(stall), Fault::Stall(stall));
    }

    #[test]
    fn test_policy_report_numbers() {
        let mut config = ClientConfig::default();
        config.retries.max_attempts = 4;
        config.retries.base_delay_ms = 100;
        config.retries.max_delay_ms = 300;
        config.timeouts.attempt_timeout_ms = 1000;

        let report = policy_report(&config).unwrap();
        assert_eq!(report["max_attempts"], 4);
        assert_eq!(report["attempt_timeout_ms"], 1000);
        assert_eq!(report["backoff_schedule_ms"], json!([100, 200, 300]));
        // 600ms of backoff plus four full attempts.
        assert_eq!(report["worst_case_ms"], 4600);
        assert!(report["call_deadline_ms"].is_null());
    }

    #[test]
    fn test_policy_report_saturates_instead_of_wrapping() {
        let mut config = ClientConfig::default();
        config.retries.max_attempts = 3;
        config.timeouts.attempt_timeout_ms = u64::MAX;

        let report = policy_report(&config).unwrap();
        assert_eq!(report["attempt_timeout_ms"], u64::MAX);
        assert_eq!(report["worst_case_ms"], u64::MAX);
    }

    #[test]
    fn test_policy_report_rejects_invalid_config() {
        let mut config = ClientConfig::default();
        config.retries.max_attempts = 0;
        assert!(matches!(policy_report(&config), Err(ConfigError::Validation(_))));
    }
}

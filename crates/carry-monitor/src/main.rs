use anyhow::{Context, Result};
use carry_monitor::cli::{MonitorArgs, USAGE};
use carry_monitor::{CarryMonitor, MonitorConfig};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    // Logs go to stderr so stdout carries only the report
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = MonitorConfig::from_env().context("Invalid configuration")?;
    let parsed = MonitorArgs::parse(&args)?;
    let inputs = parsed.load(config.counterpart_yield)?;

    tracing::info!(
        high_beta = inputs.high_beta.len(),
        retreat_extras = inputs.retreat_extras.len(),
        "Loaded price series"
    );

    let report = CarryMonitor::new(&config).run(&inputs)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

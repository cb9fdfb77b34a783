//! `sim` — run scripted fault-injected editing sessions.

#![forbid(unsafe_code)]

use clap::Parser;
use mapform_sim::driver::{SimConfig, run_campaign};
use mapform_sim::transport::FaultConfig;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Deterministic fault-injection sessions for mapform's sync protocol",
    long_about = None
)]
struct Args {
    /// Base RNG seed; each session uses seed + index.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of sessions to run.
    #[arg(long, default_value_t = 10)]
    sessions: u32,

    /// Editing rounds per session.
    #[arg(long, default_value_t = 50)]
    rounds: u32,

    /// Pages seeded per session.
    #[arg(long, default_value_t = 5)]
    pages: u32,

    /// Maximum delivery delay in ticks.
    #[arg(long, default_value_t = 2)]
    max_delay: u8,

    /// Percentage of requests dropped in flight.
    #[arg(long, default_value_t = 0)]
    drop_rate: u8,

    /// Percentage of settlements duplicated.
    #[arg(long, default_value_t = 0)]
    dup_rate: u8,

    /// Percentage chance of reordering deliveries each tick.
    #[arg(long, default_value_t = 5)]
    reorder_rate: u8,

    /// Emit the full JSON report instead of a summary.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber_init();

    let args = Args::parse();
    let config = SimConfig {
        seed: args.seed,
        rounds: args.rounds,
        pages: args.pages,
        fault: FaultConfig {
            max_delay_ticks: args.max_delay,
            drop_rate_percent: args.drop_rate,
            duplicate_rate_percent: args.dup_rate,
            reorder_rate_percent: args.reorder_rate,
        },
    };

    let reports = run_campaign(&config, args.sessions)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    let converged = reports.iter().filter(|r| r.converged).count();
    let dropped: u64 = reports.iter().map(|r| r.stats.dropped).sum();
    let failures: u64 = reports.iter().map(|r| r.stats.failures).sum();
    let unsettled: usize = reports.iter().map(|r| r.unsettled).sum();

    println!("sessions:   {}", reports.len());
    println!("converged:  {converged}/{}", reports.len());
    println!("dropped:    {dropped}");
    println!("rejected:   {failures}");
    println!("unsettled:  {unsettled}");

    for (index, report) in reports.iter().enumerate() {
        if !report.converged {
            println!(
                "  session {index}: editor {:?} vs store {:?} (dropped {}, rejected {})",
                report.editor_order, report.store_order, report.stats.dropped,
                report.stats.failures
            );
        }
    }
    Ok(())
}

fn tracing_subscriber_init() {
    // the sim binary stays quiet unless MAPFORM_LOG asks otherwise
    use tracing_subscriber::{EnvFilter, fmt};
    let filter = EnvFilter::try_from_env("MAPFORM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

//! offset-cli: dry-run front end for the offset aggregator.
//!
//! Everything runs against the in-memory chain described by the config
//! file's `[simulation]` section; nothing leaves the process.

mod simulation;

use anyhow::{bail, Context};
use clap::Parser;
use offset_engine::{OffsetAggregator, Sizing, STAT_COMMITTED, STAT_REVERTED, STAT_UNITS_RETIRED};
use offset_nullables::NullChain;
use offset_types::{Amount, DepositorId};
use offset_utils::LogFormat;
use serde::Serialize;
use simulation::{display_asset, resolve_asset, resolve_payment, CliConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "offset-cli", about = "Offset aggregator dry-run CLI")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "offset.toml", env = "OFFSET_CONFIG")]
    config: PathBuf,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// Defaults to the config file's value.
    #[arg(long, env = "OFFSET_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json". Defaults to the config file's value.
    #[arg(long, env = "OFFSET_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// List the curated allow-list.
    Assets,

    /// Show the conversion path from a payment asset to a pool.
    Path {
        /// Payment: curated symbol, 0x identifier, or "native".
        #[arg(long)]
        from: String,
        /// Target pool: curated symbol or 0x identifier.
        #[arg(long)]
        to: String,
    },

    /// Quote a conversion against the simulated market.
    Quote {
        #[arg(long)]
        pay: String,
        #[arg(long)]
        pool: String,
        #[command(flatten)]
        sizing: SizingArgs,
    },

    /// Run one offset workflow against the simulated chain.
    Simulate {
        /// Depositor invoking the workflow.
        #[arg(long)]
        depositor: DepositorId,
        #[arg(long)]
        pay: String,
        #[arg(long)]
        pool: String,
        #[command(flatten)]
        sizing: SizingArgs,
        /// Native value attached to the invocation.
        #[arg(long, default_value_t = 0)]
        attached: u128,
    },
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct SizingArgs {
    /// Retire exactly this pool amount.
    #[arg(long)]
    amount_out: Option<u128>,
    /// Spend exactly this payment amount.
    #[arg(long)]
    amount_in: Option<u128>,
}

impl SizingArgs {
    fn sizing(&self) -> anyhow::Result<Sizing> {
        match (self.amount_out, self.amount_in) {
            (Some(out), None) => Ok(Sizing::ExactOutput(Amount::new(out))),
            (None, Some(amount_in)) => Ok(Sizing::ExactInput(Amount::new(amount_in))),
            _ => bail!("exactly one of --amount-out and --amount-in is required"),
        }
    }
}

#[derive(Serialize)]
struct SimulationReport<'a> {
    receipt: &'a offset_engine::WorkflowReceipt,
    records: &'a [offset_engine::AuditRecord],
    ledger: Vec<LedgerLine>,
    stats: std::collections::BTreeMap<&'static str, u64>,
    registry_version: u64,
}

#[derive(Serialize)]
struct LedgerLine {
    depositor: DepositorId,
    asset: String,
    amount: Amount,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::from_toml_file(&cli.config)?;
    let format = cli.log_format.unwrap_or(config.aggregator.log_format);
    let level = cli.log_level.as_deref().unwrap_or(&config.aggregator.log_level);
    offset_utils::init_logging(format, level);
    tracing::info!(config = %cli.config.display(), "loaded config");

    let mut agg = config.build()?;
    let snapshot = agg.snapshot();
    let routing = *agg.planner().routing();

    match cli.command {
        Command::Assets => print_json(&snapshot.assets().collect::<Vec<_>>()),

        Command::Path { from, to } => {
            let payment = resolve_payment(&snapshot, &routing, &from)?;
            let pool = resolve_asset(&snapshot, &routing, &to)?;
            let path = agg.planner().plan_path(agg.planner().source_of(payment), pool);
            let names: Vec<String> = path
                .iter()
                .map(|id| display_asset(&snapshot, &routing, id))
                .collect();
            print_json(&names)
        }

        Command::Quote { pay, pool, sizing } => {
            let payment = resolve_payment(&snapshot, &routing, &pay)?;
            let pool = resolve_asset(&snapshot, &routing, &pool)?;
            let quote = match sizing.sizing()? {
                Sizing::ExactOutput(amount) => agg.quote_needed_input(payment, pool, amount),
                Sizing::ExactInput(amount) => agg.quote_expected_output(payment, pool, amount),
            }
            .context("quote failed")?;
            print_json(&quote)
        }

        Command::Simulate {
            depositor,
            pay,
            pool,
            sizing,
            attached,
        } => {
            let payment = resolve_payment(&snapshot, &routing, &pay)?;
            let pool = resolve_asset(&snapshot, &routing, &pool)?;
            let receipt = agg
                .offset_with(depositor, payment, Amount::new(attached), pool, sizing.sizing()?)
                .context("workflow rolled back")?;
            print_json(&report(&agg, &receipt, &snapshot, &routing))
        }
    }
}

fn report<'a>(
    agg: &'a OffsetAggregator<NullChain>,
    receipt: &'a offset_engine::WorkflowReceipt,
    snapshot: &offset_registry::EligibilitySnapshot,
    routing: &offset_engine::Routing,
) -> SimulationReport<'a> {
    let ledger = agg
        .ledger()
        .entries()
        .map(|(depositor, asset, amount)| LedgerLine {
            depositor: *depositor,
            asset: display_asset(snapshot, routing, asset),
            amount,
        })
        .collect();
    tracing::info!(
        committed = agg.stats().get(STAT_COMMITTED),
        reverted = agg.stats().get(STAT_REVERTED),
        retired = agg.stats().get(STAT_UNITS_RETIRED),
        "simulation finished"
    );
    SimulationReport {
        receipt,
        records: agg.journal().records(),
        ledger,
        stats: agg.stats().snapshot(),
        registry_version: snapshot.version(),
    }
}

//! CLI configuration: the aggregator section plus a simulated market.

use anyhow::{anyhow, Context};
use offset_engine::{AggregatorConfig, OffsetAggregator, Payment, Routing};
use offset_nullables::{NullChain, Rate};
use offset_registry::EligibilitySnapshot;
use offset_types::{Amount, AssetId, DepositorId, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Keyword for the native settlement asset wherever an asset is named.
pub const NATIVE: &str = "native";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub aggregator: AggregatorConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// State the in-memory chain starts from.
///
/// Assets are named by curated symbol, `0x` identifier, or `native`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Block time in Unix seconds. Defaults to the current time.
    #[serde(default)]
    pub block_time: Option<u64>,

    #[serde(default)]
    pub rates: Vec<RateEntry>,

    #[serde(default)]
    pub inventory: Vec<InventoryEntry>,

    #[serde(default)]
    pub balances: Vec<BalanceEntry>,
}

/// Directional pair rate: `out = in * numerator / denominator`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateEntry {
    pub from: String,
    pub to: String,
    pub numerator: u128,
    #[serde(default = "default_denominator")]
    pub denominator: u128,
}

fn default_denominator() -> u128 {
    1
}

/// Certificate inventory behind a pool, listed oldest first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub pool: String,
    pub certificate: String,
    pub amount: Amount,
}

/// Wallet balance a depositor starts with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub depositor: DepositorId,
    pub asset: String,
    pub amount: Amount,
}

impl CliConfig {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Build an aggregator over a chain seeded from the simulation section.
    pub fn build(&self) -> anyhow::Result<OffsetAggregator<NullChain>> {
        let registry = self.aggregator.build_registry()?;
        let routing = self.aggregator.routing(&registry)?;
        let snapshot = registry.snapshot();
        let sim = &self.simulation;

        let mut chain = NullChain::new();
        chain.set_block_time(sim.block_time.map(Timestamp::new).unwrap_or_else(Timestamp::now));
        for rate in &sim.rates {
            chain.set_rate(
                resolve_asset(&snapshot, &routing, &rate.from)?,
                resolve_asset(&snapshot, &routing, &rate.to)?,
                Rate::new(rate.numerator, rate.denominator),
            );
        }
        for entry in &sim.inventory {
            chain.stock(
                resolve_asset(&snapshot, &routing, &entry.pool)?,
                resolve_asset(&snapshot, &routing, &entry.certificate)?,
                entry.amount,
            );
        }
        for entry in &sim.balances {
            if entry.asset.eq_ignore_ascii_case(NATIVE) {
                chain.fund_native(entry.depositor, entry.amount);
            } else {
                chain.fund(entry.depositor, resolve_asset(&snapshot, &routing, &entry.asset)?, entry.amount);
            }
        }
        tracing::debug!(
            rates = sim.rates.len(),
            inventory = sim.inventory.len(),
            balances = sim.balances.len(),
            "simulated chain seeded"
        );

        Ok(OffsetAggregator::new(chain, registry, routing))
    }
}

/// Curated symbol, `0x` identifier, or `native` (its wrapped form).
pub fn resolve_asset(snapshot: &EligibilitySnapshot, routing: &Routing, name: &str) -> anyhow::Result<AssetId> {
    if name.eq_ignore_ascii_case(NATIVE) {
        return Ok(routing.wrapped_native);
    }
    if name.starts_with("0x") {
        return name.parse().map_err(|e| anyhow!("{e}"));
    }
    snapshot
        .resolve(name)
        .map(|asset| asset.id)
        .ok_or_else(|| anyhow!("unknown asset symbol {name}"))
}

/// Like [`resolve_asset`], but `native` stays native.
pub fn resolve_payment(snapshot: &EligibilitySnapshot, routing: &Routing, name: &str) -> anyhow::Result<Payment> {
    if name.eq_ignore_ascii_case(NATIVE) {
        return Ok(Payment::Native);
    }
    resolve_asset(snapshot, routing, name).map(Payment::Token)
}

/// Symbol for display, falling back to the identifier.
pub fn display_asset(snapshot: &EligibilitySnapshot, routing: &Routing, id: &AssetId) -> String {
    match snapshot.symbol_of(id) {
        Some(symbol) => symbol.to_string(),
        None if *id == routing.wrapped_native => format!("{NATIVE} (wrapped)"),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offset_engine::{Sizing, WorkflowKind};
    use std::io::Write;

    const SAMPLE: &str = r#"
[routing]
intermediary = "USDC"
wrapped_native = "0x0d500b1d8e8ef31e21c99d1db9a6444d3adf1270"

[[assets]]
symbol = "USDC"
id = "0x2791bca1f2de4661ed88a30c99a7a9449aa84174"
capability = "swappable"

[[assets]]
symbol = "BCT"
id = "0x2f800db0fdb5223b3c3f354886d907a671414a7f"
capability = "redeemable"

[simulation]
block_time = 1700000000

[[simulation.rates]]
from = "native"
to = "USDC"
numerator = 1
denominator = 2

[[simulation.rates]]
from = "USDC"
to = "BCT"
numerator = 1

[[simulation.inventory]]
pool = "BCT"
certificate = "0x463de2a5c6e8bb0c87f4aa80a02689e6680f72c7"
amount = 1000

[[simulation.balances]]
depositor = "0x00000000000000000000000000000000000000a1"
asset = "native"
amount = 500
"#;

    #[test]
    fn simulate_native_exact_output() {
        let config = CliConfig::from_toml_str(SAMPLE).unwrap();
        let mut agg = config.build().unwrap();
        let depositor: DepositorId = "0x00000000000000000000000000000000000000a1".parse().unwrap();
        let bct = agg.snapshot().resolve("BCT").unwrap().id;

        let receipt = agg
            .offset_with(depositor, Payment::Native, Amount::new(100), bct, Sizing::ExactOutput(Amount::new(10)))
            .unwrap();
        assert_eq!(receipt.kind, WorkflowKind::ExactOutputNative);
        assert_eq!(receipt.swap.as_ref().unwrap().amount_in, Amount::new(20));
        assert_eq!(receipt.total_retired(), Amount::new(10));
    }

    #[test]
    fn resolve_names() {
        let config = CliConfig::from_toml_str(SAMPLE).unwrap();
        let registry = config.aggregator.build_registry().unwrap();
        let routing = config.aggregator.routing(&registry).unwrap();
        let snapshot = registry.snapshot();

        assert_eq!(resolve_payment(&snapshot, &routing, "NATIVE").unwrap(), Payment::Native);
        assert_eq!(resolve_asset(&snapshot, &routing, "native").unwrap(), routing.wrapped_native);
        assert_eq!(display_asset(&snapshot, &routing, &routing.intermediary), "USDC");
        assert!(resolve_asset(&snapshot, &routing, "NCT").is_err());
        assert!(resolve_asset(&snapshot, &routing, "0x12").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = CliConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.simulation.rates.len(), 2);
        assert_eq!(config.simulation.rates[1].denominator, 1);
    }

    #[test]
    fn simulation_section_is_optional() {
        let text = SAMPLE.split("[simulation]").next().unwrap();
        let config = CliConfig::from_toml_str(text).unwrap();
        assert!(config.simulation.rates.is_empty());
        assert!(config.build().is_ok());
    }
}

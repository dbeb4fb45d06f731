//! Conversion planning: path derivation and verified quotes.
//!
//! Paths are deterministic. A source that is itself the universal
//! intermediary converts directly; everything else hops through it. The
//! native settlement asset has no transferable identifier of its own and is
//! routed from its wrapped form.

use crate::error::EngineError;
use offset_services::SwapRouter;
use offset_types::{Amount, AssetId};
use serde::{Deserialize, Serialize};

/// What a caller pays with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payment {
    /// The native settlement asset, attached as value to the invocation.
    Native,
    /// A transferable token.
    Token(AssetId),
}

/// Identifiers the planner routes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routing {
    /// Universal intermediary every non-direct path hops through.
    pub intermediary: AssetId,
    /// Wrapped form of the native asset, used as the first hop of native paths.
    pub wrapped_native: AssetId,
}

/// A verified quote: one amount per path element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub path: Vec<AssetId>,
    pub amounts: Vec<Amount>,
}

impl Quote {
    /// Amount entering the first hop.
    pub fn amount_in(&self) -> Amount {
        self.amounts.first().copied().unwrap_or(Amount::ZERO)
    }

    /// Amount leaving the last hop.
    pub fn amount_out(&self) -> Amount {
        self.amounts.last().copied().unwrap_or(Amount::ZERO)
    }
}

#[derive(Clone, Debug)]
pub struct ConversionPlanner {
    routing: Routing,
}

impl ConversionPlanner {
    pub fn new(routing: Routing) -> Self {
        Self { routing }
    }

    pub fn routing(&self) -> &Routing {
        &self.routing
    }

    /// Identifier the router sees as the first path element for `payment`.
    pub fn source_of(&self, payment: Payment) -> AssetId {
        match payment {
            Payment::Native => self.routing.wrapped_native,
            Payment::Token(id) => id,
        }
    }

    pub fn plan_path(&self, from: AssetId, to: AssetId) -> Vec<AssetId> {
        if from == self.routing.intermediary {
            vec![from, to]
        } else {
            vec![from, self.routing.intermediary, to]
        }
    }

    /// Input needed for exactly `desired` to leave the path.
    pub fn quote_exact_output<R: SwapRouter + ?Sized>(
        &self,
        router: &R,
        path: &[AssetId],
        desired: Amount,
    ) -> Result<Quote, EngineError> {
        let amounts = router
            .quote_exact_output(path, desired)
            .map_err(EngineError::SwapFailed)?;
        verify_amounts(path, &amounts)?;
        if amounts[amounts.len() - 1] != desired {
            return Err(EngineError::QuoteInconsistency(format!(
                "terminal amount {} differs from requested {desired}",
                amounts[amounts.len() - 1]
            )));
        }
        Ok(Quote {
            path: path.to_vec(),
            amounts,
        })
    }

    /// Output expected when `supplied` enters the path.
    pub fn quote_exact_input<R: SwapRouter + ?Sized>(
        &self,
        router: &R,
        path: &[AssetId],
        supplied: Amount,
    ) -> Result<Quote, EngineError> {
        let amounts = router
            .quote_exact_input(path, supplied)
            .map_err(EngineError::SwapFailed)?;
        verify_amounts(path, &amounts)?;
        if amounts[0] != supplied {
            return Err(EngineError::QuoteInconsistency(format!(
                "initial amount {} differs from supplied {supplied}",
                amounts[0]
            )));
        }
        Ok(Quote {
            path: path.to_vec(),
            amounts,
        })
    }
}

/// One amount per path element, and at least one hop.
pub(crate) fn verify_amounts(path: &[AssetId], amounts: &[Amount]) -> Result<(), EngineError> {
    if path.len() < 2 {
        return Err(EngineError::QuoteInconsistency(format!(
            "path of length {} has no hop",
            path.len()
        )));
    }
    if amounts.len() != path.len() {
        return Err(EngineError::QuoteInconsistency(format!(
            "{} amounts for a path of {} assets",
            amounts.len(),
            path.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use offset_nullables::{NullChain, Rate};

    fn id(n: u8) -> AssetId {
        AssetId::new([n; 20])
    }

    fn planner() -> ConversionPlanner {
        ConversionPlanner::new(Routing {
            intermediary: id(1),
            wrapped_native: id(9),
        })
    }

    #[test]
    fn direct_path_from_intermediary() {
        assert_eq!(planner().plan_path(id(1), id(5)), vec![id(1), id(5)]);
    }

    #[test]
    fn other_sources_hop_through_intermediary() {
        assert_eq!(planner().plan_path(id(2), id(5)), vec![id(2), id(1), id(5)]);
        let native = planner().source_of(Payment::Native);
        assert_eq!(planner().plan_path(native, id(5)), vec![id(9), id(1), id(5)]);
    }

    #[test]
    fn exact_output_quote() {
        let mut chain = NullChain::new();
        chain.set_rate(id(2), id(1), Rate::new(1, 1));
        chain.set_rate(id(1), id(5), Rate::new(5, 6));
        let path = planner().plan_path(id(2), id(5));
        let quote = planner().quote_exact_output(&chain, &path, Amount::new(10)).unwrap();
        assert_eq!(quote.amount_in(), Amount::new(12));
        assert_eq!(quote.amount_out(), Amount::new(10));
    }

    #[test]
    fn truncated_quote_is_inconsistent() {
        let mut chain = NullChain::new();
        chain.set_rate(id(1), id(5), Rate::parity());
        chain.faults_mut().truncate_quotes = true;
        let path = planner().plan_path(id(1), id(5));
        let err = planner().quote_exact_input(&chain, &path, Amount::new(10)).unwrap_err();
        assert!(matches!(err, EngineError::QuoteInconsistency(_)));
    }

    #[test]
    fn skewed_terminal_amount_is_inconsistent() {
        let mut chain = NullChain::new();
        chain.set_rate(id(1), id(5), Rate::parity());
        chain.faults_mut().skew_quote_output = true;
        let path = planner().plan_path(id(1), id(5));
        let err = planner().quote_exact_output(&chain, &path, Amount::new(10)).unwrap_err();
        assert!(matches!(err, EngineError::QuoteInconsistency(_)));
    }

    #[test]
    fn missing_market_is_swap_failure() {
        let chain = NullChain::new();
        let path = planner().plan_path(id(2), id(5));
        let err = planner().quote_exact_input(&chain, &path, Amount::new(1)).unwrap_err();
        assert!(matches!(err, EngineError::SwapFailed(_)));
    }
}

//! Fixed-rate pricing for the in-memory swap router.

use offset_services::ServiceError;
use offset_types::{Amount, AssetId};
use std::collections::HashMap;

/// `output = input * numerator / denominator`, rounded down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rate {
    pub numerator: u128,
    pub denominator: u128,
}

impl Rate {
    pub fn new(numerator: u128, denominator: u128) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// One unit in, one unit out.
    pub fn parity() -> Self {
        Self::new(1, 1)
    }

    /// Output delivered for `input`, rounded down.
    pub fn output_for(&self, input: Amount) -> Option<Amount> {
        if self.denominator == 0 {
            return None;
        }
        input
            .raw()
            .checked_mul(self.numerator)
            .map(|scaled| Amount::new(scaled / self.denominator))
    }

    /// Smallest input that delivers at least `output`, rounded up.
    pub fn input_for(&self, output: Amount) -> Option<Amount> {
        if self.numerator == 0 {
            return None;
        }
        let scaled = output.raw().checked_mul(self.denominator)?;
        Some(Amount::new(scaled.div_ceil(self.numerator)))
    }
}

/// Pair rates keyed by (from, to). Pairs are directional.
#[derive(Clone, Debug, Default)]
pub struct NullMarket {
    rates: HashMap<(AssetId, AssetId), Rate>,
}

impl NullMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rate(&mut self, from: AssetId, to: AssetId, rate: Rate) {
        self.rates.insert((from, to), rate);
    }

    pub fn rate(&self, from: &AssetId, to: &AssetId) -> Result<Rate, ServiceError> {
        self.rates
            .get(&(*from, *to))
            .copied()
            .ok_or(ServiceError::NoMarket {
                from: *from,
                to: *to,
            })
    }

    fn check_path(path: &[AssetId]) -> Result<(), ServiceError> {
        if path.len() < 2 {
            return Err(ServiceError::Rejected(format!(
                "path needs at least two assets, got {}",
                path.len()
            )));
        }
        Ok(())
    }

    /// Amounts entering each hop so that `amount_out` leaves the last one.
    pub fn amounts_in(&self, path: &[AssetId], amount_out: Amount) -> Result<Vec<Amount>, ServiceError> {
        Self::check_path(path)?;
        let mut amounts = vec![Amount::ZERO; path.len()];
        amounts[path.len() - 1] = amount_out;
        for i in (0..path.len() - 1).rev() {
            let rate = self.rate(&path[i], &path[i + 1])?;
            amounts[i] = rate
                .input_for(amounts[i + 1])
                .ok_or_else(|| ServiceError::Rejected("amount overflow".into()))?;
        }
        Ok(amounts)
    }

    /// Amounts leaving each hop when `amount_in` enters the first one.
    pub fn amounts_out(&self, path: &[AssetId], amount_in: Amount) -> Result<Vec<Amount>, ServiceError> {
        Self::check_path(path)?;
        let mut amounts = Vec::with_capacity(path.len());
        amounts.push(amount_in);
        for hop in path.windows(2) {
            let rate = self.rate(&hop[0], &hop[1])?;
            let previous = amounts[amounts.len() - 1];
            let next = rate
                .output_for(previous)
                .ok_or_else(|| ServiceError::Rejected("amount overflow".into()))?;
            amounts.push(next);
        }
        Ok(amounts)
    }
}

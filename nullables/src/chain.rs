//! In-memory chain implementing every aggregator port.

use crate::faults::Faults;
use crate::market::{NullMarket, Rate};
use offset_services::{
    ChainState, Checkpoint, Custody, ExactInputOrder, ExactOutputOrder, Funding, Holder,
    Redemption, RedemptionService, RetirementService, ServiceError, SwapRouter,
};
use offset_types::{Amount, AssetId, DepositorId, Timestamp};
use std::collections::{BTreeMap, VecDeque};

/// One external call as observed by the chain, in call order.
///
/// The call log is not part of the revertible state: a reverted workflow
/// still shows what it attempted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExternalCall {
    Pull { asset: AssetId, from: DepositorId, amount: Amount },
    Push { asset: AssetId, to: DepositorId, amount: Amount },
    ApproveRouter { asset: AssetId, amount: Amount },
    ReceiveNative { from: DepositorId, amount: Amount },
    SendNative { to: DepositorId, amount: Amount },
    SwapExactOutput { path: Vec<AssetId>, amount_out: Amount },
    SwapExactInput { path: Vec<AssetId>, amount_in: Amount },
    Redeem { pool: AssetId, amount: Amount },
    Retire { certificate: AssetId, amount: Amount },
}

/// Everything a checkpoint captures.
#[derive(Clone, Debug, Default)]
struct World {
    tokens: BTreeMap<(Holder, AssetId), Amount>,
    native: BTreeMap<Holder, Amount>,
    router_allowances: BTreeMap<AssetId, Amount>,
    /// Oldest-first certificate inventory per pool.
    inventory: BTreeMap<AssetId, VecDeque<(AssetId, Amount)>>,
    retired: Vec<(AssetId, Amount)>,
}

impl World {
    fn token(&self, holder: Holder, asset: &AssetId) -> Amount {
        self.tokens.get(&(holder, *asset)).copied().unwrap_or(Amount::ZERO)
    }

    fn set_token(&mut self, holder: Holder, asset: AssetId, amount: Amount) {
        if amount.is_zero() {
            self.tokens.remove(&(holder, asset));
        } else {
            self.tokens.insert((holder, asset), amount);
        }
    }

    fn mint(&mut self, holder: Holder, asset: AssetId, amount: Amount) -> Result<(), ServiceError> {
        let balance = self
            .token(holder, &asset)
            .checked_add(amount)
            .ok_or_else(|| ServiceError::Rejected("balance overflow".into()))?;
        self.set_token(holder, asset, balance);
        Ok(())
    }

    fn burn(&mut self, holder: Holder, asset: AssetId, amount: Amount) -> Result<(), ServiceError> {
        let available = self.token(holder, &asset);
        let balance = available
            .checked_sub(amount)
            .ok_or(ServiceError::InsufficientFunds {
                asset: asset.to_string(),
                needed: amount,
                available,
            })?;
        self.set_token(holder, asset, balance);
        Ok(())
    }

    fn transfer(&mut self, from: Holder, to: Holder, asset: AssetId, amount: Amount) -> Result<(), ServiceError> {
        self.burn(from, asset, amount)?;
        self.mint(to, asset, amount)
    }

    fn native(&self, holder: Holder) -> Amount {
        self.native.get(&holder).copied().unwrap_or(Amount::ZERO)
    }

    fn adjust_native(&mut self, holder: Holder, credit: Amount, debit: Amount) -> Result<(), ServiceError> {
        let available = self.native(holder);
        let balance = available
            .checked_add(credit)
            .and_then(|b| b.checked_sub(debit))
            .ok_or(ServiceError::InsufficientFunds {
                asset: "native".into(),
                needed: debit,
                available,
            })?;
        self.native.insert(holder, balance);
        Ok(())
    }

    fn take_allowance(&mut self, asset: &AssetId, amount: Amount) -> Result<(), ServiceError> {
        let approved = self.router_allowances.get(asset).copied().unwrap_or(Amount::ZERO);
        let remaining = approved
            .checked_sub(amount)
            .ok_or(ServiceError::AllowanceExceeded {
                asset: *asset,
                needed: amount,
                approved,
            })?;
        if remaining.is_zero() {
            self.router_allowances.remove(asset);
        } else {
            self.router_allowances.insert(*asset, remaining);
        }
        Ok(())
    }
}

/// A deterministic, revertible stand-in for the chain the aggregator runs on.
pub struct NullChain {
    world: World,
    checkpoints: Vec<(Checkpoint, World)>,
    next_checkpoint: u64,
    market: NullMarket,
    faults: Faults,
    block_time: Timestamp,
    calls: Vec<ExternalCall>,
}

impl NullChain {
    pub fn new() -> Self {
        Self {
            world: World::default(),
            checkpoints: Vec::new(),
            next_checkpoint: 0,
            market: NullMarket::new(),
            faults: Faults::default(),
            block_time: Timestamp::new(1_700_000_000),
            calls: Vec::new(),
        }
    }

    pub fn set_block_time(&mut self, time: Timestamp) {
        self.block_time = time;
    }

    /// Give a depositor tokens outside of any workflow.
    pub fn fund(&mut self, depositor: DepositorId, asset: AssetId, amount: Amount) {
        let balance = self.world.token(Holder::Depositor(depositor), &asset);
        self.world.set_token(
            Holder::Depositor(depositor),
            asset,
            Amount::new(balance.raw().saturating_add(amount.raw())),
        );
    }

    /// Give a depositor native value outside of any workflow.
    pub fn fund_native(&mut self, depositor: DepositorId, amount: Amount) {
        let holder = Holder::Depositor(depositor);
        let balance = self.world.native(holder);
        self.world
            .native
            .insert(holder, Amount::new(balance.raw().saturating_add(amount.raw())));
    }

    pub fn set_rate(&mut self, from: AssetId, to: AssetId, rate: Rate) {
        self.market.set_rate(from, to, rate);
    }

    /// Append certificate inventory behind whatever a pool already holds.
    pub fn stock(&mut self, pool: AssetId, certificate: AssetId, amount: Amount) {
        self.world
            .inventory
            .entry(pool)
            .or_default()
            .push_back((certificate, amount));
    }

    pub fn balance_of(&self, holder: Holder, asset: &AssetId) -> Amount {
        self.world.token(holder, asset)
    }

    pub fn native_balance_of(&self, holder: Holder) -> Amount {
        self.world.native(holder)
    }

    /// Remaining inventory of a pool, oldest first.
    pub fn inventory_of(&self, pool: &AssetId) -> Vec<(AssetId, Amount)> {
        self.world
            .inventory
            .get(pool)
            .map(|q| q.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every retirement that is part of the current state, in order.
    pub fn retirements(&self) -> &[(AssetId, Amount)] {
        &self.world.retired
    }

    pub fn retired_total(&self, certificate: &AssetId) -> Amount {
        self.world
            .retired
            .iter()
            .filter(|(c, _)| c == certificate)
            .map(|(_, a)| *a)
            .sum()
    }

    pub fn faults_mut(&mut self) -> &mut Faults {
        &mut self.faults
    }

    pub fn calls(&self) -> &[ExternalCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn open_checkpoints(&self) -> usize {
        self.checkpoints.len()
    }

    fn check_deadline(&self, deadline: Timestamp) -> Result<(), ServiceError> {
        if deadline.is_past(self.block_time) {
            return Err(ServiceError::Expired {
                deadline,
                now: self.block_time,
            });
        }
        Ok(())
    }

    fn pay_router(&mut self, asset: &AssetId, funding: Funding, consumed: Amount) -> Result<(), ServiceError> {
        match funding {
            Funding::Allowance => {
                self.world.take_allowance(asset, consumed)?;
                self.world.burn(Holder::Custody, *asset, consumed)
            }
            Funding::Native(forwarded) => {
                if forwarded < consumed {
                    return Err(ServiceError::InsufficientFunds {
                        asset: "native".into(),
                        needed: consumed,
                        available: forwarded,
                    });
                }
                // Only the consumed part leaves custody; the rest comes straight back.
                self.world.adjust_native(Holder::Custody, Amount::ZERO, consumed)
            }
        }
    }
}

impl Default for NullChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainState for NullChain {
    fn block_time(&self) -> Timestamp {
        self.block_time
    }

    fn checkpoint(&mut self) -> Checkpoint {
        let checkpoint = Checkpoint(self.next_checkpoint);
        self.next_checkpoint += 1;
        self.checkpoints.push((checkpoint, self.world.clone()));
        checkpoint
    }

    fn revert_to(&mut self, checkpoint: Checkpoint) -> Result<(), ServiceError> {
        if self.faults.reject_revert {
            return Err(ServiceError::Rejected("environment refused to revert".into()));
        }
        let index = self
            .checkpoints
            .iter()
            .position(|(c, _)| *c == checkpoint)
            .ok_or(ServiceError::UnknownCheckpoint(checkpoint.0))?;
        self.checkpoints.truncate(index + 1);
        if let Some((_, world)) = self.checkpoints.pop() {
            self.world = world;
        }
        Ok(())
    }

    fn release(&mut self, checkpoint: Checkpoint) -> Result<(), ServiceError> {
        if self.faults.reject_release {
            return Err(ServiceError::Rejected("environment refused to release".into()));
        }
        let index = self
            .checkpoints
            .iter()
            .position(|(c, _)| *c == checkpoint)
            .ok_or(ServiceError::UnknownCheckpoint(checkpoint.0))?;
        self.checkpoints.truncate(index);
        Ok(())
    }
}

impl Custody for NullChain {
    fn pull(&mut self, asset: &AssetId, from: &DepositorId, amount: Amount) -> Result<(), ServiceError> {
        self.calls.push(ExternalCall::Pull {
            asset: *asset,
            from: *from,
            amount,
        });
        if self.faults.reject_pulls {
            return Err(ServiceError::Rejected("transfer-from refused".into()));
        }
        self.world
            .transfer(Holder::Depositor(*from), Holder::Custody, *asset, amount)
    }

    fn push(&mut self, asset: &AssetId, to: &DepositorId, amount: Amount) -> Result<(), ServiceError> {
        self.calls.push(ExternalCall::Push {
            asset: *asset,
            to: *to,
            amount,
        });
        self.world
            .transfer(Holder::Custody, Holder::Depositor(*to), *asset, amount)
    }

    fn approve_router(&mut self, asset: &AssetId, amount: Amount) -> Result<(), ServiceError> {
        self.calls.push(ExternalCall::ApproveRouter {
            asset: *asset,
            amount,
        });
        if amount.is_zero() {
            self.world.router_allowances.remove(asset);
        } else {
            self.world.router_allowances.insert(*asset, amount);
        }
        Ok(())
    }

    fn router_allowance(&self, asset: &AssetId) -> Amount {
        self.world
            .router_allowances
            .get(asset)
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn held(&self, asset: &AssetId) -> Amount {
        self.world.token(Holder::Custody, asset)
    }

    fn receive_native(&mut self, from: &DepositorId, amount: Amount) -> Result<(), ServiceError> {
        self.calls.push(ExternalCall::ReceiveNative {
            from: *from,
            amount,
        });
        self.world
            .adjust_native(Holder::Depositor(*from), Amount::ZERO, amount)?;
        self.world.adjust_native(Holder::Custody, amount, Amount::ZERO)
    }

    fn send_native(&mut self, to: &DepositorId, amount: Amount) -> Result<(), ServiceError> {
        self.calls.push(ExternalCall::SendNative { to: *to, amount });
        if self.faults.reject_native_refunds {
            return Err(ServiceError::Rejected("recipient refused native value".into()));
        }
        self.world.adjust_native(Holder::Custody, Amount::ZERO, amount)?;
        self.world
            .adjust_native(Holder::Depositor(*to), amount, Amount::ZERO)
    }

    fn native_held(&self) -> Amount {
        self.world.native(Holder::Custody)
    }
}

impl SwapRouter for NullChain {
    fn quote_exact_output(&self, path: &[AssetId], amount_out: Amount) -> Result<Vec<Amount>, ServiceError> {
        let mut amounts = self.market.amounts_in(path, amount_out)?;
        if self.faults.skew_quote_output {
            if let Some(last) = amounts.last_mut() {
                *last = Amount::new(last.raw() + 1);
            }
        }
        if self.faults.truncate_quotes {
            amounts.pop();
        }
        Ok(amounts)
    }

    fn quote_exact_input(&self, path: &[AssetId], amount_in: Amount) -> Result<Vec<Amount>, ServiceError> {
        let mut amounts = self.market.amounts_out(path, amount_in)?;
        if self.faults.truncate_quotes {
            amounts.pop();
        }
        Ok(amounts)
    }

    fn execute_exact_output(&mut self, order: ExactOutputOrder<'_>) -> Result<Vec<Amount>, ServiceError> {
        self.calls.push(ExternalCall::SwapExactOutput {
            path: order.path.to_vec(),
            amount_out: order.amount_out,
        });
        if self.faults.reject_swaps {
            return Err(ServiceError::Rejected("router refused swap".into()));
        }
        self.check_deadline(order.deadline)?;

        let mut amounts = self.market.amounts_in(order.path, order.amount_out)?;
        if amounts[0] > order.max_amount_in {
            return Err(ServiceError::Rejected(format!(
                "excessive input amount: {} > {}",
                amounts[0], order.max_amount_in
            )));
        }
        amounts[0] = amounts[0].saturating_sub(self.faults.input_discount);

        self.pay_router(&order.path[0], order.funding, amounts[0])?;
        let output = order.path[order.path.len() - 1];
        self.world.mint(order.recipient, output, order.amount_out)?;
        Ok(amounts)
    }

    fn execute_exact_input(&mut self, order: ExactInputOrder<'_>) -> Result<Vec<Amount>, ServiceError> {
        self.calls.push(ExternalCall::SwapExactInput {
            path: order.path.to_vec(),
            amount_in: order.amount_in,
        });
        if self.faults.reject_swaps {
            return Err(ServiceError::Rejected("router refused swap".into()));
        }
        self.check_deadline(order.deadline)?;

        let mut amounts = self.market.amounts_out(order.path, order.amount_in)?;
        let last = amounts.len() - 1;
        if amounts[last] < order.min_amount_out {
            return Err(ServiceError::Rejected(format!(
                "insufficient output amount: {} < {}",
                amounts[last], order.min_amount_out
            )));
        }

        self.pay_router(&order.path[0], order.funding, order.amount_in)?;
        let output = order.path[order.path.len() - 1];
        self.world.mint(order.recipient, output, amounts[last])?;
        amounts[last] = Amount::new(amounts[last].raw().saturating_add(self.faults.phantom_output.raw()));
        Ok(amounts)
    }
}

impl RedemptionService for NullChain {
    fn redeem_oldest(&mut self, pool: &AssetId, amount: Amount) -> Result<Redemption, ServiceError> {
        self.calls.push(ExternalCall::Redeem {
            pool: *pool,
            amount,
        });
        if self.faults.reject_redemptions {
            return Err(ServiceError::Rejected("pool refused redemption".into()));
        }

        let stocked: Amount = self
            .world
            .inventory
            .get(pool)
            .map(|q| q.iter().map(|(_, a)| *a).sum())
            .unwrap_or(Amount::ZERO);
        if stocked < amount {
            return Err(ServiceError::InsufficientFunds {
                asset: format!("certificate inventory of {pool}"),
                needed: amount,
                available: stocked,
            });
        }
        self.world.burn(Holder::Custody, *pool, amount)?;

        let mut redemption = Redemption::default();
        let mut remaining = amount;
        let queue = self.world.inventory.entry(*pool).or_default();
        while !remaining.is_zero() {
            let Some((certificate, available)) = queue.pop_front() else {
                break;
            };
            let taken = available.min(remaining);
            let left = available.saturating_sub(taken);
            if !left.is_zero() {
                queue.push_front((certificate, left));
            }
            remaining = remaining.saturating_sub(taken);
            redemption.certificates.push(certificate);
            redemption.amounts.push(taken);
        }
        if let Some(last) = redemption.amounts.last_mut() {
            *last = last.saturating_sub(self.faults.redemption_shortfall);
        }
        for (certificate, taken) in redemption.certificates.iter().zip(&redemption.amounts) {
            self.world.mint(Holder::Custody, *certificate, *taken)?;
        }

        if self.faults.truncate_redemptions {
            redemption.amounts.pop();
        }
        Ok(redemption)
    }
}

impl RetirementService for NullChain {
    fn retire(&mut self, certificate: &AssetId, amount: Amount) -> Result<(), ServiceError> {
        self.calls.push(ExternalCall::Retire {
            certificate: *certificate,
            amount,
        });
        if self.faults.reject_retirements || self.faults.reject_retirement_of == Some(*certificate) {
            return Err(ServiceError::Rejected(format!("registry refused to retire {certificate}")));
        }
        self.world.burn(Holder::Custody, *certificate, amount)?;
        self.world.retired.push((*certificate, amount));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> AssetId {
        AssetId::new([n; 20])
    }

    fn alice() -> DepositorId {
        DepositorId::new([0xa1; 20])
    }

    #[test]
    fn revert_restores_balances() {
        let mut chain = NullChain::new();
        chain.fund(alice(), id(1), Amount::new(100));
        let cp = chain.checkpoint();
        chain.pull(&id(1), &alice(), Amount::new(40)).unwrap();
        assert_eq!(chain.held(&id(1)), Amount::new(40));
        chain.revert_to(cp).unwrap();
        assert_eq!(chain.held(&id(1)), Amount::ZERO);
        assert_eq!(chain.balance_of(Holder::Depositor(alice()), &id(1)), Amount::new(100));
        assert_eq!(chain.open_checkpoints(), 0);
        // The attempt is still visible in the call log.
        assert_eq!(chain.calls().len(), 1);
    }

    #[test]
    fn refused_release_leaves_checkpoint_revertible() {
        let mut chain = NullChain::new();
        chain.fund(alice(), id(1), Amount::new(100));
        chain.faults_mut().reject_release = true;
        let cp = chain.checkpoint();
        chain.pull(&id(1), &alice(), Amount::new(40)).unwrap();
        assert!(chain.release(cp).is_err());
        assert_eq!(chain.open_checkpoints(), 1);
        chain.revert_to(cp).unwrap();
        assert_eq!(chain.held(&id(1)), Amount::ZERO);
        assert_eq!(chain.open_checkpoints(), 0);
    }

    #[test]
    fn release_keeps_effects() {
        let mut chain = NullChain::new();
        chain.fund(alice(), id(1), Amount::new(100));
        let cp = chain.checkpoint();
        chain.pull(&id(1), &alice(), Amount::new(40)).unwrap();
        chain.release(cp).unwrap();
        assert_eq!(chain.held(&id(1)), Amount::new(40));
        assert!(chain.revert_to(cp).is_err());
    }

    #[test]
    fn redeem_takes_oldest_inventory_first() {
        let mut chain = NullChain::new();
        let pool = id(5);
        chain.stock(pool, id(10), Amount::new(3));
        chain.stock(pool, id(11), Amount::new(10));
        chain.fund(alice(), pool, Amount::new(8));
        chain.pull(&pool, &alice(), Amount::new(8)).unwrap();

        let redemption = chain.redeem_oldest(&pool, Amount::new(8)).unwrap();
        assert_eq!(redemption.certificates, vec![id(10), id(11)]);
        assert_eq!(redemption.amounts, vec![Amount::new(3), Amount::new(5)]);
        assert_eq!(chain.inventory_of(&pool), vec![(id(11), Amount::new(5))]);
        assert_eq!(chain.held(&id(11)), Amount::new(5));
        assert_eq!(chain.held(&pool), Amount::ZERO);
    }

    #[test]
    fn exact_output_swap_draws_allowance() {
        let mut chain = NullChain::new();
        chain.set_rate(id(1), id(2), Rate::new(1, 2));
        chain.fund(alice(), id(1), Amount::new(50));
        chain.pull(&id(1), &alice(), Amount::new(20)).unwrap();
        chain.approve_router(&id(1), Amount::new(20)).unwrap();

        let path = [id(1), id(2)];
        let amounts = chain
            .execute_exact_output(ExactOutputOrder {
                path: &path,
                amount_out: Amount::new(10),
                max_amount_in: Amount::new(20),
                recipient: Holder::Custody,
                deadline: chain.block_time(),
                funding: Funding::Allowance,
            })
            .unwrap();
        assert_eq!(amounts, vec![Amount::new(20), Amount::new(10)]);
        assert_eq!(chain.router_allowance(&id(1)), Amount::ZERO);
        assert_eq!(chain.held(&id(2)), Amount::new(10));
    }

    #[test]
    fn expired_deadline_rejected() {
        let mut chain = NullChain::new();
        chain.set_rate(id(1), id(2), Rate::parity());
        let path = [id(1), id(2)];
        let err = chain
            .execute_exact_input(ExactInputOrder {
                path: &path,
                amount_in: Amount::new(1),
                min_amount_out: Amount::ZERO,
                recipient: Holder::Custody,
                deadline: Timestamp::new(chain.block_time().as_secs() - 1),
                funding: Funding::Allowance,
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Expired { .. }));
    }

    #[test]
    fn retire_burns_from_custody() {
        let mut chain = NullChain::new();
        chain.fund(alice(), id(9), Amount::new(4));
        chain.pull(&id(9), &alice(), Amount::new(4)).unwrap();
        chain.retire(&id(9), Amount::new(3)).unwrap();
        assert_eq!(chain.held(&id(9)), Amount::new(1));
        assert_eq!(chain.retired_total(&id(9)), Amount::new(3));
        assert!(chain.retire(&id(9), Amount::new(2)).is_err());
    }
}

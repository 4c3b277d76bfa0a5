//! Batch settlement engine.
//!
//! Moves funds into or out of the pool for many counterparties in one
//! all-or-nothing call. The engine mutates the ledger and drives the
//! gateway; the caller owns the checkpoint that undoes both on failure.
//!
//! ## Payin
//!
//! Items are processed one at a time: validate, pull with balance-delta
//! measurement, credit what actually arrived.
//!
//! ## Payout
//!
//! 1. **Validation phase**: for every item check recipient, amount, and
//!    asset, then debit. Later items see earlier debits.
//! 2. **Execution phase**: push every item.
//!
//! Every insufficient-balance failure therefore surfaces before any value
//! leaves the pool.

use poolkeep_access::RoleRegistry;
use poolkeep_ledger::{AssetRegistry, Ledger, TransferGateway, pull_measured};
use poolkeep_types::{Address, Amount, AssetId, PoolError, PoolEvent, Result, Role};

/// Roles allowed to run batches.
const BATCH_ROLES: [Role; 2] = [Role::Admin, Role::Operator];

/// Borrowed pool state a batch runs against.
pub struct BatchContext<'a> {
    pub roles: &'a RoleRegistry,
    pub assets: &'a AssetRegistry,
    pub ledger: &'a mut Ledger,
    pub gateway: &'a dyn TransferGateway,
}

/// Validates and executes batch payins and payouts.
#[derive(Debug, Clone, Copy)]
pub struct BatchSettlementEngine {
    max_batch_size: usize,
}

impl BatchSettlementEngine {
    #[must_use]
    pub fn new(max_batch_size: usize) -> Self {
        Self { max_batch_size }
    }

    #[must_use]
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Check the three parallel arrays agree in length and fit the bound.
    pub fn check_shape(&self, first: usize, second: usize, third: usize) -> Result<()> {
        if first != second || second != third {
            return Err(PoolError::ArrayLengthMismatch {
                first,
                second,
                third,
            });
        }
        if first > self.max_batch_size {
            return Err(PoolError::BatchTooLarge {
                len: first,
                max: self.max_batch_size,
            });
        }
        Ok(())
    }

    /// Pull each item from its sender and credit what arrived.
    ///
    /// Returns one `BatchPayin` event per item.
    pub fn payin(
        &self,
        ctx: &mut BatchContext<'_>,
        caller: Address,
        froms: &[Address],
        assets: &[AssetId],
        amounts: &[Amount],
    ) -> Result<Vec<PoolEvent>> {
        ctx.roles.require_any(caller, &BATCH_ROLES)?;
        self.check_shape(froms.len(), assets.len(), amounts.len())?;

        let mut events = Vec::with_capacity(froms.len());
        for (index, ((&from, &asset), &requested)) in
            froms.iter().zip(assets).zip(amounts).enumerate()
        {
            let received = Self::payin_item(ctx, from, asset, requested)
                .map_err(|e| e.at_item(index))?;
            tracing::debug!(index, %from, %asset, %requested, %received, "Batch payin item");
            events.push(PoolEvent::BatchPayin {
                actor: caller,
                index,
                from,
                asset,
                requested,
                received,
            });
        }
        Ok(events)
    }

    fn payin_item(
        ctx: &mut BatchContext<'_>,
        from: Address,
        asset: AssetId,
        requested: Amount,
    ) -> Result<Amount> {
        if from.is_zero() {
            return Err(PoolError::InvalidSender);
        }
        if requested.is_zero() {
            return Err(PoolError::ZeroAmount);
        }
        if asset.is_native() {
            return Err(PoolError::InvalidAsset(asset));
        }
        ctx.assets.require_supported(asset)?;

        let received = pull_measured(ctx.gateway, asset, from, requested)?;
        ctx.ledger.credit(ctx.assets, asset, received)?;
        Ok(received)
    }

    /// Debit every item, then push every item.
    ///
    /// No operator withdraw limit applies. Returns one `BatchPayout` event
    /// per item.
    pub fn payout(
        &self,
        ctx: &mut BatchContext<'_>,
        caller: Address,
        recipients: &[Address],
        assets: &[AssetId],
        amounts: &[Amount],
    ) -> Result<Vec<PoolEvent>> {
        ctx.roles.require_any(caller, &BATCH_ROLES)?;
        self.check_shape(recipients.len(), assets.len(), amounts.len())?;

        let items: Vec<(Address, AssetId, Amount)> = recipients
            .iter()
            .zip(assets)
            .zip(amounts)
            .map(|((&to, &asset), &amount)| (to, asset, amount))
            .collect();

        // Validation phase.
        for (index, &(recipient, asset, amount)) in items.iter().enumerate() {
            Self::reserve_payout(ctx, recipient, asset, amount).map_err(|e| e.at_item(index))?;
        }

        // Execution phase.
        let mut events = Vec::with_capacity(items.len());
        for (index, (recipient, asset, amount)) in items.into_iter().enumerate() {
            ctx.gateway
                .push(asset, recipient, amount)
                .map_err(|e| e.at_item(index))?;
            tracing::debug!(index, %recipient, %asset, %amount, "Batch payout item");
            events.push(PoolEvent::BatchPayout {
                actor: caller,
                index,
                recipient,
                asset,
                amount,
            });
        }
        Ok(events)
    }

    fn reserve_payout(
        ctx: &mut BatchContext<'_>,
        recipient: Address,
        asset: AssetId,
        amount: Amount,
    ) -> Result<()> {
        if recipient.is_zero() {
            return Err(PoolError::InvalidRecipient);
        }
        if amount.is_zero() {
            return Err(PoolError::ZeroAmount);
        }
        ctx.assets.require_supported(asset)?;
        ctx.ledger.debit(ctx.assets, asset, amount)?;
        Ok(())
    }
}

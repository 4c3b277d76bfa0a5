//! The custody pool: every externally callable operation.
//!
//! Value-moving calls run inside [`CustodyPool::transact`]:
//!
//! ```text
//! enter (reentrancy) → pause check → ledger checkpoint → gateway.begin
//!     → validate / authorize / mutate / transfer → journal → gateway.commit
//! ```
//!
//! Any error after the checkpoint restores the ledger and rolls the
//! gateway frame back, so a failed call leaves no trace in balances,
//! holdings, or the journal.

use std::sync::Arc;

use poolkeep_access::{PauseSwitch, ReentrancyGuard, RoleRegistry, WithdrawalPolicy};
use poolkeep_ledger::{AssetRegistry, Journal, Ledger, TransferGateway, pull_measured};
use poolkeep_types::{
    Address, Amount, AssetBalance, AssetId, AuditRecord, PoolConfig, PoolError, PoolEvent, Result,
    Role,
};

use crate::batch::{BatchContext, BatchSettlementEngine};

/// Everything guarded by the pool's single exclusion domain.
#[derive(Debug)]
struct PoolState {
    roles: RoleRegistry,
    assets: AssetRegistry,
    ledger: Ledger,
    pause: PauseSwitch,
    journal: Journal,
}

/// A custodial multi-asset pool.
///
/// `Send + Sync`: share it behind an `Arc`. Calls from different threads
/// are serialized; a call back into the pool from inside one of its own
/// gateway transfers fails with [`PoolError::Reentrant`].
pub struct CustodyPool {
    state: ReentrancyGuard<PoolState>,
    gateway: Arc<dyn TransferGateway>,
    engine: BatchSettlementEngine,
}

impl CustodyPool {
    /// Build a pool from `config`. The admin holds every role; configured
    /// tokens and limits are journaled as the admin's first actions.
    pub fn initialize(config: PoolConfig, gateway: Arc<dyn TransferGateway>) -> Result<Self> {
        config.validate()?;
        let admin = config.admin;
        let roles = RoleRegistry::new(admin);
        let mut assets = AssetRegistry::new();
        let mut events = Vec::new();

        if !config.native_withdraw_limit.is_zero() {
            assets.set_withdraw_limit(&roles, admin, AssetId::NATIVE, config.native_withdraw_limit)?;
            events.push(PoolEvent::WithdrawLimitSet {
                actor: admin,
                asset: AssetId::NATIVE,
                limit: config.native_withdraw_limit,
            });
        }
        for entry in &config.assets {
            assets.add(&roles, admin, entry.asset)?;
            events.push(PoolEvent::AssetAdded {
                actor: admin,
                asset: entry.asset,
            });
            if !entry.withdraw_limit.is_zero() {
                assets.set_withdraw_limit(&roles, admin, entry.asset, entry.withdraw_limit)?;
                events.push(PoolEvent::WithdrawLimitSet {
                    actor: admin,
                    asset: entry.asset,
                    limit: entry.withdraw_limit,
                });
            }
        }

        let mut journal = Journal::new();
        journal.append_all(events)?;

        tracing::info!(
            %admin,
            assets = assets.list().len(),
            max_batch_size = config.max_batch_size,
            "Pool initialized"
        );

        Ok(Self {
            state: ReentrancyGuard::new(PoolState {
                roles,
                assets,
                ledger: Ledger::new(),
                pause: PauseSwitch::new(),
                journal,
            }),
            gateway,
            engine: BatchSettlementEngine::new(config.max_batch_size),
        })
    }

    #[must_use]
    pub fn max_batch_size(&self) -> usize {
        self.engine.max_batch_size()
    }

    // ── Deposits ────────────────────────────────────────────────────

    /// Deposit `amount` of the native asset from `caller`.
    ///
    /// Native transfers deliver exactly what was sent, so the full amount
    /// is credited.
    pub fn deposit_native(&self, caller: Address, amount: Amount) -> Result<AuditRecord> {
        let records = self.transact(|state, gateway| {
            state.assets.require_supported(AssetId::NATIVE)?;
            if amount.is_zero() {
                return Err(PoolError::ZeroAmount);
            }
            gateway.pull(AssetId::NATIVE, caller, amount)?;
            state.ledger.credit(&state.assets, AssetId::NATIVE, amount)?;
            Ok(vec![PoolEvent::Deposited {
                actor: caller,
                asset: AssetId::NATIVE,
                requested: amount,
                received: amount,
            }])
        })?;
        tracing::info!(%caller, %amount, "Native deposit committed");
        single(records)
    }

    /// Deposit `requested` of a token from `caller`, crediting only what
    /// the pool's held balance actually grew by.
    pub fn deposit_asset(
        &self,
        caller: Address,
        asset: AssetId,
        requested: Amount,
    ) -> Result<AuditRecord> {
        let mut credited = Amount::ZERO;
        let records = self.transact(|state, gateway| {
            if asset.is_native() {
                return Err(PoolError::InvalidAsset(asset));
            }
            state.assets.require_supported(asset)?;
            if requested.is_zero() {
                return Err(PoolError::ZeroAmount);
            }
            let received = pull_measured(gateway, asset, caller, requested)?;
            state.ledger.credit(&state.assets, asset, received)?;
            credited = received;
            Ok(vec![PoolEvent::Deposited {
                actor: caller,
                asset,
                requested,
                received,
            }])
        })?;
        tracing::info!(%caller, %asset, %requested, received = %credited, "Deposit committed");
        single(records)
    }

    /// Model of the pool's plain receive hook, which always reverts.
    ///
    /// Value sent outside the deposit entry points is refused, so the
    /// sender keeps it. Touches neither pool state nor the gateway and
    /// takes no lock; the only effect is the returned error.
    pub fn receive_direct(&self, from: Address, amount: Amount) -> Result<()> {
        tracing::warn!(%from, %amount, "Unsolicited transfer rejected");
        Err(PoolError::UnsolicitedTransfer { from })
    }

    // ── Withdrawals ─────────────────────────────────────────────────

    /// Withdraw `amount` of the native asset to `recipient`.
    pub fn withdraw_native(
        &self,
        caller: Address,
        amount: Amount,
        recipient: Address,
    ) -> Result<AuditRecord> {
        self.withdraw(caller, AssetId::NATIVE, amount, recipient, true)
    }

    /// Withdraw `amount` of a token to `recipient`. The full amount is
    /// debited whatever the recipient ends up receiving.
    pub fn withdraw_asset(
        &self,
        caller: Address,
        asset: AssetId,
        amount: Amount,
        recipient: Address,
    ) -> Result<AuditRecord> {
        self.withdraw(caller, asset, amount, recipient, false)
    }

    fn withdraw(
        &self,
        caller: Address,
        asset: AssetId,
        amount: Amount,
        recipient: Address,
        native_entry: bool,
    ) -> Result<AuditRecord> {
        let mut granted = Role::Admin;
        let records = self.transact(|state, gateway| {
            let limit = state.assets.withdraw_limit(asset);
            granted = WithdrawalPolicy::check(&state.roles, caller, asset, amount, limit)?;
            if asset.is_native() != native_entry {
                return Err(PoolError::InvalidAsset(asset));
            }
            state.assets.require_supported(asset)?;
            if amount.is_zero() {
                return Err(PoolError::ZeroAmount);
            }
            if recipient.is_zero() {
                return Err(PoolError::InvalidRecipient);
            }
            state.ledger.debit(&state.assets, asset, amount)?;
            gateway.push(asset, recipient, amount)?;
            Ok(vec![PoolEvent::Withdrawn {
                actor: caller,
                asset,
                amount,
                recipient,
            }])
        })?;
        tracing::info!(%caller, %asset, %amount, %recipient, via = %granted, "Withdrawal committed");
        single(records)
    }

    // ── Batches ─────────────────────────────────────────────────────

    /// Pull from many senders in one atomic call. Returns one record per item.
    pub fn batch_payin(
        &self,
        caller: Address,
        froms: &[Address],
        assets: &[AssetId],
        amounts: &[Amount],
    ) -> Result<Vec<AuditRecord>> {
        let engine = self.engine;
        let records = self.transact(|state, gateway| {
            let mut ctx = BatchContext {
                roles: &state.roles,
                assets: &state.assets,
                ledger: &mut state.ledger,
                gateway,
            };
            engine.payin(&mut ctx, caller, froms, assets, amounts)
        })?;
        tracing::info!(%caller, items = records.len(), "Batch payin committed");
        Ok(records)
    }

    /// Pay many recipients in one atomic call. Returns one record per item.
    pub fn batch_payout(
        &self,
        caller: Address,
        recipients: &[Address],
        assets: &[AssetId],
        amounts: &[Amount],
    ) -> Result<Vec<AuditRecord>> {
        let engine = self.engine;
        let records = self.transact(|state, gateway| {
            let mut ctx = BatchContext {
                roles: &state.roles,
                assets: &state.assets,
                ledger: &mut state.ledger,
                gateway,
            };
            engine.payout(&mut ctx, caller, recipients, assets, amounts)
        })?;
        tracing::info!(%caller, items = records.len(), "Batch payout committed");
        Ok(records)
    }

    // ── Administration ──────────────────────────────────────────────

    pub fn add_supported_asset(&self, caller: Address, asset: AssetId) -> Result<AuditRecord> {
        let records = self.administer(|state| {
            state.assets.add(&state.roles, caller, asset)?;
            Ok(vec![PoolEvent::AssetAdded {
                actor: caller,
                asset,
            }])
        })?;
        tracing::info!(%caller, %asset, "Asset added");
        single(records)
    }

    /// Stop supporting an asset. Its pool balance must be zero.
    pub fn remove_supported_asset(&self, caller: Address, asset: AssetId) -> Result<AuditRecord> {
        let records = self.administer(|state| {
            state
                .assets
                .remove(&state.roles, caller, asset, &state.ledger)?;
            Ok(vec![PoolEvent::AssetRemoved {
                actor: caller,
                asset,
            }])
        })?;
        tracing::info!(%caller, %asset, "Asset removed");
        single(records)
    }

    /// Set the operator withdraw limit for `asset`. Zero disables operator
    /// withdrawals of it.
    pub fn set_withdraw_limit(
        &self,
        caller: Address,
        asset: AssetId,
        limit: Amount,
    ) -> Result<AuditRecord> {
        let records = self.administer(|state| {
            state
                .assets
                .set_withdraw_limit(&state.roles, caller, asset, limit)?;
            Ok(vec![PoolEvent::WithdrawLimitSet {
                actor: caller,
                asset,
                limit,
            }])
        })?;
        tracing::info!(%caller, %asset, %limit, "Withdraw limit set");
        single(records)
    }

    pub fn pause(&self, caller: Address) -> Result<AuditRecord> {
        let records = self.administer(|state| {
            state.pause.pause(&state.roles, caller)?;
            Ok(vec![PoolEvent::Paused { actor: caller }])
        })?;
        tracing::info!(%caller, "Pool paused");
        single(records)
    }

    pub fn unpause(&self, caller: Address) -> Result<AuditRecord> {
        let records = self.administer(|state| {
            state.pause.unpause(&state.roles, caller)?;
            Ok(vec![PoolEvent::Unpaused { actor: caller }])
        })?;
        tracing::info!(%caller, "Pool unpaused");
        single(records)
    }

    // ── Roles ───────────────────────────────────────────────────────

    /// Grant `role` to `account`. `None` if it already held the role.
    pub fn grant_role(
        &self,
        caller: Address,
        account: Address,
        role: Role,
    ) -> Result<Option<AuditRecord>> {
        let records = self.administer(|state| {
            let changed = state.roles.grant(caller, account, role)?;
            Ok(changed
                .then_some(PoolEvent::RoleGranted {
                    actor: caller,
                    account,
                    role,
                })
                .into_iter()
                .collect())
        })?;
        if !records.is_empty() {
            tracing::info!(%caller, %account, %role, "Role granted");
        }
        Ok(records.into_iter().next())
    }

    /// Revoke `role` from `account`. `None` if it did not hold the role.
    pub fn revoke_role(
        &self,
        caller: Address,
        account: Address,
        role: Role,
    ) -> Result<Option<AuditRecord>> {
        let records = self.administer(|state| {
            let changed = state.roles.revoke(caller, account, role)?;
            Ok(changed
                .then_some(PoolEvent::RoleRevoked {
                    actor: caller,
                    account,
                    role,
                })
                .into_iter()
                .collect())
        })?;
        if !records.is_empty() {
            tracing::info!(%caller, %account, %role, "Role revoked");
        }
        Ok(records.into_iter().next())
    }

    /// Drop `role` from the caller.
    pub fn renounce_role(&self, caller: Address, role: Role) -> Result<Option<AuditRecord>> {
        let records = self.administer(|state| {
            let changed = state.roles.renounce(caller, role);
            Ok(changed
                .then_some(PoolEvent::RoleRevoked {
                    actor: caller,
                    account: caller,
                    role,
                })
                .into_iter()
                .collect())
        })?;
        if !records.is_empty() {
            tracing::info!(%caller, %role, "Role renounced");
        }
        Ok(records.into_iter().next())
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn pool_balance(&self, asset: AssetId) -> Result<Amount> {
        self.read(|state| state.ledger.balance(asset))
    }

    pub fn is_supported(&self, asset: AssetId) -> Result<bool> {
        self.read(|state| state.assets.is_supported(asset))
    }

    /// Supported assets. Order is unstable across removals.
    pub fn list_supported_assets(&self) -> Result<Vec<AssetId>> {
        self.read(|state| state.assets.list().to_vec())
    }

    /// Pool balance of every supported asset, in enumeration order.
    pub fn get_all_balances(&self) -> Result<Vec<AssetBalance>> {
        self.read(|state| state.ledger.balances_of(state.assets.list()))
    }

    pub fn has_role(&self, account: Address, role: Role) -> Result<bool> {
        self.read(|state| state.roles.has_role(account, role))
    }

    pub fn is_paused(&self) -> Result<bool> {
        self.read(|state| state.pause.is_paused())
    }

    pub fn withdraw_limit(&self, asset: AssetId) -> Result<Amount> {
        self.read(|state| state.assets.withdraw_limit(asset))
    }

    /// Check `balance == credited - debited` for `asset`.
    pub fn verify_supply(&self, asset: AssetId) -> Result<()> {
        self.read(|state| state.ledger.verify_supply(asset))?
    }

    /// [`Self::verify_supply`] for every asset the ledger has touched.
    pub fn verify_all(&self) -> Result<()> {
        self.read(|state| state.ledger.verify_all())?
    }

    /// Every committed audit record, oldest first.
    pub fn audit_log(&self) -> Result<Vec<AuditRecord>> {
        self.read(|state| state.journal.records().to_vec())
    }

    /// Digest of the latest audit record.
    pub fn journal_head(&self) -> Result<[u8; 32]> {
        self.read(|state| state.journal.head())
    }

    pub fn verify_journal(&self) -> Result<()> {
        self.read(|state| state.journal.verify_chain())?
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Run a value-moving call atomically.
    ///
    /// `op` may only mutate the ledger; that is what gets checkpointed.
    fn transact<F>(&self, op: F) -> Result<Vec<AuditRecord>>
    where
        F: FnOnce(&mut PoolState, &dyn TransferGateway) -> Result<Vec<PoolEvent>>,
    {
        let mut state = self.state.enter()?;
        state.pause.check()?;

        let checkpoint = state.ledger.clone();
        let gateway = self.gateway.as_ref();
        gateway.begin();

        let outcome = op(&mut *state, gateway).and_then(|events| state.journal.append_all(events));
        match outcome {
            Ok(records) => {
                gateway.commit();
                tracing::debug!(
                    records = records.len(),
                    head = hex::encode(state.journal.head()),
                    "Call committed"
                );
                Ok(records)
            }
            Err(err) => {
                state.ledger = checkpoint;
                gateway.rollback();
                tracing::debug!(error = %err, "Call rolled back");
                Err(err)
            }
        }
    }

    /// Run an administrative call atomically. Not gated by pause.
    fn administer<F>(&self, op: F) -> Result<Vec<AuditRecord>>
    where
        F: FnOnce(&mut PoolState) -> Result<Vec<PoolEvent>>,
    {
        let mut state = self.state.enter()?;
        let roles = state.roles.clone();
        let assets = state.assets.clone();
        let pause = state.pause.clone();

        let outcome = op(&mut *state).and_then(|events| state.journal.append_all(events));
        if outcome.is_err() {
            state.roles = roles;
            state.assets = assets;
            state.pause = pause;
        }
        outcome
    }

    fn read<T>(&self, f: impl FnOnce(&PoolState) -> T) -> Result<T> {
        let state = self.state.enter()?;
        Ok(f(&*state))
    }
}

fn single(records: Vec<AuditRecord>) -> Result<AuditRecord> {
    records
        .into_iter()
        .next()
        .ok_or_else(|| PoolError::Internal("committed call produced no audit record".into()))
}

//! External value movement.
//!
//! [`TransferGateway`] is the only way value enters or leaves the pool.
//! It reports what the pool holds rather than what a transfer claimed to
//! move, so deposits can be credited by balance delta: some assets skim a
//! fee in transit and deliver less than requested.
//!
//! Every value-moving pool call runs inside a gateway *frame*. The pool
//! calls `begin` on entry, then `commit` on success or `rollback` on any
//! failure. Hosts that execute transfers inside an enclosing transaction
//! revert them in `rollback`; the defaults are no-ops.

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use poolkeep_types::{Address, Amount, AssetId, PoolError, Result, constants};

/// Transfer primitive for every asset kind, the native one included.
pub trait TransferGateway: Send + Sync {
    /// How much of `asset` the pool currently holds.
    fn held_balance(&self, asset: AssetId) -> Result<Amount>;

    /// Move `amount` of `asset` from `from` into the pool. The pool may
    /// end up holding less than `amount` more.
    fn pull(&self, asset: AssetId, from: Address, amount: Amount) -> Result<()>;

    /// Move `amount` of `asset` from the pool to `to`.
    fn push(&self, asset: AssetId, to: Address, amount: Amount) -> Result<()>;

    fn begin(&self) {}

    fn commit(&self) {}

    fn rollback(&self) {}
}

/// Pull `requested` of `asset` from `from` and return what the pool
/// actually received, measured as the change in its held balance.
///
/// # Errors
/// - `ZeroReceived` if the held balance did not grow
/// - `OverReceived` if it grew by more than `requested`
/// - any error from the pull itself
pub fn pull_measured(
    gateway: &dyn TransferGateway,
    asset: AssetId,
    from: Address,
    requested: Amount,
) -> Result<Amount> {
    let before = gateway.held_balance(asset)?;
    gateway.pull(asset, from, requested)?;
    let after = gateway.held_balance(asset)?;

    let received = after.saturating_sub(before);
    if received.is_zero() {
        return Err(PoolError::ZeroReceived { asset });
    }
    if received > requested {
        tracing::warn!(%asset, %from, %requested, %received, "Asset over-delivered on transfer-in");
        return Err(PoolError::OverReceived {
            asset,
            requested,
            received,
        });
    }
    if received < requested {
        tracing::debug!(%asset, %requested, %received, skimmed = %(requested - received), "Transfer fee skimmed");
    }
    Ok(received)
}

type Holdings = HashMap<(AssetId, Address), Amount>;

#[derive(Debug, Default)]
struct Book {
    holdings: Holdings,
    /// Per-asset transfer fee in basis points, burned in transit.
    fee_bps: HashMap<AssetId, u32>,
    /// Per-asset extra units minted to the receiver on pull.
    over_delivery: HashMap<AssetId, Amount>,
    /// Counterparties whose transfers always fail.
    blocked: HashSet<Address>,
    /// Open frame snapshots, innermost last.
    frames: Vec<Holdings>,
}

impl Book {
    fn held(&self, asset: AssetId, holder: Address) -> Amount {
        self.holdings.get(&(asset, holder)).copied().unwrap_or_default()
    }

    fn fee(&self, asset: AssetId, amount: Amount) -> Amount {
        let bps = Amount::from(self.fee_bps.get(&asset).copied().unwrap_or(0));
        let denom = Amount::from(constants::BPS_DENOMINATOR);
        // floor(amount * bps / denom) without overflowing the product.
        (amount / denom) * bps + (amount % denom) * bps / denom
    }

    fn move_units(
        &mut self,
        asset: AssetId,
        from: Address,
        to: Address,
        debit: Amount,
        credit: Amount,
    ) -> Result<()> {
        if self.blocked.contains(&from) || self.blocked.contains(&to) {
            return Err(PoolError::TransferFailed {
                asset,
                reason: "counterparty rejected transfer".into(),
            });
        }
        let source = self.held(asset, from);
        let remaining = source
            .checked_sub(debit)
            .ok_or_else(|| PoolError::TransferFailed {
                asset,
                reason: format!("{from} holds {source}, needs {debit}"),
            })?;
        let base = if from == to { remaining } else { self.held(asset, to) };
        let target = base
            .checked_add(credit)
            .ok_or_else(|| PoolError::TransferFailed {
                asset,
                reason: format!("{to} balance would exceed the amount range"),
            })?;
        self.holdings.insert((asset, from), remaining);
        self.holdings.insert((asset, to), target);
        Ok(())
    }
}

/// Process-local gateway over an in-memory holdings book.
///
/// Supports fee-on-transfer assets, over-delivering assets, and counterparties
/// whose transfers fail. Frames snapshot the whole book, so a rolled-back
/// call leaves every holder exactly where it started.
#[derive(Debug)]
pub struct InMemoryGateway {
    pool: Address,
    book: Mutex<Book>,
}

impl InMemoryGateway {
    /// Create a gateway where `pool` is the custodial account.
    #[must_use]
    pub fn new(pool: Address) -> Self {
        Self {
            pool,
            book: Mutex::new(Book::default()),
        }
    }

    /// The custodial account.
    #[must_use]
    pub fn pool_address(&self) -> Address {
        self.pool
    }

    /// Create `amount` of `asset` out of thin air for `holder`.
    ///
    /// # Errors
    /// `Configuration` if the holder's balance would pass `Amount::MAX`.
    pub fn mint(&self, asset: AssetId, holder: Address, amount: Amount) -> Result<()> {
        let mut book = self.book();
        let next = book
            .held(asset, holder)
            .checked_add(amount)
            .ok_or_else(|| {
                PoolError::Configuration(format!("minting {amount} of {asset} to {holder} exceeds the amount range"))
            })?;
        book.holdings.insert((asset, holder), next);
        Ok(())
    }

    /// What `holder` owns of `asset` in this book.
    #[must_use]
    pub fn balance_of(&self, asset: AssetId, holder: Address) -> Amount {
        self.book().held(asset, holder)
    }

    /// Skim `bps` basis points from every transfer of `asset`.
    ///
    /// # Errors
    /// `InvalidAsset` for the native asset, which never charges a fee;
    /// `Configuration` if `bps` exceeds 100%.
    pub fn set_transfer_fee(&self, asset: AssetId, bps: u32) -> Result<()> {
        if asset.is_native() {
            return Err(PoolError::InvalidAsset(asset));
        }
        if bps > constants::BPS_DENOMINATOR {
            return Err(PoolError::Configuration(format!("fee of {bps} bps exceeds 100%")));
        }
        self.book().fee_bps.insert(asset, bps);
        Ok(())
    }

    /// Make every pull of `asset` deliver `extra` units beyond the request.
    ///
    /// # Errors
    /// `InvalidAsset` for the native asset, which always delivers exactly
    /// what was sent.
    pub fn set_over_delivery(&self, asset: AssetId, extra: Amount) -> Result<()> {
        if asset.is_native() {
            return Err(PoolError::InvalidAsset(asset));
        }
        self.book().over_delivery.insert(asset, extra);
        Ok(())
    }

    /// Make every transfer to or from `account` fail.
    pub fn block(&self, account: Address) {
        self.book().blocked.insert(account);
    }

    pub fn unblock(&self, account: Address) {
        self.book().blocked.remove(&account);
    }

    /// Number of open frames.
    #[must_use]
    pub fn open_frames(&self) -> usize {
        self.book().frames.len()
    }

    fn book(&self) -> MutexGuard<'_, Book> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TransferGateway for InMemoryGateway {
    fn held_balance(&self, asset: AssetId) -> Result<Amount> {
        Ok(self.book().held(asset, self.pool))
    }

    fn pull(&self, asset: AssetId, from: Address, amount: Amount) -> Result<()> {
        let mut book = self.book();
        let fee = book.fee(asset, amount);
        let extra = book.over_delivery.get(&asset).copied().unwrap_or_default();
        let delivered = (amount - fee)
            .checked_add(extra)
            .ok_or_else(|| PoolError::TransferFailed {
                asset,
                reason: "delivery would exceed the amount range".into(),
            })?;
        tracing::debug!(%asset, %from, %amount, %fee, %extra, "gateway pull");
        book.move_units(asset, from, self.pool, amount, delivered)
    }

    fn push(&self, asset: AssetId, to: Address, amount: Amount) -> Result<()> {
        let mut book = self.book();
        let fee = book.fee(asset, amount);
        tracing::debug!(%asset, %to, %amount, %fee, "gateway push");
        book.move_units(asset, self.pool, to, amount, amount - fee)
    }

    fn begin(&self) {
        let mut book = self.book();
        let snapshot = book.holdings.clone();
        book.frames.push(snapshot);
    }

    fn commit(&self) {
        self.book().frames.pop();
    }

    fn rollback(&self) {
        let mut book = self.book();
        if let Some(snapshot) = book.frames.pop() {
            book.holdings = snapshot;
        }
    }
}

//! Scenario files: a pool config plus an ordered list of steps.
//!
//! ```json
//! {
//!   "pool": { "admin": "0x…", "native_withdraw_limit": 100 },
//!   "steps": [
//!     { "op": "mint", "asset": "native", "holder": "0x…", "amount": 1000 },
//!     { "op": "deposit_native", "caller": "0x…", "amount": "340282366920938463463374607431768211456" }
//!   ]
//! }
//! ```
//!
//! Amounts are JSON integers up to `u64::MAX`, or decimal / `0x`-hex strings
//! for anything larger.
//!
//! Fixture steps (`mint`, `set_fee`, `set_over_delivery`, `block`,
//! `unblock`) act on the in-memory gateway; every other step is a pool call.

use std::{path::Path, sync::Arc};

use anyhow::{Context, bail};
use poolkeep_ledger::InMemoryGateway;
use poolkeep_settlement::CustodyPool;
use poolkeep_types::{Address, Amount, AssetBalance, AssetId, AuditRecord, PoolConfig, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub pool: PoolConfig,
    /// Custodial account on the gateway. Defaults to `0xff…ff`.
    #[serde(default = "default_pool_address")]
    pub pool_address: Address,
    pub steps: Vec<Step>,
}

fn default_pool_address() -> Address {
    Address::from_bytes([0xff; 20])
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Mint {
        asset: AssetId,
        holder: Address,
        #[serde(with = "poolkeep_types::amount_serde")]
        amount: Amount,
    },
    SetFee {
        asset: AssetId,
        bps: u32,
    },
    SetOverDelivery {
        asset: AssetId,
        #[serde(with = "poolkeep_types::amount_serde")]
        extra: Amount,
    },
    Block {
        account: Address,
    },
    Unblock {
        account: Address,
    },
    DepositNative {
        caller: Address,
        #[serde(with = "poolkeep_types::amount_serde")]
        amount: Amount,
    },
    DepositAsset {
        caller: Address,
        asset: AssetId,
        #[serde(with = "poolkeep_types::amount_serde")]
        amount: Amount,
    },
    WithdrawNative {
        caller: Address,
        #[serde(with = "poolkeep_types::amount_serde")]
        amount: Amount,
        recipient: Address,
    },
    WithdrawAsset {
        caller: Address,
        asset: AssetId,
        #[serde(with = "poolkeep_types::amount_serde")]
        amount: Amount,
        recipient: Address,
    },
    BatchPayin {
        caller: Address,
        froms: Vec<Address>,
        assets: Vec<AssetId>,
        #[serde(with = "poolkeep_types::amount_serde::vec")]
        amounts: Vec<Amount>,
    },
    BatchPayout {
        caller: Address,
        recipients: Vec<Address>,
        assets: Vec<AssetId>,
        #[serde(with = "poolkeep_types::amount_serde::vec")]
        amounts: Vec<Amount>,
    },
    AddAsset {
        caller: Address,
        asset: AssetId,
    },
    RemoveAsset {
        caller: Address,
        asset: AssetId,
    },
    SetWithdrawLimit {
        caller: Address,
        asset: AssetId,
        #[serde(with = "poolkeep_types::amount_serde")]
        limit: Amount,
    },
    Pause {
        caller: Address,
    },
    Unpause {
        caller: Address,
    },
    GrantRole {
        caller: Address,
        account: Address,
        role: Role,
    },
    RevokeRole {
        caller: Address,
        account: Address,
        role: Role,
    },
    RenounceRole {
        caller: Address,
        role: Role,
    },
    ReceiveDirect {
        from: Address,
        #[serde(with = "poolkeep_types::amount_serde")]
        amount: Amount,
    },
}

impl Step {
    /// The `op` tag, for reports and logs.
    pub fn op(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::SetFee { .. } => "set_fee",
            Self::SetOverDelivery { .. } => "set_over_delivery",
            Self::Block { .. } => "block",
            Self::Unblock { .. } => "unblock",
            Self::DepositNative { .. } => "deposit_native",
            Self::DepositAsset { .. } => "deposit_asset",
            Self::WithdrawNative { .. } => "withdraw_native",
            Self::WithdrawAsset { .. } => "withdraw_asset",
            Self::BatchPayin { .. } => "batch_payin",
            Self::BatchPayout { .. } => "batch_payout",
            Self::AddAsset { .. } => "add_asset",
            Self::RemoveAsset { .. } => "remove_asset",
            Self::SetWithdrawLimit { .. } => "set_withdraw_limit",
            Self::Pause { .. } => "pause",
            Self::Unpause { .. } => "unpause",
            Self::GrantRole { .. } => "grant_role",
            Self::RevokeRole { .. } => "revoke_role",
            Self::RenounceRole { .. } => "renounce_role",
            Self::ReceiveDirect { .. } => "receive_direct",
        }
    }

    /// Apply the step. Returns how many audit records it committed.
    fn apply(&self, pool: &CustodyPool, gateway: &InMemoryGateway) -> poolkeep_types::Result<usize> {
        match self {
            Self::Mint {
                asset,
                holder,
                amount,
            } => gateway.mint(*asset, *holder, *amount).map(|()| 0),
            Self::SetFee { asset, bps } => gateway.set_transfer_fee(*asset, *bps).map(|()| 0),
            Self::SetOverDelivery { asset, extra } => {
                gateway.set_over_delivery(*asset, *extra).map(|()| 0)
            }
            Self::Block { account } => {
                gateway.block(*account);
                Ok(0)
            }
            Self::Unblock { account } => {
                gateway.unblock(*account);
                Ok(0)
            }
            Self::DepositNative { caller, amount } => {
                pool.deposit_native(*caller, *amount).map(|_| 1)
            }
            Self::DepositAsset {
                caller,
                asset,
                amount,
            } => pool.deposit_asset(*caller, *asset, *amount).map(|_| 1),
            Self::WithdrawNative {
                caller,
                amount,
                recipient,
            } => pool.withdraw_native(*caller, *amount, *recipient).map(|_| 1),
            Self::WithdrawAsset {
                caller,
                asset,
                amount,
                recipient,
            } => pool
                .withdraw_asset(*caller, *asset, *amount, *recipient)
                .map(|_| 1),
            Self::BatchPayin {
                caller,
                froms,
                assets,
                amounts,
            } => pool
                .batch_payin(*caller, froms, assets, amounts)
                .map(|records| records.len()),
            Self::BatchPayout {
                caller,
                recipients,
                assets,
                amounts,
            } => pool
                .batch_payout(*caller, recipients, assets, amounts)
                .map(|records| records.len()),
            Self::AddAsset { caller, asset } => pool.add_supported_asset(*caller, *asset).map(|_| 1),
            Self::RemoveAsset { caller, asset } => {
                pool.remove_supported_asset(*caller, *asset).map(|_| 1)
            }
            Self::SetWithdrawLimit {
                caller,
                asset,
                limit,
            } => pool.set_withdraw_limit(*caller, *asset, *limit).map(|_| 1),
            Self::Pause { caller } => pool.pause(*caller).map(|_| 1),
            Self::Unpause { caller } => pool.unpause(*caller).map(|_| 1),
            Self::GrantRole {
                caller,
                account,
                role,
            } => pool
                .grant_role(*caller, *account, *role)
                .map(|record| usize::from(record.is_some())),
            Self::RevokeRole {
                caller,
                account,
                role,
            } => pool
                .revoke_role(*caller, *account, *role)
                .map(|record| usize::from(record.is_some())),
            Self::RenounceRole { caller, role } => pool
                .renounce_role(*caller, *role)
                .map(|record| usize::from(record.is_some())),
            Self::ReceiveDirect { from, amount } => pool.receive_direct(*from, *amount).map(|()| 0),
        }
    }
}

/// What one step did.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: &'static str,
    pub ok: bool,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final state after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub steps: Vec<StepOutcome>,
    pub balances: Vec<AssetBalance>,
    pub paused: bool,
    pub journal_head: String,
    pub journal: Vec<AuditRecord>,
}

impl Report {
    #[must_use]
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.ok).count()
    }
}

impl Scenario {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let scenario: Self = serde_json::from_str(json)?;
        scenario.pool.validate()?;
        Ok(scenario)
    }

    /// Run every step against a fresh pool.
    ///
    /// A failing step is recorded and the replay continues, unless
    /// `fail_fast` is set.
    pub fn replay(&self, fail_fast: bool) -> anyhow::Result<Report> {
        let gateway = Arc::new(InMemoryGateway::new(self.pool_address));
        let pool = CustodyPool::initialize(self.pool.clone(), gateway.clone())
            .context("initializing pool")?;

        let mut steps = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let outcome = match step.apply(&pool, &gateway) {
                Ok(records) => StepOutcome {
                    index,
                    op: step.op(),
                    ok: true,
                    records,
                    error: None,
                },
                Err(err) => {
                    tracing::warn!(index, op = step.op(), error = %err, "Step failed");
                    if fail_fast {
                        bail!("step {index} ({}) failed: {err}", step.op());
                    }
                    StepOutcome {
                        index,
                        op: step.op(),
                        ok: false,
                        records: 0,
                        error: Some(err.to_string()),
                    }
                }
            };
            steps.push(outcome);
        }

        pool.verify_all().context("supply invariant")?;
        pool.verify_journal().context("journal chain")?;

        Ok(Report {
            steps,
            balances: pool.get_all_balances()?,
            paused: pool.is_paused()?,
            journal_head: hex::encode(pool.journal_head()?),
            journal: pool.audit_log()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use poolkeep_types::PoolEvent;

    use super::*;

    const OPERATOR_LIMIT: &str = include_str!("../scenarios/operator_limit.json");

    #[test]
    fn operator_limit_scenario_replays() {
        let scenario = Scenario::from_json_str(OPERATOR_LIMIT).unwrap();
        let report = scenario.replay(false).unwrap();

        assert_eq!(report.failed_steps(), 1);
        let failed = report.steps.iter().find(|s| !s.ok).unwrap();
        assert_eq!(failed.op, "withdraw_native");
        assert!(failed.error.as_deref().unwrap().starts_with("PK_ERR_401"));
        // 1000 in, 50 withdrawn, 150 paid out in the batch.
        assert_eq!(report.balances[0], AssetBalance::new(AssetId::NATIVE, Amount::from(800)));
        // 1% skimmed from each of the 1000 and 2000 pulls.
        assert_eq!(report.balances[1].amount, Amount::from(990 + 1_980));
        assert!(!report.paused);
        assert_eq!(report.journal.len(), 1 + 4 + 2 + 1);
    }

    #[test]
    fn fail_fast_stops_at_first_error() {
        let scenario = Scenario::from_json_str(OPERATOR_LIMIT).unwrap();
        let err = scenario.replay(true).unwrap_err();
        assert!(err.to_string().contains("withdraw_native"));
    }

    #[test]
    fn steps_parse_by_op_tag() {
        let json = r#"{ "op": "batch_payout", "caller": "0x0101010101010101010101010101010101010101",
                        "recipients": [], "assets": [], "amounts": [] }"#;
        let step: Step = serde_json::from_str(json).unwrap();
        assert_eq!(step.op(), "batch_payout");

        let json = r#"{ "op": "grant_role", "caller": "0x0101010101010101010101010101010101010101",
                        "account": "0x0202020202020202020202020202020202020202", "role": "OPERATOR" }"#;
        assert!(matches!(
            serde_json::from_str::<Step>(json).unwrap(),
            Step::GrantRole {
                role: Role::Operator,
                ..
            }
        ));
    }

    #[test]
    fn invalid_pool_config_is_rejected() {
        let json = r#"{ "pool": { "admin": "0x0000000000000000000000000000000000000000" }, "steps": [] }"#;
        assert!(Scenario::from_json_str(json).is_err());
    }

    #[test]
    fn amounts_beyond_u64_replay() {
        let json = r#"{
            "pool": {
                "admin": "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a",
                "native_withdraw_limit": "18446744073709551616"
            },
            "steps": [
                { "op": "mint", "asset": "native", "holder": "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a",
                  "amount": "340282366920938463463374607431768211456" },
                { "op": "deposit_native", "caller": "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a",
                  "amount": "340282366920938463463374607431768211456" },
                { "op": "withdraw_native", "caller": "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a",
                  "amount": "0x10000000000000000", "recipient": "0x0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c" },
                { "op": "batch_payout", "caller": "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a",
                  "recipients": ["0x0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c"], "assets": ["native"],
                  "amounts": [18446744073709551615] }
            ]
        }"#;
        let scenario = Scenario::from_json_str(json).unwrap();
        let two_pow_64 = Amount::from(u64::MAX) + Amount::from(1);
        assert_eq!(scenario.pool.native_withdraw_limit, two_pow_64);

        let report = scenario.replay(true).unwrap();
        assert_eq!(report.failed_steps(), 0);
        let deposited = two_pow_64 * two_pow_64;
        assert_eq!(
            report.balances[0].amount,
            deposited - two_pow_64 - Amount::from(u64::MAX)
        );
        assert!(matches!(
            report.journal[0].event,
            PoolEvent::WithdrawLimitSet { limit, .. } if limit == two_pow_64
        ));

        let out = serde_json::to_string(&report).unwrap();
        assert!(out.contains("\"340282366920938463463374607431768211456\""), "{out}");
    }

    #[test]
    fn native_over_delivery_step_fails() {
        let json = r#"{
            "pool": { "admin": "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a" },
            "steps": [ { "op": "set_over_delivery", "asset": "native", "extra": 1 } ]
        }"#;
        let report = Scenario::from_json_str(json).unwrap().replay(false).unwrap();
        assert_eq!(report.failed_steps(), 1);
        assert!(report.steps[0].error.as_deref().unwrap().starts_with("PK_ERR_200"));
    }
}

//! Withdrawal authorization.
//!
//! A pure decision over the caller's roles and the asset's operator limit,
//! evaluated before any ledger mutation:
//!
//! ```text
//! Admin                        → allow (no limit)
//! Operator, 0 < amount ≤ limit → allow
//! Operator, limit == 0         → deny LimitNotSet
//! Operator, amount > limit     → deny LimitExceeded
//! anyone else                  → deny MissingRole
//! ```

use poolkeep_types::{Address, Amount, AssetId, PoolError, Result, Role};

use crate::RoleRegistry;

/// Outcome of [`WithdrawalPolicy::authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalDecision {
    /// Allowed; `via` is the role that granted it.
    Allow { via: Role },
    Deny(DenyReason),
}

/// Why a withdrawal was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingRole,
    LimitNotSet,
    LimitExceeded { limit: Amount },
}

impl WithdrawalDecision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    /// Convert a denial into the matching [`PoolError`].
    pub fn into_result(self, caller: Address, asset: AssetId, amount: Amount) -> Result<Role> {
        match self {
            Self::Allow { via } => Ok(via),
            Self::Deny(DenyReason::MissingRole) => Err(PoolError::MissingRole {
                account: caller,
                role: Role::Operator,
            }),
            Self::Deny(DenyReason::LimitNotSet) => Err(PoolError::LimitNotSet(asset)),
            Self::Deny(DenyReason::LimitExceeded { limit }) => Err(PoolError::LimitExceeded {
                asset,
                requested: amount,
                limit,
            }),
        }
    }
}

/// Single-withdrawal authorization policy.
pub struct WithdrawalPolicy;

impl WithdrawalPolicy {
    /// Decide whether `caller` may withdraw `amount` of an asset whose
    /// operator limit is `limit`.
    #[must_use]
    pub fn authorize(
        roles: &RoleRegistry,
        caller: Address,
        amount: Amount,
        limit: Amount,
    ) -> WithdrawalDecision {
        if roles.has_role(caller, Role::Admin) {
            return WithdrawalDecision::Allow { via: Role::Admin };
        }
        if !roles.has_role(caller, Role::Operator) {
            return WithdrawalDecision::Deny(DenyReason::MissingRole);
        }
        if limit.is_zero() {
            return WithdrawalDecision::Deny(DenyReason::LimitNotSet);
        }
        if amount > limit {
            return WithdrawalDecision::Deny(DenyReason::LimitExceeded { limit });
        }
        WithdrawalDecision::Allow { via: Role::Operator }
    }

    /// [`Self::authorize`] followed by [`WithdrawalDecision::into_result`].
    pub fn check(
        roles: &RoleRegistry,
        caller: Address,
        asset: AssetId,
        amount: Amount,
        limit: Amount,
    ) -> Result<Role> {
        Self::authorize(roles, caller, amount, limit).into_result(caller, asset, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (RoleRegistry, Address, Address) {
        let admin = Address::random();
        let operator = Address::random();
        let mut roles = RoleRegistry::new(admin);
        roles.grant(admin, operator, Role::Operator).unwrap();
        (roles, admin, operator)
    }

    #[test]
    fn admin_ignores_limit() {
        let (roles, admin, _) = setup();
        for limit in [0, 1, 100] {
            let decision =
                WithdrawalPolicy::authorize(&roles, admin, Amount::from(1_000_000), Amount::from(limit));
            assert_eq!(decision, WithdrawalDecision::Allow { via: Role::Admin });
        }
    }

    #[test]
    fn operator_within_limit() {
        let (roles, _, operator) = setup();
        let limit = Amount::from(100);
        assert!(WithdrawalPolicy::authorize(&roles, operator, limit, limit).is_allowed());
        assert!(WithdrawalPolicy::authorize(&roles, operator, Amount::from(1), limit).is_allowed());
    }

    #[test]
    fn operator_over_limit() {
        let (roles, _, operator) = setup();
        let (requested, limit) = (Amount::from(101), Amount::from(100));
        let decision = WithdrawalPolicy::authorize(&roles, operator, requested, limit);
        assert_eq!(decision, WithdrawalDecision::Deny(DenyReason::LimitExceeded { limit }));
        let err = WithdrawalPolicy::check(&roles, operator, AssetId::NATIVE, requested, limit).unwrap_err();
        assert!(matches!(
            err,
            PoolError::LimitExceeded { requested: r, limit: l, .. } if r == requested && l == limit
        ));
    }

    #[test]
    fn operator_without_limit() {
        let (roles, _, operator) = setup();
        let err = WithdrawalPolicy::check(&roles, operator, AssetId::NATIVE, Amount::from(1), Amount::ZERO)
            .unwrap_err();
        assert!(matches!(err, PoolError::LimitNotSet(a) if a == AssetId::NATIVE));
    }

    #[test]
    fn stranger_denied() {
        let (roles, _, _) = setup();
        let decision =
            WithdrawalPolicy::authorize(&roles, Address::random(), Amount::from(1), Amount::from(100));
        assert_eq!(decision, WithdrawalDecision::Deny(DenyReason::MissingRole));

        // Role comes first: even a zero amount is refused for missing the role.
        let err = WithdrawalPolicy::check(&roles, Address::random(), AssetId::NATIVE, Amount::ZERO, Amount::ZERO)
            .unwrap_err();
        assert!(matches!(err, PoolError::MissingRole { role: Role::Operator, .. }));
    }

    #[test]
    fn operator_decision_boundary() {
        let (roles, _, operator) = setup();
        for limit in 0..5u64 {
            for amount in 1..8u64 {
                let allowed =
                    WithdrawalPolicy::authorize(&roles, operator, Amount::from(amount), Amount::from(limit))
                        .is_allowed();
                assert_eq!(allowed, limit > 0 && amount <= limit, "limit={limit} amount={amount}");
            }
        }
    }
}

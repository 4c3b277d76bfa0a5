//! Role membership.
//!
//! The configured admin holds every role from initialization. Only a
//! `DefaultAdmin` may grant or revoke; any holder may renounce its own role.

use std::collections::{BTreeSet, HashMap};

use poolkeep_types::{Address, PoolError, Result, Role};

/// Role membership per identity.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    members: HashMap<Address, BTreeSet<Role>>,
}

impl RoleRegistry {
    /// Create a registry where `admin` holds every role.
    #[must_use]
    pub fn new(admin: Address) -> Self {
        let mut members = HashMap::new();
        members.insert(admin, Role::ALL.into_iter().collect());
        Self { members }
    }

    #[must_use]
    pub fn has_role(&self, account: Address, role: Role) -> bool {
        self.members
            .get(&account)
            .is_some_and(|roles| roles.contains(&role))
    }

    /// Fail with `MissingRole` unless `account` holds `role`.
    pub fn require(&self, account: Address, role: Role) -> Result<()> {
        if self.has_role(account, role) {
            Ok(())
        } else {
            Err(PoolError::MissingRole { account, role })
        }
    }

    /// Fail with `MissingRole` unless `account` holds at least one of `roles`.
    /// The error names the last role in the list, the weakest one accepted.
    pub fn require_any(&self, account: Address, roles: &[Role]) -> Result<()> {
        if roles.iter().any(|role| self.has_role(account, *role)) {
            return Ok(());
        }
        let role = roles
            .last()
            .copied()
            .ok_or_else(|| PoolError::Internal("require_any called with no roles".into()))?;
        Err(PoolError::MissingRole { account, role })
    }

    /// Grant `role` to `account`. Returns whether membership changed.
    pub fn grant(&mut self, caller: Address, account: Address, role: Role) -> Result<bool> {
        self.require(caller, Role::DefaultAdmin)?;
        Ok(self.members.entry(account).or_default().insert(role))
    }

    /// Revoke `role` from `account`. Returns whether membership changed.
    pub fn revoke(&mut self, caller: Address, account: Address, role: Role) -> Result<bool> {
        self.require(caller, Role::DefaultAdmin)?;
        Ok(self.remove(account, role))
    }

    /// Drop `role` from the caller itself. Returns whether membership changed.
    pub fn renounce(&mut self, caller: Address, role: Role) -> bool {
        self.remove(caller, role)
    }

    fn remove(&mut self, account: Address, role: Role) -> bool {
        let Some(roles) = self.members.get_mut(&account) else {
            return false;
        };
        let removed = roles.remove(&role);
        if roles.is_empty() {
            self.members.remove(&account);
        }
        removed
    }
}

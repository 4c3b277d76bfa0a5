//! Access roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A role an identity may hold. Identities may hold any combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Authority over role membership only. Held by the configured admin.
    DefaultAdmin,
    /// Asset management, unlimited withdrawal, pause/unpause, limit-setting.
    Admin,
    /// Withdrawal bounded by per-asset limits, batch settlement.
    Operator,
}

impl Role {
    /// Every role, in grant order for the initial admin.
    pub const ALL: [Self; 3] = [Self::DefaultAdmin, Self::Admin, Self::Operator];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultAdmin => write!(f, "DEFAULT_ADMIN"),
            Self::Admin => write!(f, "ADMIN"),
            Self::Operator => write!(f, "OPERATOR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_display_matches_serde() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
        }
    }
}

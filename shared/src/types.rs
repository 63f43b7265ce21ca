//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// User roles recognized by the platform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    FactoryAdmin,
    Dealer,
    ServiceCenter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::FactoryAdmin => "factory_admin",
            Role::Dealer => "dealer",
            Role::ServiceCenter => "service_center",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "factory_admin" => Some(Role::FactoryAdmin),
            "dealer" => Some(Role::Dealer),
            "service_center" => Some(Role::ServiceCenter),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::FactoryAdmin, Role::Dealer, Role::ServiceCenter] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert_eq!(Role::from_str("admin"), None);
        assert_eq!(Role::from_str(""), None);
    }
}

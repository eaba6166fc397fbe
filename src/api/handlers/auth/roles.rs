//! Roles and the fixed role to permission mapping.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "moderator" => Ok(Self::Moderator),
            "user" => Ok(Self::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadOwnProfile,
    ReadEarthquakes,
    WriteEarthquakes,
    ReadUsers,
}

impl Permission {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadOwnProfile => "read:own-profile",
            Self::ReadEarthquakes => "read:earthquakes",
            Self::WriteEarthquakes => "write:earthquakes",
            Self::ReadUsers => "read:users",
        }
    }
}

const USER_PERMISSIONS: &[Permission] = &[Permission::ReadOwnProfile, Permission::ReadEarthquakes];

const MODERATOR_PERMISSIONS: &[Permission] = &[
    Permission::ReadOwnProfile,
    Permission::ReadEarthquakes,
    Permission::WriteEarthquakes,
    Permission::ReadUsers,
];

/// Whether `role` holds `permission`. Admin is a wildcard.
///
/// The mapping is fixed at compile time and never mutated at runtime.
#[must_use]
pub fn role_allows(role: Role, permission: Permission) -> bool {
    match role {
        Role::Admin => true,
        Role::Moderator => MODERATOR_PERMISSIONS.contains(&permission),
        Role::User => USER_PERMISSIONS.contains(&permission),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Admin, Role::Moderator, Role::User] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Role::Moderator).ok(),
            Some("\"moderator\"".to_string())
        );
    }

    #[test]
    fn admin_is_wildcard() {
        for permission in [
            Permission::ReadOwnProfile,
            Permission::ReadEarthquakes,
            Permission::WriteEarthquakes,
            Permission::ReadUsers,
        ] {
            assert!(role_allows(Role::Admin, permission));
        }
    }

    #[test]
    fn moderator_can_write_earthquakes_user_cannot() {
        assert!(role_allows(Role::Moderator, Permission::WriteEarthquakes));
        assert!(!role_allows(Role::User, Permission::WriteEarthquakes));
        assert!(!role_allows(Role::User, Permission::ReadUsers));
        assert!(role_allows(Role::User, Permission::ReadOwnProfile));
    }
}

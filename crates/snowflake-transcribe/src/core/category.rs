//! Object categories and their dependency order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TranscribeError};

/// A class of account objects replicated as one unit.
///
/// Variants are declared in creation order, and the derived `Ord` is that
/// order: anything a category can reference sorts before it. Rollback walks
/// the same order backwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ObjectCategory {
    /// Databases with their schemas, tables and views.
    Database,
    /// Users. The default role may not exist yet; Snowflake tolerates that.
    User,
    Role,
    Warehouse,
    /// Role granted to a user. Needs users and roles.
    UserRoleGrant,
    /// Role granted to another role. Needs roles.
    RoleRoleGrant,
    /// Privilege on a database object or warehouse granted to a role.
    RoleObjectGrant,
}

impl ObjectCategory {
    /// Every category, in creation order.
    pub const ALL: [ObjectCategory; 7] = [
        ObjectCategory::Database,
        ObjectCategory::User,
        ObjectCategory::Role,
        ObjectCategory::Warehouse,
        ObjectCategory::UserRoleGrant,
        ObjectCategory::RoleRoleGrant,
        ObjectCategory::RoleObjectGrant,
    ];

    /// Whether replicating this category creates objects that can be dropped.
    ///
    /// Grants exist only as long as the objects they connect, so they are not
    /// tracked in the rollback ledger.
    pub fn is_reversible(self) -> bool {
        matches!(
            self,
            ObjectCategory::Database
                | ObjectCategory::User
                | ObjectCategory::Role
                | ObjectCategory::Warehouse
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectCategory::Database => "databases",
            ObjectCategory::User => "users",
            ObjectCategory::Role => "roles",
            ObjectCategory::Warehouse => "warehouses",
            ObjectCategory::UserRoleGrant => "user_role_grants",
            ObjectCategory::RoleRoleGrant => "role_role_grants",
            ObjectCategory::RoleObjectGrant => "role_object_grants",
        }
    }
}

impl fmt::Display for ObjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectCategory {
    type Err = TranscribeError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ObjectCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized || c.as_str().trim_end_matches('s') == normalized)
            .ok_or_else(|| {
                TranscribeError::Config(format!(
                    "unknown object category '{}' (expected one of: {})",
                    s,
                    ObjectCategory::ALL.map(|c| c.as_str()).join(", ")
                ))
            })
    }
}

/// Object types a role-object grant may target.
///
/// Grants on anything else (account, integrations, functions, stages, ...)
/// are dropped before mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GrantObjectType {
    Warehouse,
    Database,
    Schema,
    Table,
    View,
}

impl GrantObjectType {
    /// Parse the catalog's `GRANTED_ON` value. Unsupported types yield `None`.
    pub fn parse(granted_on: &str) -> Option<Self> {
        match granted_on.trim().to_ascii_uppercase().as_str() {
            "WAREHOUSE" => Some(GrantObjectType::Warehouse),
            "DATABASE" => Some(GrantObjectType::Database),
            "SCHEMA" => Some(GrantObjectType::Schema),
            "TABLE" => Some(GrantObjectType::Table),
            "VIEW" => Some(GrantObjectType::View),
            _ => None,
        }
    }

    /// Keyword used in `GRANT ... ON <keyword> ...`.
    pub fn keyword(self) -> &'static str {
        match self {
            GrantObjectType::Warehouse => "WAREHOUSE",
            GrantObjectType::Database => "DATABASE",
            GrantObjectType::Schema => "SCHEMA",
            GrantObjectType::Table => "TABLE",
            GrantObjectType::View => "VIEW",
        }
    }
}

impl fmt::Display for GrantObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

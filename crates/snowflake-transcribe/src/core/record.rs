//! Raw catalog rows and the typed records built from them.
//!
//! Introspection returns flat, untyped rows whose column names differ in case
//! between `SHOW` listings (`name`) and account-usage views (`NAME`). Rows are
//! converted to one typed record per category at the catalog boundary; the
//! mapper never looks at a [`SourceRow`].

use serde::{Deserialize, Serialize};

use super::category::{GrantObjectType, ObjectCategory};
use crate::error::{Result, TranscribeError};

/// One row of an introspection result.
///
/// Column lookup is case-insensitive. Values are nullable text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRow {
    columns: Vec<(String, Option<String>)>,
}

impl SourceRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new();
        for (column, value) in pairs {
            row.push(column, value.map(Into::into));
        }
        row
    }

    pub fn push(&mut self, column: impl Into<String>, value: Option<String>) {
        self.columns.push((column.into(), value));
    }

    /// Value of a column, `None` when the column is absent or null.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .and_then(|(_, value)| value.as_deref())
    }

    /// Whether the column is present in the row (null or not).
    pub fn has_column(&self, column: &str) -> bool {
        self.columns
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(column))
    }

    /// Value of the first column.
    pub fn first(&self) -> Option<&str> {
        self.columns.first().and_then(|(_, value)| value.as_deref())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Required, non-null column value.
    fn required(&self, category: ObjectCategory, column: &str) -> Result<String> {
        if !self.has_column(column) {
            return Err(TranscribeError::catalog(
                category,
                format!("expected column {} not present in result", column),
            ));
        }
        match self.get(column) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(TranscribeError::catalog(
                category,
                format!("column {} is null or empty", column),
            )),
        }
    }

    /// Optional column value; empty strings count as null.
    fn optional(&self, column: &str) -> Option<String> {
        self.get(column)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// A database from `SHOW DATABASES`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseRecord {
    pub name: String,
}

impl DatabaseRecord {
    pub fn from_row(row: &SourceRow) -> Result<Self> {
        Ok(Self {
            name: row.required(ObjectCategory::Database, "name")?,
        })
    }
}

/// A role from `ACCOUNT_USAGE.ROLES`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub name: String,
}

impl RoleRecord {
    pub fn from_row(row: &SourceRow) -> Result<Self> {
        Ok(Self {
            name: row.required(ObjectCategory::Role, "NAME")?,
        })
    }
}

/// A user from `ACCOUNT_USAGE.USERS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub login_name: Option<String>,
    pub display_name: Option<String>,
    pub default_role: Option<String>,
    pub email: Option<String>,
}

impl UserRecord {
    pub fn from_row(row: &SourceRow) -> Result<Self> {
        Ok(Self {
            name: row.required(ObjectCategory::User, "NAME")?,
            login_name: row.optional("LOGIN_NAME"),
            display_name: row.optional("DISPLAY_NAME"),
            default_role: row.optional("DEFAULT_ROLE"),
            email: row.optional("EMAIL"),
        })
    }
}

/// A warehouse from `SHOW WAREHOUSES`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseRecord {
    pub name: String,
    pub size: String,
}

impl WarehouseRecord {
    pub fn from_row(row: &SourceRow) -> Result<Self> {
        Ok(Self {
            name: row.required(ObjectCategory::Warehouse, "name")?,
            size: row.required(ObjectCategory::Warehouse, "size")?,
        })
    }
}

/// A role granted to a user, from `ACCOUNT_USAGE.GRANTS_TO_USERS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleGrant {
    pub role: String,
    pub user: String,
}

impl UserRoleGrant {
    pub fn from_row(row: &SourceRow) -> Result<Self> {
        Ok(Self {
            role: row.required(ObjectCategory::UserRoleGrant, "ROLE")?,
            user: row.required(ObjectCategory::UserRoleGrant, "GRANTEE_NAME")?,
        })
    }
}

/// A role granted to another role, from `ACCOUNT_USAGE.GRANTS_TO_ROLES`
/// rows with `GRANTED_ON = 'ROLE'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRoleGrant {
    /// The role being granted.
    pub role: String,
    /// The role receiving it.
    pub grantee: String,
}

impl RoleRoleGrant {
    pub fn from_row(row: &SourceRow) -> Result<Self> {
        Ok(Self {
            role: row.required(ObjectCategory::RoleRoleGrant, "NAME")?,
            grantee: row.required(ObjectCategory::RoleRoleGrant, "GRANTEE_NAME")?,
        })
    }
}

/// A privilege on an object granted to a role.
///
/// `database` and `schema` hold the containing names for schema-scoped
/// objects; which of them is used depends on `object_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantEdge {
    pub privilege: String,
    pub object_type: GrantObjectType,
    pub name: String,
    pub schema: Option<String>,
    pub database: Option<String>,
    pub grantee: String,
}

impl GrantEdge {
    /// Build an edge from a `GRANTS_TO_ROLES` row.
    ///
    /// Returns `Ok(None)` for grants on unsupported object types.
    pub fn from_row(row: &SourceRow) -> Result<Option<Self>> {
        let granted_on = row.required(ObjectCategory::RoleObjectGrant, "GRANTED_ON")?;
        let Some(object_type) = GrantObjectType::parse(&granted_on) else {
            return Ok(None);
        };

        Ok(Some(Self {
            privilege: row.required(ObjectCategory::RoleObjectGrant, "PRIVILEGE")?,
            object_type,
            name: row.required(ObjectCategory::RoleObjectGrant, "NAME")?,
            schema: row.optional("TABLE_SCHEMA"),
            database: row.optional("TABLE_CATALOG"),
            grantee: row.required(ObjectCategory::RoleObjectGrant, "GRANTEE_NAME")?,
        }))
    }
}

//! Object mapper: typed catalog records to target statements.
//!
//! Each category has one pure mapping from its record type to a
//! [`StatementPair`]: a `CREATE OR REPLACE` (or `GRANT`) statement that
//! succeeds even when the object already exists, and an `IF EXISTS`-guarded
//! drop for categories that are rolled back.
//!
//! Adding a category means adding a record type and an [`ObjectMapping`]
//! impl; the engine drives every category through the same generic pass.

mod account;
mod ddl;
mod grant;

pub use ddl::{database_script, split_statements, DatabaseScript};

use crate::core::{ObjectCategory, StatementPair};
use crate::error::Result;

/// Placeholder password used when none is configured.
pub const DEFAULT_USER_PASSWORD: &str = "abc123";

/// Values the mappings need besides the record itself.
#[derive(Debug, Clone)]
pub struct MappingContext {
    /// Password set on every replicated user. Source authentication
    /// (SSO, key pairs) is never carried over.
    pub user_password: String,
}

impl Default for MappingContext {
    fn default() -> Self {
        Self {
            user_password: DEFAULT_USER_PASSWORD.to_string(),
        }
    }
}

/// Mapping of one record type to its statements.
pub trait ObjectMapping {
    /// Category the record belongs to.
    const CATEGORY: ObjectCategory;

    /// Human-readable object name for logs and reports.
    fn object_name(&self) -> String;

    /// Creation statement and, for reversible categories, its inverse.
    fn to_statements(&self, ctx: &MappingContext) -> Result<StatementPair>;
}

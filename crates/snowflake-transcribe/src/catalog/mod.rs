//! Catalog reader: introspection of the source account.
//!
//! Issues one read-only query per category and converts every row to its
//! typed record. A query failure or a row of unexpected shape fails the
//! whole category; no partial result is returned.

use tracing::debug;

use crate::core::identifier::{quote_ident, quote_literal};
use crate::core::{
    CatalogSource, DatabaseRecord, GrantEdge, ObjectCategory, RoleRecord, RoleRoleGrant,
    SourceRow, UserRecord, UserRoleGrant, WarehouseRecord,
};
use crate::error::{Result, TranscribeError};

const SHOW_DATABASES: &str = "SHOW DATABASES";

const SHOW_WAREHOUSES: &str = "SHOW WAREHOUSES";

const SELECT_ROLES: &str = "SELECT NAME FROM SNOWFLAKE.ACCOUNT_USAGE.ROLES \
     WHERE DELETED_ON IS NULL \
     ORDER BY CREATED_ON";

// The earliest-created user is the account's bootstrap user. It exists in
// every fresh account, so neither it nor its grants are read.
const SELECT_USERS: &str = "SELECT NAME, LOGIN_NAME, DISPLAY_NAME, DEFAULT_ROLE, EMAIL \
     FROM SNOWFLAKE.ACCOUNT_USAGE.USERS \
     WHERE DELETED_ON IS NULL \
     AND NAME NOT IN (SELECT NAME FROM SNOWFLAKE.ACCOUNT_USAGE.USERS \
     WHERE CREATED_ON = (SELECT MIN(CREATED_ON) FROM SNOWFLAKE.ACCOUNT_USAGE.USERS)) \
     ORDER BY CREATED_ON";

const SELECT_GRANTS_TO_USERS: &str = "SELECT ROLE, GRANTEE_NAME \
     FROM SNOWFLAKE.ACCOUNT_USAGE.GRANTS_TO_USERS \
     WHERE DELETED_ON IS NULL \
     AND GRANTEE_NAME NOT IN (SELECT NAME FROM SNOWFLAKE.ACCOUNT_USAGE.USERS \
     WHERE CREATED_ON = (SELECT MIN(CREATED_ON) FROM SNOWFLAKE.ACCOUNT_USAGE.USERS)) \
     ORDER BY CREATED_ON";

const SELECT_ROLE_GRANTS_TO_ROLES: &str = "SELECT NAME, GRANTEE_NAME \
     FROM SNOWFLAKE.ACCOUNT_USAGE.GRANTS_TO_ROLES \
     WHERE DELETED_ON IS NULL AND GRANTED_ON = 'ROLE' \
     ORDER BY CREATED_ON";

const SELECT_OBJECT_GRANTS_TO_ROLES: &str = "SELECT PRIVILEGE, GRANTED_ON, NAME, TABLE_CATALOG, \
     TABLE_SCHEMA, GRANTEE_NAME \
     FROM SNOWFLAKE.ACCOUNT_USAGE.GRANTS_TO_ROLES \
     WHERE DELETED_ON IS NULL AND GRANTED_TO = 'ROLE' AND GRANTED_ON <> 'ROLE' \
     ORDER BY CREATED_ON";

/// Role-object grants read from the catalog.
#[derive(Debug, Default)]
pub struct ObjectGrants {
    /// Grants on supported object types.
    pub edges: Vec<GrantEdge>,
    /// Grants on object types outside the supported set.
    pub unsupported: usize,
}

/// Typed view over a [`CatalogSource`].
pub struct CatalogReader<'a, S: CatalogSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: CatalogSource + ?Sized> CatalogReader<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    async fn fetch(&self, category: ObjectCategory, sql: &str) -> Result<Vec<SourceRow>> {
        debug!("Catalog query for {}: {}", category, sql);
        let rows = self
            .source
            .query(sql)
            .await
            .map_err(|e| as_catalog_error(category, e))?;
        debug!("Catalog returned {} {} rows", rows.len(), category);
        Ok(rows)
    }

    pub async fn databases(&self) -> Result<Vec<DatabaseRecord>> {
        let rows = self.fetch(ObjectCategory::Database, SHOW_DATABASES).await?;
        rows.iter().map(DatabaseRecord::from_row).collect()
    }

    /// Fully qualified creation DDL for one database.
    pub async fn database_ddl(&self, database: &str) -> Result<String> {
        // GET_DDL takes the name as a string; the quotes inside keep its case.
        let sql = format!(
            "SELECT GET_DDL('DATABASE', {}, TRUE)",
            quote_literal(&quote_ident(database)?)
        );
        debug!("Catalog query for {}: {}", ObjectCategory::Database, sql);
        self.source
            .query_scalar(&sql)
            .await
            .map_err(|e| as_catalog_error(ObjectCategory::Database, e))?
            .ok_or_else(|| {
                TranscribeError::catalog(
                    ObjectCategory::Database,
                    format!("GET_DDL returned no value for {}", database),
                )
            })
    }

    pub async fn roles(&self) -> Result<Vec<RoleRecord>> {
        let rows = self.fetch(ObjectCategory::Role, SELECT_ROLES).await?;
        rows.iter().map(RoleRecord::from_row).collect()
    }

    pub async fn users(&self) -> Result<Vec<UserRecord>> {
        let rows = self.fetch(ObjectCategory::User, SELECT_USERS).await?;
        rows.iter().map(UserRecord::from_row).collect()
    }

    pub async fn warehouses(&self) -> Result<Vec<WarehouseRecord>> {
        let rows = self.fetch(ObjectCategory::Warehouse, SHOW_WAREHOUSES).await?;
        rows.iter().map(WarehouseRecord::from_row).collect()
    }

    pub async fn user_role_grants(&self) -> Result<Vec<UserRoleGrant>> {
        let rows = self
            .fetch(ObjectCategory::UserRoleGrant, SELECT_GRANTS_TO_USERS)
            .await?;
        rows.iter().map(UserRoleGrant::from_row).collect()
    }

    pub async fn role_role_grants(&self) -> Result<Vec<RoleRoleGrant>> {
        let rows = self
            .fetch(ObjectCategory::RoleRoleGrant, SELECT_ROLE_GRANTS_TO_ROLES)
            .await?;
        rows.iter().map(RoleRoleGrant::from_row).collect()
    }

    pub async fn role_object_grants(&self) -> Result<ObjectGrants> {
        let rows = self
            .fetch(ObjectCategory::RoleObjectGrant, SELECT_OBJECT_GRANTS_TO_ROLES)
            .await?;

        let mut grants = ObjectGrants::default();
        for row in &rows {
            match GrantEdge::from_row(row)? {
                Some(edge) => grants.edges.push(edge),
                None => grants.unsupported += 1,
            }
        }
        Ok(grants)
    }
}

/// Attribute a transport failure to the category being read.
fn as_catalog_error(category: ObjectCategory, err: TranscribeError) -> TranscribeError {
    match err {
        TranscribeError::Catalog { .. } | TranscribeError::Connection { .. } => err,
        other => TranscribeError::catalog(category, other.to_string()),
    }
}

//! Transport capabilities the replication engine depends on.
//!
//! - [`CatalogSource`]: read-only queries against the source account
//! - [`TargetExecutor`]: statement execution against the target account
//!
//! The engine never talks to a driver directly, which keeps the ordering and
//! mapping logic testable with in-memory implementations.

use async_trait::async_trait;
use std::sync::Arc;

use super::record::SourceRow;
use crate::error::Result;

/// Read-only access to the source account.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Run a query and return every row of the result, in order.
    ///
    /// Must support `SHOW <objects>` listings as well as relational queries
    /// over the account-usage views.
    async fn query(&self, sql: &str) -> Result<Vec<SourceRow>>;

    /// Run a query returning a single text value (e.g. `GET_DDL`).
    ///
    /// Drivers that buffer rows with a bounded cell size should override
    /// this to fetch large values.
    async fn query_scalar(&self, sql: &str) -> Result<Option<String>> {
        let rows = self.query(sql).await?;
        Ok(rows
            .first()
            .and_then(|row| row.first())
            .map(str::to_string))
    }

    /// Account identifier this source reads from.
    fn account(&self) -> &str;

    /// Release the underlying connection.
    async fn close(&self);
}

/// Read-write access to the target account.
#[async_trait]
pub trait TargetExecutor: Send + Sync {
    /// Execute one statement. A rejected statement is returned as
    /// [`TranscribeError::Statement`](crate::error::TranscribeError::Statement).
    async fn execute(&self, sql: &str) -> Result<()>;

    /// Account identifier this executor writes to.
    fn account(&self) -> &str;

    /// Release the underlying connection.
    async fn close(&self);
}

#[async_trait]
impl<S: CatalogSource + ?Sized> CatalogSource for Arc<S> {
    async fn query(&self, sql: &str) -> Result<Vec<SourceRow>> {
        (**self).query(sql).await
    }

    async fn query_scalar(&self, sql: &str) -> Result<Option<String>> {
        (**self).query_scalar(sql).await
    }

    fn account(&self) -> &str {
        (**self).account()
    }

    async fn close(&self) {
        (**self).close().await
    }
}

#[async_trait]
impl<T: TargetExecutor + ?Sized> TargetExecutor for Arc<T> {
    async fn execute(&self, sql: &str) -> Result<()> {
        (**self).execute(sql).await
    }

    fn account(&self) -> &str {
        (**self).account()
    }

    async fn close(&self) {
        (**self).close().await
    }
}

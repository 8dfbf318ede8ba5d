//! Transport implementations of the core traits.
//!
//! - [`odbc`]: Snowflake over the Snowflake ODBC driver (feature `odbc`)
//!
//! The engine only sees [`CatalogSource`](crate::core::CatalogSource) and
//! [`TargetExecutor`](crate::core::TargetExecutor); [`connect`] opens both
//! accounts from a [`Config`] and hands back a ready session.

#[cfg(feature = "odbc")]
pub mod odbc;

use std::future::Future;

use crate::config::{AccountConfig, Config};
use crate::core::{CatalogSource, TargetExecutor};
use crate::engine::ReplicationSession;
use crate::error::Result;

#[cfg(feature = "odbc")]
pub use odbc::OdbcSnowflakeConnection as SnowflakeConnection;

#[cfg(not(feature = "odbc"))]
pub use disabled::SnowflakeConnection;

/// Session between two Snowflake accounts.
pub type SnowflakeSession = ReplicationSession<SnowflakeConnection, SnowflakeConnection>;

/// Connect to the source and target accounts of `config`.
#[cfg(feature = "odbc")]
pub async fn connect(config: &Config) -> Result<SnowflakeSession> {
    let driver = &config.replication.odbc_driver;
    open_session(config, |account| SnowflakeConnection::connect(account, driver)).await
}

/// Connect to the source and target accounts of `config`.
///
/// This build has no Snowflake transport, so this always fails.
#[cfg(not(feature = "odbc"))]
pub async fn connect(config: &Config) -> Result<SnowflakeSession> {
    Err(crate::error::TranscribeError::connection(
        &config.source.account,
        "built without Snowflake support; rebuild with `--features odbc` \
         (requires unixODBC and the Snowflake ODBC driver)",
    ))
}

/// Open the source, then the target, with `open`. When the target cannot be
/// opened the source connection is closed before the error is returned.
#[cfg_attr(not(feature = "odbc"), allow(dead_code))]
async fn open_session<'a, C, F, Fut>(
    config: &'a Config,
    open: F,
) -> Result<ReplicationSession<C, C>>
where
    C: CatalogSource + TargetExecutor,
    F: Fn(&'a AccountConfig) -> Fut,
    Fut: Future<Output = Result<C>>,
{
    let source = open(&config.source).await?;
    let target = match open(&config.target).await {
        Ok(target) => target,
        Err(e) => {
            CatalogSource::close(&source).await;
            return Err(e);
        }
    };
    Ok(ReplicationSession::from_config(source, target, config))
}

#[cfg(not(feature = "odbc"))]
mod disabled {
    use async_trait::async_trait;

    use crate::core::{CatalogSource, SourceRow, TargetExecutor};
    use crate::error::Result;

    /// Stand-in connection type for builds without a transport. It has no
    /// values, so a session over it can never be constructed.
    pub enum SnowflakeConnection {}

    #[async_trait]
    impl CatalogSource for SnowflakeConnection {
        async fn query(&self, _sql: &str) -> Result<Vec<SourceRow>> {
            match *self {}
        }

        fn account(&self) -> &str {
            match *self {}
        }

        async fn close(&self) {
            match *self {}
        }
    }

    #[async_trait]
    impl TargetExecutor for SnowflakeConnection {
        async fn execute(&self, _sql: &str) -> Result<()> {
            match *self {}
        }

        fn account(&self) -> &str {
            match *self {}
        }

        async fn close(&self) {
            match *self {}
        }
    }
}

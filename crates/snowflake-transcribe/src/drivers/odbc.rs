//! Snowflake connection over ODBC.
//!
//! **Requirements:**
//! - The `odbc` feature must be enabled
//! - unixODBC (Linux/macOS) and the Snowflake ODBC driver must be installed.
//!   The driver name defaults to `SnowflakeDSIIDriver` and can be changed with
//!   `replication.odbc_driver`.

use std::sync::OnceLock;

use async_trait::async_trait;
use odbc_api::{
    buffers::TextRowSet, Connection, ConnectionOptions, Cursor, Environment, ResultSetMetadata,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::{AccountConfig, AuthMethod};
use crate::core::{CatalogSource, SourceRow, TargetExecutor};
use crate::error::{Result, TranscribeError};

/// Rows fetched per round trip for catalog listings.
const BATCH_SIZE: usize = 1000;

/// Longest text value kept per cell for catalog listings.
const MAX_CELL_BYTES: usize = 4096;

/// Longest text value kept for single-value queries (`GET_DDL` output).
const MAX_SCALAR_BYTES: usize = 16 * 1024 * 1024;

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

fn environment() -> Result<&'static Environment> {
    if let Some(env) = ENVIRONMENT.get() {
        return Ok(env);
    }
    let env = Environment::new().map_err(|e| {
        TranscribeError::connection(
            "",
            format!(
                "Failed to create ODBC environment: {}. \
                 Make sure unixODBC and the Snowflake ODBC driver are installed.",
                e
            ),
        )
    })?;
    Ok(ENVIRONMENT.get_or_init(|| env))
}

/// Wrap a connection-string value in braces so `;` and `=` survive.
fn braced(value: &str) -> String {
    format!("{{{}}}", value.replace('}', "}}"))
}

/// ODBC connection string for one account.
fn connection_string(config: &AccountConfig, driver: &str) -> String {
    let mut attributes = format!(
        "Driver={};Server={};UID={};Warehouse={};Role={};",
        braced(driver),
        braced(&config.host()),
        braced(&config.user),
        braced(&config.warehouse),
        braced(&config.role),
    );

    match config.auth {
        AuthMethod::Password => {
            let password = config.password.as_deref().unwrap_or_default();
            attributes.push_str(&format!("PWD={};", braced(password)));
        }
        AuthMethod::KeyPair => {
            let key_file = config
                .private_key_file
                .as_deref()
                .map(|p| p.to_string_lossy())
                .unwrap_or_default();
            attributes.push_str(&format!(
                "AUTHENTICATOR=SNOWFLAKE_JWT;PRIV_KEY_FILE={};",
                braced(&key_file)
            ));
            if let Some(passphrase) = &config.private_key_passphrase {
                attributes.push_str(&format!("PRIV_KEY_FILE_PWD={};", braced(passphrase)));
            }
        }
    }
    attributes
}

/// One long-lived session with a Snowflake account.
///
/// Implements both [`CatalogSource`] and [`TargetExecutor`]. ODBC handles
/// are not safe for concurrent use, so every call holds the connection lock.
pub struct OdbcSnowflakeConnection {
    account: String,
    conn: Mutex<Option<Connection<'static>>>,
}

impl OdbcSnowflakeConnection {
    /// Open a session for `config` through the named ODBC driver.
    pub async fn connect(config: &AccountConfig, driver: &str) -> Result<Self> {
        let env = environment()?;
        let connection_string = connection_string(config, driver);

        debug!(
            "ODBC connection string (credentials hidden): Driver={{{}}};Server={};UID={};Warehouse={};Role={};auth={}",
            driver,
            config.host(),
            config.user,
            config.warehouse,
            config.role,
            config.auth
        );

        let conn = env
            .connect_with_connection_string(&connection_string, ConnectionOptions::default())
            .map_err(|e| {
                TranscribeError::connection(
                    &config.account,
                    format!(
                        "{}. Check the account identifier, credentials and that the {} driver is registered.",
                        e, driver
                    ),
                )
            })?;

        info!(
            "Connected to Snowflake account {} as {} (role {}, warehouse {}, {} auth)",
            config.account, config.user, config.role, config.warehouse, config.auth
        );

        Ok(Self {
            account: config.account.clone(),
            conn: Mutex::new(Some(conn)),
        })
    }

    fn closed(&self) -> TranscribeError {
        TranscribeError::connection(&self.account, "connection is closed")
    }

    /// Run a query and collect every row with its column names.
    async fn fetch(&self, sql: &str, batch_size: usize, max_cell: usize) -> Result<Vec<SourceRow>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(|| self.closed())?;

        let mut rows = Vec::new();
        let cursor = conn
            .execute(sql, ())
            .map_err(|e| TranscribeError::statement(sql, e.to_string()))?;

        if let Some(mut cursor) = cursor {
            let num_cols = cursor
                .num_result_cols()
                .map_err(|e| TranscribeError::statement(sql, e.to_string()))?
                as u16;

            let mut columns = Vec::with_capacity(num_cols as usize);
            for col in 1..=num_cols {
                let name = cursor
                    .col_name(col)
                    .map_err(|e| TranscribeError::statement(sql, e.to_string()))?;
                columns.push(name);
            }

            let mut buffers = TextRowSet::for_cursor(batch_size, &mut cursor, Some(max_cell))
                .map_err(|e| TranscribeError::statement(sql, e.to_string()))?;
            let mut row_cursor = cursor
                .bind_buffer(&mut buffers)
                .map_err(|e| TranscribeError::statement(sql, e.to_string()))?;

            while let Some(batch) = row_cursor
                .fetch()
                .map_err(|e| TranscribeError::statement(sql, e.to_string()))?
            {
                for row_idx in 0..batch.num_rows() {
                    let mut row = SourceRow::new();
                    for (col_idx, name) in columns.iter().enumerate() {
                        let value = batch
                            .at(col_idx, row_idx)
                            .map(|bytes| String::from_utf8_lossy(bytes).to_string());
                        row.push(name.clone(), value);
                    }
                    rows.push(row);
                }
            }
        }

        Ok(rows)
    }
}

#[async_trait]
impl CatalogSource for OdbcSnowflakeConnection {
    async fn query(&self, sql: &str) -> Result<Vec<SourceRow>> {
        self.fetch(sql, BATCH_SIZE, MAX_CELL_BYTES).await
    }

    async fn query_scalar(&self, sql: &str) -> Result<Option<String>> {
        let rows = self.fetch(sql, 1, MAX_SCALAR_BYTES).await?;
        Ok(rows
            .first()
            .and_then(|row| row.first())
            .map(str::to_string))
    }

    fn account(&self) -> &str {
        &self.account
    }

    async fn close(&self) {
        if self.conn.lock().await.take().is_some() {
            debug!("Closed connection to {}", self.account);
        }
    }
}

#[async_trait]
impl TargetExecutor for OdbcSnowflakeConnection {
    async fn execute(&self, sql: &str) -> Result<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(|| self.closed())?;
        conn.execute(sql, ())
            .map_err(|e| TranscribeError::statement(sql, e.to_string()))?;
        Ok(())
    }

    fn account(&self) -> &str {
        &self.account
    }

    async fn close(&self) {
        CatalogSource::close(self).await
    }
}

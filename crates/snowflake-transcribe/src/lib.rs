//! # snowflake-transcribe
//!
//! Metadata replication between two Snowflake accounts.
//!
//! This library reads the object catalog of a source account and recreates
//! it in a target account:
//!
//! - **Databases** with their schemas, tables and views, from `GET_DDL`
//! - **Users**, **roles** and **warehouses**
//! - **Grants**: roles to users, roles to roles (opt-in) and privileges on
//!   warehouses, databases, schemas, tables and views to roles
//!
//! Categories run in dependency order. Every object created is tracked in a
//! rollback ledger so the run can be torn down again in reverse order.
//!
//! ## Example
//!
//! ```rust,no_run
//! use snowflake_transcribe::{drivers, Config};
//!
//! #[tokio::main]
//! async fn main() -> snowflake_transcribe::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let mut session = drivers::connect(&config).await?;
//!     let report = session.copy_account().await?;
//!     println!("{} statements executed", report.total_created());
//!     session.close().await;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod core;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod target;

#[cfg(test)]
mod testing;

// Re-exports for convenient access
pub use crate::core::{CatalogSource, ObjectCategory, Statement, TargetExecutor};
pub use config::{AccountConfig, AuthMethod, Config, ErrorPolicy, ReplicationConfig};
pub use engine::{
    CategoryOutcome, HealthCheckResult, InterruptedPass, ReplicationReport, ReplicationSession,
    RollbackLedger, RollbackReport, RunStatus,
};
pub use error::{Result, TranscribeError};

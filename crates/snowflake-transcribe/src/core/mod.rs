//! Core abstractions shared by the catalog reader, mapper and engine.
//!
//! - [`category`]: object categories and their creation order
//! - [`record`]: raw catalog rows and the typed records built from them
//! - [`statement`]: statement builder with quoting and redaction rules
//! - [`identifier`]: identifier validation and quoting
//! - [`traits`]: transport capabilities for the source and target accounts

pub mod category;
pub mod identifier;
pub mod record;
pub mod statement;
pub mod traits;

pub use category::{GrantObjectType, ObjectCategory};
pub use record::{
    DatabaseRecord, GrantEdge, RoleRecord, RoleRoleGrant, SourceRow, UserRecord, UserRoleGrant,
    WarehouseRecord,
};
pub use statement::{Statement, StatementBuilder, StatementPair};
pub use traits::{CatalogSource, TargetExecutor};

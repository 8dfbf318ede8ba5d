//! Statement submission to the target account.
//!
//! Wraps a [`TargetExecutor`] so every statement is logged with its secrets
//! masked and every result becomes a [`StatementOutcome`]. A rejected
//! statement is never an `Err` here; the caller decides whether it ends the
//! run.

use tracing::{info, warn};

use crate::core::{ObjectCategory, Statement, TargetExecutor};
use crate::engine::{StatementOutcome, StatementStatus};
use crate::error::TranscribeError;

/// Submits statements one at a time, or only plans them in dry-run mode.
pub struct StatementRunner<'a, T: TargetExecutor + ?Sized> {
    target: &'a T,
    dry_run: bool,
}

impl<'a, T: TargetExecutor + ?Sized> StatementRunner<'a, T> {
    pub fn new(target: &'a T, dry_run: bool) -> Self {
        Self { target, dry_run }
    }

    /// Execute one statement and report what happened.
    pub async fn run(
        &self,
        category: ObjectCategory,
        object: &str,
        statement: &Statement,
    ) -> StatementOutcome {
        let sql = statement.display_text().to_string();

        if self.dry_run {
            info!("[{}] planned: {}", category, sql);
            return StatementOutcome {
                object: object.to_string(),
                sql,
                status: StatementStatus::Planned,
            };
        }

        match self.target.execute(statement.sql()).await {
            Ok(()) => {
                info!("[{}] {}", category, sql);
                StatementOutcome {
                    object: object.to_string(),
                    sql,
                    status: StatementStatus::Executed,
                }
            }
            Err(e) => {
                let error = failure_message(e);
                warn!("[{}] failed on {}: {}\n  SQL: {}", category, object, error, sql);
                StatementOutcome {
                    object: object.to_string(),
                    sql,
                    status: StatementStatus::Failed { error },
                }
            }
        }
    }
}

/// The platform's message without the statement text, which may hold a
/// password.
pub fn failure_message(err: TranscribeError) -> String {
    match err {
        TranscribeError::Statement { message, .. } => message,
        other => other.to_string(),
    }
}

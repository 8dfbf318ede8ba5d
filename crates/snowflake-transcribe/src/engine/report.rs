//! Per-statement, per-category and per-run outcome reports.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ObjectCategory;
use crate::error::{Result, TranscribeError};

/// What happened to one statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatementStatus {
    /// Accepted by the target account.
    Executed,
    /// Generated but not submitted (dry run).
    Planned,
    /// Rejected by the target, or the record could not be mapped.
    Failed { error: String },
}

/// One generated statement and its result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementOutcome {
    /// Object the statement belongs to.
    pub object: String,
    /// Statement text with secrets masked. Empty when mapping failed.
    pub sql: String,
    #[serde(flatten)]
    pub status: StatementStatus,
}

impl StatementOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, StatementStatus::Failed { .. })
    }
}

/// Summary of one category pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryOutcome {
    pub category: ObjectCategory,
    /// Statements accepted by the target.
    pub created: usize,
    /// Statements rejected, plus records that could not be mapped.
    pub failed: usize,
    /// Statements generated without executing (dry run).
    pub planned: usize,
    /// Rows skipped because they name a reserved/system object.
    pub skipped_reserved: usize,
    /// Grant rows skipped because their object type is not supported.
    pub skipped_unsupported: usize,
    /// Inverse statements for the objects this pass created (or would create).
    pub drops: Vec<String>,
    pub statements: Vec<StatementOutcome>,
}

impl CategoryOutcome {
    pub fn new(category: ObjectCategory) -> Self {
        Self {
            category,
            created: 0,
            failed: 0,
            planned: 0,
            skipped_reserved: 0,
            skipped_unsupported: 0,
            drops: Vec::new(),
            statements: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: StatementOutcome) {
        match outcome.status {
            StatementStatus::Executed => self.created += 1,
            StatementStatus::Planned => self.planned += 1,
            StatementStatus::Failed { .. } => self.failed += 1,
        }
        self.statements.push(outcome);
    }

    /// Objects (statements) that failed, for the summary.
    pub fn failures(&self) -> impl Iterator<Item = &StatementOutcome> {
        self.statements.iter().filter(|s| s.is_failed())
    }
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    CompletedWithErrors,
    DryRun,
}

/// Result of a `copy_account` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationReport {
    /// Unique run identifier.
    pub run_id: String,
    pub status: RunStatus,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub categories: Vec<CategoryOutcome>,
}

impl ReplicationReport {
    pub fn new(run_id: String, started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            run_id,
            status: if dry_run {
                RunStatus::DryRun
            } else {
                RunStatus::Completed
            },
            dry_run,
            started_at,
            completed_at: started_at,
            duration_seconds: 0.0,
            categories: Vec::new(),
        }
    }

    /// Stamp completion time and derive the final status.
    pub fn finish(&mut self) {
        self.completed_at = Utc::now();
        self.duration_seconds =
            (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0;
        if !self.dry_run && self.total_failed() > 0 {
            self.status = RunStatus::CompletedWithErrors;
        }
    }

    pub fn total_created(&self) -> usize {
        self.categories.iter().map(|c| c.created).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.categories.iter().map(|c| c.failed).sum()
    }

    pub fn category(&self, category: ObjectCategory) -> Option<&CategoryOutcome> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Result of replaying the rollback ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollbackReport {
    pub dropped: usize,
    pub failed: usize,
    pub planned: usize,
    pub statements: Vec<StatementOutcome>,
}

impl RollbackReport {
    pub fn push(&mut self, outcome: StatementOutcome) {
        match outcome.status {
            StatementStatus::Executed => self.dropped += 1,
            StatementStatus::Planned => self.planned += 1,
            StatementStatus::Failed { .. } => self.failed += 1,
        }
        self.statements.push(outcome);
    }

    /// `Err` when any drop statement failed.
    pub fn ensure_success(&self) -> Result<()> {
        if self.failed > 0 {
            return Err(TranscribeError::Rollback(format!(
                "{} of {} drop statements failed",
                self.failed,
                self.statements.len()
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Connectivity of one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointHealth {
    pub account: String,
    pub connected: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EndpointHealth {
    pub fn up(account: &str, elapsed: Duration) -> Self {
        Self {
            account: account.to_string(),
            connected: true,
            latency_ms: elapsed.as_millis() as u64,
            error: None,
        }
    }

    pub fn down(account: &str, elapsed: Duration, err: TranscribeError) -> Self {
        Self {
            account: account.to_string(),
            connected: false,
            latency_ms: elapsed.as_millis() as u64,
            error: Some(err.to_string()),
        }
    }
}

/// Result of probing both accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub healthy: bool,
    pub source: EndpointHealth,
    pub target: EndpointHealth,
}

impl HealthCheckResult {
    pub fn new(source: EndpointHealth, target: EndpointHealth) -> Self {
        Self {
            healthy: source.connected && target.connected,
            source,
            target,
        }
    }
}

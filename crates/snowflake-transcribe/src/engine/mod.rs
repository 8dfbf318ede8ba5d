//! Replication engine: drives every category from source to target.
//!
//! A [`ReplicationSession`] owns one connection per account. Categories run
//! in dependency order (see [`ObjectCategory`]) and each pass follows the
//! same steps: read the catalog, drop reserved names, map each record to
//! statements and submit them in catalog order. When a pass ends, the drops
//! for the objects it created go to the [`RollbackLedger`]. A pass stopped by
//! the abort policy never reaches the ledger; its drops are kept as an
//! [`InterruptedPass`] instead.

mod ledger;
mod report;
mod reserved;
mod rollback;


pub use ledger::{InterruptedPass, RollbackLedger};
pub use report::{
    CategoryOutcome, EndpointHealth, HealthCheckResult, ReplicationReport, RollbackReport,
    RunStatus, StatementOutcome, StatementStatus,
};
pub use reserved::{ReservedNames, SYSTEM_DATABASES, SYSTEM_ROLES, SYSTEM_USERS};

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::catalog::CatalogReader;
use crate::config::{Config, ErrorPolicy, ReplicationConfig};
use crate::core::{CatalogSource, ObjectCategory, Statement, TargetExecutor};
use crate::error::{Result, TranscribeError};
use crate::mapper::{database_script, MappingContext, ObjectMapping};
use crate::target::StatementRunner;

/// Query used to check the source connection.
const SOURCE_PROBE: &str = "SELECT CURRENT_ACCOUNT()";

/// Statement used to check the target connection.
const TARGET_PROBE: &str = "SELECT 1";

/// One replication session between a source and a target account.
pub struct ReplicationSession<S: CatalogSource, T: TargetExecutor> {
    source: S,
    target: T,
    options: ReplicationConfig,
    reserved: ReservedNames,
    mapping: MappingContext,
    ledger: RollbackLedger,
    interrupted: Option<InterruptedPass>,
    run_id: String,
}

/// State of one category pass while it runs.
struct Pass {
    outcome: CategoryOutcome,
    drops: Vec<Statement>,
}

impl Pass {
    fn new(category: ObjectCategory) -> Self {
        Self {
            outcome: CategoryOutcome::new(category),
            drops: Vec::new(),
        }
    }

    fn category(&self) -> ObjectCategory {
        self.outcome.category
    }
}

impl<S: CatalogSource, T: TargetExecutor> ReplicationSession<S, T> {
    /// Create a session over already-open connections.
    pub fn new(source: S, target: T, options: ReplicationConfig, reserved: ReservedNames) -> Self {
        let mapping = MappingContext {
            user_password: options.default_password.clone(),
        };
        Self {
            source,
            target,
            options,
            reserved,
            mapping,
            ledger: RollbackLedger::new(),
            interrupted: None,
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Create a session using the replication options and reserved names of
    /// `config`.
    pub fn from_config(source: S, target: T, config: &Config) -> Self {
        Self::new(
            source,
            target,
            config.replication.clone(),
            ReservedNames::from_config(config),
        )
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn options(&self) -> &ReplicationConfig {
        &self.options
    }

    /// Drops recorded so far in this run.
    pub fn ledger(&self) -> &RollbackLedger {
        &self.ledger
    }

    /// The pass the abort policy stopped last, if it had created anything.
    pub fn interrupted(&self) -> Option<&InterruptedPass> {
        self.interrupted.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// Categories `copy_account` runs, in order.
    pub fn plan(&self) -> Vec<ObjectCategory> {
        ObjectCategory::ALL
            .into_iter()
            .filter(|c| *c != ObjectCategory::RoleRoleGrant || self.options.include_role_role_grants)
            .collect()
    }

    /// Replicate every category in dependency order.
    ///
    /// Starts a new run: the ledger and any interrupted pass are cleared
    /// first. A statement rejected by
    /// the target is recorded in the report and the run goes on, unless the
    /// error policy is `abort`. A catalog read failure stops the run; ledger
    /// entries of the categories already finished are kept.
    pub async fn copy_account(&mut self) -> Result<ReplicationReport> {
        self.run_id = uuid::Uuid::new_v4().to_string();
        self.ledger.clear();
        self.interrupted = None;

        let mut report = ReplicationReport::new(self.run_id.clone(), Utc::now(), self.options.dry_run);
        info!(
            "Starting account copy {} -> {} (run {}{})",
            self.source.account(),
            self.target.account(),
            self.run_id,
            if self.options.dry_run { ", dry run" } else { "" }
        );

        for category in self.plan() {
            match self.replicate(category).await {
                Ok(outcome) => report.categories.push(outcome),
                Err(e) => {
                    error!("Account copy stopped during {}: {}", category, e);
                    return Err(e);
                }
            }
        }

        report.finish();
        info!(
            "Account copy {:?}: {} statements executed, {} failed in {:.1}s",
            report.status,
            report.total_created(),
            report.total_failed(),
            report.duration_seconds
        );
        Ok(report)
    }

    /// Replicate one category.
    pub async fn replicate(&mut self, category: ObjectCategory) -> Result<CategoryOutcome> {
        match category {
            ObjectCategory::Database => self.database_objects().await,
            ObjectCategory::User => self.users().await,
            ObjectCategory::Role => self.roles().await,
            ObjectCategory::Warehouse => self.warehouses().await,
            ObjectCategory::UserRoleGrant => self.user_role_grants().await,
            ObjectCategory::RoleRoleGrant => self.role_role_grants().await,
            ObjectCategory::RoleObjectGrant => self.role_object_grants().await,
        }
    }

    /// Recreate every non-system database with its schemas, tables and views.
    ///
    /// All DDL is read before anything is executed. The database's drop goes
    /// to the ledger only when its leading `create database` statement
    /// succeeded.
    pub async fn database_objects(&mut self) -> Result<CategoryOutcome> {
        let mut pass = self.start(ObjectCategory::Database);

        let mut scripts = Vec::new();
        {
            let reader = CatalogReader::new(&self.source);
            for database in reader.databases().await? {
                if self.reserved.is_database(&database.name) {
                    debug!("Skipping reserved database {}", database.name);
                    pass.outcome.skipped_reserved += 1;
                    continue;
                }
                let ddl = reader.database_ddl(&database.name).await?;
                scripts.push((database, ddl));
            }
        }

        for (database, ddl) in scripts {
            let script = match database_script(&database, &ddl) {
                Ok(script) => script,
                Err(e) => {
                    self.mapping_failure(&mut pass, &database.name, e)?;
                    continue;
                }
            };

            for (i, statement) in script.statements.iter().enumerate() {
                let result = self
                    .runner()
                    .run(pass.category(), &script.name, statement)
                    .await;
                let drop = (i == 0).then(|| script.drop.clone());
                self.settle(&mut pass, result, drop)?;
            }
        }

        Ok(self.finish(pass))
    }

    /// Recreate users with a placeholder password.
    pub async fn users(&mut self) -> Result<CategoryOutcome> {
        let pass = self.start(ObjectCategory::User);
        let records = CatalogReader::new(&self.source).users().await?;
        let reserved = &self.reserved;
        let (records, skipped) = retain_unreserved(records, |u| reserved.is_user(&u.name));
        self.apply(pass, records, skipped).await
    }

    pub async fn roles(&mut self) -> Result<CategoryOutcome> {
        let pass = self.start(ObjectCategory::Role);
        let records = CatalogReader::new(&self.source).roles().await?;
        let reserved = &self.reserved;
        let (records, skipped) = retain_unreserved(records, |r| reserved.is_role(&r.name));
        self.apply(pass, records, skipped).await
    }

    /// Recreate warehouses at their source size, initially suspended.
    pub async fn warehouses(&mut self) -> Result<CategoryOutcome> {
        let pass = self.start(ObjectCategory::Warehouse);
        let records = CatalogReader::new(&self.source).warehouses().await?;
        let reserved = &self.reserved;
        let (records, skipped) = retain_unreserved(records, |w| reserved.is_warehouse(&w.name));
        self.apply(pass, records, skipped).await
    }

    pub async fn user_role_grants(&mut self) -> Result<CategoryOutcome> {
        let pass = self.start(ObjectCategory::UserRoleGrant);
        let records = CatalogReader::new(&self.source).user_role_grants().await?;
        let reserved = &self.reserved;
        let (records, skipped) = retain_unreserved(records, |g| reserved.skips_user_role_grant(g));
        self.apply(pass, records, skipped).await
    }

    /// Grants between two system roles already exist in every account and
    /// are skipped, as are grants naming an ignored role.
    pub async fn role_role_grants(&mut self) -> Result<CategoryOutcome> {
        let pass = self.start(ObjectCategory::RoleRoleGrant);
        let records = CatalogReader::new(&self.source).role_role_grants().await?;
        let reserved = &self.reserved;
        let (records, skipped) = retain_unreserved(records, |g| reserved.skips_role_role_grant(g));
        self.apply(pass, records, skipped).await
    }

    /// Privileges on warehouses, databases, schemas, tables and views.
    pub async fn role_object_grants(&mut self) -> Result<CategoryOutcome> {
        let mut pass = self.start(ObjectCategory::RoleObjectGrant);
        let grants = CatalogReader::new(&self.source).role_object_grants().await?;
        if grants.unsupported > 0 {
            debug!(
                "Skipping {} grants on unsupported object types",
                grants.unsupported
            );
        }
        pass.outcome.skipped_unsupported = grants.unsupported;

        let reserved = &self.reserved;
        let (records, skipped) = retain_unreserved(grants.edges, |g| reserved.skips_object_grant(g));
        self.apply(pass, records, skipped).await
    }

    /// Check both connections with a trivial query.
    pub async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let source = match self.source.query_scalar(SOURCE_PROBE).await {
            Ok(_) => EndpointHealth::up(self.source.account(), started.elapsed()),
            Err(e) => EndpointHealth::down(self.source.account(), started.elapsed(), e),
        };

        let started = Instant::now();
        let target = match self.target.execute(TARGET_PROBE).await {
            Ok(()) => EndpointHealth::up(self.target.account(), started.elapsed()),
            Err(e) => EndpointHealth::down(self.target.account(), started.elapsed(), e),
        };

        HealthCheckResult::new(source, target)
    }

    /// Close both connections.
    pub async fn close(self) {
        self.source.close().await;
        self.target.close().await;
        info!(
            "Closed connections to {} and {}",
            self.source.account(),
            self.target.account()
        );
    }

    fn runner(&self) -> StatementRunner<'_, T> {
        StatementRunner::new(&self.target, self.options.dry_run)
    }

    fn start(&self, category: ObjectCategory) -> Pass {
        info!(
            "Replicating {} from {} to {}",
            category,
            self.source.account(),
            self.target.account()
        );
        Pass::new(category)
    }

    /// Map and submit every record of a pass, then close it.
    async fn apply<R: ObjectMapping>(
        &mut self,
        mut pass: Pass,
        records: Vec<R>,
        skipped_reserved: usize,
    ) -> Result<CategoryOutcome> {
        pass.outcome.skipped_reserved += skipped_reserved;

        for record in records {
            let object = record.object_name();
            let pair = match record.to_statements(&self.mapping) {
                Ok(pair) => pair,
                Err(e) => {
                    self.mapping_failure(&mut pass, &object, e)?;
                    continue;
                }
            };

            let result = self.runner().run(R::CATEGORY, &object, &pair.create).await;
            self.settle(&mut pass, result, pair.drop)?;
        }

        Ok(self.finish(pass))
    }

    /// Account for one statement result. Under the abort policy a failure
    /// interrupts the pass and ends it with an error.
    fn settle(
        &mut self,
        pass: &mut Pass,
        result: StatementOutcome,
        drop: Option<Statement>,
    ) -> Result<()> {
        let failure = match &result.status {
            StatementStatus::Executed => {
                pass.drops.extend(drop);
                None
            }
            StatementStatus::Planned => {
                if let Some(drop) = drop {
                    pass.outcome.drops.push(drop.display_text().to_string());
                }
                None
            }
            StatementStatus::Failed { error } => {
                Some(TranscribeError::statement(result.sql.clone(), error.clone()))
            }
        };
        pass.outcome.push(result);

        match failure {
            Some(err) if self.options.on_error == ErrorPolicy::Abort => {
                self.interrupt(pass);
                Err(err)
            }
            _ => Ok(()),
        }
    }

    /// Record a record that could not be turned into statements.
    fn mapping_failure(
        &mut self,
        pass: &mut Pass,
        object: &str,
        err: TranscribeError,
    ) -> Result<()> {
        warn!("[{}] {}", pass.category(), err);
        pass.outcome.push(StatementOutcome {
            object: object.to_string(),
            sql: String::new(),
            status: StatementStatus::Failed {
                error: err.to_string(),
            },
        });

        if self.options.on_error == ErrorPolicy::Abort {
            self.interrupt(pass);
            return Err(err);
        }
        Ok(())
    }

    fn finish(&mut self, mut pass: Pass) -> CategoryOutcome {
        self.close_pass(&mut pass);
        let outcome = pass.outcome;
        info!(
            "Finished {}: {} created, {} failed, {} skipped",
            outcome.category,
            outcome.created,
            outcome.failed,
            outcome.skipped_reserved + outcome.skipped_unsupported
        );
        outcome
    }

    /// Move the drops of a finished pass into the ledger. Dry runs record
    /// nothing.
    fn close_pass(&mut self, pass: &mut Pass) {
        let drops = std::mem::take(&mut pass.drops);
        pass.outcome
            .drops
            .extend(drops.iter().map(|d| d.display_text().to_string()));
        if self.options.dry_run {
            return;
        }
        if self
            .interrupted
            .as_ref()
            .is_some_and(|i| i.category == pass.category())
        {
            self.interrupted = None;
        }
        self.ledger.record(pass.category(), drops);
    }

    /// Set aside the drops of a pass the abort policy stopped.
    fn interrupt(&mut self, pass: &mut Pass) {
        let drops = std::mem::take(&mut pass.drops);
        if self.options.dry_run || drops.is_empty() {
            return;
        }
        warn!(
            "{} pass interrupted; {} created objects are kept out of the rollback ledger",
            pass.category(),
            drops.len()
        );
        self.interrupted = Some(InterruptedPass {
            category: pass.category(),
            drops,
        });
    }
}

/// Split off reserved records, logging each one.
fn retain_unreserved<R, F>(records: Vec<R>, is_reserved: F) -> (Vec<R>, usize)
where
    R: ObjectMapping,
    F: Fn(&R) -> bool,
{
    let total = records.len();
    let kept: Vec<R> = records
        .into_iter()
        .filter(|record| {
            let reserved = is_reserved(record);
            if reserved {
                debug!("Skipping reserved {}: {}", R::CATEGORY, record.object_name());
            }
            !reserved
        })
        .collect();
    let skipped = total - kept.len();
    (kept, skipped)
}

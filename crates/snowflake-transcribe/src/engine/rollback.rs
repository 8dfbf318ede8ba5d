//! Rollback runner: replays the ledger against the target.

use tracing::{debug, info, warn};

use super::{InterruptedPass, ReplicationSession, RollbackReport};
use crate::core::{CatalogSource, ObjectCategory, TargetExecutor};

impl<S: CatalogSource, T: TargetExecutor> ReplicationSession<S, T> {
    /// Drop everything this run created.
    pub async fn drop_added_objects(&self) -> RollbackReport {
        self.drop_objects(&ObjectCategory::ALL).await
    }

    /// Drop the objects created for the given categories only.
    ///
    /// Ledger entries run in reverse creation order (warehouses, roles, users,
    /// databases) regardless of the order of `categories`. Objects of an
    /// interrupted pass are dropped first, since that pass ran last. A failing
    /// drop is logged and the teardown goes on. The ledger itself is left
    /// untouched, so a teardown can be repeated; every drop is `IF EXISTS`.
    pub async fn drop_objects(&self, categories: &[ObjectCategory]) -> RollbackReport {
        let mut report = RollbackReport::default();

        for category in categories.iter().filter(|c| !c.is_reversible()) {
            debug!("{} have no rollback entries", category);
        }

        if let Some(interrupted) = &self.interrupted {
            if categories.contains(&interrupted.category) {
                let category = interrupted.category;
                info!(
                    "Dropping {} {} of the interrupted pass",
                    interrupted.drops.len(),
                    category
                );
                for drop in interrupted.drops.iter().rev() {
                    let outcome = self.runner().run(category, category.as_str(), drop).await;
                    report.push(outcome);
                }
            }
        }

        for (category, drops) in self.ledger.in_rollback_order() {
            if !categories.contains(&category) {
                continue;
            }
            info!("Dropping {} {}", drops.len(), category);

            for drop in drops.iter().rev() {
                let outcome = self.runner().run(category, category.as_str(), drop).await;
                report.push(outcome);
            }
        }

        if report.failed > 0 {
            warn!(
                "Rollback finished with {} failed drop statements",
                report.failed
            );
        } else {
            info!("Rollback finished: {} objects dropped", report.dropped);
        }
        report
    }

    /// The teardown as a SQL script: the interrupted pass, if any, followed
    /// by the ledger.
    pub fn rollback_script(&self) -> String {
        let mut script = self
            .interrupted
            .as_ref()
            .map(InterruptedPass::to_script)
            .unwrap_or_default();
        script.push_str(&self.ledger.to_script());
        script
    }
}

//! Rollback ledger: the drop statements accumulated during a run.

use std::collections::BTreeMap;

use crate::core::{ObjectCategory, Statement};

/// Drop statements per category, keyed in creation order.
///
/// An entry is written once, when the category's pass ends, and holds one
/// drop for every object that pass actually created. Grant categories never
/// get an entry.
#[derive(Debug, Clone, Default)]
pub struct RollbackLedger {
    entries: BTreeMap<ObjectCategory, Vec<Statement>>,
}

impl RollbackLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the drops of a finished category pass, replacing any earlier
    /// entry for the same category.
    pub fn record(&mut self, category: ObjectCategory, drops: Vec<Statement>) {
        if category.is_reversible() {
            self.entries.insert(category, drops);
        }
    }

    /// Whether a pass for `category` has finished in this run.
    pub fn contains(&self, category: ObjectCategory) -> bool {
        self.entries.contains_key(&category)
    }

    pub fn get(&self, category: ObjectCategory) -> Option<&[Statement]> {
        self.entries.get(&category).map(Vec::as_slice)
    }

    /// Entries in reverse creation order: warehouses, roles, users, databases.
    pub fn in_rollback_order(&self) -> impl Iterator<Item = (ObjectCategory, &[Statement])> {
        self.entries
            .iter()
            .rev()
            .map(|(category, drops)| (*category, drops.as_slice()))
    }

    /// Every drop statement in the order teardown executes them.
    ///
    /// Categories run in reverse creation order, and within a category the
    /// most recently created object is dropped first.
    pub fn rollback_statements(&self) -> Vec<&Statement> {
        self.in_rollback_order()
            .flat_map(|(_, drops)| drops.iter().rev())
            .collect()
    }

    /// Total number of drop statements held.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Render the teardown as a SQL script, one statement per line.
    pub fn to_script(&self) -> String {
        let mut script = String::new();
        for (category, drops) in self.in_rollback_order() {
            script.push_str(&format!("-- {} ({})\n", category, drops.len()));
            for drop in drops.iter().rev() {
                script.push_str(drop.sql());
                script.push_str(";\n");
            }
        }
        script
    }
}

/// Drops for the objects a pass created before the abort policy stopped it.
///
/// Kept apart from the [`RollbackLedger`], which only holds finished passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptedPass {
    pub category: ObjectCategory,
    pub drops: Vec<Statement>,
}

impl InterruptedPass {
    /// Render the drops newest first, in the format of
    /// [`RollbackLedger::to_script`].
    pub fn to_script(&self) -> String {
        let mut script = format!("-- {} (interrupted, {})\n", self.category, self.drops.len());
        for drop in self.drops.iter().rev() {
            script.push_str(drop.sql());
            script.push_str(";\n");
        }
        script
    }
}

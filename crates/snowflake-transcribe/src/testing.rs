//! In-memory source and target accounts for tests.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::core::{CatalogSource, SourceRow, TargetExecutor};
use crate::error::{Result, TranscribeError};

fn row(pairs: &[(&str, Option<&str>)]) -> SourceRow {
    SourceRow::from_pairs(pairs.iter().map(|(k, v)| (*k, *v)))
}

/// Source account serving canned catalog rows.
#[derive(Default)]
pub struct FakeCatalog {
    databases: Vec<String>,
    ddl: Vec<(String, String)>,
    roles: Vec<SourceRow>,
    users: Vec<SourceRow>,
    warehouses: Vec<SourceRow>,
    user_grants: Vec<SourceRow>,
    role_grants: Vec<SourceRow>,
    object_grants: Vec<SourceRow>,
    fail_on: Vec<String>,
    queries: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A database listed by `SHOW DATABASES` whose DDL is `ddl`.
    pub fn with_database(mut self, name: &str, ddl: &str) -> Self {
        self.databases.push(name.to_string());
        self.with_ddl(name, ddl)
    }

    /// DDL for a database that `SHOW DATABASES` does not list.
    pub fn with_ddl(mut self, name: &str, ddl: &str) -> Self {
        self.ddl.push((name.to_string(), ddl.to_string()));
        self
    }

    pub fn with_role(mut self, name: &str) -> Self {
        self.roles.push(row(&[("NAME", Some(name))]));
        self
    }

    pub fn with_user(
        mut self,
        name: &str,
        login_name: Option<&str>,
        display_name: Option<&str>,
        default_role: Option<&str>,
        email: Option<&str>,
    ) -> Self {
        self.users.push(row(&[
            ("NAME", Some(name)),
            ("LOGIN_NAME", login_name),
            ("DISPLAY_NAME", display_name),
            ("DEFAULT_ROLE", default_role),
            ("EMAIL", email),
        ]));
        self
    }

    pub fn with_warehouse(mut self, name: &str, size: &str) -> Self {
        self.warehouses
            .push(row(&[("name", Some(name)), ("size", Some(size))]));
        self
    }

    pub fn with_user_grant(mut self, role: &str, user: &str) -> Self {
        self.user_grants
            .push(row(&[("ROLE", Some(role)), ("GRANTEE_NAME", Some(user))]));
        self
    }

    pub fn with_role_grant(mut self, role: &str, grantee: &str) -> Self {
        self.role_grants
            .push(row(&[("NAME", Some(role)), ("GRANTEE_NAME", Some(grantee))]));
        self
    }

    pub fn with_object_grant(
        mut self,
        privilege: &str,
        granted_on: &str,
        name: &str,
        database: Option<&str>,
        schema: Option<&str>,
        grantee: &str,
    ) -> Self {
        self.object_grants.push(row(&[
            ("PRIVILEGE", Some(privilege)),
            ("GRANTED_ON", Some(granted_on)),
            ("NAME", Some(name)),
            ("TABLE_CATALOG", database),
            ("TABLE_SCHEMA", schema),
            ("GRANTEE_NAME", Some(grantee)),
        ]));
        self
    }

    /// Fail every query containing `fragment`.
    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on.push(fragment.to_string());
        self
    }

    /// Every query received so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    fn record(&self, sql: &str) -> Result<()> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(sql.to_string());
        }
        if self.fail_on.iter().any(|f| sql.contains(f.as_str())) {
            return Err(TranscribeError::statement(sql, "simulated query failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn query(&self, sql: &str) -> Result<Vec<SourceRow>> {
        self.record(sql)?;

        let rows = if sql.contains("SHOW DATABASES") {
            self.databases
                .iter()
                .map(|name| row(&[("name", Some(name.as_str()))]))
                .collect()
        } else if sql.contains("SHOW WAREHOUSES") {
            self.warehouses.clone()
        } else if sql.contains("ACCOUNT_USAGE.ROLES") {
            self.roles.clone()
        } else if sql.contains("GRANTS_TO_USERS") {
            self.user_grants.clone()
        } else if sql.contains("ACCOUNT_USAGE.USERS") {
            self.users.clone()
        } else if sql.contains("GRANTS_TO_ROLES") && sql.contains("GRANTED_ON = 'ROLE'") {
            self.role_grants.clone()
        } else if sql.contains("GRANTS_TO_ROLES") {
            self.object_grants.clone()
        } else {
            Vec::new()
        };
        Ok(rows)
    }

    async fn query_scalar(&self, sql: &str) -> Result<Option<String>> {
        self.record(sql)?;
        Ok(self
            .ddl
            .iter()
            .find(|(name, _)| sql.contains(&format!("'\"{}\"'", name)))
            .map(|(_, ddl)| ddl.clone()))
    }

    fn account(&self) -> &str {
        "source_account"
    }

    async fn close(&self) {}
}

/// Target account that records statements and tracks which objects exist.
///
/// `GRANT` statements fail when the role, user or grantee they name does not
/// exist yet, like the real platform does.
#[derive(Default)]
pub struct RecordingTarget {
    executed: Mutex<Vec<String>>,
    objects: Mutex<BTreeSet<(String, String)>>,
    fail_on: Vec<String>,
    closed: Mutex<bool>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every statement containing `fragment`.
    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on.push(fragment.to_string());
        self
    }

    /// Objects that already exist before the run.
    pub fn with_existing(self, kind: &str, name: &str) -> Self {
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert((kind.to_string(), name.to_string()));
        }
        self
    }

    /// Every statement that was attempted, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn exists(&self, kind: &str, name: &str) -> bool {
        self.objects
            .lock()
            .map(|o| o.contains(&(kind.to_string(), name.to_string())))
            .unwrap_or(false)
    }

    /// Every object currently present, as `(KIND, name)`.
    pub fn snapshot(&self) -> BTreeSet<(String, String)> {
        self.objects.lock().map(|o| o.clone()).unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.lock().map(|c| *c).unwrap_or(false)
    }

    fn apply(&self, sql: &str) -> std::result::Result<(), String> {
        let tokens = tokenize(sql);
        let upper: Vec<String> = tokens.iter().map(|t| t.to_ascii_uppercase()).collect();
        let word = |i: usize| upper.get(i).map(String::as_str).unwrap_or_default();
        let mut objects = self.objects.lock().map_err(|e| e.to_string())?;

        match word(0) {
            "CREATE" if word(1) == "OR" && word(2) == "REPLACE" => {
                if let (Some(kind), Some(name)) = (upper.get(3), tokens.get(4)) {
                    objects.insert((kind.clone(), unquote(name)));
                }
                Ok(())
            }
            "DROP" => {
                if let (Some(kind), Some(name)) = (upper.get(1), tokens.last()) {
                    let name = unquote(name);
                    if kind == "DATABASE" {
                        let prefix = format!("{}.", name);
                        objects.retain(|(_, n)| !n.starts_with(&prefix));
                    }
                    objects.remove(&(kind.clone(), name));
                }
                Ok(())
            }
            "GRANT" if word(1) == "ROLE" => {
                let role = tokens.get(2).map(|t| unquote(t)).unwrap_or_default();
                let grantee_kind = upper.get(4).cloned().unwrap_or_default();
                let grantee = tokens.get(5).map(|t| unquote(t)).unwrap_or_default();
                if !objects.contains(&("ROLE".to_string(), role.clone())) {
                    return Err(format!("Role '{}' does not exist", role));
                }
                if !objects.contains(&(grantee_kind.clone(), grantee.clone())) {
                    return Err(format!("{} '{}' does not exist", grantee_kind, grantee));
                }
                Ok(())
            }
            "GRANT" => {
                let to = upper.iter().position(|t| t == "TO").unwrap_or(0);
                let grantee = tokens.get(to + 2).map(|t| unquote(t)).unwrap_or_default();
                if !objects.contains(&("ROLE".to_string(), grantee.clone())) {
                    return Err(format!("Role '{}' does not exist", grantee));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Split on whitespace outside double quotes.
fn tokenize(sql: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in sql.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn unquote(token: &str) -> String {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .map(|t| t.replace("\"\"", "\""))
        .unwrap_or_else(|| token.to_string())
}

#[async_trait]
impl TargetExecutor for RecordingTarget {
    async fn execute(&self, sql: &str) -> Result<()> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }
        if self.fail_on.iter().any(|f| sql.contains(f.as_str())) {
            return Err(TranscribeError::statement(sql, "simulated rejection"));
        }
        self.apply(sql)
            .map_err(|message| TranscribeError::statement(sql, message))
    }

    fn account(&self) -> &str {
        "target_account"
    }

    async fn close(&self) {
        if let Ok(mut closed) = self.closed.lock() {
            *closed = true;
        }
    }
}

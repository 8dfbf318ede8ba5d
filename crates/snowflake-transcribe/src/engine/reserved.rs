//! Names that replication never touches.
//!
//! System databases and roles exist in every account and cannot be
//! recreated. The users and warehouse the tool itself is connected with are
//! excluded too, so a run never replaces the credentials it runs under.
//!
//! Roles and warehouses named in the ignore lists are different: they are
//! never created on the target, so grants naming them are skipped as well.

use std::collections::HashSet;

use crate::config::Config;
use crate::core::{GrantEdge, GrantObjectType, RoleRoleGrant, UserRoleGrant};

/// Databases present in every account.
pub const SYSTEM_DATABASES: &[&str] = &["SNOWFLAKE", "SNOWFLAKE_SAMPLE_DATA"];

/// Roles present in every account.
pub const SYSTEM_ROLES: &[&str] = &[
    "PUBLIC",
    "ACCOUNTADMIN",
    "SECURITYADMIN",
    "ORGADMIN",
    "USERADMIN",
    "SYSADMIN",
];

/// Users present in every account.
pub const SYSTEM_USERS: &[&str] = &["SNOWFLAKE"];

/// Reserved names per object kind. Membership is exact on the name as the
/// catalog stores it.
#[derive(Debug, Clone, Default)]
pub struct ReservedNames {
    databases: HashSet<String>,
    roles: HashSet<String>,
    users: HashSet<String>,
    warehouses: HashSet<String>,
    ignored_roles: HashSet<String>,
    ignored_warehouses: HashSet<String>,
}

impl ReservedNames {
    /// The built-in system names only.
    pub fn system() -> Self {
        let mut reserved = Self::default();
        reserved.databases.extend(SYSTEM_DATABASES.iter().map(|s| s.to_string()));
        reserved.roles.extend(SYSTEM_ROLES.iter().map(|s| s.to_string()));
        reserved.users.extend(SYSTEM_USERS.iter().map(|s| s.to_string()));
        reserved
    }

    /// System names plus the session objects and ignore lists of `config`.
    pub fn from_config(config: &Config) -> Self {
        let mut reserved = Self::system();
        let replication = &config.replication;

        add_all(&mut reserved.databases, &replication.ignore_databases);
        add_all(&mut reserved.users, &replication.ignore_users);
        for role in &replication.ignore_roles {
            reserved.ignore_role(role);
        }
        for warehouse in &replication.ignore_warehouses {
            reserved.ignore_warehouse(warehouse);
        }

        add(&mut reserved.users, &config.source.user);
        add(&mut reserved.users, &config.target.user);
        add(&mut reserved.warehouses, &config.target.warehouse);
        reserved
    }

    pub fn is_database(&self, name: &str) -> bool {
        self.databases.contains(name)
    }

    pub fn is_role(&self, name: &str) -> bool {
        self.roles.contains(name)
    }

    pub fn is_user(&self, name: &str) -> bool {
        self.users.contains(name)
    }

    pub fn is_warehouse(&self, name: &str) -> bool {
        self.warehouses.contains(name)
    }

    /// Whether `name` is a role excluded by configuration rather than a
    /// system role.
    pub fn is_ignored_role(&self, name: &str) -> bool {
        self.ignored_roles.contains(name)
    }

    pub fn is_ignored_warehouse(&self, name: &str) -> bool {
        self.ignored_warehouses.contains(name)
    }

    /// Grants to reserved users, and grants of ignored roles.
    pub fn skips_user_role_grant(&self, grant: &UserRoleGrant) -> bool {
        self.is_user(&grant.user) || self.is_ignored_role(&grant.role)
    }

    /// Grants between two reserved roles already exist in every account.
    /// Grants naming an ignored role on either side cannot be applied.
    pub fn skips_role_role_grant(&self, grant: &RoleRoleGrant) -> bool {
        (self.is_role(&grant.role) && self.is_role(&grant.grantee))
            || self.is_ignored_role(&grant.role)
            || self.is_ignored_role(&grant.grantee)
    }

    /// Privileges on objects in reserved databases, on ignored warehouses,
    /// or held by ignored roles.
    pub fn skips_object_grant(&self, edge: &GrantEdge) -> bool {
        if self.is_ignored_role(&edge.grantee) {
            return true;
        }
        match edge.object_type {
            GrantObjectType::Database => self.is_database(&edge.name),
            GrantObjectType::Schema | GrantObjectType::Table | GrantObjectType::View => edge
                .database
                .as_deref()
                .map(|db| self.is_database(db))
                .unwrap_or(false),
            GrantObjectType::Warehouse => self.is_ignored_warehouse(&edge.name),
        }
    }

    pub fn add_database(&mut self, name: &str) {
        add(&mut self.databases, name);
    }

    pub fn add_role(&mut self, name: &str) {
        add(&mut self.roles, name);
    }

    pub fn add_user(&mut self, name: &str) {
        add(&mut self.users, name);
    }

    pub fn add_warehouse(&mut self, name: &str) {
        add(&mut self.warehouses, name);
    }

    /// Exclude a role that does not exist on the target.
    pub fn ignore_role(&mut self, name: &str) {
        add(&mut self.roles, name);
        add(&mut self.ignored_roles, name);
    }

    /// Exclude a warehouse that does not exist on the target.
    pub fn ignore_warehouse(&mut self, name: &str) {
        add(&mut self.warehouses, name);
        add(&mut self.ignored_warehouses, name);
    }
}

// Names typed in the config follow unquoted-identifier rules and are stored
// uppercase by the catalog; keep both spellings.
fn add(set: &mut HashSet<String>, name: &str) {
    set.insert(name.to_string());
    set.insert(name.to_ascii_uppercase());
}

fn add_all(set: &mut HashSet<String>, names: &[String]) {
    for name in names {
        add(set, name);
    }
}

//! Configuration type definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::mapper::DEFAULT_USER_PASSWORD;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Account objects are read from.
    pub source: AccountConfig,

    /// Account objects are created in.
    pub target: AccountConfig,

    /// Replication behavior.
    #[serde(default)]
    pub replication: ReplicationConfig,
}

/// Credentials and session settings for one Snowflake account.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Account identifier, e.g. `xy12345.eu-west-1` or `myorg-myaccount`.
    pub account: String,

    /// Login user.
    pub user: String,

    /// How the user authenticates (default: password).
    #[serde(default)]
    pub auth: AuthMethod,

    /// Password, for `auth: password`. Never serialized.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// PKCS#8 private key file, for `auth: key_pair`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_file: Option<PathBuf>,

    /// Passphrase of an encrypted private key. Never serialized.
    #[serde(default, skip_serializing)]
    pub private_key_passphrase: Option<String>,

    /// Warehouse the session runs on.
    pub warehouse: String,

    /// Session role (default: ACCOUNTADMIN).
    #[serde(default = "default_role")]
    pub role: String,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("auth", &self.auth)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("private_key_file", &self.private_key_file)
            .field(
                "private_key_passphrase",
                &self.private_key_passphrase.as_ref().map(|_| "[REDACTED]"),
            )
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .finish()
    }
}

/// Credential kind used to open a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// User name and password.
    #[default]
    Password,
    /// Key-pair authentication with a private key file (JWT).
    KeyPair,
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethod::Password => write!(f, "password"),
            AuthMethod::KeyPair => write!(f, "key_pair"),
        }
    }
}

/// What to do when the target rejects a statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the failure and carry on with the next object.
    #[default]
    Continue,
    /// Stop the run at the first rejected statement.
    Abort,
}

/// Replication behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Replicate role-to-role grants (default: false).
    #[serde(default)]
    pub include_role_role_grants: bool,

    /// Statement error policy (default: continue).
    #[serde(default)]
    pub on_error: ErrorPolicy,

    /// Generate and report statements without executing them (default: false).
    #[serde(default)]
    pub dry_run: bool,

    /// Password set on every replicated user.
    #[serde(default = "default_password", skip_serializing)]
    pub default_password: String,

    /// Databases never replicated, in addition to the system databases.
    #[serde(default)]
    pub ignore_databases: Vec<String>,

    /// Roles never replicated, in addition to the system roles.
    #[serde(default)]
    pub ignore_roles: Vec<String>,

    /// Users never replicated, in addition to the session users.
    #[serde(default)]
    pub ignore_users: Vec<String>,

    /// Warehouses never replicated, in addition to the target session warehouse.
    #[serde(default)]
    pub ignore_warehouses: Vec<String>,

    /// ODBC driver name (default: SnowflakeDSIIDriver).
    #[serde(default = "default_odbc_driver")]
    pub odbc_driver: String,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            include_role_role_grants: false,
            on_error: ErrorPolicy::default(),
            dry_run: false,
            default_password: default_password(),
            ignore_databases: Vec::new(),
            ignore_roles: Vec::new(),
            ignore_users: Vec::new(),
            ignore_warehouses: Vec::new(),
            odbc_driver: default_odbc_driver(),
        }
    }
}

fn default_role() -> String {
    "ACCOUNTADMIN".to_string()
}

fn default_password() -> String {
    DEFAULT_USER_PASSWORD.to_string()
}

fn default_odbc_driver() -> String {
    "SnowflakeDSIIDriver".to_string()
}

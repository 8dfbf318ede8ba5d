//! Configuration validation.

use super::{AccountConfig, AuthMethod, Config};
use crate::core::identifier::validate_identifier;
use crate::error::{Result, TranscribeError};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    validate_account("source", &config.source)?;
    validate_account("target", &config.target)?;

    // Replicating an account onto itself would replace its own objects
    if config
        .source
        .account
        .eq_ignore_ascii_case(&config.target.account)
    {
        return Err(TranscribeError::Config(
            "source and target cannot be the same account".into(),
        ));
    }

    let replication = &config.replication;
    if replication.default_password.is_empty() {
        return Err(TranscribeError::Config(
            "replication.default_password must not be empty".into(),
        ));
    }
    if replication.odbc_driver.is_empty() {
        return Err(TranscribeError::Config(
            "replication.odbc_driver must not be empty".into(),
        ));
    }

    for (field, names) in [
        ("ignore_databases", &replication.ignore_databases),
        ("ignore_roles", &replication.ignore_roles),
        ("ignore_users", &replication.ignore_users),
        ("ignore_warehouses", &replication.ignore_warehouses),
    ] {
        for name in names {
            validate_identifier(name).map_err(|e| {
                TranscribeError::Config(format!("replication.{}: {}", field, e))
            })?;
        }
    }

    Ok(())
}

fn validate_account(side: &str, account: &AccountConfig) -> Result<()> {
    let fields = [
        ("account", &account.account),
        ("user", &account.user),
        ("warehouse", &account.warehouse),
        ("role", &account.role),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(TranscribeError::Config(format!(
                "{}.{} is required",
                side, field
            )));
        }
    }
    validate_credentials(side, account)
}

/// Exactly one credential kind, the one `auth` selects, may be present.
fn validate_credentials(side: &str, account: &AccountConfig) -> Result<()> {
    let has_password = account.password.as_deref().is_some_and(|p| !p.is_empty());
    let has_key_file = account
        .private_key_file
        .as_ref()
        .is_some_and(|p| !p.as_os_str().is_empty());

    let (required, present, unused) = match account.auth {
        AuthMethod::Password => (
            "password",
            has_password,
            vec![
                ("private_key_file", account.private_key_file.is_some()),
                ("private_key_passphrase", account.private_key_passphrase.is_some()),
            ],
        ),
        AuthMethod::KeyPair => (
            "private_key_file",
            has_key_file,
            vec![("password", account.password.is_some())],
        ),
    };

    if !present {
        return Err(TranscribeError::Config(format!(
            "{}.{} is required with auth: {}",
            side, required, account.auth
        )));
    }
    if let Some((field, _)) = unused.iter().find(|(_, set)| *set) {
        return Err(TranscribeError::Config(format!(
            "{}.{} cannot be combined with auth: {}",
            side, field, account.auth
        )));
    }
    Ok(())
}

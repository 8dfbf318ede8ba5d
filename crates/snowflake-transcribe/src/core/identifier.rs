//! Identifier validation and quoting for generated Snowflake statements.
//!
//! Every object name that reaches a statement comes from the source catalog
//! exactly as stored, so names are always emitted as double-quoted
//! identifiers. That keeps case-sensitive and mixed-case names intact when
//! they are recreated in the target account.
//!
//! Identifiers cannot be bound as statement parameters, so names are
//! validated (empty, null bytes, length) and escaped here instead.

use crate::error::{Result, TranscribeError};

/// Maximum identifier length accepted by Snowflake.
const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Validate an identifier for security issues.
///
/// Rejects empty identifiers, identifiers containing null bytes and
/// identifiers exceeding the maximum length.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TranscribeError::Identifier(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(TranscribeError::Identifier(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(TranscribeError::Identifier(format!(
            "Identifier exceeds maximum length of {} characters: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }

    Ok(())
}

/// Quote a Snowflake identifier.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
///
/// ```ignore
/// assert_eq!(quote_ident("Sales")?, "\"Sales\"");
/// assert_eq!(quote_ident("a\"b")?, "\"a\"\"b\"");
/// ```
pub fn quote_ident(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Qualify an object name from its parts, outermost first.
///
/// `["D", "S", "T"]` renders as `"D"."S"."T"`.
pub fn qualify(parts: &[&str]) -> Result<String> {
    if parts.is_empty() {
        return Err(TranscribeError::Identifier(
            "Qualified name needs at least one part".to_string(),
        ));
    }

    let quoted = parts
        .iter()
        .map(|part| quote_ident(part))
        .collect::<Result<Vec<_>>>()?;
    Ok(quoted.join("."))
}

/// Quote a string literal.
///
/// Snowflake treats backslash as an escape character inside single-quoted
/// literals, so backslashes are doubled along with single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

/// Validate a bare keyword sequence such as a privilege name.
///
/// Privileges arrive from the catalog as plain text (`SELECT`,
/// `CREATE SCHEMA`, `APPLY MASKING POLICY`) and are emitted unquoted, so
/// only letters, underscores and single spaces between words are allowed.
pub fn validate_keyword(keyword: &str) -> Result<()> {
    let valid = !keyword.is_empty()
        && keyword.split(' ').all(|word| {
            !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic() || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(TranscribeError::Identifier(format!(
            "Not a valid keyword: {:?}",
            keyword
        )))
    }
}

//! Statement building.
//!
//! Generated SQL is assembled from typed pieces rather than interpolated
//! strings: identifiers always pass through [`quote_ident`], literals through
//! [`quote_literal`], and optional properties that are `None` add nothing to
//! the statement. Secret values are rendered into the executable text but
//! masked in the display text used for logs and reports.

use std::fmt;

use super::identifier::{qualify, quote_ident, quote_literal, validate_keyword};
use crate::error::Result;

const REDACTED: &str = "'********'";

/// A generated statement.
///
/// Not `Serialize`: reports carry [`Statement::display_text`].
#[derive(Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    /// Present when the statement embeds a secret.
    redacted: Option<String>,
}

impl Statement {
    /// A statement with no secrets, taken verbatim.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            redacted: None,
        }
    }

    /// The executable text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Text safe to log or report.
    pub fn display_text(&self) -> &str {
        self.redacted.as_deref().unwrap_or(&self.sql)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_text())
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Statement").field(&self.display_text()).finish()
    }
}

/// Creation statement plus its inverse.
///
/// `drop` is `None` for categories that are not rolled back (grants).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementPair {
    pub create: Statement,
    pub drop: Option<Statement>,
}

/// Token-based builder for a single statement.
///
/// Tokens are joined with single spaces, so skipped optional clauses never
/// leave stray whitespace or empty assignments behind.
#[derive(Debug, Default)]
pub struct StatementBuilder {
    tokens: Vec<String>,
    redacted: Option<Vec<String>>,
}

impl StatementBuilder {
    /// Start a statement with fixed leading keywords, e.g. `CREATE OR REPLACE ROLE`.
    pub fn new(head: &str) -> Self {
        Self {
            tokens: vec![head.to_string()],
            redacted: None,
        }
    }

    fn push(&mut self, token: String) {
        if let Some(redacted) = self.redacted.as_mut() {
            redacted.push(token.clone());
        }
        self.tokens.push(token);
    }

    /// Append fixed keywords.
    pub fn keyword(mut self, keyword: &str) -> Self {
        self.push(keyword.to_string());
        self
    }

    /// Append keywords that came from the catalog (e.g. a privilege name).
    pub fn checked_keyword(mut self, keyword: &str) -> Result<Self> {
        validate_keyword(keyword)?;
        self.push(keyword.to_ascii_uppercase());
        Ok(self)
    }

    /// Append a quoted identifier.
    pub fn ident(mut self, name: &str) -> Result<Self> {
        let quoted = quote_ident(name)?;
        self.push(quoted);
        Ok(self)
    }

    /// Append a dot-qualified name, outermost part first.
    pub fn qualified(mut self, parts: &[&str]) -> Result<Self> {
        let qualified = qualify(parts)?;
        self.push(qualified);
        Ok(self)
    }

    /// Append `KEY = 'value'`.
    pub fn string_property(mut self, key: &str, value: &str) -> Self {
        self.push(format!("{} = {}", key, quote_literal(value)));
        self
    }

    /// Append `KEY = 'value'` only when a value is present.
    pub fn optional_string_property(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.string_property(key, value),
            None => self,
        }
    }

    /// Append `KEY = "identifier"`.
    pub fn ident_property(mut self, key: &str, name: &str) -> Result<Self> {
        let quoted = quote_ident(name)?;
        self.push(format!("{} = {}", key, quoted));
        Ok(self)
    }

    /// Append `KEY = "identifier"` only when a value is present.
    pub fn optional_ident_property(self, key: &str, name: Option<&str>) -> Result<Self> {
        match name {
            Some(name) => self.ident_property(key, name),
            None => Ok(self),
        }
    }

    /// Append `KEY = TRUE|FALSE`.
    pub fn bool_property(mut self, key: &str, value: bool) -> Self {
        self.push(format!("{} = {}", key, if value { "TRUE" } else { "FALSE" }));
        self
    }

    /// Append `KEY = 'secret'`, masked in the display text.
    pub fn secret_property(mut self, key: &str, value: &str) -> Self {
        let redacted = self.redacted.get_or_insert_with(|| self.tokens.clone());
        redacted.push(format!("{} = {}", key, REDACTED));
        self.tokens.push(format!("{} = {}", key, quote_literal(value)));
        self
    }

    pub fn build(self) -> Statement {
        Statement {
            sql: self.tokens.join(" "),
            redacted: self.redacted.map(|tokens| tokens.join(" ")),
        }
    }
}

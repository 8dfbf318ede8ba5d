//! Whole-database DDL scripts.
//!
//! `GET_DDL('database', ..., true)` returns one text blob that recreates the
//! database with its schemas, tables and views, already in creation order and
//! with fully qualified names. The blob is split into single statements that
//! are executed in the order they appear.

use crate::core::{DatabaseRecord, ObjectCategory, Statement, StatementBuilder};
use crate::error::{Result, TranscribeError};

/// Statements recreating one database, plus the drop that removes it.
#[derive(Debug, Clone)]
pub struct DatabaseScript {
    pub name: String,
    pub statements: Vec<Statement>,
    pub drop: Statement,
}

/// Build the script for a database from its `GET_DDL` output.
pub fn database_script(record: &DatabaseRecord, ddl: &str) -> Result<DatabaseScript> {
    let statements: Vec<Statement> = split_statements(ddl)
        .into_iter()
        .map(Statement::raw)
        .collect();

    if statements.is_empty() {
        return Err(TranscribeError::mapping(
            ObjectCategory::Database,
            &record.name,
            "GET_DDL returned no statements",
        ));
    }

    let drop = StatementBuilder::new("DROP DATABASE IF EXISTS")
        .ident(&record.name)?
        .build();

    Ok(DatabaseScript {
        name: record.name.clone(),
        statements,
        drop,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexer {
    Code,
    SingleQuoted,
    DoubleQuoted,
    DollarQuoted,
    LineComment,
    BlockComment,
}

/// Split a DDL blob on `;` terminators.
///
/// Terminators inside string literals, quoted identifiers and `$$` bodies do
/// not split. Comments are removed. Outside quotes, runs of whitespace
/// (including newlines and tabs) collapse to one space. Empty fragments are
/// discarded.
pub fn split_statements(ddl: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = Lexer::Code;
    let mut chars = ddl.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            Lexer::Code => match c {
                ';' => {
                    finish(&mut current, &mut statements);
                }
                '\'' => {
                    current.push(c);
                    state = Lexer::SingleQuoted;
                }
                '"' => {
                    current.push(c);
                    state = Lexer::DoubleQuoted;
                }
                '$' if chars.peek() == Some(&'$') => {
                    chars.next();
                    current.push_str("$$");
                    state = Lexer::DollarQuoted;
                }
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = Lexer::LineComment;
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = Lexer::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = Lexer::BlockComment;
                }
                c if c.is_whitespace() => push_space(&mut current),
                c => current.push(c),
            },
            Lexer::SingleQuoted => {
                current.push(c);
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            current.push(escaped);
                        }
                    }
                    '\'' => state = Lexer::Code,
                    _ => {}
                }
            }
            Lexer::DoubleQuoted => {
                current.push(c);
                if c == '"' {
                    state = Lexer::Code;
                }
            }
            Lexer::DollarQuoted => {
                if c == '$' && chars.peek() == Some(&'$') {
                    chars.next();
                    current.push_str("$$");
                    state = Lexer::Code;
                } else {
                    current.push(c);
                }
            }
            Lexer::LineComment => {
                if c == '\n' {
                    push_space(&mut current);
                    state = Lexer::Code;
                }
            }
            Lexer::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    push_space(&mut current);
                    state = Lexer::Code;
                }
            }
        }
    }

    finish(&mut current, &mut statements);
    statements
}

fn push_space(current: &mut String) {
    if !current.is_empty() && !current.ends_with(' ') {
        current.push(' ');
    }
}

fn finish(current: &mut String, statements: &mut Vec<String>) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DDL: &str = "create or replace database SALES;\n\n\
        create or replace schema SALES.PUBLIC;\n\n\
        create or replace TABLE SALES.PUBLIC.ORDERS (\n\tID NUMBER(38,0),\n\tNOTE VARCHAR(100)\n);\n\
        create or replace view SALES.PUBLIC.V_ORDERS(\n\tID\n) as select id from orders;\n";

    #[test]
    fn test_split_sample_ddl_in_order() {
        let statements = split_statements(SAMPLE_DDL);
        assert_eq!(
            statements,
            vec![
                "create or replace database SALES",
                "create or replace schema SALES.PUBLIC",
                "create or replace TABLE SALES.PUBLIC.ORDERS ( ID NUMBER(38,0), NOTE VARCHAR(100) )",
                "create or replace view SALES.PUBLIC.V_ORDERS( ID ) as select id from orders",
            ]
        );
    }

    #[test]
    fn test_split_discards_empty_fragments() {
        assert_eq!(split_statements(";;\n ; \t"), Vec::<String>::new());
        assert_eq!(split_statements("select 1;;select 2"), vec!["select 1", "select 2"]);
    }

    #[test]
    fn test_semicolon_in_string_literal_does_not_split() {
        let statements =
            split_statements("create table t (c varchar default 'a;b');create schema s;");
        assert_eq!(
            statements,
            vec!["create table t (c varchar default 'a;b')", "create schema s"]
        );
    }

    #[test]
    fn test_escaped_quotes_in_literal() {
        let statements = split_statements("comment = 'it''s; fine';x;'a\\';b';");
        assert_eq!(statements, vec!["comment = 'it''s; fine'", "x", "'a\\';b'"]);
    }

    #[test]
    fn test_quoted_identifier_keeps_whitespace() {
        let statements = split_statements("create table \"My;\n Table\" (a int);");
        assert_eq!(statements, vec!["create table \"My;\n Table\" (a int)"]);
    }

    #[test]
    fn test_dollar_body_is_verbatim() {
        let ddl = "create view v as select $$a;\nb$$ as c;\ncreate schema s;";
        let statements = split_statements(ddl);
        assert_eq!(
            statements,
            vec!["create view v as select $$a;\nb$$ as c", "create schema s"]
        );
    }

    #[test]
    fn test_comments_are_removed() {
        let ddl = "create table t ( -- trailing; comment\n a int /* block; */ , b int // x\n);";
        let statements = split_statements(ddl);
        assert_eq!(statements, vec!["create table t ( a int , b int )"]);
    }

    #[test]
    fn test_database_script() {
        let record = DatabaseRecord {
            name: "Sales".into(),
        };
        let script = database_script(&record, SAMPLE_DDL).unwrap();
        assert_eq!(script.statements.len(), 4);
        assert_eq!(script.drop.sql(), "DROP DATABASE IF EXISTS \"Sales\"");
    }

    #[test]
    fn test_database_script_empty_ddl() {
        let record = DatabaseRecord { name: "X".into() };
        assert!(database_script(&record, " \n;\n").is_err());
    }
}

//! Splitting command-line arguments into SQL statements.

use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

use crate::{Error, Result};

/// Strip one pair of matching enclosing quotes, if present.
///
/// Undoes the quoting a shell or interactive prompt leaves around an argument
/// such as `'ALTER TABLE t ADD COLUMN c INT'`.
pub fn trim_quote_mark(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Parse `args` into one canonical SQL string per statement.
///
/// Tokens are joined with single spaces, trimmed and unquoted before parsing,
/// so `["ALTER", "TABLE", "t", "DROP", "c;", "DROP TABLE u"]` yields two
/// statements.
pub fn extract_sqls_from_args(args: &[String]) -> Result<Vec<String>> {
    if args.is_empty() {
        return Err(Error::EmptyInput);
    }

    let concat = args.join(" ");
    let sql = trim_quote_mark(concat.trim());

    let statements =
        Parser::parse_sql(&MySqlDialect {}, sql).map_err(|source| Error::InvalidStatement {
            sql: sql.to_string(),
            source,
        })?;

    let sqls: Vec<String> = statements.iter().map(ToString::to_string).collect();
    if sqls.is_empty() {
        return Err(Error::NoValidStatements);
    }
    Ok(sqls)
}

//! Placeholder handling for caller-supplied predicate fragments.
//!
//! Fragments are written with bare `?` placeholders whatever the backend. For dialects with
//! numbered placeholders every `?` becomes `$n`:
//! ```rust
//! use tiny_orm::prelude::*;
//! use tiny_orm::translation::translate_placeholders;
//!
//! let sql = translate_placeholders("name = ? AND age = ?", Dialect::Postgres, 1);
//! assert_eq!(sql, "name = $1 AND age = $2");
//! ```
//!
//! Warning: quoted strings, comments and dollar-quoted blocks are skipped by a lightweight state
//! machine; unusual SQL (PL/pgSQL bodies, the jsonb `?` operators) may still be misread.

use std::borrow::Cow;

mod parsers;
mod scanner;

use scanner::placeholder_offsets;

use crate::types::Dialect;

/// Rewrite the `?` placeholders of `sql` into the syntax of `dialect`.
///
/// Numbering starts at `start`, so a fragment can follow arguments already bound by the
/// surrounding statement. Returns a borrowed `Cow` when no changes are needed.
#[must_use]
pub fn translate_placeholders(sql: &str, dialect: Dialect, start: usize) -> Cow<'_, str> {
    if !dialect.numbered_placeholders() {
        return Cow::Borrowed(sql);
    }

    let offsets = placeholder_offsets(sql);
    if offsets.is_empty() {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len() + offsets.len() * 2);
    let mut copied = 0;
    for (n, offset) in offsets.into_iter().enumerate() {
        out.push_str(&sql[copied..offset]);
        out.push_str(&dialect.placeholder(start + n));
        copied = offset + 1;
    }
    out.push_str(&sql[copied..]);

    Cow::Owned(out)
}

/// Number of `?` placeholders in `sql`.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    placeholder_offsets(sql).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_placeholders_for_postgres() {
        let res = translate_placeholders("name = ? AND age = ?", Dialect::Postgres, 1);
        assert_eq!(res, "name = $1 AND age = $2");

        let res = translate_placeholders("a = ?", Dialect::Postgres, 4);
        assert_eq!(res, "a = $4");
    }

    #[test]
    fn leaves_positional_dialects_alone() {
        for dialect in [Dialect::Mysql, Dialect::Sqlite] {
            let res = translate_placeholders("name = ? AND age = ?", dialect, 1);
            assert!(matches!(res, Cow::Borrowed(_)));
            assert_eq!(res, "name = ? AND age = ?");
        }
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "note = '?' AND a = ? -- b = ?\n/* ? */ AND c = ?";
        let res = translate_placeholders(sql, Dialect::Postgres, 1);
        assert_eq!(res, "note = '?' AND a = $1 -- b = ?\n/* ? */ AND c = $2");
        assert_eq!(count_placeholders(sql), 2);
    }

    #[test]
    fn skips_dollar_quoted_blocks() {
        let sql = "body = $q$ why? $q$ AND id = ?";
        let res = translate_placeholders(sql, Dialect::Postgres, 1);
        assert_eq!(res, "body = $q$ why? $q$ AND id = $1");
    }

    #[test]
    fn keeps_multibyte_text_intact() {
        let sql = "name = 'Zoë?' AND city = ?";
        let res = translate_placeholders(sql, Dialect::Postgres, 1);
        assert_eq!(res, "name = 'Zoë?' AND city = $1");
    }

    #[test]
    fn counts_escaped_quotes_correctly() {
        assert_eq!(count_placeholders("a = 'it''s?' AND b = ?"), 1);
        assert_eq!(count_placeholders("\"odd?col\" = ?"), 1);
        assert_eq!(count_placeholders("no placeholders"), 0);
    }
}

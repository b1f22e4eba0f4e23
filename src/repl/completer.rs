//! SQL keyword completion for the line editor.

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

/// Keywords offered on Tab, in suggestion order.
const KEYWORDS: &[&str] = &[
    "SELECT",
    "FROM",
    "WHERE",
    "JOIN",
    "GROUP BY",
    "ORDER BY",
    "INSERT INTO",
    "UPDATE",
    "DELETE FROM",
    "CREATE TABLE",
    "ALTER TABLE",
    "DROP TABLE",
    "COUNT",
    "SUM",
    "AVG",
    "MAX",
    "MIN",
    "DISTINCT",
    "AS",
    "AND",
    "OR",
    "NOT",
    "BETWEEN",
    "LIKE",
    "IN",
    "NULL",
    "IS NULL",
    "IS NOT NULL",
    "CASE",
    "WHEN",
    "THEN",
    "ELSE",
    "END",
    "INNER JOIN",
    "LEFT JOIN",
    "RIGHT JOIN",
    "FULL JOIN",
    "OUTER JOIN",
    "UNION",
    "INTERSECT",
    "EXCEPT",
    "MINUS",
    "HAVING",
    "LIMIT",
    "OFFSET",
    "FETCH",
    "CASCADE",
    "PRIMARY KEY",
    "FOREIGN KEY",
    "INDEX",
    "UNIQUE",
    "CHECK",
    "DEFAULT",
    "NULLIF",
    "COALESCE",
    "EXISTS",
    "ALL",
    "ANY",
    "ASC",
    "DESC",
    "OVER",
    "PARTITION BY",
    "SET",
    "FOR",
    "ON",
    "VALUES",
];

/// rustyline helper providing keyword completion.
#[derive(Debug, Default)]
pub struct SqlHelper;

impl SqlHelper {
    pub fn new() -> Self {
        Self
    }
}

/// Returns the byte offset where the word ending at `pos` starts.
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
        .last()
        .map(|(i, _)| i)
        .unwrap_or(pos)
}

/// Keywords matching `word` case-insensitively by prefix.
pub fn complete_keyword(word: &str) -> Vec<&'static str> {
    if word.is_empty() {
        return Vec::new();
    }
    let upper = word.to_uppercase();
    KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| keyword.starts_with(&upper))
        .collect()
}

impl Completer for SqlHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = word_start(line, pos);
        let candidates = complete_keyword(&line[start..pos])
            .into_iter()
            .map(|keyword| Pair {
                display: keyword.to_string(),
                replacement: keyword.to_string(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for SqlHelper {
    type Hint = String;
}

impl Highlighter for SqlHelper {}

impl Validator for SqlHelper {}

impl Helper for SqlHelper {}

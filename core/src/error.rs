use thiserror::Error;

/// Syntax errors raised while parsing a query string. Offsets are char
/// positions into the raw query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty query")]
    EmptyQuery,
    #[error("empty phrase at offset {0}")]
    EmptyPhrase(usize),
    #[error("unterminated phrase starting at offset {0}")]
    UnterminatedPhrase(usize),
    #[error("unbalanced parenthesis at offset {0}")]
    UnbalancedParen(usize),
    #[error("operator {operator} at offset {offset} is missing an operand")]
    MissingOperand { operator: &'static str, offset: usize },
    #[error("unexpected {token} at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },
    #[error("query has no positive term; a negation needs something to exclude from")]
    NegativeOnly,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("index holds no documents")]
    EmptyIndex,
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("corrupt index: {0}")]
    Corrupt(String),
}

use thiserror::Error;

/// Structural failures while turning text into a document.
///
/// Missing optional fields are not errors; they resolve to defaults so that
/// files written by older and newer format revisions both load.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("empty input")]
    EmptyInput,

    #[error("unbalanced parentheses at byte {0}")]
    UnbalancedParens(usize),

    #[error("unterminated string starting at byte {0}")]
    UnterminatedString(usize),

    #[error("unexpected trailing content at byte {0}")]
    TrailingContent(usize),

    #[error("expected ({expected} ...), found ({found} ...)")]
    UnexpectedTag { expected: String, found: String },

    #[error("expected a list, found `{0}`")]
    ExpectedList(String),

    #[error("unknown record `{0}` (strict mode)")]
    UnknownRecord(String),
}

/// Cross-reference failures inside an already-parsed document.
///
/// These indicate either a malformed file or a real bug; continuing would
/// produce wrong geometry, so they are surfaced instead of defaulted.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("no symbol `{0}` in the library table")]
    LibSymbolNotFound(String),

    #[error("no pin numbered {number} on library symbol {symbol}")]
    PinNotFound { number: String, symbol: String },

    #[error("no property `{name}` on {owner}")]
    PropertyNotFound { name: String, owner: String },
}

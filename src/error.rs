use thiserror::Error;

/// Errors raised while building the vocabulary, reading pairs, or training.
#[derive(Debug, Error)]
pub enum Error {
    /// A word was queried by string but is not in the vocabulary.
    #[error("token: {0} is not in the vocabulary")]
    Lookup(String),

    /// A word is in the vocabulary but owns no row of the tables, as the
    /// sentinel and the stop words do.
    #[error("token: {0} has no trainable row")]
    NoRow(String),

    /// A line of the pair source is not two whitespace separated integers.
    #[error("malformed pair line {line:?}: {reason}")]
    Parse { line: String, reason: String },

    /// A raw id read from the pair source has no row in the embedding tables.
    #[error("raw id {raw} is not a trainable id (trainable raw ids are {first}..{end})")]
    IndexOutOfRange { raw: usize, first: usize, end: usize },

    /// The pair source is empty or entirely blank, so it can never be cycled.
    #[error("pair source has no lines to read")]
    DegenerateSource,

    /// Missing or invalid parameters.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Errors raised at the dependency-source boundary.
//!
//! Linguistically odd input never produces an error; only a missing or
//! malformed parse does.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("CoNLL-U line {line}: {message}")]
    Conllu { line: usize, message: String },

    #[error("invalid token JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no dependency parse available for {0:?}")]
    NotParsed(String),

    #[error("lexicon configuration: {0}")]
    Lexicon(String),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("token at position {index} carries id {id}")]
    Misnumbered { index: usize, id: u32 },

    #[error("token {token} points at head {head}, outside the sentence")]
    HeadOutOfRange { token: u32, head: u32 },

    #[error("sentence has no root token")]
    MissingRoot,
}

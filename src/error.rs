//! Error types for the conversion pipeline.

use crate::mapper::MapError;
use crate::sql::{LexError, ParseError, Position};
use thiserror::Error;

/// Everything that can stop a conversion. The first error aborts the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Input is not valid UTF-8
    #[error("input is not valid UTF-8 at byte {offset}")]
    Encoding { offset: usize },

    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A statement has no faithful translation
    #[error("statement {statement} at {position}: {source}")]
    Map {
        statement: usize,
        position: Position,
        #[source]
        source: MapError,
    },

    /// Cancelled by the host between statements
    #[error("conversion cancelled before statement {statement}")]
    Cancelled { statement: usize },
}

impl ConvertError {
    /// Index of the statement the error belongs to, when there is one.
    pub fn statement(&self) -> Option<usize> {
        match self {
            Self::Encoding { .. } | Self::Lex(_) => None,
            Self::Parse(err) => Some(err.statement),
            Self::Map { statement, .. } | Self::Cancelled { statement } => Some(*statement),
        }
    }
}

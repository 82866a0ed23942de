use crate::query::OpKind;
use crate::{DocId, TermId};
use thiserror::Error;

/// Failures surfaced to the caller of a query. Unknown terms are not errors;
/// they are absorbed by the evaluator's resolution rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("failed to parse query: {message}")]
    Parse { message: String },
    #[error("cannot handle query shape: {0}")]
    UnsupportedShape(String),
    #[error("{kind} takes {expected} argument(s), got {got}")]
    Arity { kind: OpKind, expected: &'static str, got: usize },
}

impl QueryError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        QueryError::Parse { message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("term id 0 is reserved, cannot assign it to '{term}'")]
    ReservedTermId { term: String },
    #[error("posting list for term {term_id} is not strictly ascending")]
    UnsortedPostings { term_id: TermId },
    #[error("posting list for term {term_id} names document {doc_id}, which is not in the document map")]
    UnknownDocument { term_id: TermId, doc_id: DocId },
    #[error("{file}:{line_no}: unable to parse line '{line}'")]
    MalformedLine { file: String, line_no: usize, line: String },
}

pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod tokenizer;

pub use error::{IndexError, QueryError};
pub use index::{DocId, IndexBuilder, InvertedIndex, TermId, UNKNOWN_TERM};
pub use query::QueryEngine;

//! Boolean query pipeline: text is parsed into an [`Ast`], flattened into an
//! [`Operation`], then evaluated against an [`InvertedIndex`].

pub mod eval;
pub mod lexer;
pub mod normalize;
pub mod parser;
pub mod setops;

pub use eval::{evaluate, evaluate_flat, evaluate_tree, intersect_many, negate, resolve_signed, SignedTermId};
pub use normalize::{normalize, normalize_operation, Arg, OpKind, Operation, SignedTerm};
pub use parser::{parse, Ast, BoolOp, Node, Rest};

use crate::{DocId, InvertedIndex, QueryError};

/// Runs boolean queries against a borrowed index. Holds no state of its own,
/// so any number of engines may share one index across threads.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    index: &'a InvertedIndex,
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self { Self { index } }

    pub fn index(&self) -> &'a InvertedIndex { self.index }

    /// Parse and normalize without evaluating.
    pub fn plan(&self, query: &str) -> Result<Operation, QueryError> {
        let ast = parse(query)?;
        normalize(&ast)
    }

    /// Matching document ids, ascending.
    pub fn execute(&self, query: &str) -> Result<Vec<DocId>, QueryError> {
        let plan = self.plan(query).map_err(|e| {
            tracing::warn!(query, error = %e, "failed to plan query");
            e
        })?;
        tracing::debug!(query, %plan, complex = plan.is_complex(), "executing query");
        self.evaluate(&plan)
    }

    /// Evaluate an already normalized plan.
    pub fn evaluate(&self, plan: &Operation) -> Result<Vec<DocId>, QueryError> {
        let docs = evaluate(plan, self.index)?;
        tracing::debug!(hits = docs.len(), "query done");
        Ok(docs)
    }
}

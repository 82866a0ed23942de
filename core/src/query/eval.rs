use super::normalize::{Arg, OpKind, Operation, SignedTerm};
use super::setops::{difference, intersect_two, union_two};
use crate::{DocId, InvertedIndex, QueryError, TermId, UNKNOWN_TERM};
use std::borrow::Cow;
use std::fmt;

/// A term id carrying its sign: positive for a plain term, negative for a
/// negated term, zero for a plain term missing from the dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignedTermId(i64);

impl SignedTermId {
    pub const UNKNOWN: Self = Self(UNKNOWN_TERM as i64);

    pub fn plain(term_id: TermId) -> Self { Self(term_id as i64) }

    pub fn negated(term_id: TermId) -> Self { Self(-(term_id as i64)) }

    pub fn is_unknown(self) -> bool { self.0 == 0 }

    pub fn is_negated(self) -> bool { self.0 < 0 }

    pub fn term_id(self) -> TermId { self.0.unsigned_abs() as TermId }

    pub fn get(self) -> i64 { self.0 }
}

impl fmt::Display for SignedTermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

/// Resolve a leaf against the dictionary. This is the only place the unknown
/// sentinel is produced:
///
/// | token              | result                     |
/// |--------------------|----------------------------|
/// | `-term`, known     | `Some(-id)`                |
/// | `-term`, unknown   | `None` (drop the argument) |
/// | `term`, known      | `Some(id)`                 |
/// | `term`, unknown    | `Some(UNKNOWN)`            |
///
/// Since term id 0 never has postings, negating the sentinel yields the whole
/// universe (see [`negate`]).
pub fn resolve_signed(token: &SignedTerm, index: &InvertedIndex) -> Option<SignedTermId> {
    match (index.term_id(&token.term), token.negated) {
        (Some(id), true) => Some(SignedTermId::negated(id)),
        (None, true) => None,
        (Some(id), false) => Some(SignedTermId::plain(id)),
        (None, false) => Some(SignedTermId::UNKNOWN),
    }
}

/// `U \ postings(term_id)`. A term without a posting list, the sentinel
/// included, negates to the full universe.
pub fn negate(index: &InvertedIndex, term_id: TermId) -> Vec<DocId> {
    match index.postings(term_id) {
        Some(postings) => difference(&index.universe(), postings),
        None => index.universe(),
    }
}

/// Documents for a signed id on its own: postings when positive, the
/// negation otherwise. The sentinel is treated as a negation and so yields
/// every document.
pub fn signed_postings(index: &InvertedIndex, id: SignedTermId) -> Cow<'_, [DocId]> {
    if id.get() > 0 {
        Cow::Borrowed(index.postings(id.term_id()).unwrap_or(&[]))
    } else {
        Cow::Owned(negate(index, id.term_id()))
    }
}

/// Multi-way AND. Lists are ordered by length so the most selective one
/// seeds the result, and the fold stops once the result is empty.
///
/// The sentinel is sized like its negation (the whole universe), so it sorts
/// behind every real term; when the fold reaches it, it contributes nothing.
/// A conjunction naming an unknown plain term therefore matches no document.
/// An empty id list, which only arises when every argument was a dropped
/// negated unknown term, matches every document.
pub fn intersect_many(index: &InvertedIndex, ids: &[SignedTermId]) -> Vec<DocId> {
    let mut lists: Vec<(SignedTermId, Cow<'_, [DocId]>)> =
        ids.iter().map(|&id| (id, signed_postings(index, id))).collect();
    lists.sort_by_key(|(_, postings)| postings.len());

    let mut lists = lists.into_iter();
    let mut result = match lists.next() {
        Some((id, postings)) => conjunct(id, postings),
        None => return index.universe(),
    };
    for (id, postings) in lists {
        if result.is_empty() {
            break;
        }
        result = intersect_two(&result, &conjunct(id, postings));
    }
    result
}

fn conjunct(id: SignedTermId, postings: Cow<'_, [DocId]>) -> Vec<DocId> {
    if id.is_unknown() { Vec::new() } else { postings.into_owned() }
}

/// Evaluate an operation whose arguments are all terms.
pub fn evaluate_flat(operation: &Operation, index: &InvertedIndex) -> Result<Vec<DocId>, QueryError> {
    let mut ids = Vec::with_capacity(operation.args().len());
    for arg in operation.args() {
        match arg {
            Arg::Term(token) => ids.extend(resolve_signed(token, index)),
            Arg::Op(_) => {
                return Err(QueryError::UnsupportedShape(format!("nested operation in flat query {operation}")))
            }
        }
    }

    match operation.kind() {
        // The sentinel comes back from `signed_postings` as the universe, so an
        // unknown plain term in an OR matches every document.
        OpKind::Or => Ok(ids.iter().fold(Vec::new(), |acc, &id| union_two(&acc, &signed_postings(index, id)))),
        OpKind::And => Ok(intersect_many(index, &ids)),
        OpKind::Not => match ids.as_slice() {
            [] => Ok(index.universe()),
            [id] if id.is_negated() => Ok(index.postings(id.term_id()).unwrap_or(&[]).to_vec()),
            [id] => Ok(negate(index, id.term_id())),
            _ => Err(QueryError::UnsupportedShape(format!("{operation}"))),
        },
        OpKind::Lookup => match ids.as_slice() {
            [] => Ok(Vec::new()),
            [id] if id.is_unknown() => Ok(Vec::new()),
            [id] => {
                let mut docs = signed_postings(index, *id).into_owned();
                docs.sort_unstable();
                Ok(docs)
            }
            _ => Err(QueryError::UnsupportedShape(format!("{operation}"))),
        },
    }
}

/// Contribution of a term argument of a `kind` node on the tree path.
fn tree_leaf<'a>(token: &SignedTerm, kind: OpKind, index: &'a InvertedIndex) -> Cow<'a, [DocId]> {
    match (index.term_id(&token.term), token.negated) {
        (Some(id), true) => Cow::Owned(negate(index, id)),
        (None, true) if kind == OpKind::And => Cow::Borrowed(&[]),
        (None, true) => Cow::Owned(index.universe()),
        (Some(id), false) => Cow::Borrowed(index.postings(id).unwrap_or(&[])),
        // An unknown plain term matches nothing.
        (None, false) => Cow::Borrowed(&[]),
    }
}

/// Recursive evaluation for operations with nested sub-operations.
pub fn evaluate_tree(operation: &Operation, index: &InvertedIndex) -> Result<Vec<DocId>, QueryError> {
    let kind = operation.kind();
    let mut acc = if kind == OpKind::And { index.universe() } else { Vec::new() };

    for arg in operation.args() {
        let contribution = match arg {
            Arg::Op(sub) => Cow::Owned(evaluate_tree(sub, index)?),
            Arg::Term(token) => tree_leaf(token, kind, index),
        };
        acc = match kind {
            OpKind::And => intersect_two(&acc, &contribution),
            OpKind::Or | OpKind::Lookup => union_two(&acc, &contribution),
            OpKind::Not => return Ok(difference(&index.universe(), &contribution)),
        };
    }
    Ok(acc)
}

/// Evaluate a normalized query. Operations whose arguments are all terms take
/// the flat path; any nested operation sends the whole query down the tree path.
pub fn evaluate(operation: &Operation, index: &InvertedIndex) -> Result<Vec<DocId>, QueryError> {
    if operation.is_complex() {
        tracing::trace!(%operation, "tree evaluation");
        evaluate_tree(operation, index)
    } else {
        tracing::trace!(%operation, "flat evaluation");
        evaluate_flat(operation, index)
    }
}

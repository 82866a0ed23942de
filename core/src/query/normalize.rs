use super::parser::{Ast, BoolOp, Node};
use crate::QueryError;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpKind {
    And,
    Or,
    Not,
    Lookup,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpKind::And => "AND",
            OpKind::Or => "OR",
            OpKind::Not => "NOT",
            OpKind::Lookup => "LOOKUP",
        })
    }
}

impl From<BoolOp> for OpKind {
    fn from(op: BoolOp) -> Self {
        match op {
            BoolOp::And => OpKind::And,
            BoolOp::Or => OpKind::Or,
            BoolOp::Not => OpKind::Not,
        }
    }
}

/// A query leaf: a term, optionally negated. Rendered as `-term` when negated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignedTerm {
    pub term: String,
    pub negated: bool,
}

impl SignedTerm {
    pub fn plain(term: impl Into<String>) -> Self { Self { term: term.into(), negated: false } }

    pub fn negated(term: impl Into<String>) -> Self { Self { term: term.into(), negated: true } }

    pub fn negate(self) -> Self { Self { term: self.term, negated: !self.negated } }
}

impl fmt::Display for SignedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "-{}", self.term)
        } else {
            f.write_str(&self.term)
        }
    }
}

impl Serialize for SignedTerm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Arg {
    Term(SignedTerm),
    Op(Operation),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Term(t) => fmt::Display::fmt(t, f),
            Arg::Op(op) => fmt::Display::fmt(op, f),
        }
    }
}

/// Normalized query node. `NOT` and `LOOKUP` hold exactly one argument,
/// `AND` and `OR` at least two; the constructor enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    op: OpKind,
    args: Vec<Arg>,
}

impl Operation {
    pub fn new(op: OpKind, args: Vec<Arg>) -> Result<Self, QueryError> {
        let ok = match op {
            OpKind::Not | OpKind::Lookup => args.len() == 1,
            OpKind::And | OpKind::Or => args.len() >= 2,
        };
        if !ok {
            let expected = match op {
                OpKind::Not | OpKind::Lookup => "exactly 1",
                OpKind::And | OpKind::Or => "at least 2",
            };
            return Err(QueryError::Arity { kind: op, expected, got: args.len() });
        }
        Ok(Self { op, args })
    }

    pub fn lookup(term: impl Into<String>) -> Self {
        Self { op: OpKind::Lookup, args: vec![Arg::Term(SignedTerm::plain(term))] }
    }

    pub fn kind(&self) -> OpKind { self.op }

    pub fn args(&self) -> &[Arg] { &self.args }

    /// True when some argument is a nested operation rather than a term.
    pub fn is_complex(&self) -> bool { self.args.iter().any(|a| matches!(a, Arg::Op(_))) }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.op)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// Append `child` to the arguments of a `kind` node: same-operator AND/OR
/// children are spliced in, `NOT term` becomes a signed term, lookups
/// contribute their term, anything else is nested.
fn merge(kind: OpKind, args: &mut Vec<Arg>, child: Operation) {
    let Operation { op, args: mut child_args } = child;
    if op == kind && matches!(kind, OpKind::And | OpKind::Or) {
        args.append(&mut child_args);
        return;
    }
    match (op, child_args.pop()) {
        (OpKind::Not, Some(Arg::Term(t))) if child_args.is_empty() => args.push(Arg::Term(t.negate())),
        (OpKind::Lookup, Some(arg)) if child_args.is_empty() => args.push(arg),
        (op, last) => {
            child_args.extend(last);
            args.push(Arg::Op(Operation { op, args: child_args }));
        }
    }
}

/// Turn a parse tree into a flattened [`Operation`].
pub fn normalize(ast: &Ast) -> Result<Operation, QueryError> {
    let node = match ast {
        Ast::Term(t) => return Ok(Operation::lookup(t.as_str())),
        Ast::Node(node) => node,
    };
    let Node { op, fst, lst } = node;
    let Some(op) = op else {
        return normalize(fst);
    };
    if let (BoolOp::Not, Ast::Term(t)) = (op, fst.as_ref()) {
        return Operation::new(OpKind::Not, vec![Arg::Term(SignedTerm::plain(t.as_str()))]);
    }

    let kind = OpKind::from(*op);
    let mut args = Vec::new();
    merge(kind, &mut args, normalize(fst)?);
    for operand in lst.iter().flat_map(|rest| rest.iter()) {
        merge(kind, &mut args, normalize(operand)?);
    }
    Operation::new(kind, args)
}

/// Re-apply the flattening rules to an existing tree. A tree produced by
/// [`normalize`] comes back unchanged.
pub fn normalize_operation(operation: &Operation) -> Result<Operation, QueryError> {
    let kind = operation.kind();
    let mut args = Vec::with_capacity(operation.args().len());
    for arg in operation.args() {
        match arg {
            Arg::Term(t) => args.push(Arg::Term(t.clone())),
            Arg::Op(child) => merge(kind, &mut args, normalize_operation(child)?),
        }
    }
    Operation::new(kind, args)
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;

    fn plan(q: &str) -> Operation { normalize(&parse(q).unwrap()).unwrap() }

    #[test]
    fn single_term_is_lookup() {
        assert_eq!(plan("Caesar").to_string(), "LOOKUP(Caesar)");
        assert_eq!(plan("((Caesar))").to_string(), "LOOKUP(Caesar)");
    }

    #[test]
    fn flattens_same_operator_chains() {
        assert_eq!(plan("a AND (b AND c) AND d").to_string(), "AND(a, b, c, d)");
        assert_eq!(plan("(a OR b) OR (c OR d)").to_string(), "OR(a, b, c, d)");
    }

    #[test]
    fn keeps_mixed_operators_nested() {
        let op = plan("Caesar AND (Brutus OR Hamlet) AND Cleopatra");
        assert_eq!(op.to_string(), "AND(Caesar, OR(Brutus, Hamlet), Cleopatra)");
        assert!(op.is_complex());
    }

    #[test]
    fn not_term_becomes_signed_token() {
        let op = plan("a AND NOT b");
        assert_eq!(op.args(), &[Arg::Term(SignedTerm::plain("a")), Arg::Term(SignedTerm::negated("b"))]);
        assert!(!op.is_complex());
        assert_eq!(plan("a OR NOT b OR c").to_string(), "OR(a, -b, c)");
    }

    #[test]
    fn top_level_not_term() {
        assert_eq!(plan("NOT Caesar").to_string(), "NOT(Caesar)");
        assert_eq!(plan("NOT (Caesar)").to_string(), "NOT(Caesar)");
    }

    #[test]
    fn double_negation_cancels_inside_chains() {
        assert_eq!(plan("NOT NOT a").to_string(), "NOT(-a)");
        assert_eq!(plan("b AND NOT NOT a").to_string(), "AND(b, a)");
    }

    #[test]
    fn not_over_expression_stays_nested() {
        let op = plan("a AND NOT (b OR c)");
        assert_eq!(op.to_string(), "AND(a, NOT(OR(b, c)))");
        assert!(op.is_complex());
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        for q in [
            "Caesar",
            "NOT Caesar",
            "a AND b AND c",
            "a AND (b OR c) AND NOT (d AND e)",
            "(a OR NOT b) AND (c OR (d OR e))",
            "NOT NOT (a AND b)",
        ] {
            let once = plan(q);
            assert_eq!(normalize_operation(&once).unwrap(), once, "{q}");
        }
    }

    #[test]
    fn arity_checked_at_construction() {
        let err = Operation::new(OpKind::And, vec![Arg::Term(SignedTerm::plain("a"))]).unwrap_err();
        assert!(matches!(err, QueryError::Arity { kind: OpKind::And, got: 1, .. }));
        assert!(Operation::new(OpKind::Not, vec![]).is_err());
    }

    #[test]
    fn plan_serializes_signed_terms_as_strings() {
        let json = serde_json::to_value(plan("a AND NOT b")).unwrap();
        assert_eq!(json, serde_json::json!({"op": "AND", "args": ["a", "-b"]}));
    }
}

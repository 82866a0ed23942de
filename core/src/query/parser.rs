use super::lexer::{self, Token};
use crate::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
    Not,
}

/// Parse tree as produced by the grammar, before any flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    Term(String),
    Node(Node),
}

/// An operator applied to `fst` and, for binary chains, the operands in `lst`.
/// A node without an operator wraps a parenthesized group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub op: Option<BoolOp>,
    pub fst: Box<Ast>,
    pub lst: Option<Rest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rest {
    Single(Box<Ast>),
    Many(Vec<Ast>),
}

impl Rest {
    pub fn iter(&self) -> std::slice::Iter<'_, Ast> {
        match self {
            Rest::Single(ast) => std::slice::from_ref(ast.as_ref()).iter(),
            Rest::Many(asts) => asts.iter(),
        }
    }
}

impl Ast {
    pub fn term(t: impl Into<String>) -> Self { Ast::Term(t.into()) }

    pub fn has_operation(&self) -> bool { matches!(self, Ast::Node(Node { op: Some(_), .. })) }
}

/// Deepest nesting of `NOT` and parentheses a query may use. Normalization
/// and evaluation recurse along the same structure, so this bounds them too.
pub const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self { Self { tokens, pos: 0, depth: 0 } }

    fn descend(&mut self) -> Result<(), QueryError> {
        if self.depth >= MAX_DEPTH {
            return Err(QueryError::parse(format!(
                "query nested too deeply at position {} (limit {MAX_DEPTH})",
                self.pos.saturating_sub(1)
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn peek(&self) -> Option<&Token> { self.tokens.get(self.pos) }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect_rparen(&mut self) -> Result<(), QueryError> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            Some(tok) => Err(QueryError::parse(format!("expected ')' at position {}, got {tok}", self.pos - 1))),
            None => Err(QueryError::parse("expected closing parenthesis, got end of input")),
        }
    }

    /// or = and ("OR" and)*
    fn parse_or(&mut self) -> Result<Ast, QueryError> {
        let fst = self.parse_and()?;
        let mut rest = Vec::new();
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            rest.push(self.parse_and()?);
        }
        Ok(chain(BoolOp::Or, fst, rest))
    }

    /// and = unary ("AND" unary)*
    fn parse_and(&mut self) -> Result<Ast, QueryError> {
        let fst = self.parse_unary()?;
        let mut rest = Vec::new();
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            rest.push(self.parse_unary()?);
        }
        Ok(chain(BoolOp::And, fst, rest))
    }

    /// unary = "NOT" unary | primary
    fn parse_unary(&mut self) -> Result<Ast, QueryError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            self.descend()?;
            let operand = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Ast::Node(Node { op: Some(BoolOp::Not), fst: Box::new(operand), lst: None }));
        }
        self.parse_primary()
    }

    /// primary = "(" or ")" | term
    fn parse_primary(&mut self) -> Result<Ast, QueryError> {
        match self.advance() {
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.parse_or()?;
                self.expect_rparen()?;
                self.depth -= 1;
                Ok(Ast::Node(Node { op: None, fst: Box::new(inner), lst: None }))
            }
            Some(Token::Term(t)) => Ok(Ast::Term(t)),
            Some(tok) => Err(QueryError::parse(format!("unexpected {tok} at position {}", self.pos - 1))),
            None => Err(QueryError::parse("unexpected end of input")),
        }
    }
}

fn chain(op: BoolOp, fst: Ast, mut rest: Vec<Ast>) -> Ast {
    let lst = match rest.len() {
        0 => return fst,
        1 => Rest::Single(Box::new(rest.remove(0))),
        _ => Rest::Many(rest),
    };
    Ast::Node(Node { op: Some(op), fst: Box::new(fst), lst: Some(lst) })
}

/// Parse query text into an [`Ast`].
pub fn parse(query: &str) -> Result<Ast, QueryError> {
    let tokens = lexer::tokenize(query);
    if tokens.is_empty() {
        return Err(QueryError::parse("empty query"));
    }
    let mut parser = Parser::new(tokens);
    let ast = parser.parse_or()?;
    if let Some(tok) = parser.peek() {
        return Err(QueryError::parse(format!("unexpected {tok} at position {}", parser.pos)));
    }
    Ok(ast)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(op: Option<BoolOp>, fst: Ast, lst: Option<Rest>) -> Ast {
        Ast::Node(Node { op, fst: Box::new(fst), lst })
    }

    #[test]
    fn single_term() {
        assert_eq!(parse("Caesar").unwrap(), Ast::term("Caesar"));
        assert!(!parse("Caesar").unwrap().has_operation());
    }

    #[test]
    fn two_operands_use_single_rest() {
        let ast = parse("a AND b").unwrap();
        assert_eq!(ast, node(Some(BoolOp::And), Ast::term("a"), Some(Rest::Single(Box::new(Ast::term("b"))))));
    }

    #[test]
    fn longer_chains_use_list_rest() {
        let ast = parse("a OR b OR c").unwrap();
        assert_eq!(ast, node(Some(BoolOp::Or), Ast::term("a"), Some(Rest::Many(vec![Ast::term("b"), Ast::term("c")]))));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let ast = parse("a OR b AND c").unwrap();
        let and = node(Some(BoolOp::And), Ast::term("b"), Some(Rest::Single(Box::new(Ast::term("c")))));
        assert_eq!(ast, node(Some(BoolOp::Or), Ast::term("a"), Some(Rest::Single(Box::new(and)))));
    }

    #[test]
    fn parens_wrap_without_operator() {
        let ast = parse("(a)").unwrap();
        assert_eq!(ast, node(None, Ast::term("a"), None));
        assert!(!ast.has_operation());
    }

    #[test]
    fn not_takes_one_operand() {
        let ast = parse("NOT a AND b").unwrap();
        let not = node(Some(BoolOp::Not), Ast::term("a"), None);
        assert_eq!(ast, node(Some(BoolOp::And), not, Some(Rest::Single(Box::new(Ast::term("b"))))));
    }

    #[test]
    fn deep_nesting_is_a_parse_error() {
        let parens = format!("{}Caesar{}", "(".repeat(10_000), ")".repeat(10_000));
        let nots = format!("{}Caesar", "NOT ".repeat(10_000));
        for q in [parens, nots] {
            let err = parse(&q).unwrap_err();
            assert!(err.to_string().contains("nested too deeply"), "{err}");
        }
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        let q = format!("{}a{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(parse(&q).is_ok());
        let q = format!("{}a{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert!(parse(&q).is_err());
        // siblings do not add up
        let q = vec!["(NOT a)"; 2 * MAX_DEPTH].join(" OR ");
        assert!(parse(&q).is_ok());
    }

    #[test]
    fn malformed_queries_fail() {
        for q in ["", "   ", "a AND", "OR a", "(a OR b", "a OR b)", "NOT", "a b", "()"] {
            let err = parse(q).unwrap_err();
            assert!(matches!(err, QueryError::Parse { .. }), "{q:?} gave {err:?}");
        }
    }
}

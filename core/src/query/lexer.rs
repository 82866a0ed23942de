use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Term(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Term(t) => write!(f, "term '{t}'"),
            Token::And => write!(f, "'AND'"),
            Token::Or => write!(f, "'OR'"),
            Token::Not => write!(f, "'NOT'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
        }
    }
}

/// Split a query into tokens. Operators are recognised only in upper case;
/// any other run of non-space, non-parenthesis characters is a term.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(match word.as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "NOT" => Token::Not,
                    _ => Token::Term(word),
                });
            }
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_parens_from_terms() {
        assert_eq!(
            tokenize("(Brutus OR  Hamlet)AND NOT x"),
            vec![
                Token::LParen,
                Token::Term("Brutus".into()),
                Token::Or,
                Token::Term("Hamlet".into()),
                Token::RParen,
                Token::And,
                Token::Not,
                Token::Term("x".into()),
            ]
        );
    }

    #[test]
    fn lowercase_operators_are_terms() {
        assert_eq!(tokenize("and"), vec![Token::Term("and".into())]);
    }
}

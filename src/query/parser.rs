//! Tokenizer and recursive-descent parser for the query language.
//!
//! Precedence, loosest first: `or`, `and`, `not`, comparison.

use regex::Regex;
use serde_json::{Number, Value};

use super::{CompareOp, Expr, QueryError};

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    Op(CompareOp),
    RegexMatch,
    RegexNotMatch,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_str(&mut self, expected: &str) -> bool {
        if self.input[self.pos..].starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn tokenize(mut self) -> Result<Vec<(Token, usize)>, QueryError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let Some(ch) = self.peek_char() else {
                break;
            };
            let token = match ch {
                '"' | '\'' => self.quoted(ch)?,
                '(' | ')' | '[' | ']' | ',' => {
                    self.pos += 1;
                    match ch {
                        '(' => Token::LParen,
                        ')' => Token::RParen,
                        '[' => Token::LBracket,
                        ']' => Token::RBracket,
                        _ => Token::Comma,
                    }
                }
                c if c.is_ascii_digit() || (c == '-' && self.next_is_digit()) => self.number()?,
                c if c.is_alphabetic() || c == '_' || c == '$' => self.word(),
                _ => self.symbol()?,
            };
            tokens.push((token, start));
        }
        Ok(tokens)
    }

    fn next_is_digit(&self) -> bool {
        self.input[self.pos..]
            .chars()
            .nth(1)
            .is_some_and(|c| c.is_ascii_digit())
    }

    fn symbol(&mut self) -> Result<Token, QueryError> {
        let token = if self.consume_str("==") {
            Token::Op(CompareOp::Eq)
        } else if self.consume_str("!=") {
            Token::Op(CompareOp::Ne)
        } else if self.consume_str("=~") {
            Token::RegexMatch
        } else if self.consume_str("!~") {
            Token::RegexNotMatch
        } else if self.consume_str(">=") {
            Token::Op(CompareOp::Ge)
        } else if self.consume_str("<=") {
            Token::Op(CompareOp::Le)
        } else if self.consume_str(">") {
            Token::Op(CompareOp::Gt)
        } else if self.consume_str("<") {
            Token::Op(CompareOp::Lt)
        } else if self.consume_str("&&") {
            Token::And
        } else if self.consume_str("||") {
            Token::Or
        } else if self.consume_str("!") {
            Token::Not
        } else {
            return Err(QueryError::Syntax {
                message: format!("Unexpected character '{}'", self.peek_char().unwrap_or('?')),
                position: self.pos,
            });
        };
        Ok(token)
    }

    fn word(&mut self) -> Token {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' || ch == '$' {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
        match &self.input[start..self.pos] {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "true" => Token::True,
            "false" => Token::False,
            "null" | "nil" => Token::Null,
            "in" => Token::Op(CompareOp::In),
            "contains" => Token::Op(CompareOp::Contains),
            "startsWith" => Token::Op(CompareOp::StartsWith),
            "endsWith" => Token::Op(CompareOp::EndsWith),
            "matches" => Token::RegexMatch,
            word => Token::Ident(word.to_string()),
        }
    }

    fn number(&mut self) -> Result<Token, QueryError> {
        let start = self.pos;
        if self.peek_char() == Some('-') {
            self.pos += 1;
        }
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() || ch == '.' || ch == 'e' || ch == 'E' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.input[start..self.pos];
        text.parse::<f64>()
            .map(Token::Num)
            .map_err(|_| QueryError::Syntax {
                message: format!("Invalid number '{}'", text),
                position: start,
            })
    }

    fn quoted(&mut self, quote: char) -> Result<Token, QueryError> {
        let start = self.pos;
        self.pos += quote.len_utf8();
        let mut result = String::new();

        while let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
            if ch == quote {
                return Ok(Token::Str(result));
            }
            if ch == '\\' {
                let Some(escaped) = self.peek_char() else {
                    break;
                };
                self.pos += escaped.len_utf8();
                match escaped {
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    'r' => result.push('\r'),
                    '"' | '\'' | '\\' => result.push(escaped),
                    other => {
                        result.push('\\');
                        result.push(other);
                    }
                }
            } else {
                result.push(ch);
            }
        }

        Err(QueryError::Syntax {
            message: "Unterminated string".to_string(),
            position: start,
        })
    }
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    idx: usize,
    end: usize,
}

/// Parse query text into an expression tree
pub(crate) fn parse(input: &str) -> Result<Expr, QueryError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser { tokens, idx: 0, end: input.len() };
    let expr = parser.or()?;
    if let Some((token, position)) = parser.tokens.get(parser.idx) {
        return Err(QueryError::Syntax {
            message: format!("Unexpected {}", describe(token)),
            position: *position,
        });
    }
    Ok(expr)
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(name) => format!("'{}'", name),
        Token::Str(s) => format!("string {:?}", s),
        Token::Num(n) => format!("number {}", n),
        Token::Op(op) => format!("'{}'", op.symbol()),
        Token::RParen => "')'".to_string(),
        Token::RBracket => "']'".to_string(),
        Token::Comma => "','".to_string(),
        other => format!("{:?}", other).to_lowercase(),
    }
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.idx).map(|(token, _)| token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.idx).map_or(self.end, |(_, pos)| *pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.idx).map(|(token, _)| token.clone());
        if token.is_some() {
            self.idx += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.idx += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), QueryError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("Expected {}", what)))
        }
    }

    fn error(&self, message: String) -> QueryError {
        QueryError::Syntax { message, position: self.position() }
    }

    fn or(&mut self) -> Result<Expr, QueryError> {
        let mut lhs = self.and()?;
        while self.eat(&Token::Or) {
            let rhs = self.and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, QueryError> {
        let mut lhs = self.unary()?;
        while self.eat(&Token::And) {
            let rhs = self.unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, QueryError> {
        if self.eat(&Token::Not) {
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, QueryError> {
        let lhs = self.primary()?;
        match self.peek() {
            Some(Token::Op(op)) => {
                let op = *op;
                self.idx += 1;
                let rhs = self.primary()?;
                Ok(Expr::Compare { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
            }
            Some(Token::RegexMatch) | Some(Token::RegexNotMatch) => {
                let negated = self.peek() == Some(&Token::RegexNotMatch);
                self.idx += 1;
                let position = self.position();
                let pattern = match self.advance() {
                    Some(Token::Str(pattern)) => pattern,
                    _ => {
                        return Err(QueryError::Syntax {
                            message: "Expected a string pattern".to_string(),
                            position,
                        });
                    }
                };
                let regex = Regex::new(&pattern)
                    .map_err(|source| QueryError::Regex { pattern, source })?;
                Ok(Expr::Matches { lhs: Box::new(lhs), regex, negated })
            }
            _ => Ok(lhs),
        }
    }

    fn primary(&mut self) -> Result<Expr, QueryError> {
        let position = self.position();
        let Some(token) = self.advance() else {
            return Err(QueryError::Syntax {
                message: "Expected expression".to_string(),
                position,
            });
        };

        match token {
            Token::Ident(path) => Ok(Expr::Field(path.split('.').map(str::to_string).collect())),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Num(n) => Ok(Expr::Literal(number_value(n))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::LParen => {
                let inner = self.or()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if !self.eat(&Token::RBracket) {
                    loop {
                        items.push(self.primary()?);
                        if self.eat(&Token::RBracket) {
                            break;
                        }
                        self.expect(&Token::Comma, "',' or ']'")?;
                    }
                }
                Ok(Expr::List(items))
            }
            other => Err(QueryError::Syntax {
                message: format!("Unexpected {}", describe(&other)),
                position,
            }),
        }
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_operators() {
        let tokens: Vec<Token> = Lexer::new(r#"a>=1 && b =~ "x" || !c"#)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a".into()),
                Token::Op(CompareOp::Ge),
                Token::Num(1.0),
                Token::And,
                Token::Ident("b".into()),
                Token::RegexMatch,
                Token::Str("x".into()),
                Token::Or,
                Token::Not,
                Token::Ident("c".into()),
            ]
        );
    }

    #[test]
    fn test_escapes_in_strings() {
        let tokens = Lexer::new(r#"'it\'s' "a\"b""#).tokenize().unwrap();
        assert_eq!(tokens[0].0, Token::Str("it's".into()));
        assert_eq!(tokens[1].0, Token::Str("a\"b".into()));
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse("a or b and c").unwrap();
        assert!(matches!(expr, Expr::Or(_, rhs) if matches!(*rhs, Expr::And(_, _))));
    }

    #[test]
    fn test_error_positions() {
        match parse("level == ") {
            Err(QueryError::Syntax { position, .. }) => assert_eq!(position, 9),
            other => panic!("unexpected result: {:?}", other),
        }
        match parse("a == 1 )") {
            Err(QueryError::Syntax { position, message }) => {
                assert_eq!(position, 7);
                assert!(message.contains("')'"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(parse("a # b"), Err(QueryError::Syntax { position: 2, .. })));
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(parse("   "), Err(QueryError::Syntax { .. })));
    }

    #[test]
    fn test_negative_numbers_and_lists() {
        let expr = parse("x in [-1, 2.5, \"a\"]").unwrap();
        let Expr::Compare { rhs, .. } = expr else {
            panic!("expected comparison");
        };
        let Expr::List(items) = *rhs else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 3);
        assert!(matches!(&items[0], Expr::Literal(v) if v == &Value::from(-1)));
    }
}

//! Compiler for gettext `Plural-Forms` expressions.
//!
//! Accepts either a bare C expression over `n` (`n != 1`) or a whole header
//! value (`nplurals=3; plural=n%10==1 && n%100!=11 ? 0 : 1;`). The result is a
//! small AST evaluated with unsigned 64-bit arithmetic.

use std::fmt::Display;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

lazy_static! {
    static ref NPLURALS_REGEX: Regex = Regex::new(r"\bnplurals\s*=\s*([^;]*)").unwrap();
    static ref PLURAL_REGEX: Regex = Regex::new(r"\bplural\s*=\s*([^;]*)").unwrap();
}

/// A compiled plural expression.
///
/// Serializes as the source text it was compiled from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PluralExpression {
    source: String,
    nplurals: Option<usize>,
    ast: Expr,
}

impl PluralExpression {
    /// Compiles a bare expression or a `Plural-Forms` header value.
    pub fn compile(source: &str) -> Result<Self, Error> {
        let (nplurals, body, offset) = match PLURAL_REGEX.captures(source).and_then(|c| c.get(1)) {
            Some(body) => (parse_nplurals(source)?, body.as_str(), body.start()),
            None => (None, source, 0),
        };

        let ast = Parser::new(source, body, offset)?.parse()?;
        Ok(Self {
            source: source.to_string(),
            nplurals,
            ast,
        })
    }

    /// The text this expression was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The declared `nplurals`, when compiled from a header value.
    pub fn nplurals(&self) -> Option<usize> {
        self.nplurals
    }

    /// Evaluates the expression for `n`.
    pub fn evaluate(&self, n: u64) -> u64 {
        self.ast.eval(n)
    }
}

impl TryFrom<String> for PluralExpression {
    type Error = Error;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        PluralExpression::compile(&source)
    }
}

impl From<PluralExpression> for String {
    fn from(expression: PluralExpression) -> Self {
        expression.source
    }
}

impl Display for PluralExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

fn parse_nplurals(source: &str) -> Result<Option<usize>, Error> {
    let Some(value) = NPLURALS_REGEX.captures(source).and_then(|c| c.get(1)) else {
        return Ok(None);
    };
    match value.as_str().trim().parse::<usize>() {
        Ok(count) if count > 0 => Ok(Some(count)),
        _ => Err(Error::rule_syntax(
            source,
            value.start(),
            "nplurals must be a positive integer",
        )),
    }
}

/// Deepest nesting of parentheses, `!` and `?:` the parser accepts.
const MAX_DEPTH: usize = 64;

/// Longest expression, in tokens, the compiler accepts.
const MAX_TOKENS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    N,
    Const(u64),
    Not(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, n: u64) -> u64 {
        match self {
            Expr::N => n,
            Expr::Const(value) => *value,
            Expr::Not(inner) => u64::from(inner.eval(n) == 0),
            Expr::Ternary(cond, then, otherwise) => {
                if cond.eval(n) != 0 {
                    then.eval(n)
                } else {
                    otherwise.eval(n)
                }
            }
            Expr::Binary(BinOp::Or, lhs, rhs) => u64::from(lhs.eval(n) != 0 || rhs.eval(n) != 0),
            Expr::Binary(BinOp::And, lhs, rhs) => u64::from(lhs.eval(n) != 0 && rhs.eval(n) != 0),
            Expr::Binary(op, lhs, rhs) => {
                let (a, b) = (lhs.eval(n), rhs.eval(n));
                match op {
                    BinOp::Eq => u64::from(a == b),
                    BinOp::Ne => u64::from(a != b),
                    BinOp::Lt => u64::from(a < b),
                    BinOp::Le => u64::from(a <= b),
                    BinOp::Gt => u64::from(a > b),
                    BinOp::Ge => u64::from(a >= b),
                    BinOp::Add => a.wrapping_add(b),
                    BinOp::Sub => a.wrapping_sub(b),
                    BinOp::Mul => a.wrapping_mul(b),
                    // Division by zero is total: it yields 0.
                    BinOp::Div => a.checked_div(b).unwrap_or(0),
                    BinOp::Rem => a.checked_rem(b).unwrap_or(0),
                    BinOp::Or | BinOp::And => unreachable!("handled above"),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    N,
    Num(u64),
    Op(BinOp),
    Not,
    Question,
    Colon,
    LParen,
    RParen,
    End,
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, body: &str, offset: usize) -> Result<Self, Error> {
        let tokens = tokenize(source, body, offset)?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
            depth: 0,
        })
    }

    fn parse(mut self) -> Result<Expr, Error> {
        let expr = self.ternary()?;
        match self.peek() {
            Token::End => Ok(expr),
            _ => Err(self.error("unexpected trailing input")),
        }
    }

    fn peek(&self) -> Token {
        self.tokens[self.pos].0
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos].1
    }

    fn advance(&mut self) -> Token {
        let token = self.peek();
        if token != Token::End {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: &str) -> Error {
        let message = match self.peek() {
            Token::End => format!("{message} (unexpected end of expression)"),
            _ => message.to_string(),
        };
        Error::rule_syntax(self.source, self.offset(), message)
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), Error> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("expected `{what}`")))
        }
    }

    fn nested(&mut self, parse: fn(&mut Self) -> Result<Expr, Error>) -> Result<Expr, Error> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // cond ? a : b, right-associative
    fn ternary(&mut self) -> Result<Expr, Error> {
        let cond = self.binary(0)?;
        if self.peek() != Token::Question {
            return Ok(cond);
        }
        self.advance();
        let then = self.nested(Self::ternary)?;
        self.expect(Token::Colon, ":")?;
        let otherwise = self.nested(Self::ternary)?;
        Ok(Expr::Ternary(Box::new(cond), Box::new(then), Box::new(otherwise)))
    }

    fn binary(&mut self, level: usize) -> Result<Expr, Error> {
        const LEVELS: &[&[BinOp]] = &[
            &[BinOp::Or],
            &[BinOp::And],
            &[BinOp::Eq, BinOp::Ne],
            &[BinOp::Lt, BinOp::Le, BinOp::Gt, BinOp::Ge],
            &[BinOp::Add, BinOp::Sub],
            &[BinOp::Mul, BinOp::Div, BinOp::Rem],
        ];

        let Some(ops) = LEVELS.get(level) else {
            return self.unary();
        };

        let mut lhs = self.binary(level + 1)?;
        while let Token::Op(op) = self.peek() {
            if !ops.contains(&op) {
                break;
            }
            self.advance();
            let rhs = self.binary(level + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, Error> {
        match self.peek() {
            Token::Not => {
                self.advance();
                Ok(Expr::Not(Box::new(self.nested(Self::unary)?)))
            }
            Token::N => {
                self.advance();
                Ok(Expr::N)
            }
            Token::Num(value) => {
                self.advance();
                Ok(Expr::Const(value))
            }
            Token::LParen => {
                self.advance();
                let inner = self.nested(Self::ternary)?;
                self.expect(Token::RParen, ")")?;
                Ok(inner)
            }
            _ => Err(self.error("expected `n`, a number, `!` or `(`")),
        }
    }
}

fn tokenize(source: &str, body: &str, offset: usize) -> Result<Vec<(Token, usize)>, Error> {
    let bytes = body.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let at = offset + i;
        let next = bytes.get(i + 1).copied();
        let (token, width) = match bytes[i] {
            b' ' | b'\t' | b'\r' | b'\n' => {
                i += 1;
                continue;
            }
            b'n' => (Token::N, 1),
            b'0'..=b'9' => {
                let digits = bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
                let text = &body[i..i + digits];
                let value = text.parse::<u64>().map_err(|_| {
                    Error::rule_syntax(source, at, format!("number `{text}` is too large"))
                })?;
                (Token::Num(value), digits)
            }
            b'(' => (Token::LParen, 1),
            b')' => (Token::RParen, 1),
            b'?' => (Token::Question, 1),
            b':' => (Token::Colon, 1),
            b'+' => (Token::Op(BinOp::Add), 1),
            b'-' => (Token::Op(BinOp::Sub), 1),
            b'*' => (Token::Op(BinOp::Mul), 1),
            b'/' => (Token::Op(BinOp::Div), 1),
            b'%' => (Token::Op(BinOp::Rem), 1),
            b'|' if next == Some(b'|') => (Token::Op(BinOp::Or), 2),
            b'&' if next == Some(b'&') => (Token::Op(BinOp::And), 2),
            b'=' if next == Some(b'=') => (Token::Op(BinOp::Eq), 2),
            b'!' if next == Some(b'=') => (Token::Op(BinOp::Ne), 2),
            b'!' => (Token::Not, 1),
            b'<' if next == Some(b'=') => (Token::Op(BinOp::Le), 2),
            b'<' => (Token::Op(BinOp::Lt), 1),
            b'>' if next == Some(b'=') => (Token::Op(BinOp::Ge), 2),
            b'>' => (Token::Op(BinOp::Gt), 1),
            _ => {
                let ch = body[i..].chars().next().unwrap_or('?');
                return Err(Error::rule_syntax(
                    source,
                    at,
                    format!("unexpected character `{ch}`"),
                ));
            }
        };
        if tokens.len() == MAX_TOKENS {
            return Err(Error::rule_syntax(source, at, "expression is too long"));
        }
        tokens.push((token, at));
        i += width;
    }

    tokens.push((Token::End, offset + bytes.len()));
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str, n: u64) -> u64 {
        PluralExpression::compile(source).unwrap().evaluate(n)
    }

    #[test]
    fn test_germanic_rule() {
        assert_eq!(eval("n != 1", 0), 1);
        assert_eq!(eval("n != 1", 1), 0);
        assert_eq!(eval("(n != 1)", 2), 1);
    }

    #[test]
    fn test_header_value_form() {
        let expr = PluralExpression::compile("nplurals=2; plural=(n > 1);").unwrap();
        assert_eq!(expr.nplurals(), Some(2));
        assert_eq!(expr.evaluate(1), 0);
        assert_eq!(expr.evaluate(2), 1);
        assert_eq!(expr.source(), "nplurals=2; plural=(n > 1);");
    }

    #[test]
    fn test_header_without_trailing_semicolon() {
        let expr = PluralExpression::compile("nplurals=1; plural=0").unwrap();
        assert_eq!(expr.nplurals(), Some(1));
        assert_eq!(expr.evaluate(42), 0);
    }

    #[test]
    fn test_russian_rule() {
        let src = "nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : \
                   n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);";
        let expected = [(1, 0), (2, 1), (4, 1), (5, 2), (11, 2), (12, 2), (21, 0), (22, 1), (111, 2)];
        for (n, form) in expected {
            assert_eq!(eval(src, n), form, "n = {n}");
        }
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let sources = [
            format!("{}n{}", "(".repeat(500), ")".repeat(500)),
            format!("{}n", "!".repeat(1000)),
            format!("nplurals=2; plural={}0;", "n ? 1 : ".repeat(200)),
        ];
        for source in &sources {
            let err = PluralExpression::compile(source).unwrap_err();
            assert!(matches!(err, Error::RuleSyntax { .. }), "{err}");
            assert!(err.to_string().contains("nested too deeply"), "{err}");
        }
    }

    #[test]
    fn test_nesting_below_the_limit() {
        let source = format!("{}n != 1{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(eval(&source, 1), 0);
        assert_eq!(eval(&source, 2), 1);
        assert_eq!(eval(&format!("{}n", "!".repeat(40)), 3), 1);
    }

    #[test]
    fn test_deeply_nested_header_does_not_build_a_catalog() {
        let deep = format!("{}n{}", "(".repeat(1000), ")".repeat(1000));
        let err = crate::PluralRule::compile(&format!("nplurals=2; plural={deep};")).unwrap_err();
        assert!(matches!(err, Error::RuleSyntax { .. }), "{err}");
    }

    #[test]
    fn test_overlong_expression_is_a_syntax_error() {
        let source = format!("{}n", "n+".repeat(2000));
        let err = PluralExpression::compile(&source).unwrap_err();
        assert!(err.to_string().contains("expression is too long"), "{err}");
    }

    #[test]
    fn test_ternary_is_right_associative() {
        let src = "n==0 ? 0 : n==1 ? 1 : n==2 ? 2 : 3";
        assert_eq!(eval(src, 0), 0);
        assert_eq!(eval(src, 1), 1);
        assert_eq!(eval(src, 2), 2);
        assert_eq!(eval(src, 9), 3);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3", 0), 7);
        assert_eq!(eval("(1 + 2) * 3", 0), 9);
        assert_eq!(eval("n % 10 + 1 == 2", 11), 1);
        assert_eq!(eval("0 || 1 && 0", 0), 0);
        assert_eq!(eval("!n", 0), 1);
        assert_eq!(eval("!!n", 7), 1);
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        assert_eq!(eval("n / 0", 5), 0);
        assert_eq!(eval("n % 0", 5), 0);
    }

    #[test]
    fn test_subtraction_wraps() {
        assert_eq!(eval("n - 1", 0), u64::MAX);
    }

    #[test]
    fn test_syntax_errors_report_position() {
        match PluralExpression::compile("n != ").unwrap_err() {
            Error::RuleSyntax { position, message, .. } => {
                assert_eq!(position, 5);
                assert!(message.contains("unexpected end"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        match PluralExpression::compile("nplurals=2; plural=n $ 1;").unwrap_err() {
            Error::RuleSyntax { position, .. } => assert_eq!(position, 21),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_malformed_inputs() {
        for src in ["", "n ? 1", "(n", "n)", "n = 1", "x", "nplurals=0; plural=0;", "nplurals=two; plural=n;"] {
            assert!(PluralExpression::compile(src).is_err(), "accepted {src:?}");
        }
    }

    #[test]
    fn test_serde_as_source_text() {
        let expr = PluralExpression::compile("n > 1").unwrap();
        let json = serde_json::to_string(&expr).unwrap();
        assert_eq!(json, "\"n > 1\"");
        let back: PluralExpression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
        assert!(serde_json::from_str::<PluralExpression>("\"n >\"").is_err());
    }
}

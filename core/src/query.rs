//! Query syntax: terms, quoted phrases, `AND` / `OR` / `NOT` and parentheses.
//!
//! ```text
//! Query    := OrExpr
//! OrExpr   := AndExpr ( "OR" AndExpr )*
//! AndExpr  := NotExpr ( ["AND"] NotExpr )*
//! NotExpr  := ["NOT"] Primary
//! Primary  := TERM | PHRASE | "(" OrExpr ")"
//! ```
//!
//! Operators are recognized only in uppercase. Term text is kept verbatim;
//! normalization happens during evaluation.

use crate::error::ParseError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Term(String),
    Phrase(Vec<String>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn and(left: Expr, right: Expr) -> Expr { Expr::And(Box::new(left), Box::new(right)) }

    pub fn or(left: Expr, right: Expr) -> Expr { Expr::Or(Box::new(left), Box::new(right)) }

    pub fn not(operand: Expr) -> Expr { Expr::Not(Box::new(operand)) }

    /// Leaves not under any `Not`, in left-to-right order.
    pub fn positive_leaves(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        self.collect_positive(&mut out);
        out
    }

    fn collect_positive<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        match self {
            Expr::Term(_) | Expr::Phrase(_) => out.push(self),
            Expr::And(l, r) | Expr::Or(l, r) => {
                l.collect_positive(out);
                r.collect_positive(out);
            }
            Expr::Not(_) => {}
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Term(t) => write!(f, "{t}"),
            Expr::Phrase(words) => write!(f, "\"{}\"", words.join(" ")),
            Expr::And(l, r) => write!(f, "({l} AND {r})"),
            Expr::Or(l, r) => write!(f, "({l} OR {r})"),
            Expr::Not(e) => write!(f, "(NOT {e})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Word(String),
    Phrase(Vec<String>),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Word(w) => format!("term {w:?}"),
            Tok::Phrase(_) => "phrase".to_string(),
            Tok::And => "AND".to_string(),
            Tok::Or => "OR".to_string(),
            Tok::Not => "NOT".to_string(),
            Tok::LParen => "'('".to_string(),
            Tok::RParen => "')'".to_string(),
        }
    }

    fn starts_operand(&self) -> bool {
        matches!(self, Tok::Word(_) | Tok::Phrase(_) | Tok::LParen | Tok::Not)
    }
}

fn lex(input: &str) -> Result<Vec<(Tok, usize)>, ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                out.push((Tok::LParen, i));
                i += 1;
            }
            ')' => {
                out.push((Tok::RParen, i));
                i += 1;
            }
            '"' => {
                let start = i;
                let close = chars[i + 1..]
                    .iter()
                    .position(|&c| c == '"')
                    .ok_or(ParseError::UnterminatedPhrase(start))?;
                let inner: String = chars[i + 1..i + 1 + close].iter().collect();
                let words: Vec<String> = inner.split_whitespace().map(str::to_string).collect();
                if words.is_empty() {
                    return Err(ParseError::EmptyPhrase(start));
                }
                out.push((Tok::Phrase(words), start));
                i += close + 2;
            }
            _ => {
                let start = i;
                while i < chars.len() && !chars[i].is_whitespace() && !matches!(chars[i], '(' | ')' | '"') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let tok = match word.as_str() {
                    "AND" => Tok::And,
                    "OR" => Tok::Or,
                    "NOT" => Tok::Not,
                    _ => Tok::Word(word),
                };
                out.push((tok, start));
            }
        }
    }
    Ok(out)
}

struct Parser {
    toks: Vec<(Tok, usize)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> { self.toks.get(self.pos).map(|(t, _)| t) }

    fn offset(&self) -> usize { self.toks.get(self.pos).map(|(_, o)| *o).unwrap_or(self.end) }

    /// Advance past a token already inspected with `peek`, returning its offset.
    fn skip(&mut self) -> usize {
        let offset = self.offset();
        self.pos += 1;
        offset
    }

    fn bump(&mut self) -> Option<(Tok, usize)> {
        let t = self.toks.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.and_expr()?;
        while self.peek() == Some(&Tok::Or) {
            let offset = self.skip();
            self.require_operand("OR", offset)?;
            let right = self.and_expr()?;
            left = Expr::or(left, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.not_expr()?;
        loop {
            match self.peek() {
                Some(Tok::And) => {
                    let offset = self.skip();
                    self.require_operand("AND", offset)?;
                }
                Some(t) if t.starts_operand() => {}
                _ => break,
            }
            let right = self.not_expr()?;
            left = Expr::and(left, right);
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Expr, ParseError> {
        if self.peek() == Some(&Tok::Not) {
            let offset = self.skip();
            self.require_operand("NOT", offset)?;
            return Ok(Expr::not(self.primary()?));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let offset = self.offset();
        match self.bump() {
            Some((Tok::Word(w), _)) => Ok(Expr::Term(w)),
            Some((Tok::Phrase(words), _)) => Ok(Expr::Phrase(words)),
            Some((Tok::LParen, open)) => {
                if self.peek() == Some(&Tok::RParen) {
                    return Err(ParseError::UnexpectedToken { token: "')'".to_string(), offset: self.offset() });
                }
                let inner = self.or_expr()?;
                match self.bump() {
                    Some((Tok::RParen, _)) => Ok(inner),
                    _ => Err(ParseError::UnbalancedParen(open)),
                }
            }
            Some((Tok::RParen, o)) => Err(ParseError::UnbalancedParen(o)),
            Some((t, o)) => Err(ParseError::UnexpectedToken { token: t.describe(), offset: o }),
            None => Err(ParseError::UnexpectedToken { token: "end of query".to_string(), offset }),
        }
    }

    /// An operator must be followed by something that can start an operand.
    fn require_operand(&self, operator: &'static str, offset: usize) -> Result<(), ParseError> {
        match self.peek() {
            Some(t) if t.starts_operand() => Ok(()),
            _ => Err(ParseError::MissingOperand { operator, offset }),
        }
    }
}

/// Parse a raw query into an expression tree.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let toks = lex(input)?;
    if toks.is_empty() {
        return Err(ParseError::EmptyQuery);
    }
    if let Some((first, offset)) = toks.first() {
        if matches!(first, Tok::And | Tok::Or) {
            let operator = if *first == Tok::And { "AND" } else { "OR" };
            return Err(ParseError::MissingOperand { operator, offset: *offset });
        }
    }
    let mut parser = Parser { toks, pos: 0, end: input.chars().count() };
    let expr = parser.or_expr()?;
    if let Some((tok, offset)) = parser.bump() {
        return Err(match tok {
            Tok::RParen => ParseError::UnbalancedParen(offset),
            other => ParseError::UnexpectedToken { token: other.describe(), offset },
        });
    }
    if expr.positive_leaves().is_empty() {
        return Err(ParseError::NegativeOnly);
    }
    tracing::debug!(query = input, parsed = %expr, "parsed query");
    Ok(expr)
}

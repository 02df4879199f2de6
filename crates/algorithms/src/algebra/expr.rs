//! Formula parsing and evaluation
//!
//! Recursive-descent parser for the calculator's formula language:
//! `+ - * / ^`, unary minus, parentheses, numeric literals and grid
//! identifiers. Identifiers are resolved to grid indices at parse time,
//! so evaluation is a plain walk over a slice of cell values.

use pozar_core::{Error, Result};

/// A parsed formula
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(f64),
    /// Index into the grid list the formula was parsed against
    Grid(usize),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Expr {
    /// Parse a formula against an ordered list of grid names
    pub fn parse(formula: &str, names: &[&str]) -> Result<Expr> {
        let tokens = tokenize(formula)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            names,
            end: formula.len(),
        };
        let expr = parser.expression()?;
        if let Some(&(at, _)) = parser.peek() {
            return Err(formula_error(at, "unexpected trailing input"));
        }
        Ok(expr)
    }

    /// Evaluate against one cell's values, ordered like the parse-time names
    pub fn eval(&self, values: &[f64]) -> f64 {
        match self {
            Expr::Literal(v) => *v,
            Expr::Grid(i) => values[*i],
            Expr::Neg(inner) => -inner.eval(values),
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval(values);
                let b = rhs.eval(values);
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn formula_error(position: usize, message: impl Into<String>) -> Error {
    Error::Formula {
        position,
        message: message.into(),
    }
}

fn tokenize(formula: &str) -> Result<Vec<(usize, Token)>> {
    let bytes = formula.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push((i, Token::Plus));
                i += 1;
            }
            '-' => {
                tokens.push((i, Token::Minus));
                i += 1;
            }
            '*' => {
                tokens.push((i, Token::Star));
                i += 1;
            }
            '/' => {
                tokens.push((i, Token::Slash));
                i += 1;
            }
            '^' => {
                tokens.push((i, Token::Caret));
                i += 1;
            }
            '(' => {
                tokens.push((i, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((i, Token::RParen));
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                // Optional exponent
                if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                    let mut j = i + 1;
                    if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                        j += 1;
                    }
                    if j < bytes.len() && bytes[j].is_ascii_digit() {
                        i = j;
                        while i < bytes.len() && bytes[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text = &formula[start..i];
                let value: f64 = text
                    .parse()
                    .map_err(|_| formula_error(start, format!("invalid number '{}'", text)))?;
                tokens.push((start, Token::Number(value)));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                tokens.push((start, Token::Ident(formula[start..i].to_string())));
            }
            other => {
                return Err(formula_error(i, format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    names: &'a [&'a str],
    end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&(usize, Token)> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expression(&mut self) -> Result<Expr> {
        let mut lhs = self.term()?;
        while let Some((_, token)) = self.peek() {
            let op = match token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        while let Some((_, token)) = self.peek() {
            let op = match token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr> {
        if matches!(self.peek(), Some((_, Token::Minus))) {
            self.pos += 1;
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.atom()?;
        if matches!(self.peek(), Some((_, Token::Caret))) {
            self.pos += 1;
            // Right-associative; exponent may carry its own unary minus
            let exponent = self.unary()?;
            return Ok(Expr::Binary(
                BinaryOp::Pow,
                Box::new(base),
                Box::new(exponent),
            ));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr> {
        match self.advance() {
            Some((_, Token::Number(v))) => Ok(Expr::Literal(v)),
            Some((at, Token::Ident(name))) => {
                let index = self
                    .names
                    .iter()
                    .position(|n| *n == name)
                    .ok_or_else(|| formula_error(at, format!("unknown grid '{}'", name)))?;
                Ok(Expr::Grid(index))
            }
            Some((_, Token::LParen)) => {
                let inner = self.expression()?;
                match self.advance() {
                    Some((_, Token::RParen)) => Ok(inner),
                    Some((at, _)) => Err(formula_error(at, "expected ')'")),
                    None => Err(formula_error(self.end, "unclosed '('")),
                }
            }
            Some((at, _)) => Err(formula_error(at, "expected number, grid or '('")),
            None => Err(formula_error(self.end, "unexpected end of formula")),
        }
    }
}

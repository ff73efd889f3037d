//! Expression evaluation tool.
//!
//! Supports `+`, `-`, `*`, `/`, `^` (right-associative power),
//! parentheses, unary negation, and decimal numbers. Uses a
//! recursive-descent parser; malformed input and division by zero are
//! recoverable execution failures, fed back to the oracle as observations.

use async_trait::async_trait;
use stepline_core::error::ToolError;
use stepline_core::step::Observation;
use stepline_core::tool::Tool;

pub struct EvaluateExpressionTool;

#[async_trait]
impl Tool for EvaluateExpressionTool {
    fn name(&self) -> &str {
        "evaluate_expression"
    }

    fn description(&self) -> &str {
        "Compute a mathematical expression. Supports +, -, *, /, ^, parentheses, and decimal numbers."
    }

    fn params(&self) -> &[&str] {
        &["expression"]
    }

    async fn invoke(&self, args: &[String]) -> Result<Observation, ToolError> {
        let value = evaluate(&args[0]).map_err(|reason| ToolError::ExecutionFailed {
            tool: self.name().to_string(),
            reason,
        })?;
        Ok(Observation::Number(value))
    }
}

/// Evaluate a mathematical expression string.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let tokens = tokenize(expr)?;
    let mut cursor = Cursor { tokens: &tokens, pos: 0 };
    let value = cursor.sum()?;
    if cursor.pos < cursor.tokens.len() {
        return Err(format!(
            "unexpected token after expression: {:?}",
            cursor.tokens[cursor.pos]
        ));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Caret);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            _ if c.is_ascii_digit() || c == '.' => {
                let mut num = String::new();
                while let Some(&nc) = chars.peek() {
                    if nc.is_ascii_digit() || nc == '.' {
                        num.push(nc);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = num.parse().map_err(|_| format!("invalid number: {num}"))?;
                tokens.push(Token::Number(value));
            }
            _ => return Err(format!("unexpected character: '{c}'")),
        }
    }

    if tokens.is_empty() {
        return Err("empty expression".into());
    }
    Ok(tokens)
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // sum = product (('+' | '-') product)*
    fn sum(&mut self) -> Result<f64, String> {
        let mut left = self.product()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.next();
                    left += self.product()?;
                }
                Token::Minus => {
                    self.next();
                    left -= self.product()?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // product = power (('*' | '/') power)*
    fn product(&mut self) -> Result<f64, String> {
        let mut left = self.power()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.next();
                    left *= self.power()?;
                }
                Token::Slash => {
                    self.next();
                    let right = self.power()?;
                    if right == 0.0 {
                        return Err("division by zero".into());
                    }
                    left /= right;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    // power = unary ('^' power)?   — right-associative
    fn power(&mut self) -> Result<f64, String> {
        let base = self.unary()?;
        if let Some(Token::Caret) = self.peek() {
            self.next();
            let exponent = self.power()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // unary = '-' unary | atom
    fn unary(&mut self) -> Result<f64, String> {
        if let Some(Token::Minus) = self.peek() {
            self.next();
            return Ok(-self.unary()?);
        }
        self.atom()
    }

    // atom = NUMBER | '(' sum ')'
    fn atom(&mut self) -> Result<f64, String> {
        match self.next() {
            Some(Token::Number(n)) => Ok(*n),
            Some(Token::LParen) => {
                let value = self.sum()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("expected closing parenthesis".into()),
                }
            }
            Some(tok) => Err(format!("unexpected token: {tok:?}")),
            None => Err("unexpected end of expression".into()),
        }
    }
}

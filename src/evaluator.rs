use std::fmt::{Display, Formatter};
use std::iter::Peekable;
use std::slice::Iter;

use thiserror::Error;

use crate::diagnostics::Diagnostics;
use crate::token::{LiteralValue, Token, TokenKind};

/// the evaluator's runtime value domain. Created here, handed to the driver
/// for display, never stored anywhere.
#[derive(Debug, PartialEq, Clone)]
pub enum EvalValue {
    Number(f64),
    Boolean(bool),
    Nil,
    Text(String),
}

impl Display for EvalValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            // Display formatting drops the .0 on integral values, so `1 + 2`
            // prints `3` even though the literal echo would say `3.0`.
            EvalValue::Number(n) => write!(f, "{n}"),
            EvalValue::Boolean(b) => write!(f, "{b}"),
            EvalValue::Nil => write!(f, "nil"),
            EvalValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("Expect expression.")]
    ExpectedExpression { line: usize },
    #[error("Operand must be a number.")]
    UnaryOperandNotNumber { line: usize },
    #[error("Operands must be numbers.")]
    BinaryOperandsNotNumbers { line: usize },
    #[error("Expect ')' after expression.")]
    UnclosedGrouping { line: usize },
    #[error("Expect end of expression.")]
    ExpectedEof { line: usize },
}

impl EvalError {
    pub fn line(&self) -> usize {
        match self {
            EvalError::ExpectedExpression { line }
            | EvalError::UnaryOperandNotNumber { line }
            | EvalError::BinaryOperandsNotNumbers { line }
            | EvalError::UnclosedGrouping { line }
            | EvalError::ExpectedEof { line } => *line,
        }
    }
}

/// public interface for evaluating one scanned expression. The first error
/// aborts the evaluation and comes back as a single diagnostic next to a Nil
/// result; a clean run comes back with an empty collection.
pub fn evaluate(tokens: &[Token]) -> (EvalValue, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let mut evaluator = Evaluator {
        tokens: tokens.iter().peekable(),
    };
    match evaluator.run() {
        Ok(value) => (value, diagnostics),
        Err(error) => {
            diagnostics.report(error.line(), error.to_string());
            (EvalValue::Nil, diagnostics)
        }
    }
}

/// recursive descent straight to values: each grammar rule is a method that
/// consumes the tokens it recognizes and returns what they evaluate to.
/// There is no AST in between, the grammar is small enough to do without one.
struct Evaluator<'a> {
    tokens: Peekable<Iter<'a, Token>>,
}

impl<'a> Evaluator<'a> {
    fn run(&mut self) -> Result<EvalValue, EvalError> {
        let value = self.expression()?;
        match self.tokens.peek() {
            Some(token) if token.kind != TokenKind::EOF => {
                Err(EvalError::ExpectedEof { line: token.line })
            }
            _ => Ok(value),
        }
    }

    fn expression(&mut self) -> Result<EvalValue, EvalError> {
        self.term()
    }

    /// term := unary ( "+" unary )*
    fn term(&mut self) -> Result<EvalValue, EvalError> {
        let mut value = self.unary()?;
        while let Some(operator) = self.match_current(&[TokenKind::Plus]) {
            let right = self.unary()?;
            value = match (value, right) {
                (EvalValue::Number(left), EvalValue::Number(right)) => {
                    EvalValue::Number(left + right)
                }
                _ => {
                    return Err(EvalError::BinaryOperandsNotNumbers {
                        line: operator.line,
                    })
                }
            };
        }
        Ok(value)
    }

    /// unary := ( "-" | "!" ) unary | primary
    fn unary(&mut self) -> Result<EvalValue, EvalError> {
        if let Some(operator) = self.match_current(&[TokenKind::Minus, TokenKind::Bang]) {
            let operand = self.unary()?;
            return match operator.kind {
                TokenKind::Minus => match operand {
                    EvalValue::Number(n) => Ok(EvalValue::Number(-n)),
                    _ => Err(EvalError::UnaryOperandNotNumber {
                        line: operator.line,
                    }),
                },
                TokenKind::Bang => Ok(EvalValue::Boolean(!is_truthy(&operand))),
                _ => unreachable!("match_current only yields the kinds it was asked for"),
            };
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<EvalValue, EvalError> {
        let token = match self.tokens.peek() {
            Some(token) => *token,
            // the scanner terminates every stream with EOF, which the arm
            // below turns into a proper error
            None => unreachable!("token stream ended without EOF"),
        };
        match token.kind {
            TokenKind::Number | TokenKind::String => {
                self.tokens.next();
                match &token.literal {
                    Some(LiteralValue::Number(n)) => Ok(EvalValue::Number(*n)),
                    Some(LiteralValue::Text(s)) => Ok(EvalValue::Text(s.clone())),
                    None => unreachable!("literal token scanned without a payload"),
                }
            }
            TokenKind::True => {
                self.tokens.next();
                Ok(EvalValue::Boolean(true))
            }
            TokenKind::False => {
                self.tokens.next();
                Ok(EvalValue::Boolean(false))
            }
            TokenKind::Nil => {
                self.tokens.next();
                Ok(EvalValue::Nil)
            }
            TokenKind::LeftParen => {
                self.tokens.next();
                let value = self.expression()?;
                if self.consume(TokenKind::RightParen).is_none() {
                    let line = self.tokens.peek().map(|t| t.line).unwrap_or(token.line);
                    return Err(EvalError::UnclosedGrouping { line });
                }
                Ok(value)
            }
            _ => Err(EvalError::ExpectedExpression { line: token.line }),
        }
    }

    /// consume and return the next token when its kind is one of `kinds`
    fn match_current(&mut self, kinds: &[TokenKind]) -> Option<&'a Token> {
        for kind in kinds {
            if let Some(token) = self.tokens.next_if(|t| t.kind == *kind) {
                return Some(token);
            }
        }
        None
    }

    fn consume(&mut self, kind: TokenKind) -> Option<&'a Token> {
        self.tokens.next_if(|t| t.kind == kind)
    }
}

fn is_truthy(value: &EvalValue) -> bool {
    match value {
        EvalValue::Nil => false,
        EvalValue::Boolean(b) => *b,
        // everything else is truthy, zero and the empty string included
        _ => true,
    }
}

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::{from_utf8, Chars};
use std::sync::LazyLock;

use thiserror::Error;

use crate::diagnostics::Diagnostics;
use crate::token::{LiteralValue, Token, TokenKind};

/// reserved words and the kinds they scan to. Built once, never written again,
/// so independent scans can share it without coordination.
static RESERVED_WORDS: LazyLock<HashMap<&'static str, TokenKind>> = LazyLock::new(|| {
    HashMap::from([
        ("and", TokenKind::And),
        ("class", TokenKind::Class),
        ("else", TokenKind::Else),
        ("false", TokenKind::False),
        ("fun", TokenKind::Fun),
        ("for", TokenKind::For),
        ("if", TokenKind::If),
        ("nil", TokenKind::Nil),
        ("or", TokenKind::Or),
        ("print", TokenKind::Print),
        ("return", TokenKind::Return),
        ("super", TokenKind::Super),
        ("this", TokenKind::This),
        ("true", TokenKind::True),
        ("var", TokenKind::Var),
        ("while", TokenKind::While),
    ])
});

/// public interface for tokenizing. Scans the whole input in one pass and
/// returns every token it could make sense of along with every problem it hit.
pub fn scan(source: &str) -> (Vec<Token>, Diagnostics) {
    let mut scanner = Scanner::new(source);
    scanner.scan_tokens();
    (scanner.tokens, scanner.diagnostics)
}

struct Scanner<'a> {
    source: &'a str,
    char_iter: Peekable<Chars<'a>>,
    tokens: Vec<Token>,
    diagnostics: Diagnostics,

    // position of the start of lexeme
    current_lexeme_start: usize,
    current: usize,
    line: usize,
}

#[derive(Debug, Error, PartialEq)]
pub enum LexError {
    #[error("Unexpected character: {character}")]
    UnexpectedCharacter { line: usize, character: char },
    #[error("Unterminated string.")]
    UnterminatedString { line: usize },
    #[error("Invalid number literal: {lexeme}")]
    InvalidNumberLiteral { line: usize, lexeme: String },
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { line, .. }
            | LexError::UnterminatedString { line, .. }
            | LexError::InvalidNumberLiteral { line, .. } => *line,
        }
    }
}

impl Scanner<'_> {
    fn new(source: &str) -> Scanner {
        Scanner {
            source,
            char_iter: source.chars().peekable(),
            tokens: vec![],
            diagnostics: Diagnostics::new(),
            current_lexeme_start: 0,
            current: 0,
            line: 1,
        }
    }

    fn scan_tokens(&mut self) {
        while !self.is_at_end() {
            if let Err(error) = self.scan_token() {
                self.diagnostics.report(error.line(), error.to_string());
            }
        }
        self.tokens.push(Token {
            kind: TokenKind::EOF,
            lexeme: "".to_string(),
            literal: None,
            line: self.line,
        });
    }

    fn scan_token(&mut self) -> Result<(), LexError> {
        // set start of lexeme
        self.current_lexeme_start = self.current;
        let c: char = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            ';' => self.add_token(TokenKind::Semicolon),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            '*' => self.add_token(TokenKind::Star),
            '!' => {
                let kind = if self.match_one('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.match_one('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_one('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_one('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '/' => {
                if self.match_one('/') {
                    // comment runs through the end of the line, the newline itself stays
                    while self.peek_one().is_some_and(|c| *c != '\n') {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            '.' => {
                // a dot opening a number (`.5`) beats the DOT punctuation
                if self.peek_one().is_some_and(is_digit) {
                    self.number()?;
                } else {
                    self.add_token(TokenKind::Dot);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string()?,
            c if is_digit(&c) => self.number()?,
            c if is_alpha(&c) => self.identifier(),
            _ => {
                return Err(LexError::UnexpectedCharacter {
                    line: self.line,
                    character: c,
                });
            }
        }
        Ok(())
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn match_one(&mut self, expected: char) -> bool {
        if self.peek_one() != Some(&expected) {
            return false;
        }
        self.advance();
        true
    }

    fn advance(&mut self) -> char {
        let current_char = self
            .char_iter
            .next()
            .expect("advance is only called after an is_at_end check");
        self.current += current_char.len_utf8();
        current_char
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_literal_token(kind, None);
    }

    fn add_literal_token(&mut self, kind: TokenKind, literal: Option<LiteralValue>) {
        let text: String = self.source[self.current_lexeme_start..self.current].to_string();
        self.tokens.push(Token {
            kind,
            lexeme: text,
            literal,
            line: self.line,
        });
    }

    /// like advance but does not consume the character. 1 lookahead.
    fn peek_one(&mut self) -> Option<&char> {
        self.char_iter.peek()
    }

    /// 2 lookahead, by re-slicing the source (Peekable only gives us one).
    fn peek_two(&self) -> Option<char> {
        from_utf8(&self.source.as_bytes()[self.current..])
            .expect("current always sits on a char boundary")
            .chars()
            .nth(1)
    }

    fn string(&mut self) -> Result<(), LexError> {
        // escapes get resolved here, so the content diverges from the lexeme
        let mut content = String::new();
        loop {
            match self.peek_one().copied() {
                // a raw newline or the end of input means the string never closed.
                // The newline stays unconsumed so the pass resumes right after the
                // failure point, with the line counter bumped by the main loop.
                None | Some('\n') => {
                    return Err(LexError::UnterminatedString { line: self.line });
                }
                Some('"') => break,
                Some('\\') if self.peek_two() == Some('"') => {
                    self.advance();
                    self.advance();
                    content.push('"');
                }
                Some(_) => {
                    let c = self.advance();
                    content.push(c);
                }
            }
        }

        // consume closing quote
        self.advance();
        self.add_literal_token(TokenKind::String, Some(LiteralValue::Text(content)));
        Ok(())
    }

    fn number(&mut self) -> Result<(), LexError> {
        while self.peek_one().is_some_and(|c| is_digit(c) || *c == '.') {
            self.advance();
        }

        // the maximal munch can pick up several dots (`1.2.3`), which only a
        // real parse attempt can reject
        let lexeme = &self.source[self.current_lexeme_start..self.current];
        match lexeme.parse::<f64>() {
            Ok(value) => {
                self.add_literal_token(TokenKind::Number, Some(LiteralValue::Number(value)));
                Ok(())
            }
            Err(_) => Err(LexError::InvalidNumberLiteral {
                line: self.line,
                lexeme: lexeme.to_string(),
            }),
        }
    }

    fn identifier(&mut self) {
        while self.peek_one().is_some_and(is_alphanumeric) {
            self.advance();
        }

        let lexeme = &self.source[self.current_lexeme_start..self.current];
        let kind = RESERVED_WORDS
            .get(lexeme)
            .copied()
            .unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }
}

fn is_digit(c: &char) -> bool {
    matches!(c, '0'..='9')
}

fn is_alpha(c: &char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_')
}

fn is_alphanumeric(c: &char) -> bool {
    is_digit(c) || is_alpha(c)
}

//! Token stream wrapper for the recursive descent parser.

use std::mem::discriminant;
use std::ops::Range;

use archweave_core::{CompileError, SourceLocation};

use crate::lexer::Token;
use crate::source::LineIndex;

/// Token stream with lookahead and location tracking.
///
/// Each token is paired with its byte span so errors can point at the exact
/// line and column of the offending token.
pub(crate) struct TokenStream<'src> {
    tokens: &'src [(Token, Range<usize>)],
    pos: usize,
    lines: &'src LineIndex<'src>,
}

impl<'src> TokenStream<'src> {
    pub(crate) fn new(tokens: &'src [(Token, Range<usize>)], lines: &'src LineIndex<'src>) -> Self {
        Self {
            tokens,
            pos: 0,
            lines,
        }
    }

    /// Peek at the current token without consuming it.
    pub(crate) fn peek(&self) -> Option<&'src Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Peek at the nth token ahead without consuming.
    pub(crate) fn peek_nth(&self, n: usize) -> Option<&'src Token> {
        self.tokens.get(self.pos + n).map(|(tok, _)| tok)
    }

    /// Advance to the next token and return the current one.
    pub(crate) fn advance(&mut self) -> Option<&'src Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check whether the current token has the same variant as `expected`.
    pub(crate) fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if discriminant(t) == discriminant(expected))
    }

    /// Consume the current token if it matches.
    pub(crate) fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Expect a specific token and advance past it.
    pub(crate) fn expect(&mut self, expected: Token, context: &str) -> Result<(), CompileError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {expected} {context}").trim_end().to_string()))
        }
    }

    /// Expect an identifier and return its text and location.
    pub(crate) fn expect_ident(
        &mut self,
        context: &str,
    ) -> Result<(String, SourceLocation), CompileError> {
        let location = self.location();
        match self.peek() {
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok((name.clone(), location))
            }
            _ => Err(self.error(format!("expected identifier {context}"))),
        }
    }

    /// Like [`Self::expect_ident`], but keywords are accepted as names too.
    pub(crate) fn expect_name(
        &mut self,
        context: &str,
    ) -> Result<(String, SourceLocation), CompileError> {
        if let Some(kw) = self.peek().and_then(Token::keyword) {
            let location = self.location();
            self.pos += 1;
            return Ok((kw.to_string(), location));
        }
        self.expect_ident(context)
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Location of the current token, or of the end of input.
    pub(crate) fn location(&self) -> SourceLocation {
        match self.tokens.get(self.pos) {
            Some((_, span)) => self.lines.location(span.start),
            None => self.lines.end(),
        }
    }

    /// A syntax error at the current token.
    pub(crate) fn error(&self, message: String) -> CompileError {
        let found = match self.peek() {
            Some(token) => token.to_string(),
            None => "end of input".to_string(),
        };
        CompileError::SyntaxError {
            location: self.location(),
            found,
            message,
        }
    }
}

//! Pull-based token stream with save/restore and context-driven re-lexing

use core_types::{JsError, SourcePosition};

use crate::error::unexpected_token;
use crate::lexer::{punctuator_text, Keyword, Lexer, LexerCheckpoint, Punctuator, Token};

/// A token together with where it starts and whether a line break precedes it
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    /// The token
    pub token: Token,
    /// Position of the token's first character
    pub position: SourcePosition,
    /// A line terminator appeared between the previous token and this one
    pub newline_before: bool,
}

/// Opaque snapshot returned by [`TokenStream::save_position`]
#[derive(Debug, Clone, PartialEq)]
pub struct StreamPosition {
    lexer: LexerCheckpoint,
    current: TokenInfo,
}

/// Token stream over one source text. Exactly one token, the current one,
/// has been lexed at any time.
pub struct TokenStream {
    lexer: Lexer,
    current: TokenInfo,
}

impl TokenStream {
    /// Lexes the first token of `source`.
    pub fn new(source: &str) -> Result<Self, JsError> {
        let mut lexer = Lexer::new(source);
        let current = Self::read(&mut lexer)?;
        Ok(Self { lexer, current })
    }

    fn read(lexer: &mut Lexer) -> Result<TokenInfo, JsError> {
        let token = lexer.next_token()?;
        Ok(TokenInfo {
            token,
            position: lexer.token_start(),
            newline_before: lexer.line_terminator_before_token(),
        })
    }

    /// The current token with its metadata
    pub fn current(&self) -> &TokenInfo {
        &self.current
    }

    /// The current token
    pub fn token(&self) -> &Token {
        &self.current.token
    }

    /// Start position of the current token
    pub fn position(&self) -> SourcePosition {
        self.current.position
    }

    /// Moves to the next token.
    pub fn advance(&mut self) -> Result<(), JsError> {
        self.current = Self::read(&mut self.lexer)?;
        Ok(())
    }

    /// Snapshot of the stream, including the current token.
    pub fn save_position(&self) -> StreamPosition {
        StreamPosition {
            lexer: self.lexer.checkpoint(),
            current: self.current.clone(),
        }
    }

    /// Returns to a snapshot taken by [`save_position`](Self::save_position).
    pub fn restore_position(&mut self, position: StreamPosition) {
        self.lexer.restore(position.lexer);
        self.current = position.current;
    }

    /// Replaces a current `}` that closes a template substitution with the
    /// template middle or tail that follows it.
    pub fn rescan_template(&mut self) -> Result<(), JsError> {
        if !self.is_punct(Punctuator::RBrace) {
            return Err(unexpected_token(
                "'}'",
                &self.current.token.describe(),
                Some(self.current.position),
            ));
        }
        self.current.token = self.lexer.scan_template_continuation()?;
        Ok(())
    }

    /// Replaces a current `/` or `/=` with the regular expression literal
    /// starting at the same character.
    pub fn rescan_regexp(&mut self) -> Result<(), JsError> {
        self.current.token = self.lexer.scan_regexp()?;
        Ok(())
    }

    /// Check if the current token is the given punctuator
    pub fn is_punct(&self, p: Punctuator) -> bool {
        self.current.token == Token::Punctuator(p)
    }

    /// Check if the current token is the given keyword
    pub fn is_keyword(&self, k: Keyword) -> bool {
        self.current.token == Token::Keyword(k)
    }

    /// Check if the current token is the identifier `name`
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.current.token, Token::Identifier(id) if id == name)
    }

    /// Name of the current token when it is an identifier
    pub fn ident_name(&self) -> Option<&str> {
        match &self.current.token {
            Token::Identifier(id) => Some(id),
            _ => None,
        }
    }

    /// Consumes `p` or fails with a syntax error naming it.
    pub fn expect_punct(&mut self, p: Punctuator) -> Result<(), JsError> {
        if !self.is_punct(p) {
            return Err(unexpected_token(
                &format!("'{}'", punctuator_text(p)),
                &self.current.token.describe(),
                Some(self.current.position),
            ));
        }
        self.advance()
    }
}

/// Whether an identifier token cannot name a binding in the given mode.
///
/// Reserved words proper are lexed as keywords; this covers the words that
/// are reserved only in strict mode or only inside generators.
pub fn is_reserved_ident(name: &str, strict: bool, generator: bool) -> bool {
    match name {
        "yield" => strict || generator,
        "implements" | "interface" | "let" | "package" | "private" | "protected" | "public"
        | "static" => strict,
        _ => false,
    }
}

//! Bounded lookahead over a balanced bracket span
//!
//! [`scan_balanced`] starts on an opening `(`, `[` or `{`, skips to the
//! matching close and reports the token that follows, then puts the token
//! stream back where it was. It re-lexes template continuations and
//! regular expressions along the way, so the result agrees with what the
//! real parse will see.

use bitflags::bitflags;
use tracing::trace;

use crate::lexer::{Keyword, Punctuator, Token};
use crate::token_stream::TokenStream;

/// Maximum bracket nesting the scanner follows, baseline frame included
pub const MAX_SCAN_DEPTH: usize = 256;

/// Depth of the interior of the span the scan started on
const SPAN_DEPTH: usize = 2;

bitflags! {
    /// Structural hints collected while skipping a span
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ScanHints: u8 {
        /// `;` directly inside the span
        const SEMICOLON = 1 << 0;
        /// `...` directly inside the span
        const REST = 1 << 1;
        /// `=` anywhere inside the span. Unlike the other hints this is not
        /// limited to the span's top level, so a default inside a nested
        /// pattern sets it too.
        const ASSIGNMENT = 1 << 2;
    }
}

/// What follows the closed span
#[derive(Debug, Clone, PartialEq)]
pub enum Follow {
    /// The next token
    Token(Token),
    /// The contextual keyword `of`
    Of,
    /// A line break separates the span from the next token
    LineBreak,
    /// The scan gave up before finding the matching close
    Undetermined,
}

impl Follow {
    /// Check if the following token is the punctuator `p`
    pub fn is_punct(&self, p: Punctuator) -> bool {
        matches!(self, Follow::Token(Token::Punctuator(q)) if *q == p)
    }

    /// Check if the following token is one of `set`
    pub fn is_any_punct(&self, set: &[Punctuator]) -> bool {
        set.iter().any(|p| self.is_punct(*p))
    }
}

/// Result of a lookahead scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    /// Token after the matching close
    pub follow: Follow,
    /// Hints seen inside the span
    pub hints: ScanHints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Baseline,
    Paren,
    Square,
    Brace,
    TemplateSubstitution,
}

struct BracketStack {
    frames: Vec<Bracket>,
}

impl BracketStack {
    fn with_baseline() -> Self {
        let mut frames = Vec::with_capacity(MAX_SCAN_DEPTH);
        frames.push(Bracket::Baseline);
        Self { frames }
    }

    fn try_push(&mut self, bracket: Bracket) -> bool {
        if self.frames.len() >= MAX_SCAN_DEPTH {
            return false;
        }
        self.frames.push(bracket);
        true
    }

    fn pop(&mut self) -> Option<Bracket> {
        self.frames.pop()
    }

    fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Whether a `/` after `token` starts a regular expression rather than a
/// division. `None` means no token has been seen yet.
fn regexp_allowed_after(token: Option<&Token>) -> bool {
    match token {
        None => true,
        Some(Token::Identifier(name)) => name == "of" || name == "yield",
        Some(
            Token::Number(_)
            | Token::BigInt(_)
            | Token::String(_)
            | Token::RegExp(..)
            | Token::TemplateLiteral(_)
            | Token::TemplateTail(_),
        ) => false,
        Some(Token::Keyword(k)) => {
            !matches!(k, Keyword::This | Keyword::Null | Keyword::True | Keyword::False)
        }
        Some(Token::Punctuator(p)) => !matches!(
            p,
            Punctuator::RParen
                | Punctuator::RBracket
                | Punctuator::RBrace
                | Punctuator::PlusPlus
                | Punctuator::MinusMinus
        ),
        Some(_) => true,
    }
}

/// Skips the balanced span starting at the current opening bracket.
///
/// When `no_line_terminator` is set, a line break before the following
/// token is reported as [`Follow::LineBreak`]. Never fails: lexical errors
/// and excessive nesting end the scan with [`Follow::Undetermined`]. The
/// stream is always restored before returning.
pub fn scan_balanced(stream: &mut TokenStream, no_line_terminator: bool) -> ScanOutcome {
    let saved = stream.save_position();
    let outcome = scan(stream, no_line_terminator);
    stream.restore_position(saved);
    outcome
}

fn scan(stream: &mut TokenStream, no_line_terminator: bool) -> ScanOutcome {
    let mut stack = BracketStack::with_baseline();
    let mut hints = ScanHints::empty();
    let mut last: Option<Token> = None;

    let abort = |reason: &str, hints: ScanHints| {
        trace!(reason, "lookahead scan gave up");
        ScanOutcome {
            follow: Follow::Undetermined,
            hints,
        }
    };

    loop {
        let depth = stack.depth();
        match stream.token().clone() {
            Token::Punctuator(p @ (Punctuator::LParen | Punctuator::LBracket | Punctuator::LBrace)) => {
                let bracket = match p {
                    Punctuator::LParen => Bracket::Paren,
                    Punctuator::LBracket => Bracket::Square,
                    _ => Bracket::Brace,
                };
                if !stack.try_push(bracket) {
                    return abort("bracket nesting too deep", hints);
                }
            }
            Token::Punctuator(p @ (Punctuator::RParen | Punctuator::RBracket)) => {
                let expected = if p == Punctuator::RParen {
                    Bracket::Paren
                } else {
                    Bracket::Square
                };
                if stack.pop() != Some(expected) {
                    return abort("mismatched closing bracket", hints);
                }
            }
            Token::Punctuator(Punctuator::RBrace) => match stack.pop() {
                Some(Bracket::Brace) => {}
                Some(Bracket::TemplateSubstitution) => {
                    if let Err(err) = stream.rescan_template() {
                        trace!(error = %err, "lexical error during lookahead");
                        return abort("unterminated template", hints);
                    }
                    if matches!(stream.token(), Token::TemplateMiddle(_))
                        && !stack.try_push(Bracket::TemplateSubstitution)
                    {
                        return abort("bracket nesting too deep", hints);
                    }
                }
                _ => return abort("mismatched closing bracket", hints),
            },
            Token::TemplateHead(_) => {
                if !stack.try_push(Bracket::TemplateSubstitution) {
                    return abort("bracket nesting too deep", hints);
                }
            }
            Token::EOF => return abort("end of input", hints),
            Token::Punctuator(Punctuator::Semicolon) => {
                if depth == SPAN_DEPTH {
                    hints |= ScanHints::SEMICOLON;
                }
            }
            Token::Punctuator(Punctuator::Ellipsis) => {
                if depth == SPAN_DEPTH {
                    hints |= ScanHints::REST;
                }
            }
            Token::Punctuator(Punctuator::Assign) => hints |= ScanHints::ASSIGNMENT,
            Token::Punctuator(Punctuator::Slash | Punctuator::SlashEq) => {
                if regexp_allowed_after(last.as_ref()) {
                    if let Err(err) = stream.rescan_regexp() {
                        trace!(error = %err, "lexical error during lookahead");
                        return abort("invalid regular expression", hints);
                    }
                }
            }
            _ => {}
        }

        last = Some(stream.token().clone());
        if let Err(err) = stream.advance() {
            trace!(error = %err, "lexical error during lookahead");
            return abort("lexical error", hints);
        }

        if stack.depth() <= 1 {
            let current = stream.current();
            let follow = if no_line_terminator && current.newline_before {
                Follow::LineBreak
            } else if matches!(&current.token, Token::Identifier(name) if name == "of") {
                Follow::Of
            } else {
                Follow::Token(current.token.clone())
            };
            return ScanOutcome { follow, hints };
        }
    }
}

//! JavaScript lexer - turns source text into tokens on demand
//!
//! The lexer never decides between `/` as division and `/` as the start of a
//! regular expression, nor where a template substitution ends. Callers that
//! know the context re-lex with [`Lexer::scan_regexp`] or
//! [`Lexer::scan_template_continuation`].

use core_types::{ErrorKind, JsError, SourcePosition};
use num_bigint::BigInt;

/// Reserved words that always lex as keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// break keyword
    Break,
    /// case keyword
    Case,
    /// catch keyword
    Catch,
    /// class keyword
    Class,
    /// const keyword
    Const,
    /// continue keyword
    Continue,
    /// debugger keyword
    Debugger,
    /// default keyword
    Default,
    /// delete keyword
    Delete,
    /// do keyword
    Do,
    /// else keyword
    Else,
    /// enum keyword
    Enum,
    /// export keyword
    Export,
    /// extends keyword
    Extends,
    /// false keyword
    False,
    /// finally keyword
    Finally,
    /// for keyword
    For,
    /// function keyword
    Function,
    /// if keyword
    If,
    /// import keyword
    Import,
    /// in keyword
    In,
    /// instanceof keyword
    Instanceof,
    /// new keyword
    New,
    /// null keyword
    Null,
    /// return keyword
    Return,
    /// super keyword
    Super,
    /// switch keyword
    Switch,
    /// this keyword
    This,
    /// throw keyword
    Throw,
    /// true keyword
    True,
    /// try keyword
    Try,
    /// typeof keyword
    Typeof,
    /// var keyword
    Var,
    /// void keyword
    Void,
    /// while keyword
    While,
    /// with keyword
    With,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "break" => Keyword::Break,
            "case" => Keyword::Case,
            "catch" => Keyword::Catch,
            "class" => Keyword::Class,
            "const" => Keyword::Const,
            "continue" => Keyword::Continue,
            "debugger" => Keyword::Debugger,
            "default" => Keyword::Default,
            "delete" => Keyword::Delete,
            "do" => Keyword::Do,
            "else" => Keyword::Else,
            "enum" => Keyword::Enum,
            "export" => Keyword::Export,
            "extends" => Keyword::Extends,
            "false" => Keyword::False,
            "finally" => Keyword::Finally,
            "for" => Keyword::For,
            "function" => Keyword::Function,
            "if" => Keyword::If,
            "import" => Keyword::Import,
            "in" => Keyword::In,
            "instanceof" => Keyword::Instanceof,
            "new" => Keyword::New,
            "null" => Keyword::Null,
            "return" => Keyword::Return,
            "super" => Keyword::Super,
            "switch" => Keyword::Switch,
            "this" => Keyword::This,
            "throw" => Keyword::Throw,
            "true" => Keyword::True,
            "try" => Keyword::Try,
            "typeof" => Keyword::Typeof,
            "var" => Keyword::Var,
            "void" => Keyword::Void,
            "while" => Keyword::While,
            "with" => Keyword::With,
            _ => return None,
        };
        Some(keyword)
    }

    /// Source spelling, used as a property name after `.` or in `{if: x}`
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Break => "break",
            Keyword::Case => "case",
            Keyword::Catch => "catch",
            Keyword::Class => "class",
            Keyword::Const => "const",
            Keyword::Continue => "continue",
            Keyword::Debugger => "debugger",
            Keyword::Default => "default",
            Keyword::Delete => "delete",
            Keyword::Do => "do",
            Keyword::Else => "else",
            Keyword::Enum => "enum",
            Keyword::Export => "export",
            Keyword::Extends => "extends",
            Keyword::False => "false",
            Keyword::Finally => "finally",
            Keyword::For => "for",
            Keyword::Function => "function",
            Keyword::If => "if",
            Keyword::Import => "import",
            Keyword::In => "in",
            Keyword::Instanceof => "instanceof",
            Keyword::New => "new",
            Keyword::Null => "null",
            Keyword::Return => "return",
            Keyword::Super => "super",
            Keyword::Switch => "switch",
            Keyword::This => "this",
            Keyword::Throw => "throw",
            Keyword::True => "true",
            Keyword::Try => "try",
            Keyword::Typeof => "typeof",
            Keyword::Var => "var",
            Keyword::Void => "void",
            Keyword::While => "while",
            Keyword::With => "with",
        }
    }
}

/// JavaScript punctuators (operators and delimiters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punctuator {
    /// Opening parenthesis
    LParen,
    /// Closing parenthesis
    RParen,
    /// Opening brace
    LBrace,
    /// Closing brace
    RBrace,
    /// Opening bracket
    LBracket,
    /// Closing bracket
    RBracket,
    /// Semicolon
    Semicolon,
    /// Comma
    Comma,
    /// Dot
    Dot,
    /// Spread / rest
    Ellipsis,
    /// Optional chaining
    OptionalChain,
    /// Colon
    Colon,
    /// Question mark
    Question,
    /// Assignment
    Assign,
    /// Arrow function
    Arrow,
    /// Plus
    Plus,
    /// Minus
    Minus,
    /// Multiply
    Star,
    /// Divide, or the start of a regular expression
    Slash,
    /// Modulo
    Percent,
    /// Exponentiation
    StarStar,
    /// Equality
    EqEq,
    /// Strict equality
    EqEqEq,
    /// Inequality
    NotEq,
    /// Strict inequality
    NotEqEq,
    /// Less than
    Lt,
    /// Less than or equal
    LtEq,
    /// Greater than
    Gt,
    /// Greater than or equal
    GtEq,
    /// Logical AND
    AndAnd,
    /// Logical OR
    OrOr,
    /// Nullish coalescing
    NullishCoalesce,
    /// Logical NOT
    Not,
    /// Bitwise AND
    And,
    /// Bitwise OR
    Or,
    /// Bitwise XOR
    Xor,
    /// Bitwise NOT
    Tilde,
    /// Left shift
    LtLt,
    /// Right shift
    GtGt,
    /// Unsigned right shift
    GtGtGt,
    /// Plus equals
    PlusEq,
    /// Minus equals
    MinusEq,
    /// Multiply equals
    StarEq,
    /// Divide equals, or the start of a regular expression
    SlashEq,
    /// Modulo equals
    PercentEq,
    /// Exponentiation equals
    StarStarEq,
    /// Bitwise AND equals
    AndEq,
    /// Bitwise OR equals
    OrEq,
    /// Bitwise XOR equals
    XorEq,
    /// Left shift equals
    LtLtEq,
    /// Right shift equals
    GtGtEq,
    /// Unsigned right shift equals
    GtGtGtEq,
    /// Logical AND equals
    AndAndEq,
    /// Logical OR equals
    OrOrEq,
    /// Nullish coalescing equals
    NullishCoalesceEq,
    /// Increment
    PlusPlus,
    /// Decrement
    MinusMinus,
}

/// Token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier, including contextual words such as `let`, `of` and `yield`
    Identifier(String),
    /// Number literal
    Number(f64),
    /// BigInt literal (`10n`)
    BigInt(BigInt),
    /// String literal
    String(String),
    /// Template literal with no substitutions
    TemplateLiteral(String),
    /// Template head: from ` to the first ${
    TemplateHead(String),
    /// Template middle: from } to the next ${
    TemplateMiddle(String),
    /// Template tail: from } to the closing `
    TemplateTail(String),
    /// Regular expression literal (pattern, flags)
    RegExp(String, String),
    /// Keyword
    Keyword(Keyword),
    /// Punctuator/operator
    Punctuator(Punctuator),
    /// End of input
    EOF,
}

impl Token {
    /// Short human-readable description for error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::Number(n) => format!("number {}", n),
            Token::BigInt(n) => format!("bigint {}n", n),
            Token::String(_) => "string literal".to_string(),
            Token::TemplateLiteral(_)
            | Token::TemplateHead(_)
            | Token::TemplateMiddle(_)
            | Token::TemplateTail(_) => "template literal".to_string(),
            Token::RegExp(..) => "regular expression".to_string(),
            Token::Keyword(k) => format!("'{}'", k.as_str()),
            Token::Punctuator(p) => format!("'{}'", punctuator_text(*p)),
            Token::EOF => "end of input".to_string(),
        }
    }
}

/// Source spelling of a punctuator
pub fn punctuator_text(p: Punctuator) -> &'static str {
    use Punctuator::*;
    match p {
        LParen => "(",
        RParen => ")",
        LBrace => "{",
        RBrace => "}",
        LBracket => "[",
        RBracket => "]",
        Semicolon => ";",
        Comma => ",",
        Dot => ".",
        Ellipsis => "...",
        OptionalChain => "?.",
        Colon => ":",
        Question => "?",
        Assign => "=",
        Arrow => "=>",
        Plus => "+",
        Minus => "-",
        Star => "*",
        Slash => "/",
        Percent => "%",
        StarStar => "**",
        EqEq => "==",
        EqEqEq => "===",
        NotEq => "!=",
        NotEqEq => "!==",
        Lt => "<",
        LtEq => "<=",
        Gt => ">",
        GtEq => ">=",
        AndAnd => "&&",
        OrOr => "||",
        NullishCoalesce => "??",
        Not => "!",
        And => "&",
        Or => "|",
        Xor => "^",
        Tilde => "~",
        LtLt => "<<",
        GtGt => ">>",
        GtGtGt => ">>>",
        PlusEq => "+=",
        MinusEq => "-=",
        StarEq => "*=",
        SlashEq => "/=",
        PercentEq => "%=",
        StarStarEq => "**=",
        AndEq => "&=",
        OrEq => "|=",
        XorEq => "^=",
        LtLtEq => "<<=",
        GtGtEq => ">>=",
        GtGtGtEq => ">>>=",
        AndAndEq => "&&=",
        OrOrEq => "||=",
        NullishCoalesceEq => "??=",
        PlusPlus => "++",
        MinusMinus => "--",
    }
}

/// Saved lexer state, restored with [`Lexer::restore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerCheckpoint {
    position: usize,
    line: u32,
    column: u32,
    token_start: SourcePosition,
    line_terminator_before_token: bool,
}

/// Lexer for JavaScript source code
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
    token_start: SourcePosition,
    /// Tracks if a line terminator was encountered before the last token
    line_terminator_before_token: bool,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            token_start: SourcePosition::default(),
            line_terminator_before_token: false,
        }
    }

    /// Position of the first character of the last scanned token
    pub fn token_start(&self) -> SourcePosition {
        self.token_start
    }

    /// Whether a line terminator preceded the last scanned token
    pub fn line_terminator_before_token(&self) -> bool {
        self.line_terminator_before_token
    }

    /// Snapshot of the complete lexer state
    pub fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            position: self.position,
            line: self.line,
            column: self.column,
            token_start: self.token_start,
            line_terminator_before_token: self.line_terminator_before_token,
        }
    }

    /// Returns to a snapshot taken by [`checkpoint`](Self::checkpoint)
    pub fn restore(&mut self, checkpoint: LexerCheckpoint) {
        self.position = checkpoint.position;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
        self.token_start = checkpoint.token_start;
        self.line_terminator_before_token = checkpoint.line_terminator_before_token;
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Result<Token, JsError> {
        let line_before = self.line;
        self.skip_whitespace_and_comments()?;
        self.line_terminator_before_token = self.line > line_before;
        self.token_start = self.current_position();

        if self.is_at_end() {
            return Ok(Token::EOF);
        }

        let ch = self.advance();
        let punct = |p| Ok(Token::Punctuator(p));
        match ch {
            '(' => punct(Punctuator::LParen),
            ')' => punct(Punctuator::RParen),
            '{' => punct(Punctuator::LBrace),
            '}' => punct(Punctuator::RBrace),
            '[' => punct(Punctuator::LBracket),
            ']' => punct(Punctuator::RBracket),
            ';' => punct(Punctuator::Semicolon),
            ',' => punct(Punctuator::Comma),
            ':' => punct(Punctuator::Colon),
            '~' => punct(Punctuator::Tilde),
            '.' => {
                if self.peek() == '.' && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    punct(Punctuator::Ellipsis)
                } else if self.peek().is_ascii_digit() {
                    self.scan_number(ch)
                } else {
                    punct(Punctuator::Dot)
                }
            }
            '?' => {
                if self.match_char('?') {
                    if self.match_char('=') {
                        punct(Punctuator::NullishCoalesceEq)
                    } else {
                        punct(Punctuator::NullishCoalesce)
                    }
                } else if self.peek() == '.'
                    && !self.peek_next().is_some_and(|c| c.is_ascii_digit())
                {
                    self.advance();
                    punct(Punctuator::OptionalChain)
                } else {
                    punct(Punctuator::Question)
                }
            }
            '=' => {
                if self.match_char('>') {
                    punct(Punctuator::Arrow)
                } else if self.match_char('=') {
                    if self.match_char('=') {
                        punct(Punctuator::EqEqEq)
                    } else {
                        punct(Punctuator::EqEq)
                    }
                } else {
                    punct(Punctuator::Assign)
                }
            }
            '+' => {
                if self.match_char('+') {
                    punct(Punctuator::PlusPlus)
                } else if self.match_char('=') {
                    punct(Punctuator::PlusEq)
                } else {
                    punct(Punctuator::Plus)
                }
            }
            '-' => {
                if self.match_char('-') {
                    punct(Punctuator::MinusMinus)
                } else if self.match_char('=') {
                    punct(Punctuator::MinusEq)
                } else {
                    punct(Punctuator::Minus)
                }
            }
            '*' => {
                if self.match_char('*') {
                    if self.match_char('=') {
                        punct(Punctuator::StarStarEq)
                    } else {
                        punct(Punctuator::StarStar)
                    }
                } else if self.match_char('=') {
                    punct(Punctuator::StarEq)
                } else {
                    punct(Punctuator::Star)
                }
            }
            '/' => {
                if self.match_char('=') {
                    punct(Punctuator::SlashEq)
                } else {
                    punct(Punctuator::Slash)
                }
            }
            '%' => {
                if self.match_char('=') {
                    punct(Punctuator::PercentEq)
                } else {
                    punct(Punctuator::Percent)
                }
            }
            '!' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        punct(Punctuator::NotEqEq)
                    } else {
                        punct(Punctuator::NotEq)
                    }
                } else {
                    punct(Punctuator::Not)
                }
            }
            '<' => {
                if self.match_char('<') {
                    if self.match_char('=') {
                        punct(Punctuator::LtLtEq)
                    } else {
                        punct(Punctuator::LtLt)
                    }
                } else if self.match_char('=') {
                    punct(Punctuator::LtEq)
                } else {
                    punct(Punctuator::Lt)
                }
            }
            '>' => {
                if self.match_char('>') {
                    if self.match_char('>') {
                        if self.match_char('=') {
                            punct(Punctuator::GtGtGtEq)
                        } else {
                            punct(Punctuator::GtGtGt)
                        }
                    } else if self.match_char('=') {
                        punct(Punctuator::GtGtEq)
                    } else {
                        punct(Punctuator::GtGt)
                    }
                } else if self.match_char('=') {
                    punct(Punctuator::GtEq)
                } else {
                    punct(Punctuator::Gt)
                }
            }
            '&' => {
                if self.match_char('&') {
                    if self.match_char('=') {
                        punct(Punctuator::AndAndEq)
                    } else {
                        punct(Punctuator::AndAnd)
                    }
                } else if self.match_char('=') {
                    punct(Punctuator::AndEq)
                } else {
                    punct(Punctuator::And)
                }
            }
            '|' => {
                if self.match_char('|') {
                    if self.match_char('=') {
                        punct(Punctuator::OrOrEq)
                    } else {
                        punct(Punctuator::OrOr)
                    }
                } else if self.match_char('=') {
                    punct(Punctuator::OrEq)
                } else {
                    punct(Punctuator::Or)
                }
            }
            '^' => {
                if self.match_char('=') {
                    punct(Punctuator::XorEq)
                } else {
                    punct(Punctuator::Xor)
                }
            }
            '`' => self.scan_template_part(true),
            '"' | '\'' => self.scan_string(ch),
            _ if ch.is_ascii_digit() => self.scan_number(ch),
            _ if is_id_start(ch) => Ok(self.scan_identifier(ch)),
            _ => Err(self.error(format!("unexpected character '{}'", ch))),
        }
    }

    /// Continues a template literal after the `}` that closed a
    /// substitution. The lexer must be positioned right after that `}`.
    pub fn scan_template_continuation(&mut self) -> Result<Token, JsError> {
        self.scan_template_part(false)
    }

    /// Re-lexes the last token as a regular expression literal. The last
    /// token must have been `/` or `/=`.
    pub fn scan_regexp(&mut self) -> Result<Token, JsError> {
        let start = self.token_start;
        self.position = start.offset;
        self.line = start.line;
        self.column = start.column;
        if self.peek() != '/' {
            return Err(self.error("expecting '/' at start of regular expression"));
        }
        self.advance();

        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            if self.is_at_end() || is_line_terminator(self.peek()) {
                return Err(self.error("unexpected end of regexp"));
            }
            let ch = self.advance();
            match ch {
                '\\' => {
                    pattern.push(ch);
                    if self.is_at_end() || is_line_terminator(self.peek()) {
                        return Err(self.error("unexpected end of regexp"));
                    }
                    pattern.push(self.advance());
                }
                '[' => {
                    in_class = true;
                    pattern.push(ch);
                }
                ']' if in_class => {
                    in_class = false;
                    pattern.push(ch);
                }
                '/' if !in_class => break,
                _ => pattern.push(ch),
            }
        }

        let mut flags = String::new();
        while !self.is_at_end() && is_id_continue(self.peek()) {
            flags.push(self.advance());
        }
        Ok(Token::RegExp(pattern, flags))
    }

    fn scan_template_part(&mut self, is_start: bool) -> Result<Token, JsError> {
        let mut value = String::new();
        loop {
            if self.is_at_end() {
                return Err(self.error("unexpected end of string"));
            }
            let ch = self.advance();
            match ch {
                '`' => {
                    return Ok(if is_start {
                        Token::TemplateLiteral(value)
                    } else {
                        Token::TemplateTail(value)
                    });
                }
                '$' if self.peek() == '{' => {
                    self.advance();
                    return Ok(if is_start {
                        Token::TemplateHead(value)
                    } else {
                        Token::TemplateMiddle(value)
                    });
                }
                '\\' => self.scan_escape(&mut value)?,
                '\r' => {
                    self.match_char('\n');
                    self.new_line();
                    value.push('\n');
                }
                '\n' | '\u{2028}' | '\u{2029}' => {
                    self.new_line();
                    value.push(ch);
                }
                _ => value.push(ch),
            }
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<Token, JsError> {
        let mut value = String::new();
        loop {
            if self.is_at_end() || matches!(self.peek(), '\n' | '\r') {
                return Err(self.error("unexpected end of string"));
            }
            let ch = self.advance();
            if ch == quote {
                return Ok(Token::String(value));
            }
            if ch == '\\' {
                self.scan_escape(&mut value)?;
            } else {
                value.push(ch);
            }
        }
    }

    fn scan_escape(&mut self, value: &mut String) -> Result<(), JsError> {
        if self.is_at_end() {
            return Err(self.error("unexpected end of string"));
        }
        let escaped = self.advance();
        match escaped {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'b' => value.push('\u{0008}'),
            'f' => value.push('\u{000C}'),
            'v' => value.push('\u{000B}'),
            '0' if !self.peek().is_ascii_digit() => value.push('\0'),
            'x' => {
                let code = self.scan_hex_digits(2)?;
                value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            'u' => {
                let code = if self.match_char('{') {
                    let mut code: u32 = 0;
                    let mut digits = 0;
                    while let Some(d) = self.peek_hex_digit() {
                        self.advance();
                        code = code.saturating_mul(16).saturating_add(d);
                        digits += 1;
                    }
                    if digits == 0 || !self.match_char('}') || code > 0x10FFFF {
                        return Err(self.error("invalid Unicode escape sequence"));
                    }
                    code
                } else {
                    self.scan_hex_digits(4)?
                };
                value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            '\r' => {
                self.match_char('\n');
                self.new_line();
            }
            '\n' | '\u{2028}' | '\u{2029}' => self.new_line(),
            _ => value.push(escaped),
        }
        Ok(())
    }

    fn scan_hex_digits(&mut self, count: usize) -> Result<u32, JsError> {
        let mut code = 0;
        for _ in 0..count {
            let digit = self
                .peek_hex_digit()
                .ok_or_else(|| self.error("invalid escape sequence"))?;
            self.advance();
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn peek_hex_digit(&self) -> Option<u32> {
        if self.is_at_end() {
            None
        } else {
            self.peek().to_digit(16)
        }
    }

    fn scan_number(&mut self, first: char) -> Result<Token, JsError> {
        if first == '0' {
            let radix = match self.peek() {
                'x' | 'X' => Some(16),
                'o' | 'O' => Some(8),
                'b' | 'B' => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                let mut value = 0f64;
                let mut digits = String::new();
                while !self.is_at_end() {
                    let c = self.peek();
                    if c == '_' {
                        self.advance();
                        continue;
                    }
                    match c.to_digit(radix) {
                        Some(d) => {
                            digits.push(self.advance());
                            value = value * radix as f64 + d as f64;
                        }
                        None => break,
                    }
                }
                if digits.is_empty() {
                    return Err(self.error("invalid number literal"));
                }
                if self.match_char('n') {
                    return self.finish_bigint(&digits, radix);
                }
                return self.finish_number(value);
            }
        }

        let mut text = String::new();
        text.push(first);
        let seen_dot = first == '.';
        self.scan_digits(&mut text);
        if !seen_dot && self.peek() == 'n' {
            self.advance();
            if text.len() > 1 && text.starts_with('0') {
                return Err(self.error("invalid number literal"));
            }
            return self.finish_bigint(&text, 10);
        }
        if !seen_dot && self.peek() == '.' {
            text.push(self.advance());
            self.scan_digits(&mut text);
        }
        if matches!(self.peek(), 'e' | 'E') {
            let sign_or_digit = self.peek_next();
            let exponent_ok = match sign_or_digit {
                Some('+') | Some('-') => self
                    .chars
                    .get(self.position + 2)
                    .is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if !exponent_ok {
                return Err(self.error("invalid number literal"));
            }
            text.push(self.advance());
            if matches!(self.peek(), '+' | '-') {
                text.push(self.advance());
            }
            self.scan_digits(&mut text);
        }
        let value: f64 = text
            .parse()
            .map_err(|_| self.error("invalid number literal"))?;
        self.finish_number(value)
    }

    fn finish_bigint(&mut self, digits: &str, radix: u32) -> Result<Token, JsError> {
        let value = BigInt::parse_bytes(digits.as_bytes(), radix)
            .ok_or_else(|| self.error("invalid number literal"))?;
        if !self.is_at_end() && is_id_start(self.peek()) {
            return Err(self.error("invalid number literal"));
        }
        Ok(Token::BigInt(value))
    }

    fn scan_digits(&mut self, text: &mut String) {
        while !self.is_at_end() {
            let c = self.peek();
            if c.is_ascii_digit() {
                text.push(self.advance());
            } else if c == '_' && self.peek_next().is_some_and(|n| n.is_ascii_digit()) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn finish_number(&mut self, value: f64) -> Result<Token, JsError> {
        if !self.is_at_end() && is_id_start(self.peek()) {
            return Err(self.error("invalid number literal"));
        }
        Ok(Token::Number(value))
    }

    fn scan_identifier(&mut self, first: char) -> Token {
        let mut ident = first.to_string();
        while !self.is_at_end() && is_id_continue(self.peek()) {
            ident.push(self.advance());
        }
        match Keyword::from_word(&ident) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Identifier(ident),
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), JsError> {
        while !self.is_at_end() {
            match self.peek() {
                '\r' => {
                    self.advance();
                    self.match_char('\n');
                    self.new_line();
                }
                c if is_line_terminator(c) => {
                    self.advance();
                    self.new_line();
                }
                c if c.is_whitespace() || c == '\u{FEFF}' => {
                    self.advance();
                }
                '/' if self.peek_next() == Some('/') => {
                    while !self.is_at_end() && !is_line_terminator(self.peek()) {
                        self.advance();
                    }
                }
                '/' if self.peek_next() == Some('*') => {
                    let start = self.current_position();
                    self.advance();
                    self.advance();
                    loop {
                        if self.is_at_end() {
                            return Err(JsError::new(
                                ErrorKind::SyntaxError,
                                "unexpected end of comment",
                            )
                            .with_position(start));
                        }
                        let ch = self.advance();
                        if ch == '*' && self.match_char('/') {
                            break;
                        }
                        if ch == '\r' {
                            self.match_char('\n');
                            self.new_line();
                        } else if is_line_terminator(ch) {
                            self.new_line();
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.column = 1;
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.chars.get(self.position).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.peek();
        self.position += 1;
        self.column += 1;
        ch
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn current_position(&self) -> SourcePosition {
        SourcePosition {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }

    fn error(&self, message: impl Into<String>) -> JsError {
        JsError::new(ErrorKind::SyntaxError, message).with_position(self.current_position())
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_id_start(ch: char) -> bool {
    ch == '$' || ch == '_' || ch.is_alphabetic()
}

fn is_id_continue(ch: char) -> bool {
    ch == '$' || ch == '_' || ch == '\u{200C}' || ch == '\u{200D}' || ch.is_alphanumeric()
}

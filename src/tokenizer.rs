use std::{
    fmt::{self, Display, Formatter},
    ops::Range,
};

use log::trace;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LeftParen,
    RightParen,
    Comma,

    Plus,
    Minus,
    Star,
    Slash,

    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    Identifier(String),
    String(String),
    // digits stay as text: the same literal may be a value or a line number
    Number(String),

    Rem,
    Let,
    Print,
    Input,
    If,
    Then,
    Goto,
    End,

    // session commands
    Run,
    List,
    New,

    Illegal(String),
    EOF,
}

impl Token {
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::Rem
                | Token::Let
                | Token::Print
                | Token::Input
                | Token::If
                | Token::Then
                | Token::Goto
                | Token::End
                | Token::Run
                | Token::List
                | Token::New
        )
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Token::Plus
                | Token::Minus
                | Token::Star
                | Token::Slash
                | Token::Equal
                | Token::NotEqual
                | Token::Less
                | Token::LessEqual
                | Token::Greater
                | Token::GreaterEqual
        )
    }
}

/// Writes the token the way it appears in source.
impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let text: &str = match self {
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::Comma => ",",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Equal => "=",
            Token::NotEqual => "<>",
            Token::Less => "<",
            Token::LessEqual => "<=",
            Token::Greater => ">",
            Token::GreaterEqual => ">=",
            Token::Identifier(text) | Token::Number(text) | Token::Illegal(text) => text,
            Token::String(text) => return write!(f, "\"{}\"", text),
            Token::Rem => "REM",
            Token::Let => "LET",
            Token::Print => "PRINT",
            Token::Input => "INPUT",
            Token::If => "IF",
            Token::Then => "THEN",
            Token::Goto => "GOTO",
            Token::End => "END",
            Token::Run => "RUN",
            Token::List => "LIST",
            Token::New => "NEW",
            Token::EOF => "",
        };
        write!(f, "{}", text)
    }
}

/// Marks a string-typed variable name.
pub const STRING_SUFFIX: u8 = b'$';

/// Turns an upper-cased word into its keyword token, or an identifier.
pub fn lookup_identifier(word: String) -> Token {
    match word.as_str() {
        "REM" => Token::Rem,
        "LET" => Token::Let,
        "PRINT" => Token::Print,
        "INPUT" => Token::Input,
        "IF" => Token::If,
        "THEN" => Token::Then,
        "GOTO" => Token::Goto,
        "END" => Token::End,
        "RUN" => Token::Run,
        "LIST" => Token::List,
        "NEW" => Token::New,
        _ => Token::Identifier(word),
    }
}

/// Produces tokens on demand from a single source line.
///
/// Once the input is exhausted every call to [`Lexer::next_token`] yields
/// [`Token::EOF`].
pub struct Lexer<'a> {
    bytes: &'a [u8],
    cursor: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            bytes: source.as_bytes(),
            cursor: 0,
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.next_spanned().1
    }

    /// Like [`Lexer::next_token`], paired with the token's byte range in the source.
    pub fn next_spanned(&mut self) -> (Range<usize>, Token) {
        let n = self.bytes.len();

        self.cursor += self.bytes[self.cursor..]
            .iter()
            .take_while(|&&b| matches!(b, b' ' | b'\t' | b'\r'))
            .count();

        let start = self.cursor;
        if start >= n {
            return (n..n, Token::EOF);
        }

        if start + 1 < n {
            let token = match &self.bytes[start..start + 2] {
                b"<=" => Some(Token::LessEqual),
                b">=" => Some(Token::GreaterEqual),
                b"<>" => Some(Token::NotEqual),
                _ => None,
            };

            if let Some(token) = token {
                return self.emit(token, start + 2);
            }
        }

        let token = match self.bytes[start] {
            b'+' => Some(Token::Plus),
            b'-' => Some(Token::Minus),
            b'*' => Some(Token::Star),
            b'/' => Some(Token::Slash),
            b'=' => Some(Token::Equal),
            b'<' => Some(Token::Less),
            b'>' => Some(Token::Greater),
            b'(' => Some(Token::LeftParen),
            b')' => Some(Token::RightParen),
            b',' => Some(Token::Comma),
            _ => None,
        };

        if let Some(token) = token {
            return self.emit(token, start + 1);
        }

        if self.bytes[start] == b'"' {
            return self.read_string();
        }

        if self.bytes[start].is_ascii_digit() {
            let mut end = start;
            let mut seen_dot = false;

            while end < n
                && (self.bytes[end].is_ascii_digit() || (!seen_dot && self.bytes[end] == b'.'))
            {
                seen_dot |= self.bytes[end] == b'.';
                end += 1;
            }

            let digits = self.text(start..end);
            return self.emit(Token::Number(digits), end);
        }

        if self.bytes[start].is_ascii_alphabetic() {
            let mut end = start + 1;

            while end < n && self.bytes[end].is_ascii_alphanumeric() {
                end += 1;
            }
            if end < n && self.bytes[end] == STRING_SUFFIX {
                end += 1;
            }

            let word = self.text(start..end).to_ascii_uppercase();
            return self.emit(lookup_identifier(word), end);
        }

        // Advance over a whole character so the cursor stays on a char boundary.
        let width = self
            .text(start..n)
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        trace!("illegal byte at offset {}", start);
        let text = self.text(start..start + width);
        self.emit(Token::Illegal(text), start + width)
    }

    fn read_string(&mut self) -> (Range<usize>, Token) {
        let n = self.bytes.len();
        let start = self.cursor;
        let mut end = start + 1;

        while end < n && !matches!(self.bytes[end], b'"' | b'\n') {
            end += 1;
        }

        if end >= n || self.bytes[end] != b'"' {
            return self.emit(Token::Illegal("unterminated string".to_string()), end);
        }

        let text = self.text(start + 1..end);
        self.emit(Token::String(text), end + 1)
    }

    fn emit(&mut self, token: Token, end: usize) -> (Range<usize>, Token) {
        let start = self.cursor;
        self.cursor = end;
        (start..end, token)
    }

    fn text(&self, range: Range<usize>) -> String {
        String::from_utf8_lossy(&self.bytes[range]).into_owned()
    }
}

/// Collects every token of `source` with its byte range, ending with a single
/// [`Token::EOF`].
pub fn tokenize_spanned(source: &str) -> Vec<(Range<usize>, Token)> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let (span, token) = lexer.next_spanned();
        let done = token == Token::EOF;
        tokens.push((span, token));
        if done {
            return tokens;
        }
    }
}

pub fn tokenize(source: &str) -> Vec<Token> {
    tokenize_spanned(source)
        .into_iter()
        .map(|(_, token)| token)
        .collect()
}

//! Lexer for minic source.

use crate::error::{CoreError, line_column};

/// Words that would not survive the trip into the generated C: the C11
/// keywords, plus the names the emitted `main` relies on.
const RESERVED: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "enum",
    "extern", "float", "for", "goto", "inline", "long", "register", "restrict", "return",
    "short", "signed", "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned",
    "void", "volatile", "while", "_Alignas", "_Alignof", "_Atomic", "_Bool", "_Complex",
    "_Generic", "_Imaginary", "_Noreturn", "_Static_assert", "_Thread_local", "main", "printf",
];

/// Kind of a token produced by the lexer.
///
/// Tokens carry no payload; the parser slices the source with the
/// token's byte offsets when it needs the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Special
    Eof,

    // Identifiers and literals
    Ident,
    IntLiteral,
    StringLiteral,

    // Punctuation
    LParen, // (
    RParen, // )
    LBrace, // {
    RBrace, // }
    Semi,   // ;
    Equal,  // =

    // Operators
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    EqEq,      // ==
    NotEq,     // !=
    Less,      // <
    Greater,   // >
    LessEq,    // <=
    GreaterEq, // >=

    // Keywords
    Int,
    Print,
    If,
    Else,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Eof => "end of file",
            TokenKind::Ident => "identifier",
            TokenKind::IntLiteral => "number",
            TokenKind::StringLiteral => "string literal",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Semi => "';'",
            TokenKind::Equal => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Less => "'<'",
            TokenKind::Greater => "'>'",
            TokenKind::LessEq => "'<='",
            TokenKind::GreaterEq => "'>='",
            TokenKind::Int => "'int'",
            TokenKind::Print => "'print'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
        }
    }
}

/// A single token with byte offsets into the original source.
///
/// For string literals the range includes both quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text_start: u32,
    pub text_end: u32,
}

impl Token {
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[self.text_start as usize..self.text_end as usize]
    }
}

/// Lex a source string into tokens, ending with a single `Eof` token.
///
/// Stops at the first malformed token.
pub fn lex(source: &str) -> Result<Vec<Token>, CoreError> {
    let mut lexer = Lexer {
        source,
        chars: source.as_bytes(),
        len: source.len(),
        index: 0,
    };
    lexer.run()
}

struct Lexer<'src> {
    source: &'src str,
    chars: &'src [u8],
    len: usize,
    index: usize,
}

impl<'src> Lexer<'src> {
    fn run(&mut self) -> Result<Vec<Token>, CoreError> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek_char() {
            if is_whitespace(ch) {
                self.consume_char();
                continue;
            }

            let start = self.index as u32;
            let token = match ch {
                b'(' => self.single(TokenKind::LParen, start),
                b')' => self.single(TokenKind::RParen, start),
                b'{' => self.single(TokenKind::LBrace, start),
                b'}' => self.single(TokenKind::RBrace, start),
                b';' => self.single(TokenKind::Semi, start),
                b'+' => self.single(TokenKind::Plus, start),
                b'-' => self.single(TokenKind::Minus, start),
                b'*' => self.single(TokenKind::Star, start),
                b'/' => self.single(TokenKind::Slash, start),
                b'=' => self.with_optional_eq(TokenKind::Equal, TokenKind::EqEq, start),
                b'<' => self.with_optional_eq(TokenKind::Less, TokenKind::LessEq, start),
                b'>' => self.with_optional_eq(TokenKind::Greater, TokenKind::GreaterEq, start),
                b'!' => {
                    if self.peek_next() == Some(b'=') {
                        self.consume_char(); // '!'
                        self.consume_char(); // '='
                        self.simple_token(TokenKind::NotEq, start)
                    } else {
                        return Err(self.unexpected_char(start));
                    }
                }
                b'"' => self.lex_string(start)?,
                b'0'..=b'9' => self.lex_number(start),
                _ if is_ident_start(ch) => self.lex_ident_or_keyword(start)?,
                _ => return Err(self.unexpected_char(start)),
            };

            tokens.push(token);
        }

        let end = self.len as u32;
        tokens.push(Token {
            kind: TokenKind::Eof,
            text_start: end,
            text_end: end,
        });
        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind, start: u32) -> Token {
        self.consume_char();
        self.simple_token(kind, start)
    }

    fn with_optional_eq(&mut self, plain: TokenKind, with_eq: TokenKind, start: u32) -> Token {
        self.consume_char();
        if self.peek_char() == Some(b'=') {
            self.consume_char();
            self.simple_token(with_eq, start)
        } else {
            self.simple_token(plain, start)
        }
    }

    fn simple_token(&self, kind: TokenKind, start: u32) -> Token {
        Token {
            kind,
            text_start: start,
            text_end: self.index as u32,
        }
    }

    fn error(&self, offset: u32, message: String) -> CoreError {
        let (line, column) = line_column(self.source, offset as usize);
        CoreError::LexError {
            line,
            column,
            message,
        }
    }

    fn unexpected_char(&self, start: u32) -> CoreError {
        let ch = self.source[start as usize..].chars().next().unwrap_or('?');
        self.error(start, format!("unexpected character '{ch}'"))
    }

    fn lex_string(&mut self, start: u32) -> Result<Token, CoreError> {
        // Consume the opening quote
        self.consume_char();

        while let Some(ch) = self.peek_char() {
            match ch {
                b'"' => {
                    self.consume_char(); // closing quote
                    return Ok(self.simple_token(TokenKind::StringLiteral, start));
                }
                b'\\' => {
                    // Skip over escape sequence: backslash + next char (if any)
                    self.consume_char();
                    if matches!(self.peek_char(), Some(next) if next != b'\n') {
                        self.consume_char();
                    }
                }
                b'\n' => break,
                _ => self.consume_char(),
            }
        }

        Err(self.error(start, "unterminated string literal".to_string()))
    }

    fn lex_number(&mut self, start: u32) -> Token {
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                self.consume_char();
            } else {
                break;
            }
        }
        self.simple_token(TokenKind::IntLiteral, start)
    }

    fn lex_ident_or_keyword(&mut self, start: u32) -> Result<Token, CoreError> {
        while let Some(ch) = self.peek_char() {
            if is_ident_continue(ch) {
                self.consume_char();
            } else {
                break;
            }
        }

        let text = &self.source[start as usize..self.index];
        let kind = match text {
            "int" => TokenKind::Int,
            "print" => TokenKind::Print,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            _ if RESERVED.contains(&text) => {
                return Err(self.error(
                    start,
                    format!("'{text}' is reserved in C and cannot be used as a name"),
                ));
            }
            _ => TokenKind::Ident,
        };
        Ok(self.simple_token(kind, start))
    }

    fn peek_char(&self) -> Option<u8> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.chars.get(self.index + 1).copied()
    }

    fn consume_char(&mut self) {
        if self.index < self.len {
            self.index += 1;
        }
    }
}

fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .expect("lex")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn lexes_declaration() {
        assert_eq!(
            kinds("int x = 2 * 8;"),
            vec![
                TokenKind::Int,
                TokenKind::Ident,
                TokenKind::Equal,
                TokenKind::IntLiteral,
                TokenKind::Star,
                TokenKind::IntLiteral,
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn prefers_two_character_operators() {
        assert_eq!(
            kinds("== != <= >= < > ="),
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::LessEq,
                TokenKind::GreaterEq,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Equal,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keeps_quotes_in_string_text() {
        let source = r#"print("a \"b\"");"#;
        let tokens = lex(source).expect("lex");
        let literal = tokens
            .iter()
            .find(|token| token.kind == TokenKind::StringLiteral)
            .expect("string token");
        assert_eq!(literal.text(source), r#""a \"b\"""#);
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(
            kinds("if else print int integer"),
            vec![
                TokenKind::If,
                TokenKind::Else,
                TokenKind::Print,
                TokenKind::Int,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn reports_unexpected_character_with_position() {
        let err = lex("int x;\n  x @ 1;").unwrap_err();
        match err {
            CoreError::LexError { line, column, .. } => assert_eq!((line, column), (2, 5)),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn rejects_c_reserved_words() {
        for word in ["while", "double", "return", "printf", "main"] {
            let source = format!("int {word};");
            match lex(&source).unwrap_err() {
                CoreError::LexError {
                    line,
                    column,
                    message,
                } => {
                    assert_eq!((line, column), (1, 5));
                    assert_eq!(
                        message,
                        format!("'{word}' is reserved in C and cannot be used as a name")
                    );
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn reserved_words_only_match_whole_identifiers() {
        assert_eq!(
            kinds("whilex printf_ _main"),
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_lone_bang() {
        assert!(matches!(lex("!x").unwrap_err(), CoreError::LexError { .. }));
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = lex("print(\"oops);\nint x;").unwrap_err();
        assert!(matches!(err, CoreError::LexError { line: 1, column: 7, .. }));
    }
}

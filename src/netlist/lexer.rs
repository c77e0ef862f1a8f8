//! Lexer (tokenizer) for the netlist format.

use crate::error::{EmuError, Result};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// Token types in the netlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A node kind, node id or pin id
    Identifier,
    /// A number, possibly with an SI suffix
    Number,
    /// A directive (starts with '.')
    Directive,
    /// `->`, separating input pins from output pins
    Arrow,
    /// `=>`, connecting an output pin to an input pin
    Wire,
    /// Newline
    Newline,
    /// End of file
    Eof,
}

/// Lexer for tokenizing netlist input.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn token(&self, kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Token {
        Token {
            kind,
            text: text.into(),
            line,
            column,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let start_line = self.line;
        let start_column = self.column;

        let ch = match self.peek_char() {
            Some(ch) => ch,
            None => return Ok(self.token(TokenKind::Eof, "", start_line, start_column)),
        };

        let token = match ch {
            '\n' => {
                self.advance();
                self.token(TokenKind::Newline, "\n", start_line, start_column)
            }
            '.' => {
                self.advance();
                let name = self.read_identifier();
                if name.is_empty() {
                    return Err(EmuError::lexer(start_line, start_column, "empty directive"));
                }
                self.token(TokenKind::Directive, format!(".{}", name), start_line, start_column)
            }
            '-' | '=' => {
                self.advance();
                if self.peek_char() != Some('>') {
                    return Err(EmuError::lexer(
                        start_line,
                        start_column,
                        format!("expected '>' after '{}'", ch),
                    ));
                }
                self.advance();
                let kind = if ch == '-' { TokenKind::Arrow } else { TokenKind::Wire };
                self.token(kind, format!("{}>", ch), start_line, start_column)
            }
            '0'..='9' => {
                let text = self.read_number();
                self.token(TokenKind::Number, text, start_line, start_column)
            }
            _ if ch.is_alphabetic() || ch == '_' => {
                let text = self.read_identifier();
                self.token(TokenKind::Identifier, text, start_line, start_column)
            }
            _ => {
                return Err(EmuError::lexer(
                    start_line,
                    start_column,
                    format!("unexpected character '{}'", ch),
                ));
            }
        };

        Ok(token)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, ch)| ch)
    }

    fn advance(&mut self) -> Option<char> {
        let (_, ch) = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else if ch == '#' || ch == ';' {
                // Skip comment until end of line
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(ch) = self.peek_char() {
            if !accept(ch) {
                break;
            }
            text.push(ch);
            self.advance();
        }
        text
    }

    fn read_identifier(&mut self) -> String {
        self.read_while(|ch| ch.is_alphanumeric() || ch == '_')
    }

    /// Digits, optional fraction, optional SI suffix. Trailing identifier
    /// characters are kept so that `parse_value` can reject them.
    fn read_number(&mut self) -> String {
        let mut text = self.read_while(|ch| ch.is_ascii_digit());
        if self.peek_char() == Some('.') {
            self.advance();
            text.push('.');
            text.push_str(&self.read_while(|ch| ch.is_ascii_digit()));
        }
        text.push_str(&self.read_while(|ch| ch.is_alphanumeric() || ch == '_' || ch == 'µ'));
        text
    }
}

/// Parse a number string with optional unit suffix.
pub fn parse_value(text: &str) -> Option<f64> {
    let text = text.trim();
    let last = text.chars().last()?;

    let multiplier = match last {
        'p' => 1e-12,
        'n' => 1e-9,
        'u' | 'µ' => 1e-6,
        'm' => 1e-3,
        'k' | 'K' => 1e3,
        _ => 1.0,
    };
    let num_str = if multiplier != 1.0 {
        &text[..text.len() - last.len_utf8()]
    } else {
        text
    };

    num_str.parse::<f64>().ok().map(|v| v * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            out.push(tok.kind);
            if tok.kind == TokenKind::Eof {
                return out;
            }
        }
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("250m"), Some(0.25));
        assert_eq!(parse_value("2"), Some(2.0));
        assert_eq!(parse_value("1.5"), Some(1.5));
        assert_eq!(parse_value("10u"), Some(10.0 * 1e-6));
        assert_eq!(parse_value("abc"), None);
        assert_eq!(parse_value(""), None);
    }

    #[test]
    fn test_lexer_node_line() {
        use TokenKind::*;
        assert_eq!(
            kinds("AND g g_a g_b -> g_o\n"),
            vec![Identifier, Identifier, Identifier, Identifier, Arrow, Identifier, Newline, Eof]
        );
    }

    #[test]
    fn test_lexer_edge_and_comment() {
        use TokenKind::*;
        assert_eq!(kinds("a_o => n_i # wire"), vec![Identifier, Wire, Identifier, Eof]);
    }

    #[test]
    fn test_lexer_directive() {
        let mut lexer = Lexer::new(".delay 250m");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Directive);
        assert_eq!(tok.text, ".delay");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Number);
        assert_eq!(tok.text, "250m");
    }

    #[test]
    fn test_lexer_reports_position() {
        let mut lexer = Lexer::new("a\n  $");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        match lexer.next_token() {
            Err(EmuError::LexerError { line, column, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(column, 3);
            }
            other => panic!("expected lexer error, got {:?}", other),
        }
    }

    #[test]
    fn test_lone_dash_is_an_error() {
        let mut lexer = Lexer::new("- x");
        assert!(lexer.next_token().is_err());
    }
}

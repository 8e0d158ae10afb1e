//! Lexer for the Go-like surface syntax
//!
//! Converts source code into a stream of line-tagged tokens. The I/O
//! built-ins surface as `fmt.Scanln` / `fmt.Println` and are folded into
//! single [`TokenKind::Input`] / [`TokenKind::Output`] tokens here, so the
//! parser never sees the `fmt` package name.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result};

/// The lexer state
pub struct Lexer {
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
    /// Current 1-based line
    line: u32,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
            line: 1,
        }
    }

    /// Tokenize the whole input, ending with an `Eof` token
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c == Some('\n') {
            self.line += 1;
        }
        self.pos += 1;
        c
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.line)
    }

    /// Skip whitespace and `//` comments
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.start = self.pos;

        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(self.make_token(TokenKind::Eof)),
        };

        if c.is_alphabetic() || c == '_' {
            return self.read_identifier();
        }
        if c.is_ascii_digit() {
            return self.read_number();
        }
        if c == '"' {
            return self.read_string();
        }

        self.advance();
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semi,
            '&' => TokenKind::Amp,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '+' => match self.peek() {
                Some('+') => {
                    self.advance();
                    TokenKind::PlusPlus
                }
                Some('=') => {
                    self.advance();
                    TokenKind::PlusAssign
                }
                _ => TokenKind::Plus,
            },
            '-' => match self.peek() {
                Some('-') => {
                    self.advance();
                    TokenKind::MinusMinus
                }
                Some('=') => {
                    self.advance();
                    TokenKind::MinusAssign
                }
                _ => TokenKind::Minus,
            },
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    return Err(Error::UnexpectedChar { ch: c, line: self.line });
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                }
            }
            ':' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::DeclAssign
                } else {
                    TokenKind::Colon
                }
            }
            other => return Err(Error::UnexpectedChar { ch: other, line: self.line }),
        };
        Ok(self.make_token(kind))
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Result<Token> {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();

        // `fmt.Scanln` / `fmt.Println` fold into the I/O tokens
        if text == "fmt" && self.peek() == Some('.') {
            self.advance();
            return self.read_io_builtin();
        }

        let kind = TokenKind::keyword_from_str(&text)
            .unwrap_or(TokenKind::Ident(text));
        Ok(self.make_token(kind))
    }

    fn read_io_builtin(&mut self) -> Result<Token> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() {
                self.advance();
            } else {
                break;
            }
        }
        let name: String = self.source[start..self.pos].iter().collect();
        match name.as_str() {
            "Scanln" => Ok(self.make_token(TokenKind::Input)),
            "Println" => Ok(self.make_token(TokenKind::Output)),
            _ => Err(Error::UnexpectedToken {
                expected: "'Scanln' or 'Println' after 'fmt.'".to_string(),
                got: format!("'{}'", name),
                line: self.line,
            }),
        }
    }

    /// Read a decimal number literal (integer or float)
    fn read_number(&mut self) -> Result<Token> {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_next().map_or(false, |c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();
        if is_float {
            let value = text.parse::<f32>().map_err(|_| Error::InvalidNumber {
                text: text.clone(),
                line: self.line,
            })?;
            Ok(self.make_token(TokenKind::FloatLit(value)))
        } else {
            let value = text.parse::<i32>().map_err(|_| Error::InvalidNumber {
                text: text.clone(),
                line: self.line,
            })?;
            Ok(self.make_token(TokenKind::IntLit(value)))
        }
    }

    /// Read an interpreted string literal, quotes preserved in the token
    fn read_string(&mut self) -> Result<Token> {
        let line = self.line;
        self.advance(); // opening quote
        while let Some(c) = self.peek() {
            if c == '"' {
                self.advance();
                let text: String = self.source[self.start..self.pos].iter().collect();
                return Ok(Token::new(TokenKind::StrLit(text), line));
            }
            if c == '\n' {
                break;
            }
            self.advance();
        }
        Err(Error::UnterminatedString { line })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_declaration() {
        assert_eq!(
            kinds("var x int = 2 + 3"),
            vec![
                TokenKind::Var,
                TokenKind::Ident("x".to_string()),
                TokenKind::IntType,
                TokenKind::Assign,
                TokenKind::IntLit(2),
                TokenKind::Plus,
                TokenKind::IntLit(3),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_io_builtins() {
        assert_eq!(
            kinds("fmt.Scanln(&x)\nfmt.Println(x)"),
            vec![
                TokenKind::Input,
                TokenKind::LParen,
                TokenKind::Amp,
                TokenKind::Ident("x".to_string()),
                TokenKind::RParen,
                TokenKind::Output,
                TokenKind::LParen,
                TokenKind::Ident("x".to_string()),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_compound_operators() {
        assert_eq!(
            kinds("a := b <= c != d += e++ --"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::DeclAssign,
                TokenKind::Ident("b".to_string()),
                TokenKind::LessEq,
                TokenKind::Ident("c".to_string()),
                TokenKind::NotEq,
                TokenKind::Ident("d".to_string()),
                TokenKind::PlusAssign,
                TokenKind::Ident("e".to_string()),
                TokenKind::PlusPlus,
                TokenKind::MinusMinus,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_lines_and_skips_comments() {
        let tokens = Lexer::new("var x int // declaration\nx = 1\n").tokenize().unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[3].line, 2); // `x` on the second line
    }

    #[test]
    fn string_literal_keeps_quotes() {
        let tokens = Lexer::new("\"hello world\"").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StrLit("\"hello world\"".to_string()));
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(Lexer::new("\"oops").tokenize().is_err());
    }
}

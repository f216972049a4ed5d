//! Declaration file parsing
//!
//! A declaration file holds a sequence of constructor calls:
//!
//! ```text
//! # comments run to the end of the line
//! c_library(
//!     name = "socket",
//!     srcs = ["socket.c"],
//!     deps = ["//lib/base:base", ":util"],
//! )
//! ```
//!
//! Values are string literals or bracketed lists of string literals. The
//! parser only produces [`Invocation`]s; what a constructor means is up to
//! the registry.

use crate::error::{BuildError, BuildResult};
use std::path::{Path, PathBuf};

/// Conventional file name of a directory's declaration file
pub const TARGETS_FILE: &str = "TARGETS";

/// Argument value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    List(Vec<String>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }
}

/// One constructor call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Constructor name
    pub constructor: String,
    /// Keyword arguments in written order
    pub arguments: Vec<(String, Value)>,
    /// Line of the constructor name
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Equals,
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Ident(ident) => format!("identifier '{ident}'"),
            Self::Str(_) => "string literal".to_string(),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::LBracket => "'['".to_string(),
            Self::RBracket => "']'".to_string(),
            Self::Comma => "','".to_string(),
            Self::Equals => "'='".to_string(),
            Self::Eof => "end of file".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

struct Lexer<'a> {
    file: &'a Path,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(file: &'a Path, source: &'a str) -> Self {
        Self {
            file,
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> BuildError {
        BuildError::DeclarationSyntax {
            file: self.file.to_path_buf(),
            line,
            column,
            message: message.into(),
        }
    }

    fn tokenize(mut self) -> BuildResult<Vec<Spanned>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let (line, column) = (self.line, self.column);
            let Some(&c) = self.chars.peek() else {
                tokens.push(Spanned {
                    token: Token::Eof,
                    line,
                    column,
                });
                return Ok(tokens);
            };

            let token = match c {
                '(' | ')' | '[' | ']' | ',' | '=' => {
                    self.bump();
                    match c {
                        '(' => Token::LParen,
                        ')' => Token::RParen,
                        '[' => Token::LBracket,
                        ']' => Token::RBracket,
                        ',' => Token::Comma,
                        _ => Token::Equals,
                    }
                }
                '"' | '\'' => Token::Str(self.string(c, line, column)?),
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let mut ident = String::new();
                    while let Some(&c) = self.chars.peek() {
                        if !(c.is_ascii_alphanumeric() || c == '_') {
                            break;
                        }
                        ident.push(c);
                        self.bump();
                    }
                    Token::Ident(ident)
                }
                other => return Err(self.error(line, column, format!("Unexpected character {other:?}"))),
            };
            tokens.push(Spanned {
                token,
                line,
                column,
            });
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn string(&mut self, quote: char, line: usize, column: usize) -> BuildResult<String> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.error(line, column, "Unterminated string literal"));
                }
                Some(c) if c == quote => return Ok(value),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some(c @ ('\\' | '"' | '\'')) => c,
                        Some(c) => {
                            return Err(self.error(
                                self.line,
                                self.column - 1,
                                format!("Unknown escape sequence '\\{c}'"),
                            ));
                        }
                        None => return Err(self.error(line, column, "Unterminated string literal")),
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }
    }
}

struct Parser<'a> {
    file: &'a Path,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Spanned {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn next(&mut self) -> Spanned {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, spanned: &Spanned, expected: &str) -> BuildError {
        BuildError::DeclarationSyntax {
            file: self.file.to_path_buf(),
            line: spanned.line,
            column: spanned.column,
            message: format!("Expected {expected}, found {}", spanned.token.describe()),
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> BuildResult<()> {
        let spanned = self.next();
        if spanned.token == token {
            Ok(())
        } else {
            Err(self.unexpected(&spanned, expected))
        }
    }

    fn parse(mut self) -> BuildResult<Vec<Invocation>> {
        let mut invocations = Vec::new();
        while self.peek().token != Token::Eof {
            invocations.push(self.invocation()?);
        }
        Ok(invocations)
    }

    fn invocation(&mut self) -> BuildResult<Invocation> {
        let head = self.next();
        let Token::Ident(constructor) = head.token.clone() else {
            return Err(self.unexpected(&head, "a target constructor"));
        };
        self.expect(Token::LParen, "'('")?;

        let mut arguments: Vec<(String, Value)> = Vec::new();
        loop {
            if self.peek().token == Token::RParen {
                self.next();
                break;
            }

            let key = self.next();
            let Token::Ident(name) = key.token.clone() else {
                return Err(self.unexpected(&key, "a keyword argument or ')'"));
            };
            if arguments.iter().any(|(existing, _)| *existing == name) {
                return Err(BuildError::DeclarationSyntax {
                    file: self.file.to_path_buf(),
                    line: key.line,
                    column: key.column,
                    message: format!("Keyword argument '{name}' repeated"),
                });
            }
            self.expect(Token::Equals, "'='")?;
            let value = self.value()?;
            arguments.push((name, value));

            let separator = self.next();
            match separator.token {
                Token::Comma => {}
                Token::RParen => break,
                _ => return Err(self.unexpected(&separator, "',' or ')'")),
            }
        }

        Ok(Invocation {
            constructor,
            arguments,
            line: head.line,
        })
    }

    fn value(&mut self) -> BuildResult<Value> {
        let start = self.next();
        match start.token {
            Token::Str(value) => Ok(Value::String(value)),
            Token::LBracket => {
                let mut items = Vec::new();
                loop {
                    let item = self.next();
                    match item.token {
                        Token::RBracket => break,
                        Token::Str(value) => items.push(value),
                        _ => return Err(self.unexpected(&item, "a string literal or ']'")),
                    }
                    let separator = self.next();
                    match separator.token {
                        Token::Comma => {}
                        Token::RBracket => break,
                        _ => return Err(self.unexpected(&separator, "',' or ']'")),
                    }
                }
                Ok(Value::List(items))
            }
            _ => Err(self.unexpected(&start, "a string or a list")),
        }
    }
}

/// Parse the text of a declaration file; `file` is only used in diagnostics
pub fn parse_declarations(file: impl Into<PathBuf>, source: &str) -> BuildResult<Vec<Invocation>> {
    let file = file.into();
    let tokens = Lexer::new(&file, source).tokenize()?;
    Parser {
        file: &file,
        tokens,
        pos: 0,
    }
    .parse()
}

//! Tokens produced by the lexer and consumed by the parser.

use std::collections::HashMap;
use std::sync::OnceLock;

/// The closed set of token kinds the lexer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,

    Ident,
    Int,
    String,

    Assign,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,

    Lt,
    Gt,
    Eq,
    NotEq,

    Comma,
    Semicolon,

    Lparen,
    Rparen,
    Lbrace,
    Rbrace,
    Lbracket,
    Rbracket,

    Function,
    Let,
    True,
    False,
    If,
    Else,
    Return,
}

/// A single lexical token: its kind plus the source text it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>) -> Self {
        Token {
            kind,
            literal: literal.into(),
        }
    }

    pub fn from_char(kind: TokenKind, ch: char) -> Self {
        Token {
            kind,
            literal: ch.to_string(),
        }
    }

    pub fn eof() -> Self {
        Token::new(TokenKind::Eof, "")
    }
}

fn keywords() -> &'static HashMap<&'static str, TokenKind> {
    static KEYWORDS: OnceLock<HashMap<&'static str, TokenKind>> = OnceLock::new();
    KEYWORDS.get_or_init(|| {
        let mut m = HashMap::new();
        m.insert("fn", TokenKind::Function);
        m.insert("let", TokenKind::Let);
        m.insert("true", TokenKind::True);
        m.insert("false", TokenKind::False);
        m.insert("if", TokenKind::If);
        m.insert("else", TokenKind::Else);
        m.insert("return", TokenKind::Return);
        m
    })
}

/// Classifies an already-scanned identifier as a keyword or a plain `Ident`.
pub fn lookup_ident(ident: &str) -> TokenKind {
    *keywords().get(ident).unwrap_or(&TokenKind::Ident)
}

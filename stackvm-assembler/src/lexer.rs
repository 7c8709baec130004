//! # Lexer for the Stack VM Assembly Language
//!
//! Lines are lexed one at a time; there is no newline token.

use logos::Logos;

/// Tokens for stack VM assembly
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"\s+")] // Skip whitespace
#[logos(skip r"[;#][^\n]*")] // Skip comments
pub enum Token {
    /// Colon (ends a label definition)
    #[token(":")]
    Colon,

    /// Left bracket (address operand)
    #[token("[")]
    LBracket,

    /// Right bracket
    #[token("]")]
    RBracket,

    /// Any other run of non-blank characters: mnemonic, label name or
    /// operand. Whether it means anything is decided later.
    #[regex(r"[^\s:\[\];#]+", |lex| lex.slice().to_string())]
    Word(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Colon => write!(f, ":"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Word(w) => write!(f, "{}", w),
        }
    }
}

/// Tokenize a single source line
///
/// Every character is either blank, structural or part of a word, so
/// tokenizing cannot fail.
pub fn tokenize(line: &str) -> Vec<Token> {
    Token::lexer(line).filter_map(|token| token.ok()).collect()
}

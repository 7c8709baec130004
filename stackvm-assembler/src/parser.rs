//! Assembly line parser
//!
//! Turns one tokenized line into an optional label, an optional mnemonic and
//! an optional raw operand. Mnemonic lookup and operand resolution happen in
//! the assembler, which has the instruction table and the label map.

use crate::diagnostic::DiagnosticKind;
use crate::lexer::{tokenize, Token};
use stackvm_spec::Word;

/// Raw operand text as written in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `PUSH 5`, `JMP loop`, `READ 0x100`
    Value(String),
    /// `READ [0x100]`
    Address(String),
    /// Brackets that do not enclose exactly one word, e.g. `READ [5`
    Malformed(String),
}

impl Operand {
    pub fn token(&self) -> &str {
        match self {
            Operand::Value(token) | Operand::Address(token) | Operand::Malformed(token) => token,
        }
    }
}

/// Shape of a single source line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLine {
    pub label: Option<String>,
    pub mnemonic: Option<String>,
    pub operand: Option<Operand>,
    /// Tokens after the operand; they do not affect assembly
    pub extra: Vec<String>,
}

impl ParsedLine {
    /// Blank or comment-only line
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.mnemonic.is_none()
    }
}

/// Parse one source line
///
/// The first word after an optional label is the mnemonic and the next word
/// (or bracketed word) is the operand. Only a line that has no mnemonic where
/// one is expected, or a bad label name, is malformed.
pub fn parse_line(line: &str) -> Result<ParsedLine, DiagnosticKind> {
    let tokens = tokenize(line);
    let mut parsed = ParsedLine::default();

    let rest = match tokens.as_slice() {
        [Token::Word(name), Token::Colon, rest @ ..] => {
            if !is_identifier(name) {
                return Err(malformed(format!("invalid label name `{}`", name)));
            }
            parsed.label = Some(name.clone());
            rest
        }
        rest => rest,
    };

    let tail = match rest {
        [] => return Ok(parsed),
        [Token::Word(mnemonic), tail @ ..] => {
            parsed.mnemonic = Some(mnemonic.clone());
            tail
        }
        [first, ..] => {
            return Err(malformed(format!("expected an instruction, found `{}`", first)));
        }
    };

    let extra = match tail {
        [] => &[][..],
        [Token::Word(operand), extra @ ..] => {
            parsed.operand = Some(Operand::Value(operand.clone()));
            extra
        }
        [Token::LBracket, Token::Word(operand), Token::RBracket, extra @ ..] => {
            parsed.operand = Some(Operand::Address(operand.clone()));
            extra
        }
        other => {
            parsed.operand = Some(Operand::Malformed(join(other)));
            &[][..]
        }
    };
    parsed.extra = extra.iter().map(|token| token.to_string()).collect();

    Ok(parsed)
}

/// Parse a numeric literal: `0x`/`0X` hexadecimal or decimal, optionally signed
pub fn parse_literal(token: &str) -> Option<Word> {
    let token = token.trim();
    let (negative, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };

    let magnitude = match body.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => {
            let digits = &body[2..];
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                return None;
            }
            Word::from_str_radix(digits, 16).ok()?
        }
        _ => {
            if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            body.parse::<Word>().ok()?
        }
    };

    Some(if negative { -magnitude } else { magnitude })
}

/// Label names: letter or underscore, then letters, digits, underscores
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn malformed(message: String) -> DiagnosticKind {
    DiagnosticKind::MalformedLine { message }
}

/// Source-like text for a run of tokens; adjacent words keep a space
fn join(tokens: &[Token]) -> String {
    let mut text = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && matches!((&tokens[i - 1], token), (Token::Word(_), Token::Word(_))) {
            text.push(' ');
        }
        text.push_str(&token.to_string());
    }
    text
}

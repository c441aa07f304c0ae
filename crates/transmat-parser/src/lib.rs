//! MATLAB/Octave front end: token stream in, abstract syntax tree out.
//!
//! ```
//! use transmat_parser::{parse, Stmt};
//!
//! let program = parse("x = 1:2:10;").unwrap();
//! assert!(matches!(program.body[0], Stmt::Let { .. }));
//! ```

mod ast;
mod backpatch;
mod error;
mod expr;
mod parser;
mod precedence;

pub use ast::*;
pub use error::{ParseError, SyntaxError};
pub use precedence::{Assoc, Tier};

use parser::Parser;
use serde::{Deserialize, Serialize};
use transmat_lexer::{tokenize_detailed, Token, TokenKind};

/// Dialect strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatMode {
    /// Accepts command syntax (`hold on`) and resynchronizes after a
    /// malformed if-condition.
    #[default]
    Matlab,
    /// Rejects both.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserOptions {
    pub compat: CompatMode,
}

impl ParserOptions {
    pub fn new(compat: CompatMode) -> Self {
        Self { compat }
    }

    pub fn command_syntax(&self) -> bool {
        self.compat == CompatMode::Matlab
    }

    pub fn recover_if_condition(&self) -> bool {
        self.compat == CompatMode::Matlab
    }
}

pub fn parse(input: &str) -> Result<Program, ParseError> {
    parse_with_options(input, &ParserOptions::default())
}

pub fn parse_with_options(input: &str, options: &ParserOptions) -> Result<Program, ParseError> {
    parse_tokens(tokenize_detailed(input), options)
}

/// Parses an already tokenized program.
pub fn parse_tokens(tokens: Vec<Token>, options: &ParserOptions) -> Result<Program, ParseError> {
    if let Some(bad) = tokens.iter().find(|t| t.kind == TokenKind::Error) {
        return Err(SyntaxError {
            message: format!("Invalid token: '{}'", bad.text),
            found: Some(bad.clone()),
            expected: None,
            position: Position::from(bad),
        }
        .into());
    }
    log::trace!("parsing {} tokens ({:?})", tokens.len(), options.compat);

    let mut parser = Parser::new(tokens, *options);
    let program = parser.parse_program()?;
    log::debug!("parsed {} top-level statements", program.body.len());
    Ok(program)
}

// For callers that only want a message
pub fn parse_simple(input: &str) -> Result<Program, String> {
    parse(input).map_err(String::from)
}

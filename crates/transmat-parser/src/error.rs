use crate::ast::Position;
use thiserror::Error;
use transmat_lexer::Token;

/// The token stream does not continue any production at the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub message: String,
    /// The offending token; `None` when the input ended prematurely.
    pub found: Option<Token>,
    pub expected: Option<String>,
    /// Where the error was detected. For end of input this is the end of the last token.
    pub position: Position,
}

impl SyntaxError {
    pub fn is_unexpected_eof(&self) -> bool {
        self.found.is_none()
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Syntax error at line {}, offset {}: {}",
            self.position.line, self.position.offset, self.message
        )?;
        match &self.found {
            Some(token) => write!(f, " (found: '{}')", token.text)?,
            None => write!(f, " (found: end of input)")?,
        }
        if let Some(expected) = &self.expected {
            write!(f, " (expected: {expected})")?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// A reduction received operands it cannot build a node from, e.g. a
    /// left-hand side that is not an assignable shape.
    #[error("Invalid construct at line {}, offset {}: {message}", .position.line, .position.offset)]
    InvalidTarget { message: String, position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::Syntax(err) => err.position,
            ParseError::InvalidTarget { position, .. } => *position,
        }
    }

    pub(crate) fn invalid_target(message: impl Into<String>, position: Position) -> Self {
        ParseError::InvalidTarget {
            message: message.into(),
            position,
        }
    }
}

impl From<ParseError> for String {
    fn from(error: ParseError) -> Self {
        format!("{error}")
    }
}

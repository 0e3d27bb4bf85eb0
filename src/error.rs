//! Error types shared by every phase of the pipeline.
//!
//! Scan, parse, and resolve errors are collected in an [`ErrorReporter`]
//! so a single run can surface several of them; a phase with a non-empty
//! reporter gates the phases behind it. Runtime errors abort the current
//! `interpret` call instead and carry their own display format.

use std::fmt::{Display, Formatter};
use std::io;

use thiserror::Error;

use crate::scanner::{Token, TokenType};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoxError {
    #[error("[line {line}] Error: {message}")]
    Scan { line: usize, message: String },

    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        line: usize,
        location: String,
        message: String,
    },

    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        line: usize,
        location: String,
        message: String,
    },
}

impl LoxError {
    pub fn scan(line: usize, message: &str) -> Self {
        Self::Scan {
            line,
            message: message.to_string(),
        }
    }

    pub fn parse(token: &Token, message: &str) -> Self {
        Self::Parse {
            line: token.line,
            location: locate(token),
            message: message.to_string(),
        }
    }

    pub fn resolve(token: &Token, message: &str) -> Self {
        Self::Resolve {
            line: token.line,
            location: locate(token),
            message: message.to_string(),
        }
    }
}

fn locate(token: &Token) -> String {
    if token.token_type == TokenType::Eof {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Raised while evaluating; unwinds to the statement that started the
/// current `interpret` call. I/O failures on `print` carry no line.
#[derive(Debug)]
pub struct RuntimeError {
    pub message: String,
    pub line: Option<usize>,
}

impl RuntimeError {
    pub fn new<T>(token: &Token, message: &str) -> Result<T, Self> {
        Err(Self {
            message: message.to_string(),
            line: Some(token.line),
        })
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(line) = self.line {
            write!(f, "\n[line {}]", line)?;
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {}

impl From<io::Error> for RuntimeError {
    fn from(err: io::Error) -> Self {
        Self {
            message: err.to_string(),
            line: None,
        }
    }
}

/// Collects pre-execution errors across phases.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    errors: Vec<LoxError>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: LoxError) {
        self.errors.push(error);
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    pub fn take(&mut self) -> Vec<LoxError> {
        std::mem::take(&mut self.errors)
    }
}

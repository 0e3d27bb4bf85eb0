pub mod ast_printer;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod types;

use std::io::Write;

use log::debug;

pub use crate::error::{ErrorReporter, LoxError, RuntimeError};
pub use crate::interpreter::{Interpreter, Value};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    /// One or more scan/parse/resolve errors; nothing was executed.
    StaticError,
    /// Execution started and was aborted by a runtime error.
    RuntimeError,
}

/// Drives one source unit through the full pipeline. A single `Lox`
/// instance can run many units (the REPL feeds it line by line); the
/// interpreter, its globals, and its resolution table persist across
/// runs, while the error reporter starts fresh every time.
pub struct Lox<'w> {
    interpreter: Interpreter<'w>,
    pub show_ast: bool,
}

impl<'w> Lox<'w> {
    pub fn new(output: &'w mut dyn Write) -> Self {
        Self {
            interpreter: Interpreter::new(output),
            show_ast: false,
        }
    }

    pub fn run(&mut self, source: &str, repl: bool) -> RunStatus {
        let mut reporter = ErrorReporter::new();

        let tokens = Scanner::new(source).scan_tokens(&mut reporter);
        debug!("scanned {} tokens", tokens.len());

        let statements =
            Parser::new(tokens, repl, &mut self.interpreter.next_id, &mut reporter).parse();
        debug!("parsed {} statements", statements.len());
        if reporter.had_error() {
            Self::print_errors(&mut reporter);
            return RunStatus::StaticError;
        }

        if self.show_ast {
            println!("{}", ast_printer::print_program(&statements));
        }

        Resolver::new(&mut self.interpreter, &mut reporter).resolve_statements(&statements);
        if reporter.had_error() {
            Self::print_errors(&mut reporter);
            return RunStatus::StaticError;
        }

        match self.interpreter.interpret(&statements) {
            Ok(()) => RunStatus::Ok,
            Err(error) => {
                eprintln!("{}", error);
                RunStatus::RuntimeError
            }
        }
    }

    fn print_errors(reporter: &mut ErrorReporter) {
        for error in reporter.take() {
            eprintln!("{}", error);
        }
    }
}

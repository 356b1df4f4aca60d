//! The front‑to‑back pipeline: scan → parse → resolve → interpret.
//!
//! A [`Session`] keeps one interpreter alive across runs, so globals defined
//! by one REPL line are visible to the next.  Error flags are per run.

use std::io::Write;

use log::{debug, info};

use crate::error::{ErrorKind, HexError};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::value::Value;

/// Exit status after a syntax or resolution error.
pub const EXIT_STATIC_ERROR: i32 = 65;

/// Exit status after a runtime error.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// Outcome of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Every diagnostic, in the order it was produced.
    pub diagnostics: Vec<HexError>,

    /// A lexical, syntax or resolution error occurred; nothing executed.
    pub had_error: bool,

    /// Execution started and was aborted by a runtime error.
    pub had_runtime_error: bool,
}

impl RunReport {
    fn record(&mut self, errors: Vec<HexError>) {
        for error in errors {
            match error.kind() {
                ErrorKind::Static => self.had_error = true,
                ErrorKind::Runtime => self.had_runtime_error = true,
            }
            self.diagnostics.push(error);
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.had_error && !self.had_runtime_error
    }

    /// Process exit status a file‑mode driver should use.
    pub fn exit_code(&self) -> i32 {
        if self.had_error {
            EXIT_STATIC_ERROR
        } else if self.had_runtime_error {
            EXIT_RUNTIME_ERROR
        } else {
            0
        }
    }
}

pub struct Session {
    interpreter: Interpreter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(output),
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Run a whole program.
    pub fn run(&mut self, source: &str) -> RunReport {
        info!("Running {} byte(s) of source", source.len());

        let mut report = RunReport::default();

        let Some(statements) = self.front_end(source, &mut report, |parser| parser.parse()) else {
            return report;
        };

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            report.record(errors);
            return report;
        }

        if let Err(error) = self.interpreter.interpret(&statements) {
            report.record(vec![error]);
        }

        debug!("Run finished with exit code {}", report.exit_code());

        report
    }

    /// Evaluate a single expression, yielding its value on success.
    pub fn evaluate(&mut self, source: &str) -> (RunReport, Option<Value>) {
        let mut report = RunReport::default();

        let Some(expr) = self.front_end(source, &mut report, |parser| {
            parser.parse_expression()
        }) else {
            return (report, None);
        };

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve_expression(&expr) {
            report.record(errors);
            return (report, None);
        }

        match self.interpreter.evaluate(&expr) {
            Ok(value) => (report, Some(value)),
            Err(error) => {
                report.record(vec![error]);
                (report, None)
            }
        }
    }

    /// Scan and parse with `parse`, recording diagnostics from both.  Yields
    /// the tree only if neither stage reported anything.
    fn front_end<T, F>(&mut self, source: &str, report: &mut RunReport, parse: F) -> Option<T>
    where
        F: FnOnce(Parser<'_>) -> Result<T, Vec<HexError>>,
    {
        let (tokens, lex_errors) = scan_tokens(source);
        let lexed_cleanly = lex_errors.is_empty();
        report.record(lex_errors);

        // Parse even after lexical errors so syntax errors surface too.
        match parse(Parser::new(&tokens)) {
            Ok(tree) if lexed_cleanly => Some(tree),
            Ok(_) => None,
            Err(errors) => {
                report.record(errors);
                None
            }
        }
    }
}

/// Convenience for one‑shot callers that only need printed output.
pub fn run_source(source: &str, output: Box<dyn Write>) -> RunReport {
    Session::with_output(output).run(source)
}

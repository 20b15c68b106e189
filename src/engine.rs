//! The string-in/string-out engine boundary.
//!
//! [`Engine`] wires the stages together: lex, parse, compile, parse the
//! JSON input through serde_json, execute, serialize each output. Hosts
//! talk to the engine exclusively through filter text and JSON text, so
//! they never see the value model or the bytecode.
//!
//! # Example
//!
//! ```
//! use quarry::Engine;
//!
//! let engine = Engine::new();
//! let names = engine
//!     .run_streaming(".users[] | .name", r#"{"users":[{"name":"a"},{"name":"b"}]}"#)
//!     .unwrap();
//! assert_eq!(names, vec!["\"a\"", "\"b\""]);
//! ```

#[cfg(not(test))]
use alloc::string::{String, ToString};
#[cfg(not(test))]
use alloc::vec::Vec;

use crate::builtins::{BuiltinFn, Builtins};
use crate::bytecode::Program;
use crate::compiler::{compile, CompileError};
use crate::exec::{execute, ExecError};
use crate::lexer::Lexer;
use crate::parser::{parse, ParseError};
use crate::value::JsonValue;

/// Error surfaced at the engine boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The filter text failed to lex or parse.
    Parse(ParseError),
    /// The filter parsed but contains constructs the compiler does not
    /// support.
    Compile(CompileError),
    /// A builtin was unknown or failed at runtime.
    Exec(ExecError),
    /// The JSON input was rejected by the DOM parser; the parser's message
    /// is kept verbatim.
    Json(String),
}

impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EngineError::Parse(e) => e.fmt(f),
            EngineError::Compile(e) => e.fmt(f),
            EngineError::Exec(e) => e.fmt(f),
            EngineError::Json(msg) => write!(f, "invalid JSON input: {}", msg),
        }
    }
}

impl From<ParseError> for EngineError {
    fn from(e: ParseError) -> Self {
        EngineError::Parse(e)
    }
}

impl From<CompileError> for EngineError {
    fn from(e: CompileError) -> Self {
        EngineError::Compile(e)
    }
}

impl From<ExecError> for EngineError {
    fn from(e: ExecError) -> Self {
        EngineError::Exec(e)
    }
}

/// A filter engine holding its builtin table.
///
/// Engines are independent: registering a builtin on one has no effect on
/// another, and a single engine can compile and run any number of filters.
pub struct Engine {
    builtins: Builtins,
}

impl Engine {
    /// Create an engine with the default builtins.
    pub fn new() -> Self {
        Engine {
            builtins: Builtins::new(),
        }
    }

    /// The engine's builtin table.
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Add or replace a builtin.
    pub fn register_builtin(&mut self, name: impl Into<String>, f: BuiltinFn) {
        self.builtins.register(name, f);
    }

    /// Compile filter text into a program. Pure: no engine state changes,
    /// and compiling the same filter twice yields the same program.
    pub fn compile(&self, filter: &str) -> Result<Program, EngineError> {
        if filter.trim().is_empty() {
            return Err(EngineError::Parse(ParseError::new(
                "filter cannot be empty",
                1,
                1,
            )));
        }
        let tokens = Lexer::new(filter).tokenize();
        let expr = parse(&tokens)?;
        Ok(compile(&expr)?)
    }

    /// Run a filter against JSON input text, returning the serialization of
    /// the first output, or `null` when the output stream is empty.
    pub fn run(&self, filter: &str, json_input: &str) -> Result<String, EngineError> {
        let outputs = self.run_streaming(filter, json_input)?;
        Ok(outputs
            .into_iter()
            .next()
            .unwrap_or_else(|| "null".to_string()))
    }

    /// Run a filter against JSON input text, returning every output in
    /// order as its serialization.
    pub fn run_streaming(
        &self,
        filter: &str,
        json_input: &str,
    ) -> Result<Vec<String>, EngineError> {
        let program = self.compile(filter)?;
        let input = JsonValue::from_json_text(json_input)
            .map_err(|e| EngineError::Json(e.to_string()))?;
        let outputs = execute(&program, &self.builtins, input)?;
        Ok(outputs.iter().map(JsonValue::to_json).collect())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

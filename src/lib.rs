//! # Quarry
//!
//! A streaming jq-style JSON query engine. Filter text compiles to a flat
//! bytecode program and runs against an immutable, reference-shared JSON
//! value, producing an ordered stream of outputs: `.users[] | .name` yields
//! one name per user, `keys` yields the sorted key list, `empty` yields
//! nothing.
//!
//! ## Module Roles
//!
//! | Module | Responsibility | Public Entry Points |
//! |---|---|---|
//! | `value` | Shared immutable JSON value model + serialization | [`JsonValue`] |
//! | `lexer` | Filter text -> positioned token stream | [`Lexer`], [`Token`] |
//! | `expr` | Expression AST | [`Expr`] |
//! | `parser` | Token stream -> AST, precedence climbing | [`parse`] |
//! | `compiler` | AST -> bytecode over a constant pool | [`compile`] |
//! | `bytecode` | Program representation, validation, disassembly | [`Program`] |
//! | `exec` | Bytecode executor with fan-out frames | [`execute`] |
//! | `builtins` | Injected builtin table | [`Builtins`] |
//! | `engine` | String-in/string-out boundary for hosts | [`Engine`] |
//!
//! ## Quick Start
//!
//! ```
//! use quarry::Engine;
//!
//! let engine = Engine::new();
//!
//! let first = engine.run(".name", r#"{"name":"Alice","age":30}"#).unwrap();
//! assert_eq!(first, "\"Alice\"");
//!
//! let all = engine.run_streaming(".[]", "[1,2,3]").unwrap();
//! assert_eq!(all, vec!["1", "2", "3"]);
//! ```
//!
//! ## Execution Contract
//!
//! 1. Lex and parse once, compile once, run against any number of inputs.
//! 2. Structural access is total: missing keys, out-of-range indices and
//!    type mismatches yield `null`, never an error. Builtin precondition
//!    failures are errors and abort the run.
//! 3. Output order is deterministic; object iteration is always sorted by
//!    key.
//!
//! ## Features
//!
//! - `std` (default) - std support. Without it the crate is `no_std` +
//!   `alloc`.

// Use no_std unless std feature is enabled or we're in test mode
#![cfg_attr(not(any(test, feature = "std")), no_std)]

// When using no_std, we need to explicitly link the alloc crate
#[cfg(not(any(test, feature = "std")))]
extern crate alloc;

// When using std, re-export alloc types from std for compatibility
#[cfg(any(test, feature = "std"))]
extern crate std as alloc;

pub mod builtins;
pub mod bytecode;
pub mod compiler;
pub mod engine;
pub mod exec;
pub mod expr;
pub mod lexer;
pub mod parser;
pub mod value;

pub use builtins::{BuiltinFn, Builtins};
pub use bytecode::{ConstantPool, Instruction, OpCode, Program};
pub use compiler::{compile, CompileError};
pub use engine::{Engine, EngineError};
pub use exec::{execute, ExecError};
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse, ParseError};
pub use value::JsonValue;

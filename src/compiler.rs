//! Lowering from the expression AST to a bytecode [`Program`].
//!
//! The compiler walks the tree once, emitting instructions against the
//! constant pool, then validates the result. It supports the access-path
//! subset the executor interprets: identity, field and literal-index
//! access, iteration, pipes, addition of a numeric constant, and
//! zero-argument builtin calls. Everything else fails with a message
//! naming the unsupported construct.

#[cfg(not(test))]
use alloc::format;
#[cfg(not(test))]
use alloc::string::String;

use crate::bytecode::{Instruction, OpCode, Program};
use crate::expr::{BinaryOp, Expr};
use crate::value::JsonValue;

/// Error that occurs during compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        CompileError {
            message: message.into(),
        }
    }
}

impl core::fmt::Display for CompileError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "compile error: {}", self.message)
    }
}

/// Compile an expression into a validated program.
pub fn compile(expr: &Expr) -> Result<Program, CompileError> {
    let mut program = Program::default();
    emit(expr, &mut program)?;
    program.validate()?;
    Ok(program)
}

fn emit(expr: &Expr, prog: &mut Program) -> Result<(), CompileError> {
    match expr {
        Expr::Identity => {
            prog.code.push(Instruction::new(OpCode::LoadIdentity));
            Ok(())
        }
        Expr::Field(name) => {
            let sid = prog.pool.intern_string(name);
            prog.code.push(Instruction::with_a(OpCode::GetField, sid));
            Ok(())
        }
        Expr::Index(child) => match child.as_ref() {
            Expr::Literal(JsonValue::Number(n)) => {
                let nid = prog.pool.intern_number(*n);
                prog.code.push(Instruction::with_a(OpCode::GetIndexNum, nid));
                Ok(())
            }
            Expr::Literal(JsonValue::String(s)) => {
                let sid = prog.pool.intern_string(s);
                prog.code.push(Instruction::with_a(OpCode::GetIndexStr, sid));
                Ok(())
            }
            _ => Err(CompileError::new(
                "unsupported index expression (only number and string literals compile)",
            )),
        },
        Expr::Iterate => {
            prog.code.push(Instruction::new(OpCode::Iterate));
            Ok(())
        }
        Expr::Pipe(left, right) => {
            emit(left, prog)?;
            emit(right, prog)
        }
        Expr::Binary { op, left, right } => {
            if *op == BinaryOp::Add {
                if let Expr::Literal(JsonValue::Number(n)) = right.as_ref() {
                    emit(left, prog)?;
                    let nid = prog.pool.intern_number(*n);
                    prog.code.push(Instruction::with_a(OpCode::AddConst, nid));
                    return Ok(());
                }
            }
            Err(CompileError::new(format!(
                "unsupported binary operator '{}' (only '+' with a numeric constant compiles)",
                op.symbol()
            )))
        }
        Expr::Call { name, args } => {
            if !args.is_empty() {
                return Err(CompileError::new(format!(
                    "function arguments are not supported: {}",
                    name
                )));
            }
            let sid = prog.pool.intern_string(name);
            prog.code.push(Instruction::with_a(OpCode::BuiltinCall, sid));
            Ok(())
        }
        Expr::Literal(_) => Err(CompileError::new("bare literals do not compile")),
        Expr::Slice(_, _) => Err(CompileError::new("slices are not supported")),
        Expr::Recurse => Err(CompileError::new("recursive descent is not supported")),
        Expr::Comma(_) => Err(CompileError::new("comma outputs are not supported")),
        Expr::Unary { .. } => Err(CompileError::new("unary operators are not supported")),
        Expr::Alternative(_, _) => {
            Err(CompileError::new("the '//' operator is not supported"))
        }
        Expr::ArrayLit(_) => Err(CompileError::new("array construction is not supported")),
        Expr::ObjectLit(_) => Err(CompileError::new("object construction is not supported")),
        Expr::If { .. } => Err(CompileError::new("conditionals are not supported")),
    }
}

//! Bytecode executor.
//!
//! Walks a [`Program`] with a single current-value register and collects an
//! ordered output stream. Straight-line opcodes transform the register;
//! `Iterate` fans out by running the remaining instruction tail once per
//! array element, so `.users[] | .name` streams one name per user in
//! element order. A builtin's first output becomes the register and
//! continues through the tail; any additional outputs join the stream
//! directly, untouched by later instructions. Structural access is total:
//! type mismatches, missing keys and out-of-range indices produce `Null`,
//! never an error. Only builtins fail, and a builtin failure aborts the
//! whole execution.

#[cfg(not(test))]
use alloc::format;
#[cfg(not(test))]
use alloc::string::String;
#[cfg(not(test))]
use alloc::vec::Vec;

use crate::builtins::Builtins;
use crate::bytecode::{OpCode, Program};
use crate::value::JsonValue;

/// Error that occurs during execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecError {
    pub message: String,
}

impl ExecError {
    /// Create an error from a message. Custom builtins use this to report
    /// precondition failures; include the builtin's name in the message.
    pub fn new(message: impl Into<String>) -> Self {
        ExecError {
            message: message.into(),
        }
    }
}

impl core::fmt::Display for ExecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "runtime error: {}", self.message)
    }
}

/// Run `prog` against `input`, producing every output in order.
pub fn execute(
    prog: &Program,
    builtins: &Builtins,
    input: JsonValue,
) -> Result<Vec<JsonValue>, ExecError> {
    let mut outputs = Vec::new();
    exec_range(prog, builtins, 0, input, &mut outputs)?;
    Ok(outputs)
}

/// Execute instructions from `start` to the end of the program on `input`,
/// appending outputs. `Iterate` re-enters this function once per array
/// element with the tail of the program.
fn exec_range(
    prog: &Program,
    builtins: &Builtins,
    start: usize,
    input: JsonValue,
    outputs: &mut Vec<JsonValue>,
) -> Result<(), ExecError> {
    let mut cur = input;

    for pc in start..prog.code.len() {
        let ins = &prog.code[pc];
        match ins.op {
            OpCode::Nop | OpCode::LoadIdentity => {}

            OpCode::GetField | OpCode::GetIndexStr => {
                let key = prog
                    .pool
                    .string(ins.a)
                    .ok_or_else(|| bad_operand(ins.op, pc))?;
                cur = cur.object_get(key);
            }

            OpCode::GetIndexNum => {
                let idx = prog
                    .pool
                    .number(ins.a)
                    .ok_or_else(|| bad_operand(ins.op, pc))?;
                cur = if idx < 0.0 {
                    JsonValue::Null
                } else {
                    cur.array_index(idx as usize)
                };
            }

            OpCode::Iterate => {
                return match cur {
                    JsonValue::Array(elements) => {
                        for element in elements.iter() {
                            exec_range(prog, builtins, pc + 1, element.clone(), outputs)?;
                        }
                        Ok(())
                    }
                    // Non-arrays pass through as a single output.
                    other => {
                        outputs.push(other);
                        Ok(())
                    }
                };
            }

            OpCode::AddConst => {
                let k = prog
                    .pool
                    .number(ins.a)
                    .ok_or_else(|| bad_operand(ins.op, pc))?;
                cur = match cur {
                    JsonValue::Number(n) => JsonValue::Number(n + k),
                    _ => JsonValue::Null,
                };
            }

            OpCode::Length => {
                cur = JsonValue::Number(cur.len() as f64);
            }

            OpCode::BuiltinCall => {
                let name = prog
                    .pool
                    .string(ins.a)
                    .ok_or_else(|| bad_operand(ins.op, pc))?;
                let mut produced = Vec::new();
                builtins.call(name, &cur, &mut produced)?;

                let mut produced = produced.into_iter();
                match produced.next() {
                    Some(first) => {
                        // The first output continues through the remaining
                        // instructions; any others join the stream as-is.
                        cur = first;
                        outputs.extend(produced);
                    }
                    // Zero outputs (`empty`): the frame emits nothing.
                    None => return Ok(()),
                }
            }
        }
    }

    outputs.push(cur);
    Ok(())
}

fn bad_operand(op: OpCode, pc: usize) -> ExecError {
    ExecError::new(format!("invalid pool operand for {} at pc={}", op, pc))
}

//! Bytecode program representation.
//!
//! A compiled filter is a flat [`Program`]: a vector of [`Instruction`]s
//! plus a [`ConstantPool`] owning the string and number operands. Operand
//! fields hold pool indices, `-1` meaning unused. [`Program::validate`]
//! rejects any instruction whose operand points outside the pool, and
//! `Display` renders a disassembly for debugging.

#[cfg(not(test))]
use alloc::format;
#[cfg(not(test))]
use alloc::string::{String, ToString};
#[cfg(not(test))]
use alloc::vec::Vec;

use crate::compiler::CompileError;

/// Operation codes interpreted by the executor.
///
/// `Nop` and `Length` are interpreted but not currently emitted by the
/// compiler; `length` in filter source dispatches through `BuiltinCall`
/// like every other zero-argument call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// Do nothing.
    Nop,
    /// Keep the current value.
    LoadIdentity,
    /// Object lookup by key (string pool operand); `Null` on a non-object
    /// or a missing key.
    GetField,
    /// Array lookup by index (number pool operand); `Null` on a non-array
    /// or out of range.
    GetIndexNum,
    /// Same as `GetField`, emitted for `.["key"]` syntax.
    GetIndexStr,
    /// Fan out an array into one execution of the remaining program per
    /// element; a non-array passes through as a single output.
    Iterate,
    /// Numeric addition of a pool constant; `Null` on a non-number.
    AddConst,
    /// Replace the current value with its length.
    Length,
    /// Invoke the named builtin (string pool operand) on the current value.
    /// The first output replaces the current value; extra outputs are
    /// appended to the stream as-is.
    BuiltinCall,
}

impl core::fmt::Display for OpCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OpCode::Nop => "NOP",
            OpCode::LoadIdentity => "LOAD_IDENTITY",
            OpCode::GetField => "GET_FIELD",
            OpCode::GetIndexNum => "GET_INDEX_NUM",
            OpCode::GetIndexStr => "GET_INDEX_STR",
            OpCode::Iterate => "ITERATE",
            OpCode::AddConst => "ADD_CONST",
            OpCode::Length => "LENGTH",
            OpCode::BuiltinCall => "BUILTIN_CALL",
        };
        f.write_str(s)
    }
}

/// A single instruction: an opcode and two operand slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    pub op: OpCode,
    /// General operand, usually a pool index; `-1` when unused.
    pub a: i32,
    /// Optional second operand; `-1` when unused.
    pub b: i32,
}

impl Instruction {
    /// An instruction with no operands.
    pub fn new(op: OpCode) -> Self {
        Instruction { op, a: -1, b: -1 }
    }

    /// An instruction with one operand.
    pub fn with_a(op: OpCode, a: i32) -> Self {
        Instruction { op, a, b: -1 }
    }

    /// Render this instruction with its pool operand resolved.
    pub fn disassemble(&self, pool: &ConstantPool) -> String {
        match self.op {
            OpCode::GetField | OpCode::GetIndexStr | OpCode::BuiltinCall => {
                match pool.string(self.a) {
                    Some(s) => format!("{:<16} {:?}", self.op.to_string(), s),
                    None => format!("{:<16} <bad string index {}>", self.op.to_string(), self.a),
                }
            }
            OpCode::GetIndexNum | OpCode::AddConst => match pool.number(self.a) {
                Some(n) => format!("{:<16} {}", self.op.to_string(), n),
                None => format!("{:<16} <bad number index {}>", self.op.to_string(), self.a),
            },
            _ => self.op.to_string(),
        }
    }
}

/// Owns the immediate operands referenced by instructions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantPool {
    pub strings: Vec<String>,
    pub numbers: Vec<f64>,
}

impl ConstantPool {
    /// Intern a string, reusing an existing slot when present.
    pub fn intern_string(&mut self, s: &str) -> i32 {
        if let Some(i) = self.strings.iter().position(|e| e == s) {
            return i as i32;
        }
        self.strings.push(s.to_string());
        (self.strings.len() - 1) as i32
    }

    /// Intern a number, reusing an existing slot when present.
    pub fn intern_number(&mut self, n: f64) -> i32 {
        if let Some(i) = self.numbers.iter().position(|e| *e == n) {
            return i as i32;
        }
        self.numbers.push(n);
        (self.numbers.len() - 1) as i32
    }

    /// Look up a string operand; `None` when the index is out of range.
    pub fn string(&self, idx: i32) -> Option<&str> {
        usize::try_from(idx)
            .ok()
            .and_then(|i| self.strings.get(i))
            .map(String::as_str)
    }

    /// Look up a number operand; `None` when the index is out of range.
    pub fn number(&self, idx: i32) -> Option<f64> {
        usize::try_from(idx).ok().and_then(|i| self.numbers.get(i)).copied()
    }
}

/// A compiled filter: instructions plus their constant pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub code: Vec<Instruction>,
    pub pool: ConstantPool,
}

impl Program {
    /// Check that every pool-referencing instruction carries an in-range
    /// index.
    pub fn validate(&self) -> Result<(), CompileError> {
        for (pc, ins) in self.code.iter().enumerate() {
            match ins.op {
                OpCode::GetField | OpCode::GetIndexStr | OpCode::BuiltinCall => {
                    if self.pool.string(ins.a).is_none() {
                        return Err(CompileError::new(format!(
                            "invalid string pool index in instruction at pc={}",
                            pc
                        )));
                    }
                }
                OpCode::GetIndexNum | OpCode::AddConst => {
                    if self.pool.number(ins.a).is_none() {
                        return Err(CompileError::new(format!(
                            "invalid number pool index in instruction at pc={}",
                            pc
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl core::fmt::Display for Program {
    /// Disassembly, one instruction per line with resolved operands.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (pc, ins) in self.code.iter().enumerate() {
            writeln!(f, "{:04}  {}", pc, ins.disassemble(&self.pool))?;
        }
        Ok(())
    }
}

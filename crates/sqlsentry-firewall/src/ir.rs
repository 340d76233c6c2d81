//! # Instruction Compiler and Interpreter
//!
//! Lowers a classification tree into a flat program of primitive
//! instructions and executes it to obtain an action.
//!
//! ```text
//!   LOAD payload                      ; always first
//!   CHECK BOOLEAN_BASED = 1 ' OR 1=1  ; per injection node
//!   BLOCK BOOLEAN_BASED
//!   LOG DETECTED BOOLEAN_BASED
//!   ALLOW                             ; per safe node
//!   HALT                              ; always last
//! ```
//!
//! Execution is strictly sequential and stops at the first `HALT`. Among
//! `BLOCK` and `ALLOW`, the last one executed decides the action. A tree from
//! [`crate::parser`] never emits both, so this only matters for hand-built
//! programs. `CHECK` and `ALERT` are reserved and have no effect.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Action;
use crate::parser::{Node, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    Load,
    Check,
    Block,
    Alert,
    Allow,
    Log,
    Halt,
}

impl Opcode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Opcode::Load => "LOAD",
            Opcode::Check => "CHECK",
            Opcode::Block => "BLOCK",
            Opcode::Alert => "ALERT",
            Opcode::Allow => "ALLOW",
            Opcode::Log => "LOG",
            Opcode::Halt => "HALT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub arg1: Option<String>,
    pub arg2: Option<String>,
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            arg1: None,
            arg2: None,
        }
    }

    pub fn with_args(opcode: Opcode, arg1: Option<String>, arg2: Option<String>) -> Self {
        Self { opcode, arg1, arg2 }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.as_str())?;
        for arg in [&self.arg1, &self.arg2].into_iter().flatten() {
            if !arg.is_empty() {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// An ordered instruction sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, opcode: Opcode, arg1: Option<String>, arg2: Option<String>) {
        self.instructions
            .push(Instruction::with_args(opcode, arg1, arg2));
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl fmt::Display for Program {
    /// Numbered listing, one instruction per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{:>3}: {}", index, instruction)?;
        }
        Ok(())
    }
}

/// Lowers classification trees to programs.
#[derive(Debug, Default, Clone, Copy)]
pub struct Compiler;

impl Compiler {
    pub fn compile(&self, tree: &Node) -> Program {
        let mut program = Program::new();
        program.emit(Opcode::Load, Some("payload".to_string()), None);
        Self::lower(tree, &mut program);
        program.emit(Opcode::Halt, None, None);
        program
    }

    fn lower(node: &Node, program: &mut Program) {
        match &node.kind {
            NodeKind::Injection { family } => {
                let family = family.to_string();
                program.emit(Opcode::Check, Some(family.clone()), Some(node.value.clone()));
                program.emit(Opcode::Block, Some(family.clone()), None);
                program.emit(Opcode::Log, Some("DETECTED".to_string()), Some(family));
            }
            NodeKind::Safe => program.emit(Opcode::Allow, None, None),
            NodeKind::Payload { .. } | NodeKind::Evidence { .. } => {}
        }

        for child in &node.children {
            Self::lower(child, program);
        }
    }
}

/// Result of running a [`Program`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    /// Last `BLOCK`/`ALLOW` executed, if any.
    pub action: Option<Action>,
    pub output: Vec<String>,
    /// Number of instructions executed, including the final `HALT`.
    pub steps: usize,
}

/// Sequential program interpreter.
#[derive(Debug, Default, Clone, Copy)]
pub struct Interpreter;

impl Interpreter {
    pub fn execute(&self, program: &Program) -> Execution {
        let mut action = None;
        let mut output = Vec::new();
        let mut steps = 0;

        for instruction in program.instructions() {
            steps += 1;
            match instruction.opcode {
                Opcode::Block => {
                    action = Some(Action::Block);
                    output.push(format!("BLOCK: {}", arg(&instruction.arg1)));
                }
                Opcode::Allow => {
                    action = Some(Action::Allow);
                    output.push("ALLOW".to_string());
                }
                Opcode::Log => {
                    output.push(format!(
                        "LOG: {} - {}",
                        arg(&instruction.arg1),
                        arg(&instruction.arg2)
                    ));
                }
                Opcode::Halt => break,
                // reserved
                Opcode::Load | Opcode::Check | Opcode::Alert => {}
            }
        }

        Execution {
            action,
            output,
            steps,
        }
    }
}

fn arg(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// Compile a tree.
pub fn compile(tree: &Node) -> Program {
    Compiler.compile(tree)
}

/// Execute a program.
pub fn execute(program: &Program) -> Execution {
    Interpreter.execute(program)
}

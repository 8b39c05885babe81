//! Bytecode types for the stencil compiler.
//!
//! - [`OpCode`] - The instruction set for the VM
//! - [`BytecodeChunk`] - Compiled bytecode for a function
//! - [`Constant`] and [`ConstantPool`] - Artifact-level constant storage

mod chunk;
mod constant;
mod opcode;

pub use chunk::{BytecodeChunk, JumpTooFar};
pub use constant::{Constant, ConstantPool};
pub use opcode::OpCode;

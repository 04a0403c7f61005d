//! Stack virtual machine for Monkey bytecode: call frames, the value stack,
//! globals, and builtin dispatch.
//!
//! Depends only on `monkey-core` for the `Object`/`Instructions`
//! representation and the builtin table — never on `monkeyc` — so the VM can
//! run bytecode produced by any compiler that emits the same instruction
//! format.

pub mod frame;
pub mod vm;

pub use frame::Frame;
pub use vm::{Vm, VmError, GLOBALS_SIZE, MAX_FRAMES, STACK_SIZE};

//! A single call frame: the executing closure, its instruction pointer, and
//! the stack slot its locals start at.

use std::rc::Rc;

use monkey_core::code::Instructions;
use monkey_core::object::Closure;

pub struct Frame {
    pub closure: Rc<Closure>,
    /// Pre-incremented by the VM's dispatch loop: starts at -1 so the first
    /// iteration's `ip += 1` lands on instruction 0 (spec Design Notes).
    pub ip: i64,
    pub base_pointer: usize,
}

impl Frame {
    pub fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Frame {
            closure,
            ip: -1,
            base_pointer,
        }
    }

    pub fn instructions(&self) -> &Instructions {
        &self.closure.func.instructions
    }
}

//! AST to bytecode compiler.
//!
//! Produces a flat `Instructions` buffer per function scope plus a shared
//! constant pool, following `compiler/compiler.go`'s structure. One
//! deliberate deviation from that file: a `let` binding's symbol is defined
//! *before* its value expression is compiled (not after), which is
//! what lets a function literal's body resolve its own global/local name for
//! direct recursion (e.g. a top-level `fib`) without requiring the
//! `Function`-scope/`OpCurrentClosure` mechanism for the common top-level
//! case. `Function` scope still exists and is used for nested/local
//! recursive closures, where the binding isn't visible yet when the literal
//! is compiled.

use std::fmt;
use std::rc::Rc;

use monkey_core::ast::*;
use monkey_core::builtins::BUILTINS;
use monkey_core::code::{make, Bytecode, Instructions, Opcode};
use monkey_core::object::{CompiledFunction, Object};

use crate::symbol_table::{SymbolScope, SymbolTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError(pub String);

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CompileError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EmittedInstruction {
    opcode: Opcode,
    position: usize,
}

#[derive(Debug, Default)]
struct CompilationScope {
    instructions: Instructions,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

pub struct Compiler {
    constants: Vec<Object>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (i, (name, _)) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(i, name);
        }
        Compiler {
            constants: Vec::new(),
            symbol_table,
            scopes: vec![CompilationScope::default()],
        }
    }

    /// Reuses a prior run's symbol table and constant pool, so a REPL can
    /// carry global bindings and constants across separately-compiled lines.
    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<Object>) -> Self {
        Compiler {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::default()],
        }
    }

    pub fn into_symbol_table(self) -> SymbolTable {
        self.symbol_table
    }

    pub fn constants(&self) -> &[Object] {
        &self.constants
    }

    pub fn compile_program(&mut self, program: &Program) -> Result<(), CompileError> {
        for stmt in &program.statements {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    pub fn bytecode(self) -> Bytecode {
        Bytecode {
            instructions: self.scopes.into_iter().next().unwrap().instructions,
            constants: self.constants,
        }
    }

    /// Splits a finished compilation into its bytecode and symbol table, for
    /// a caller (the REPL) that needs to keep the table for the next line
    /// while also running what was just compiled.
    pub fn into_bytecode_and_symbols(self) -> (Bytecode, SymbolTable) {
        let bytecode = Bytecode {
            instructions: self.scopes.into_iter().next().unwrap().instructions,
            constants: self.constants,
        };
        (bytecode, self.symbol_table)
    }

    fn compile_statement(&mut self, stmt: &Statement) -> Result<(), CompileError> {
        match stmt {
            Statement::Expression(s) => {
                self.compile_expression(&s.expression)?;
                self.emit(Opcode::Pop, &[]);
                Ok(())
            }
            Statement::Let(s) => {
                let symbol = self.symbol_table.define(&s.name.name);
                self.compile_expression(&s.value)?;
                match symbol.scope {
                    SymbolScope::Global => self.emit(Opcode::SetGlobal, &[symbol.index]),
                    _ => self.emit(Opcode::SetLocal, &[symbol.index]),
                };
                Ok(())
            }
            Statement::Return(s) => {
                match &s.value {
                    Some(expr) => {
                        self.compile_expression(expr)?;
                        self.emit(Opcode::ReturnValue, &[]);
                    }
                    None => {
                        self.emit(Opcode::ReturnVoid, &[]);
                    }
                }
                Ok(())
            }
        }
    }

    fn compile_block(&mut self, block: &BlockStatement) -> Result<(), CompileError> {
        for stmt in &block.statements {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    fn compile_expression(&mut self, expr: &Expression) -> Result<(), CompileError> {
        match expr {
            Expression::IntegerLiteral(v) => {
                let constant = self.add_constant(Object::Integer(*v));
                self.emit(Opcode::Constant, &[constant]);
                Ok(())
            }
            Expression::StringLiteral(s) => {
                let constant = self.add_constant(Object::String(Rc::from(s.as_str())));
                self.emit(Opcode::Constant, &[constant]);
                Ok(())
            }
            Expression::Boolean(true) => {
                self.emit(Opcode::True, &[]);
                Ok(())
            }
            Expression::Boolean(false) => {
                self.emit(Opcode::False, &[]);
                Ok(())
            }
            Expression::Identifier(ident) => self.compile_identifier(ident),
            Expression::Prefix(e) => self.compile_prefix(e),
            Expression::Infix(e) => self.compile_infix(e),
            Expression::If(e) => self.compile_if(e),
            Expression::FunctionLiteral(e) => self.compile_function_literal(e),
            Expression::Call(e) => self.compile_call(e),
            Expression::Array(e) => self.compile_array(e),
            Expression::Index(e) => self.compile_index(e),
        }
    }

    fn compile_identifier(&mut self, ident: &Identifier) -> Result<(), CompileError> {
        let symbol = self
            .symbol_table
            .resolve(&ident.name)
            .ok_or_else(|| CompileError(format!("undefined variable {}", ident.name)))?;
        self.load_symbol(&symbol);
        Ok(())
    }

    fn load_symbol(&mut self, symbol: &crate::symbol_table::Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(Opcode::GetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(Opcode::GetLocal, &[symbol.index]),
            SymbolScope::Builtin => self.emit(Opcode::GetBuiltin, &[symbol.index]),
            SymbolScope::Free => self.emit(Opcode::GetFree, &[symbol.index]),
            SymbolScope::Function => self.emit(Opcode::CurrentClosure, &[]),
        };
    }

    fn compile_prefix(&mut self, e: &PrefixExpression) -> Result<(), CompileError> {
        self.compile_expression(&e.operand)?;
        match e.operator.as_str() {
            "!" => self.emit(Opcode::Bang, &[]),
            "-" => self.emit(Opcode::Negate, &[]),
            op => return Err(CompileError(format!("unknown prefix operator {op}"))),
        };
        Ok(())
    }

    fn compile_infix(&mut self, e: &InfixExpression) -> Result<(), CompileError> {
        // `a < b` is compiled as `a > b` with the operands swapped, so the
        // VM only ever needs to implement `OpGreaterThan`.
        if e.operator == "<" {
            self.compile_expression(&e.right)?;
            self.compile_expression(&e.left)?;
            self.emit(Opcode::GreaterThan, &[]);
            return Ok(());
        }
        self.compile_expression(&e.left)?;
        self.compile_expression(&e.right)?;
        match e.operator.as_str() {
            "+" => self.emit(Opcode::Add, &[]),
            "-" => self.emit(Opcode::Sub, &[]),
            "*" => self.emit(Opcode::Mul, &[]),
            "/" => self.emit(Opcode::Div, &[]),
            ">" => self.emit(Opcode::GreaterThan, &[]),
            "==" => self.emit(Opcode::Equal, &[]),
            "!=" => self.emit(Opcode::NotEqual, &[]),
            op => return Err(CompileError(format!("unknown operator {op}"))),
        };
        Ok(())
    }

    fn compile_if(&mut self, e: &IfExpression) -> Result<(), CompileError> {
        self.compile_expression(&e.condition)?;
        let jump_if_false_pos = self.emit(Opcode::JumpIfFalse, &[9999]);

        self.compile_block(&e.consequence)?;
        if self.last_instruction_is(Opcode::Pop) {
            self.remove_last_instruction();
        }

        let jump_pos = self.emit(Opcode::Jump, &[9999]);
        let after_consequence_pos = self.current_instructions().len();
        self.replace_operand(jump_if_false_pos, after_consequence_pos);

        match &e.alternative {
            None => {
                self.emit(Opcode::Null, &[]);
            }
            Some(alt) => {
                self.compile_block(alt)?;
                if self.last_instruction_is(Opcode::Pop) {
                    self.remove_last_instruction();
                }
            }
        }
        let after_alternative_pos = self.current_instructions().len();
        self.replace_operand(jump_pos, after_alternative_pos);

        Ok(())
    }

    fn compile_function_literal(&mut self, e: &FunctionLiteral) -> Result<(), CompileError> {
        self.enter_scope();

        if let Some(name) = &e.name {
            self.symbol_table.define_function_name(name);
        }
        for param in &e.parameters {
            self.symbol_table.define(&param.name);
        }

        self.compile_block(&e.body)?;

        if self.last_instruction_is(Opcode::Pop) {
            self.replace_last_pop_with_return();
        }
        if !self.last_instruction_is(Opcode::ReturnValue) {
            self.emit(Opcode::ReturnVoid, &[]);
        }

        let free_symbols = self.symbol_table.free_symbols.clone();
        let num_locals = self.symbol_table.num_definitions();
        let instructions = self.leave_scope();

        for symbol in &free_symbols {
            self.load_symbol(symbol);
        }

        let compiled = CompiledFunction {
            instructions,
            num_locals,
            num_parameters: e.parameters.len(),
        };
        let constant = self.add_constant(Object::CompiledFunction(Rc::new(compiled)));
        self.emit(Opcode::Closure, &[constant, free_symbols.len()]);
        Ok(())
    }

    fn compile_call(&mut self, e: &CallExpression) -> Result<(), CompileError> {
        self.compile_expression(&e.function)?;
        for arg in &e.arguments {
            self.compile_expression(arg)?;
        }
        self.emit(Opcode::Call, &[e.arguments.len()]);
        Ok(())
    }

    fn compile_array(&mut self, e: &ArrayLiteral) -> Result<(), CompileError> {
        for elem in &e.elements {
            self.compile_expression(elem)?;
        }
        self.emit(Opcode::Array, &[e.elements.len()]);
        Ok(())
    }

    fn compile_index(&mut self, e: &IndexExpression) -> Result<(), CompileError> {
        self.compile_expression(&e.left)?;
        self.compile_expression(&e.index)?;
        self.emit(Opcode::Index, &[]);
        Ok(())
    }

    // -- scope and instruction bookkeeping --

    fn current_scope(&mut self) -> &mut CompilationScope {
        self.scopes.last_mut().expect("at least one scope")
    }

    fn current_instructions(&mut self) -> &mut Instructions {
        &mut self.current_scope().instructions
    }

    fn emit(&mut self, op: Opcode, operands: &[usize]) -> usize {
        let instruction = make(op, operands);
        let position = self.add_instruction(&instruction);
        self.set_last_instruction(op, position);
        position
    }

    fn add_instruction(&mut self, instruction: &[u8]) -> usize {
        let scope = self.current_scope();
        let position = scope.instructions.len();
        scope.instructions.0.extend_from_slice(instruction);
        position
    }

    fn add_constant(&mut self, obj: Object) -> usize {
        self.constants.push(obj);
        self.constants.len() - 1
    }

    fn set_last_instruction(&mut self, opcode: Opcode, position: usize) {
        let scope = self.current_scope();
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = Some(EmittedInstruction { opcode, position });
    }

    fn last_instruction_is(&mut self, opcode: Opcode) -> bool {
        match self.current_scope().last_instruction {
            Some(instr) => instr.opcode == opcode,
            None => false,
        }
    }

    fn remove_last_instruction(&mut self) {
        let scope = self.current_scope();
        let last = scope.last_instruction.expect("last instruction to remove");
        scope.instructions.0.truncate(last.position);
        scope.last_instruction = scope.previous_instruction;
    }

    fn replace_instruction(&mut self, position: usize, new_instruction: &[u8]) {
        let instructions = self.current_instructions();
        for (i, byte) in new_instruction.iter().enumerate() {
            instructions.0[position + i] = *byte;
        }
    }

    fn replace_operand(&mut self, position: usize, operand: usize) {
        let op = Opcode::from_byte(self.current_instructions().0[position])
            .expect("valid opcode at recorded position");
        let new_instruction = make(op, &[operand]);
        self.replace_instruction(position, &new_instruction);
    }

    fn replace_last_pop_with_return(&mut self) {
        let last_position = self
            .current_scope()
            .last_instruction
            .expect("a pop to replace")
            .position;
        let new_instruction = make(Opcode::ReturnValue, &[]);
        self.replace_instruction(last_position, &new_instruction);
        self.current_scope().last_instruction.as_mut().unwrap().opcode = Opcode::ReturnValue;
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        let outer = std::mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = self.scopes.pop().expect("a scope to leave");
        let outer = std::mem::take(&mut self.symbol_table)
            .into_outer()
            .expect("an enclosing symbol table");
        self.symbol_table = outer;
        scope.instructions
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use monkey_core::code::Opcode as Op;

    fn compile(input: &str) -> Bytecode {
        let program = parse(input).unwrap();
        let mut compiler = Compiler::new();
        compiler.compile_program(&program).unwrap();
        compiler.bytecode()
    }

    fn concat(chunks: Vec<Vec<u8>>) -> Instructions {
        let mut out = Instructions::new();
        for chunk in chunks {
            out.0.extend_from_slice(&chunk);
        }
        out
    }

    #[test]
    fn integer_arithmetic() {
        let bytecode = compile("1 + 2");
        assert_eq!(bytecode.constants, vec![Object::Integer(1), Object::Integer(2)]);
        let expected = concat(vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Add, &[]),
            make(Op::Pop, &[]),
        ]);
        assert_eq!(bytecode.instructions, expected);
    }

    #[test]
    fn less_than_is_compiled_as_flipped_greater_than() {
        let bytecode = compile("1 < 2");
        let expected = concat(vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::GreaterThan, &[]),
            make(Op::Pop, &[]),
        ]);
        assert_eq!(bytecode.instructions, expected);
    }

    #[test]
    fn if_without_else_emits_null_branch() {
        let bytecode = compile("if (true) { 10 }; 3333;");
        let expected = concat(vec![
            make(Op::True, &[]),
            make(Op::JumpIfFalse, &[10]),
            make(Op::Constant, &[0]),
            make(Op::Jump, &[11]),
            make(Op::Null, &[]),
            make(Op::Pop, &[]),
            make(Op::Constant, &[1]),
            make(Op::Pop, &[]),
        ]);
        assert_eq!(bytecode.instructions, expected);
    }

    #[test]
    fn global_let_statements() {
        let bytecode = compile("let one = 1; let two = 2;");
        let expected = concat(vec![
            make(Op::Constant, &[0]),
            make(Op::SetGlobal, &[0]),
            make(Op::Constant, &[1]),
            make(Op::SetGlobal, &[1]),
        ]);
        assert_eq!(bytecode.instructions, expected);
    }

    #[test]
    fn string_constants_are_deduplicated_by_occurrence() {
        let bytecode = compile(r#""monkey"; "monkey";"#);
        assert_eq!(
            bytecode.constants,
            vec![
                Object::String(Rc::from("monkey")),
                Object::String(Rc::from("monkey")),
            ]
        );
    }

    #[test]
    fn compiled_function_has_return_value() {
        let bytecode = compile("fn() { return 5 + 10 }");
        let Object::CompiledFunction(func) = &bytecode.constants[2] else {
            panic!("expected a compiled function constant");
        };
        let expected = concat(vec![
            make(Op::Constant, &[0]),
            make(Op::Constant, &[1]),
            make(Op::Add, &[]),
            make(Op::ReturnValue, &[]),
        ]);
        assert_eq!(func.instructions, expected);
    }

    #[test]
    fn closure_captures_free_variable() {
        let bytecode = compile("fn(a) { fn(b) { a + b } }");
        let has_closure = bytecode
            .instructions
            .0
            .contains(&(Op::Closure as u8));
        assert!(has_closure);
    }

    #[test]
    fn recursive_global_function_resolves_its_own_name() {
        let bytecode = compile(
            "let countdown = fn(x) { if (x == 0) { 0 } else { countdown(x - 1) } }; countdown(1);",
        );
        // compiles without an "undefined variable" error and leaves a call
        // to the global in the outer scope's instructions.
        assert!(bytecode.instructions.0.contains(&(Op::Call as u8)));
    }
}

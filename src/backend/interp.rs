//! Tree-walking interpreter
//!
//! Behaviorally equivalent to running the generated bytecode: one
//! tagged-value operand stack, one flat memory array indexed by variable
//! slot, strict left-then-right evaluation, RHS-first assignment. I/O is
//! injectable so tests can drive a run end to end. The interpreter keeps
//! its own copy of the string table: strings read from stdin are interned
//! at runtime without touching the checker's table.

use std::io::{BufRead, Write};

use log::debug;

use crate::sema::ast::{Node, NodeKind};
use crate::sema::checker::CheckedProgram;
use crate::sema::tables::StrTable;
use crate::types::Type;
use crate::utils::{Error, Result};

/// One operand-stack or memory cell. Pushes and pops for a given
/// expression agree on the lane, derived from the node's static type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
}

/// Statement outcome: `Return` unwinds to the end of `main`
enum Flow {
    Normal,
    Return,
}

pub struct Interpreter<'a, R, W> {
    checked: &'a CheckedProgram,
    strings: StrTable,
    memory: Vec<Value>,
    stack: Vec<Value>,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Interpreter<'a, R, W> {
    pub fn new(checked: &'a CheckedProgram, input: R, output: W) -> Self {
        let memory = (0..checked.vars.len())
            .map(|slot| match checked.vars.ty(slot) {
                Type::Float32 => Value::Float(0.0),
                _ => Value::Int(0),
            })
            .collect();
        Self {
            checked,
            strings: checked.strings.clone(),
            memory,
            stack: Vec::new(),
            input,
            output,
        }
    }

    /// Execute the program's `main`. The caller must have gated on
    /// [`CheckedProgram::passed`].
    pub fn run(mut self) -> Result<()> {
        let checked = self.checked;
        debug!("interpreting with {} memory slots", self.memory.len());
        self.exec_node(&checked.ast)?;
        Ok(())
    }

    // ==================== Statements ====================

    fn exec_node(&mut self, node: &Node) -> Result<Flow> {
        match node.kind {
            NodeKind::Program | NodeKind::FuncList | NodeKind::StmtSection => {
                for child in &node.children {
                    if let Flow::Return = self.exec_node(child)? {
                        return Ok(Flow::Return);
                    }
                }
                Ok(Flow::Normal)
            }

            NodeKind::FuncMain => self.exec_node(node.child(1)),
            // Never called: there is no call mechanism to reach them
            NodeKind::FuncDecl => Ok(Flow::Normal),

            NodeKind::VarDecl | NodeKind::DeclareAssign => {
                if let Some(init) = node.children.first() {
                    self.eval_expr(init)?;
                    let value = self.pop(init.ty)?;
                    self.memory[node.int_data as usize] = value;
                }
                Ok(Flow::Normal)
            }

            NodeKind::Assign => {
                let value_node = node.child(1);
                self.eval_expr(value_node)?;
                let value = self.pop(value_node.ty)?;
                self.memory[node.child(0).int_data as usize] = value;
                Ok(Flow::Normal)
            }

            NodeKind::PlusAssign | NodeKind::MinusAssign => {
                let target = node.child(0);
                let value_node = node.child(1);
                self.eval_expr(value_node)?;
                let slot = target.int_data as usize;
                let updated = match (self.memory[slot], self.pop(value_node.ty)?) {
                    (Value::Int(cur), Value::Int(v)) => {
                        if node.kind == NodeKind::PlusAssign {
                            Value::Int(cur.wrapping_add(v))
                        } else {
                            Value::Int(cur.wrapping_sub(v))
                        }
                    }
                    (Value::Float(cur), Value::Float(v)) => {
                        if node.kind == NodeKind::PlusAssign {
                            Value::Float(cur + v)
                        } else {
                            Value::Float(cur - v)
                        }
                    }
                    _ => return Err(Error::StackMismatch { expected: "matching lanes" }),
                };
                self.memory[slot] = updated;
                Ok(Flow::Normal)
            }

            NodeKind::PlusPlus | NodeKind::MinusMinus => {
                let slot = node.child(0).int_data as usize;
                let delta = if node.kind == NodeKind::PlusPlus { 1 } else { -1 };
                self.memory[slot] = match self.memory[slot] {
                    Value::Int(cur) => Value::Int(cur.wrapping_add(delta)),
                    Value::Float(cur) => Value::Float(cur + delta as f32),
                };
                Ok(Flow::Normal)
            }

            NodeKind::If => {
                self.eval_expr(node.child(0))?;
                if self.pop_int()? != 0 {
                    self.exec_node(node.child(1))
                } else if let Some(else_block) = node.children.get(2) {
                    self.exec_node(else_block)
                } else {
                    Ok(Flow::Normal)
                }
            }

            NodeKind::For => {
                if node.children.len() == 2 {
                    // Condition re-evaluated before every iteration
                    loop {
                        self.eval_expr(node.child(0))?;
                        if self.pop_int()? == 0 {
                            return Ok(Flow::Normal);
                        }
                        if let Flow::Return = self.exec_node(node.child(1))? {
                            return Ok(Flow::Return);
                        }
                    }
                } else {
                    loop {
                        if let Flow::Return = self.exec_node(node.child(0))? {
                            return Ok(Flow::Return);
                        }
                    }
                }
            }

            NodeKind::Return => {
                if let Some(value) = node.children.first() {
                    self.eval_expr(value)?;
                    self.pop(value.ty)?;
                }
                Ok(Flow::Return)
            }

            NodeKind::Input => {
                let target = node.child(0);
                let slot = target.int_data as usize;
                self.memory[slot] = match target.ty {
                    Type::Int => Value::Int(self.read_int()?),
                    Type::Float32 => Value::Float(self.read_real()?),
                    Type::Bool => Value::Int(self.read_bool()?),
                    Type::Str => Value::Int(self.read_str()?),
                    ty => {
                        return Err(Error::InvalidValueType {
                            ty,
                            stage: "interpretation",
                        })
                    }
                };
                Ok(Flow::Normal)
            }

            NodeKind::Output => {
                for arg in &node.child(0).children {
                    self.eval_expr(arg)?;
                    self.write_value(arg.ty)?;
                }
                Ok(Flow::Normal)
            }

            NodeKind::FuncCall => Err(Error::Unsupported {
                construct: "function call",
                stage: "interpretation",
            }),
            NodeKind::Switch => Err(Error::Unsupported {
                construct: "switch statement",
                stage: "interpretation",
            }),

            _ => {
                self.eval_expr(node)?;
                self.pop(node.ty)?;
                Ok(Flow::Normal)
            }
        }
    }

    // ==================== Expressions ====================

    /// Evaluate an expression, pushing exactly one value
    fn eval_expr(&mut self, node: &Node) -> Result<()> {
        match node.kind {
            NodeKind::IntVal | NodeKind::BoolVal | NodeKind::StringVal => {
                self.stack.push(Value::Int(node.int_data));
                Ok(())
            }
            NodeKind::FloatVal => {
                self.stack.push(Value::Float(node.float_data));
                Ok(())
            }
            NodeKind::VarUse => {
                self.stack.push(self.memory[node.int_data as usize]);
                Ok(())
            }

            NodeKind::Add | NodeKind::Sub | NodeKind::Mul | NodeKind::Div | NodeKind::Mod => {
                self.eval_arith(node)
            }

            NodeKind::Eq
            | NodeKind::Ne
            | NodeKind::Lt
            | NodeKind::Le
            | NodeKind::Gt
            | NodeKind::Ge => self.eval_relational(node),

            NodeKind::FuncCall => Err(Error::Unsupported {
                construct: "function call",
                stage: "interpretation",
            }),

            _ => Err(Error::InvalidValueType {
                ty: node.ty,
                stage: "interpretation",
            }),
        }
    }

    fn eval_arith(&mut self, node: &Node) -> Result<()> {
        let lhs = node.child(0);
        let rhs = node.child(1);
        self.eval_expr(lhs)?;
        self.eval_expr(rhs)?;

        if node.ty == Type::Float32 {
            let b = self.pop_as_float(rhs.ty)?;
            let a = self.pop_as_float(lhs.ty)?;
            let v = match node.kind {
                NodeKind::Add => a + b,
                NodeKind::Sub => a - b,
                NodeKind::Mul => a * b,
                NodeKind::Div => a / b,
                _ => a % b,
            };
            self.stack.push(Value::Float(v));
        } else {
            let b = self.pop_int()?;
            let a = self.pop_int()?;
            let v = match node.kind {
                NodeKind::Add => a.wrapping_add(b),
                NodeKind::Sub => a.wrapping_sub(b),
                NodeKind::Mul => a.wrapping_mul(b),
                NodeKind::Div | NodeKind::Mod if b == 0 => return Err(Error::DivisionByZero),
                NodeKind::Div => a.wrapping_div(b),
                _ => a.wrapping_rem(b),
            };
            self.stack.push(Value::Int(v));
        }
        Ok(())
    }

    fn eval_relational(&mut self, node: &Node) -> Result<()> {
        let lhs = node.child(0);
        let rhs = node.child(1);
        self.eval_expr(lhs)?;
        self.eval_expr(rhs)?;

        let holds = if lhs.ty == Type::Str {
            let b = self.pop_int()? as usize;
            let a = self.pop_int()? as usize;
            let a = strip_quotes(self.strings.get(a));
            let b = strip_quotes(self.strings.get(b));
            compare(node.kind, a, b)
        } else if lhs.ty == Type::Float32 || rhs.ty == Type::Float32 {
            let b = self.pop_as_float(rhs.ty)?;
            let a = self.pop_as_float(lhs.ty)?;
            compare(node.kind, a, b)
        } else {
            let b = self.pop_int()?;
            let a = self.pop_int()?;
            compare(node.kind, a, b)
        };
        self.stack.push(Value::Int(i32::from(holds)));
        Ok(())
    }

    // ==================== Stack ====================

    fn pop(&mut self, ty: Type) -> Result<Value> {
        match ty {
            Type::Float32 => Ok(Value::Float(self.pop_float()?)),
            _ => Ok(Value::Int(self.pop_int()?)),
        }
    }

    fn pop_int(&mut self) -> Result<i32> {
        match self.stack.pop() {
            Some(Value::Int(v)) => Ok(v),
            _ => Err(Error::StackMismatch { expected: "int" }),
        }
    }

    fn pop_float(&mut self) -> Result<f32> {
        match self.stack.pop() {
            Some(Value::Float(v)) => Ok(v),
            _ => Err(Error::StackMismatch { expected: "float" }),
        }
    }

    /// Pop per the operand's static type, widening int to float
    fn pop_as_float(&mut self, ty: Type) -> Result<f32> {
        if ty == Type::Float32 {
            self.pop_float()
        } else {
            Ok(self.pop_int()? as f32)
        }
    }

    // ==================== I/O ====================

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = self.input.read_line(&mut line)?;
        if n == 0 {
            return Err(Error::InvalidInput("unexpected end of input".into()));
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    fn read_int(&mut self) -> Result<i32> {
        write!(self.output, "read (int): ")?;
        self.output.flush()?;
        let line = self.read_line()?;
        line.trim()
            .parse()
            .map_err(|_| Error::InvalidInput(line.trim().to_string()))
    }

    fn read_real(&mut self) -> Result<f32> {
        write!(self.output, "read (real): ")?;
        self.output.flush()?;
        let line = self.read_line()?;
        line.trim()
            .parse()
            .map_err(|_| Error::InvalidInput(line.trim().to_string()))
    }

    fn read_bool(&mut self) -> Result<i32> {
        loop {
            write!(self.output, "read (bool - 0 = false, 1 = true): ")?;
            self.output.flush()?;
            match self.read_line()?.trim() {
                "0" => return Ok(0),
                "1" => return Ok(1),
                _ => continue,
            }
        }
    }

    /// Reads the whole line so embedded spaces survive; the new string is
    /// interned into the runtime table and its index returned
    fn read_str(&mut self) -> Result<i32> {
        write!(self.output, "read (str): ")?;
        self.output.flush()?;
        let line = self.read_line()?;
        Ok(self.strings.intern(&line) as i32)
    }

    fn write_value(&mut self, ty: Type) -> Result<()> {
        match ty {
            Type::Int => {
                let v = self.pop_int()?;
                writeln!(self.output, "{}", v)?;
            }
            Type::Float32 => {
                let v = self.pop_float()?;
                writeln!(self.output, "{}", v)?;
            }
            Type::Bool => {
                let v = self.pop_int()?;
                writeln!(self.output, "{}", if v != 0 { "true" } else { "false" })?;
            }
            Type::Str => {
                let idx = self.pop_int()? as usize;
                let text = strip_quotes(self.strings.get(idx)).to_string();
                writeln!(self.output, "{}", text)?;
            }
            ty => {
                return Err(Error::InvalidValueType {
                    ty,
                    stage: "interpretation",
                })
            }
        }
        Ok(())
    }
}

/// Literals keep their quotes in the string table; runtime strings from
/// stdin do not carry them
fn strip_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

fn compare<T: PartialOrd>(kind: NodeKind, a: T, b: T) -> bool {
    match kind {
        NodeKind::Eq => a == b,
        NodeKind::Ne => a != b,
        NodeKind::Lt => a < b,
        NodeKind::Le => a <= b,
        NodeKind::Gt => a > b,
        _ => a >= b,
    }
}

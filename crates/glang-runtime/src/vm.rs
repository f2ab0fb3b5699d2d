//! The bytecode interpreter.
//!
//! Compiled code does no dispatch of its own: every operator, member
//! access, call and global lookup hands its operands to the [`Runtime`].
//! The interpreter only moves values between the operand stack, the local
//! slots and the unit's globals, and follows jumps.

use glang_compiler::{BytecodeChunk, OpCode, Procedure};
use glang_core::{RuntimeError, RuntimeResult};
use log::debug;

use crate::lookup::LookupMode;
use crate::runtime::Runtime;
use crate::unit::LoadedUnit;
use crate::value::Value;

fn invalid(message: impl Into<String>) -> RuntimeError {
    RuntimeError::InvalidBytecode(message.into())
}

struct Frame<'a> {
    chunk: &'a BytecodeChunk,
    ip: usize,
    locals: Vec<Value>,
    stack: Vec<Value>,
}

impl Frame<'_> {
    fn read_u8(&mut self) -> RuntimeResult<u8> {
        let byte = self
            .chunk
            .read_byte(self.ip)
            .ok_or_else(|| invalid(format!("operand past end at {}", self.ip)))?;
        self.ip += 1;
        Ok(byte)
    }

    fn read_u16(&mut self) -> RuntimeResult<u16> {
        let value = self
            .chunk
            .read_u16(self.ip)
            .ok_or_else(|| invalid(format!("operand past end at {}", self.ip)))?;
        self.ip += 2;
        Ok(value)
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> RuntimeResult<Value> {
        self.stack
            .pop()
            .ok_or_else(|| invalid(format!("stack underflow at {}", self.ip)))
    }

    fn peek(&self) -> RuntimeResult<&Value> {
        self.stack
            .last()
            .ok_or_else(|| invalid(format!("stack underflow at {}", self.ip)))
    }

    /// Pop the topmost `count` values, first pushed first.
    fn pop_n(&mut self, count: usize) -> RuntimeResult<Vec<Value>> {
        let at = self
            .stack
            .len()
            .checked_sub(count)
            .ok_or_else(|| invalid(format!("stack underflow at {}", self.ip)))?;
        Ok(self.stack.split_off(at))
    }

    fn local(&mut self, slot: u16) -> RuntimeResult<&mut Value> {
        self.locals
            .get_mut(usize::from(slot))
            .ok_or_else(|| invalid(format!("local slot {slot} out of range")))
    }

    fn jump_forward(&mut self, offset: u16) {
        self.ip += usize::from(offset);
    }

    fn jump_back(&mut self, offset: u16) -> RuntimeResult<()> {
        self.ip = self
            .ip
            .checked_sub(usize::from(offset))
            .ok_or_else(|| invalid(format!("loop offset {offset} before start")))?;
        Ok(())
    }
}

/// Run `procedure` of `unit` with `args` in its leading local slots.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn execute(
    runtime: &Runtime,
    unit: &LoadedUnit,
    procedure: &Procedure,
    args: Vec<Value>,
) -> RuntimeResult<Value> {
    let slots = usize::from(procedure.max_locals).max(args.len());
    let mut locals = args;
    locals.resize(slots, Value::Null);
    let mut frame = Frame {
        chunk: &procedure.chunk,
        ip: 0,
        locals,
        stack: Vec::with_capacity(16),
    };

    run(runtime, unit, &mut frame).inspect_err(|e| {
        let line = frame.chunk.line_at(frame.ip.saturating_sub(1)).unwrap_or(0);
        debug!("{}:{line}: {e}", unit.type_name());
    })
}

fn run(runtime: &Runtime, unit: &LoadedUnit, frame: &mut Frame<'_>) -> RuntimeResult<Value> {
    loop {
        let at = frame.ip;
        let op = frame
            .chunk
            .read_op(at)
            .ok_or_else(|| invalid(format!("bad or missing opcode at {at}")))?;
        frame.ip += 1;

        match op {
            OpCode::PushNull => frame.push(Value::Null),
            OpCode::PushTrue => frame.push(Value::Bool(true)),
            OpCode::PushFalse => frame.push(Value::Bool(false)),
            OpCode::Constant => {
                let index = frame.read_u16()?;
                frame.push(unit.string(index)?.clone());
            }
            OpCode::Bootstrap => {
                let index = frame.read_u16()?;
                frame.push(unit.bootstrap(index)?);
            }

            OpCode::Pop => {
                frame.pop()?;
            }
            OpCode::Dup => {
                let top = frame.peek()?.clone();
                frame.push(top);
            }
            OpCode::Swap => {
                let len = frame.stack.len();
                if len < 2 {
                    return Err(invalid(format!("stack underflow at {at}")));
                }
                frame.stack.swap(len - 1, len - 2);
            }

            OpCode::GetLocal => {
                let slot = frame.read_u16()?;
                let value = frame.local(slot)?.clone();
                frame.push(value);
            }
            OpCode::SetLocal => {
                let slot = frame.read_u16()?;
                let value = frame.pop()?;
                *frame.local(slot)? = value;
            }
            OpCode::GetGlobal => {
                let name = unit.name(frame.read_u16()?)?;
                frame.push(runtime.get_global(unit.globals(), name)?);
            }
            OpCode::PutGlobal => {
                let name = unit.name(frame.read_u16()?)?;
                unit.globals().put(name, frame.peek()?.clone());
            }

            OpCode::GetField => {
                let name = unit.name(frame.read_u16()?)?;
                let receiver = frame.pop()?;
                frame.push(runtime.get_field(&receiver, name)?);
            }
            OpCode::SetField => {
                let name = unit.name(frame.read_u16()?)?;
                let value = frame.pop()?;
                let receiver = frame.pop()?;
                runtime.set_field(&receiver, name, value.clone())?;
                frame.push(value);
            }
            OpCode::GetMethod | OpCode::GetDirectMethod => {
                let name = unit.name(frame.read_u16()?)?;
                let mode = if op == OpCode::GetMethod {
                    LookupMode::Plain
                } else {
                    LookupMode::Direct
                };
                let receiver = frame.pop()?;
                let lookup = runtime.method_lookup(&receiver, name, mode)?;
                frame.push(Value::Method(lookup));
            }

            OpCode::Invoke => {
                let argc = usize::from(frame.read_u8()?);
                let args = frame.pop_n(argc)?;
                let target = frame.pop()?;
                frame.push(runtime.invoke_fixed(&target, args)?);
            }
            OpCode::NewArray => {
                let count = usize::from(frame.read_u16()?);
                let values = frame.pop_n(count)?;
                frame.push(Value::array(values));
            }
            OpCode::InvokeArray => {
                let args = frame.pop()?;
                let target = frame.pop()?;
                frame.push(runtime.invoke_array(&target, &args)?);
            }
            OpCode::BinaryOp => {
                let name = unit.name(frame.read_u16()?)?;
                let right = frame.pop()?;
                let left = frame.pop()?;
                frame.push(runtime.binary_op(name, left, right)?);
            }

            OpCode::IsTruthy => {
                let value = frame.pop()?;
                frame.push(Value::Bool(runtime.is_truthy(&value)?));
            }
            OpCode::IsFalsey => {
                let value = frame.pop()?;
                frame.push(Value::Bool(!runtime.is_truthy(&value)?));
            }

            OpCode::JumpIfFalsy => {
                let offset = frame.read_u16()?;
                let value = frame.pop()?;
                if !runtime.is_truthy(&value)? {
                    frame.jump_forward(offset);
                }
            }
            OpCode::JumpIfTruthy => {
                let offset = frame.read_u16()?;
                let value = frame.pop()?;
                if runtime.is_truthy(&value)? {
                    frame.jump_forward(offset);
                }
            }
            OpCode::Jump => {
                let offset = frame.read_u16()?;
                frame.jump_forward(offset);
            }
            OpCode::Loop => {
                let offset = frame.read_u16()?;
                frame.jump_back(offset)?;
            }

            OpCode::Import => {
                let index = frame.read_u16()?;
                frame.push(unit.import(runtime, index)?);
            }
            OpCode::ImportStar => {
                let index = frame.read_u16()?;
                unit.import_star(runtime, index)?;
            }

            OpCode::DebugPrint => {
                let prefix = unit.name(frame.read_u16()?)?;
                let value = frame.pop()?;
                let text = runtime.stringify(&value)?;
                runtime.output().debug_line(&format!("{prefix}{text}"));
            }

            OpCode::Return => return Ok(frame.stack.pop().unwrap_or(Value::Null)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glang_compiler::{CompileOptions, compile_source};

    use super::*;
    use crate::output::CapturedOutput;

    fn run_script(source: &str) -> (Arc<LoadedUnit>, Arc<CapturedOutput>, RuntimeResult<Value>) {
        run_with(source, CompileOptions::default())
    }

    fn run_with(
        source: &str,
        options: CompileOptions,
    ) -> (Arc<LoadedUnit>, Arc<CapturedOutput>, RuntimeResult<Value>) {
        let output = Arc::new(CapturedOutput::default());
        let runtime = Runtime::builder().output(output.clone()).build();
        let code = compile_source("vm.test", source, &options).unwrap();
        let unit = runtime.load_unit(code).unwrap();
        let result = unit.run_main(&runtime, Value::array(vec![]));
        (unit, output, result)
    }

    #[test]
    fn reassigned_variable_prints_latest_value() {
        let (_, output, result) = run_script("var x = 1\nx = 2\nprintln(x)");
        result.unwrap();
        assert_eq!(output.stdout(), "2\n");
    }

    #[test]
    fn top_level_assignments_become_globals() {
        let (unit, _, result) = run_script("total = 0\ni = 0\nwhile i < 5 {\n total = total + i\n i = i + 1\n}");
        result.unwrap();
        assert_eq!(unit.globals().get("total"), Some(Value::Int(10)));
    }

    #[test]
    fn conditionals_follow_truthiness() {
        let (_, output, result) = run_script(
            "if 0 { println(\"no\") } else { println(\"yes\") }\nif !\"\" { println(\"empty\") }",
        );
        result.unwrap();
        assert_eq!(output.stdout(), "yes\nempty\n");
    }

    #[test]
    fn method_calls_pass_receiver_first() {
        let (_, output, result) = run_script("println(\"hello\".substring(1, 3))");
        result.unwrap();
        assert_eq!(output.stdout(), "el\n");
    }

    #[test]
    fn wide_calls_go_through_array_entry() {
        let args = (1..=20).map(|i| i.to_string()).collect::<Vec<_>>().join(", ");
        let (_, output, result) = run_script(&format!("println({args})"));
        result.unwrap();
        let expected = (1..=20).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        assert_eq!(output.stdout(), format!("{expected}\n"));
    }

    #[test]
    fn unknown_global_names_the_variable() {
        let (_, _, result) = run_script("undefinedFn()");
        assert_eq!(result.unwrap_err().to_string(), "unknown global: undefinedFn");
    }

    #[test]
    fn debug_prints_go_to_side_channel() {
        let options = CompileOptions::default().with_debug_prints(true);
        let (_, output, result) = run_with("1 + 2", options);
        result.unwrap();
        assert_eq!(output.stderr(), "[DEBUG 1:1] 3\n");
        assert!(output.stdout().is_empty());
    }

    #[test]
    fn truncated_bytecode_is_rejected() {
        let runtime = Runtime::new();
        let mut code = compile_source("vm.bad", "null", &CompileOptions::default()).unwrap();
        code.procedures[0].chunk = BytecodeChunk::new();
        let unit = runtime.load_unit(code).unwrap();
        let err = unit.run_main(&runtime, Value::array(vec![])).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidBytecode(_)));
    }
}

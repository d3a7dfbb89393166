//! 主执行循环

use gscript_log::{debug, trace, warn};

use super::{Context, RuntimeError};
use crate::binary::Program;
use crate::runtime::bytecode::{Opcode, PackedKind, PackedValue, OPERAND_SIZE};
use crate::runtime::store::VarKind;
use crate::runtime::value::{Value, Variable, VariableData};

/// 单条指令之后的走向
enum Flow {
    Next,
    Halt,
}

/// 执行一个程序，直到走出字节码体、`STOP`，或栈空时的 `RET`
pub(super) fn run_program(ctx: &mut Context, program: &Program) -> Result<(), RuntimeError> {
    let body = program.body();
    let mut ip = 0;
    ctx.return_stack.clear();

    while ip < body.len() {
        let offset = ip;
        let byte = body[ip];
        ip += 1;
        let op = Opcode::try_from(byte).map_err(|byte| RuntimeError::UnknownOpcode { byte, offset })?;

        if ctx.trace_steps {
            trace!(ctx.logger, target: "gscript::vm", "{:04} {}", offset, op);
        }
        #[cfg(feature = "trace_execution")]
        trace!(ctx.logger, target: "gscript::vm", "stack: {:?}", ctx.stack);

        match execute(ctx, program, op, &mut ip)? {
            Flow::Next => {}
            Flow::Halt => {
                trace!(ctx.logger, target: "gscript::vm", "halted at {}", offset);
                break;
            }
        }
    }

    Ok(())
}

fn execute(ctx: &mut Context, program: &Program, op: Opcode, ip: &mut usize) -> Result<Flow, RuntimeError> {
    let body = program.body();

    match op {
        Opcode::Push => {
            let packed = read_packed(body, ip)?;
            let value = unpack_value(ctx, program, packed)?;
            ctx.push(value)?;
        }

        Opcode::Assign => {
            let value = ctx.pop()?;
            let target = ctx.pop()?;
            let name = target.name().ok_or(RuntimeError::NotAVariable { op: "ASSIGN" })?;
            ctx.assign(name, &value);
        }

        Opcode::ArrSet => array_set(ctx)?,
        Opcode::ArrGet => array_get(ctx)?,

        Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod | Opcode::Pow => {
            let (left, right) = ctx.pop_two()?;
            let result = ctx.arithmetic(op, &left, &right);
            ctx.push(Value::Number(result))?;
        }

        Opcode::Inc => step_variable(ctx, 1.0, false, "INC")?,
        Opcode::IncPush => step_variable(ctx, 1.0, true, "INCPUSH")?,
        Opcode::Dec => step_variable(ctx, -1.0, false, "DEC")?,
        Opcode::DecPush => step_variable(ctx, -1.0, true, "DECPUSH")?,

        Opcode::Call | Opcode::CmdCall => {
            let packed = read_packed(body, ip)?;
            let name = constant_string(program, packed.index)?.to_string();
            call_library(ctx, &name, op == Opcode::CmdCall)?;
        }

        Opcode::Jmp => {
            let displacement = read_i32(body, ip)?;
            *ip = jump_target(body, *ip, displacement)?;
        }

        Opcode::Jal => {
            let displacement = read_i32(body, ip)?;
            let target = jump_target(body, *ip, displacement)?;
            if ctx.return_stack.len() >= ctx.limits.max_return_depth {
                return Err(RuntimeError::ReturnStackOverflow {
                    limit: ctx.limits.max_return_depth,
                });
            }
            ctx.return_stack.push(*ip);
            *ip = target;
        }

        Opcode::Ret => match ctx.return_stack.pop() {
            Some(back) => *ip = back,
            None => return Ok(Flow::Halt),
        },

        Opcode::Eq | Opcode::Lt | Opcode::Gt | Opcode::Lte | Opcode::Gte => {
            let (left, right) = ctx.pop_two()?;
            let result = ctx.compare(op, &left, &right);
            ctx.push(Value::Flag(result))?;
        }

        Opcode::Not => {
            let value = ctx.pop()?;
            let result = !ctx.to_flag(&value);
            ctx.push(Value::Flag(result))?;
        }

        Opcode::And | Opcode::Or => {
            let (left, right) = ctx.pop_two()?;
            let (a, b) = (ctx.to_flag(&left), ctx.to_flag(&right));
            let result = if op == Opcode::And { a && b } else { a || b };
            ctx.push(Value::Flag(result))?;
        }

        Opcode::Jez | Opcode::Jnz => {
            let value = ctx.pop()?;
            let flag = ctx.to_flag(&value);
            let displacement = read_i32(body, ip)?;
            // 不跳转时操作数已被跳过
            if flag == (op == Opcode::Jnz) {
                *ip = jump_target(body, *ip, displacement)?;
            }
        }

        Opcode::Stop => return Ok(Flow::Halt),

        Opcode::DbgOut => {
            let value = ctx.pop()?;
            debug!(ctx.logger, target: "gscript::vm", "{}", ctx.describe(&value));
        }
    }

    Ok(Flow::Next)
}

// ==================== 操作数 ====================

fn read_operand(body: &[u8], ip: &mut usize) -> Result<[u8; 4], RuntimeError> {
    let bytes = body
        .get(*ip..*ip + OPERAND_SIZE)
        .ok_or(RuntimeError::TruncatedOperand { offset: *ip })?;
    *ip += OPERAND_SIZE;
    Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_i32(body: &[u8], ip: &mut usize) -> Result<i32, RuntimeError> {
    read_operand(body, ip).map(i32::from_le_bytes)
}

fn read_packed(body: &[u8], ip: &mut usize) -> Result<PackedValue, RuntimeError> {
    let offset = *ip;
    let raw = read_operand(body, ip)?;
    PackedValue::from_le_bytes(raw).map_err(|kind| RuntimeError::InvalidOperand { kind, offset })
}

/// 位移相对于操作数之后的字节；目标可以正好是结尾
fn jump_target(body: &[u8], from: usize, displacement: i32) -> Result<usize, RuntimeError> {
    let target = from as i64 + displacement as i64;
    if target < 0 || target > body.len() as i64 {
        return Err(RuntimeError::JumpOutOfBounds {
            target,
            len: body.len(),
        });
    }
    Ok(target as usize)
}

fn constant_string(program: &Program, index: u16) -> Result<&str, RuntimeError> {
    program
        .string(index)
        .ok_or(RuntimeError::InvalidConstant { table: "string", index })
}

fn constant_number(program: &Program, index: u16) -> Result<f32, RuntimeError> {
    program
        .number(index)
        .ok_or(RuntimeError::InvalidConstant { table: "number", index })
}

/// 按当前程序的常量表解析打包操作数
fn unpack_value(ctx: &mut Context, program: &Program, packed: PackedValue) -> Result<Value, RuntimeError> {
    let value = match packed.kind {
        PackedKind::ConstNumber => Value::Number(f64::from(constant_number(program, packed.index)?)),
        PackedKind::ConstString => Value::string(constant_string(program, packed.index)?),
        PackedKind::ConstArray => {
            let count = constant_number(program, packed.index)? as usize;
            if ctx.stack.len() < count {
                return Err(RuntimeError::StackUnderflow);
            }
            let elements = ctx.stack.split_off(ctx.stack.len() - count);
            let elements = elements.iter().map(|v| ctx.to_owned_value(v)).collect();
            Value::array(elements)
        }
        PackedKind::Named => ctx.lookup_named(constant_string(program, packed.index)?),
    };
    Ok(value)
}

// ==================== 变量操作 ====================

fn step_variable(ctx: &mut Context, delta: f64, push_before: bool, op: &'static str) -> Result<(), RuntimeError> {
    let target = ctx.pop()?;
    let name = target.name().ok_or(RuntimeError::NotAVariable { op })?.to_string();

    let before = ctx.to_number(&target);
    ctx.set_variable(&name, Variable::new(VariableData::Number((before + delta) as f32)));

    if push_before {
        ctx.push(Value::Number(before))?;
    }
    Ok(())
}

fn array_index(ctx: &Context, name: &str, index: &Value) -> Result<usize, RuntimeError> {
    let n = ctx.to_number(index);
    if n.is_nan() || n < 0.0 {
        return Err(RuntimeError::InvalidArrayIndex {
            name: name.to_string(),
            index: n,
        });
    }
    Ok(n as usize)
}

/// `arr idx value ARR_SET`：写入时自动扩容，空位补 0
fn array_set(ctx: &mut Context) -> Result<(), RuntimeError> {
    let value = ctx.pop()?;
    let index = ctx.pop()?;
    let target = ctx.pop()?;

    let name = target
        .name()
        .ok_or(RuntimeError::NotAVariable { op: "ARR_SET" })?
        .to_string();
    let index = array_index(ctx, &name, &index)?;
    if index >= ctx.limits.max_array_len {
        return Err(RuntimeError::ArrayTooLarge {
            name,
            len: index + 1,
            limit: ctx.limits.max_array_len,
        });
    }

    let value = match ctx.to_owned_value(&value) {
        Value::Empty => Value::Number(0.0),
        other => other,
    };

    // 写入存储里还没有这个数组时，从读取路径拷贝一份或新建
    let slot = ctx.write_slot(&name);
    let present = ctx
        .store_mut(slot)
        .is_some_and(|store| store.contains(&name, VarKind::Array));
    if !present {
        let base = ctx
            .get_variable(&name, VarKind::Array)
            .cloned()
            .unwrap_or_else(|| Variable::unset(name.as_str(), VarKind::Array));
        ctx.set_variable(&name, base);
    }

    let values = ctx
        .store_mut(slot)
        .and_then(|store| store.get_mut(&name, VarKind::Array))
        .and_then(Variable::as_array_mut);
    if let Some(values) = values {
        if index >= values.len() {
            values.resize(index + 1, Value::Number(0.0));
        }
        values[index] = value;
    }
    Ok(())
}

/// `arr idx ARR_GET`：越界或不是数组时得到 0
fn array_get(ctx: &mut Context) -> Result<(), RuntimeError> {
    let index = ctx.pop()?;
    let target = ctx.pop()?;
    let name = target.name().unwrap_or("<anonymous>").to_string();
    let index = array_index(ctx, &name, &index)?;

    let element = ctx
        .resolve(&target)
        .and_then(Variable::as_array)
        .and_then(|values| values.get(index))
        .cloned();

    let value = match element {
        Some(value) => value,
        None => {
            warn!(
                ctx.logger,
                target: "gscript::vm",
                "read of {}[{}] is out of range, using 0",
                name,
                index
            );
            Value::Number(0.0)
        }
    };
    ctx.push(value)
}

// ==================== 库调用 ====================

fn call_library(ctx: &mut Context, name: &str, is_command: bool) -> Result<(), RuntimeError> {
    let library = ctx
        .libraries
        .iter()
        .find(|lib| {
            if is_command {
                lib.command(name).is_some()
            } else {
                lib.function(name).is_some()
            }
        })
        .cloned();

    let handler = library.as_ref().and_then(|lib| {
        if is_command {
            lib.command(name)
        } else {
            lib.function(name)
        }
    });

    match handler {
        Some(handler) => {
            trace!(
                ctx.logger,
                target: "gscript::vm",
                "{} '{}'",
                if is_command { "command" } else { "function" },
                name
            );
            handler(ctx)
        }
        None if is_command => Err(RuntimeError::UnknownCommand(name.to_string())),
        None => Err(RuntimeError::UnknownFunction(name.to_string())),
    }
}

//! 字节码 JSON 输出

use gscript_core::{Opcode, PackedValue, Program};
use serde_json::{json, Value};

/// 构建整个程序的 JSON 描述
pub fn program_json(program: &Program, name: &str) -> Value {
    json!({
        "name": name,
        "strings": program.strings(),
        "numbers": program.numbers(),
        "body_offset": program.body_offset(),
        "bytecode": bytecode_json(program.body()),
    })
}

/// 构建指令数组；无法解码的字节记为 `"???"` 后继续
fn bytecode_json(body: &[u8]) -> Vec<Value> {
    let mut instructions = Vec::new();
    let mut offset = 0;

    while offset < body.len() {
        let byte = body[offset];
        let Ok(op) = Opcode::try_from(byte) else {
            instructions.push(json!({ "offset": offset, "opcode": "???", "byte": byte }));
            offset += 1;
            continue;
        };

        let size = op.operand_len();
        if size == 0 {
            instructions.push(json!({ "offset": offset, "opcode": op.name() }));
            offset += 1;
            continue;
        }

        let Some(raw) = body.get(offset + 1..offset + 1 + size) else {
            instructions.push(json!({ "offset": offset, "opcode": op.name(), "truncated": true }));
            break;
        };
        let raw = [raw[0], raw[1], raw[2], raw[3]];
        let next = offset + 1 + size;

        let operand = if op.has_jump_operand() {
            let displacement = i32::from_le_bytes(raw);
            json!({ "jump": displacement, "target": next as i64 + displacement as i64 })
        } else {
            match PackedValue::from_le_bytes(raw) {
                Ok(packed) => json!({ "kind": packed.kind.name(), "index": packed.index }),
                Err(kind) => json!({ "bad_kind": kind }),
            }
        };
        instructions.push(json!({ "offset": offset, "opcode": op.name(), "operand": operand }));
        offset = next;
    }

    instructions
}

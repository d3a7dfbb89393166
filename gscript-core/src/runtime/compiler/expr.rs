//! 表达式编译

use super::{parse_number, CompileError, Compiler};
use crate::compiler::lexer::TokenKind;
use crate::compiler::parser::{NodeId, NodeKind, SyntaxTree, TerminalId};
use crate::runtime::bytecode::Opcode;

/// 编译表达式，结果留在栈上
pub fn compile_expr(compiler: &mut Compiler, tree: &mut SyntaxTree, id: NodeId) -> Result<(), CompileError> {
    let kind = tree.kind(id).clone();

    match kind {
        NodeKind::Identifier { name } => {
            let name = tree.terminal(name).text().to_string();
            compiler.emit_named(&name)?;
        }

        NodeKind::NumberLiteral { literal } => {
            let n = number_of(tree, literal)?;
            compiler.emit_number(n)?;
        }

        NodeKind::StringLiteral { literal } => {
            let text = tree.terminal(literal).text().to_string();
            compiler.emit_string(&text)?;
        }

        NodeKind::List { elements } => {
            let count = elements.len();
            for element in elements {
                compile_opt_expr(compiler, tree, element, id, "list element")?;
            }
            compiler.emit_array(count)?;
        }

        NodeKind::Range { lower, upper } => compile_range(compiler, tree, lower, upper)?,

        NodeKind::UnaryOp { op, prefix, expr } => compile_unary(compiler, tree, id, op, prefix, expr)?,

        NodeKind::BinaryOp { op, left, right } => compile_binary(compiler, tree, id, op, left, right)?,

        NodeKind::TernaryOp {
            cond,
            then_value,
            else_value,
        } => {
            compile_expr(compiler, tree, cond)?;
            let skip_then = compiler.chunk.write_jump(Opcode::Jez);
            compile_opt_expr(compiler, tree, then_value, id, "value")?;
            let skip_else = compiler.chunk.write_jump(Opcode::Jmp);
            compiler.chunk.patch(skip_then);
            compile_opt_expr(compiler, tree, else_value, id, "value")?;
            compiler.chunk.patch(skip_else);
        }

        NodeKind::Index { left, index } => {
            compile_expr(compiler, tree, left)?;
            compile_opt_expr(compiler, tree, index, id, "index")?;
            compiler.emit(Opcode::ArrGet);
        }

        NodeKind::DotLookup { .. } => {
            return Err(CompileError::Unsupported {
                op: ".".to_string(),
                pos: tree.range(id).beg,
            });
        }

        NodeKind::Call { left, args } => {
            let NodeKind::Identifier { name } = *tree.kind(left) else {
                return Err(CompileError::Unsupported {
                    op: "()".to_string(),
                    pos: tree.range(left).beg,
                });
            };
            for arg in args {
                compile_opt_expr(compiler, tree, arg, id, "argument")?;
            }
            let name = tree.terminal(name).text().to_string();
            compiler.emit_pending_call(&name);
        }

        // 语句节点不会出现在表达式位置
        _ => {
            let at = tree.range(id).beg;
            compiler.emit_missing(at, "expression")?;
        }
    }

    Ok(())
}

/// 编译可能缺失的子表达式；缺失时压入 0
pub fn compile_opt_expr(
    compiler: &mut Compiler,
    tree: &mut SyntaxTree,
    id: Option<NodeId>,
    parent: NodeId,
    what: &str,
) -> Result<(), CompileError> {
    match id {
        Some(id) => compile_expr(compiler, tree, id),
        None => {
            let at = tree.range(parent).beg;
            compiler.emit_missing(at, what)
        }
    }
}

fn number_of(tree: &SyntaxTree, literal: TerminalId) -> Result<f32, CompileError> {
    let terminal = tree.terminal(literal);
    parse_number(terminal.text()).ok_or_else(|| CompileError::InvalidNumber {
        text: terminal.text().to_string(),
        pos: terminal.token.range.beg,
    })
}

/// `|lo, hi|` 展开为整数数组常量
fn compile_range(
    compiler: &mut Compiler,
    tree: &SyntaxTree,
    lower: TerminalId,
    upper: TerminalId,
) -> Result<(), CompileError> {
    let lo = number_of(tree, lower)? as i64;
    let hi = number_of(tree, upper)? as i64;
    let len = (hi - lo).unsigned_abs() as usize + 1;

    if len > compiler.config.max_range_len {
        return Err(CompileError::RangeTooLarge {
            lower: tree.terminal(lower).text().to_string(),
            upper: tree.terminal(upper).text().to_string(),
            limit: compiler.config.max_range_len,
            pos: tree.terminal(lower).token.range.beg,
        });
    }

    let step = if hi >= lo { 1 } else { -1 };
    let mut value = lo;
    for _ in 0..len {
        compiler.emit_number(value as f32)?;
        value += step;
    }
    compiler.emit_array(len)
}

fn compile_unary(
    compiler: &mut Compiler,
    tree: &mut SyntaxTree,
    id: NodeId,
    op: TerminalId,
    prefix: bool,
    expr: Option<NodeId>,
) -> Result<(), CompileError> {
    let op_kind = tree.terminal(op).kind();

    match op_kind {
        TokenKind::OpNot => {
            compile_opt_expr(compiler, tree, expr, id, "operand")?;
            compiler.emit(Opcode::Not);
        }
        TokenKind::OpSub => {
            compiler.emit_number(0.0)?;
            compile_opt_expr(compiler, tree, expr, id, "operand")?;
            compiler.emit(Opcode::Sub);
        }
        TokenKind::OpAdd => compile_opt_expr(compiler, tree, expr, id, "operand")?,
        TokenKind::OpIncrement | TokenKind::OpDecrement => {
            let name = match expr.map(|e| tree.kind(e)) {
                Some(NodeKind::Identifier { name }) => tree.terminal(*name).text().to_string(),
                _ => {
                    return Err(CompileError::InvalidIncrementTarget {
                        op: op_kind.spelling().to_string(),
                        pos: tree.terminal(op).token.range.beg,
                    })
                }
            };
            let increment = op_kind == TokenKind::OpIncrement;
            let (mutate, mutate_push) = if increment {
                (Opcode::Inc, Opcode::IncPush)
            } else {
                (Opcode::Dec, Opcode::DecPush)
            };

            compiler.emit_named(&name)?;
            if is_statement_position(tree, id) {
                compiler.emit(mutate);
            } else if prefix {
                // 前缀形式得到修改后的值
                compiler.emit(mutate);
                compiler.emit_named(&name)?;
            } else {
                compiler.emit(mutate_push);
            }
        }
        _ => {
            return Err(CompileError::Unsupported {
                op: op_kind.spelling().to_string(),
                pos: tree.terminal(op).token.range.beg,
            })
        }
    }

    Ok(())
}

/// 值是否被丢弃：沿三元运算的分支向上，直到遇到语句
fn is_statement_position(tree: &SyntaxTree, id: NodeId) -> bool {
    let mut current = id;

    while let Some(parent) = tree.parent(current) {
        let child = Some(current);
        match tree.kind(parent) {
            NodeKind::TernaryOp { cond, .. } => {
                if *cond == current {
                    return false;
                }
                current = parent;
            }
            NodeKind::Block { .. } | NodeKind::FunctionDecl { .. } => return true,
            NodeKind::If { cond, .. } | NodeKind::While { cond, .. } => return *cond != child,
            NodeKind::For { init, step, body, .. } => {
                return *init == child || *step == child || *body == child
            }
            _ => return false,
        }
    }

    true
}

/// 复合赋值对应的算术操作码
fn compound_op(kind: TokenKind) -> Option<Opcode> {
    match kind {
        TokenKind::OpAddAssign => Some(Opcode::Add),
        TokenKind::OpSubAssign => Some(Opcode::Sub),
        TokenKind::OpMulAssign => Some(Opcode::Mul),
        TokenKind::OpDivAssign => Some(Opcode::Div),
        TokenKind::OpPowAssign => Some(Opcode::Pow),
        TokenKind::OpModAssign => Some(Opcode::Mod),
        _ => None,
    }
}

/// 直接映射为单条指令的二元运算
fn simple_op(kind: TokenKind) -> Option<Opcode> {
    match kind {
        TokenKind::OpAdd => Some(Opcode::Add),
        TokenKind::OpSub => Some(Opcode::Sub),
        TokenKind::OpMul => Some(Opcode::Mul),
        TokenKind::OpDiv => Some(Opcode::Div),
        TokenKind::OpMod => Some(Opcode::Mod),
        TokenKind::OpPow => Some(Opcode::Pow),
        TokenKind::OpEquals => Some(Opcode::Eq),
        TokenKind::OpLessThan => Some(Opcode::Lt),
        TokenKind::OpGreaterThan => Some(Opcode::Gt),
        TokenKind::OpLessThanOrEqual => Some(Opcode::Lte),
        TokenKind::OpGreaterThanOrEqual => Some(Opcode::Gte),
        _ => None,
    }
}

fn compile_binary(
    compiler: &mut Compiler,
    tree: &mut SyntaxTree,
    id: NodeId,
    op: TerminalId,
    left: NodeId,
    right: Option<NodeId>,
) -> Result<(), CompileError> {
    let op_kind = tree.terminal(op).kind();

    if op_kind == TokenKind::OpAssign {
        return compile_assign(compiler, tree, id, left, right, None);
    }
    if let Some(arith) = compound_op(op_kind) {
        return compile_assign(compiler, tree, id, left, right, Some(arith));
    }

    match op_kind {
        TokenKind::OpAnd | TokenKind::OpOr => {
            // 短路：&& 遇假跳到 0，|| 遇真跳到 1
            let (branch, short_value, long_value) = if op_kind == TokenKind::OpAnd {
                (Opcode::Jez, 0.0, 1.0)
            } else {
                (Opcode::Jnz, 1.0, 0.0)
            };

            compile_expr(compiler, tree, left)?;
            let left_jump = compiler.chunk.write_jump(branch);
            compile_opt_expr(compiler, tree, right, id, "operand")?;
            let right_jump = compiler.chunk.write_jump(branch);

            compiler.emit_number(long_value)?;
            let end = compiler.chunk.write_jump(Opcode::Jmp);

            compiler.chunk.patch(left_jump);
            compiler.chunk.patch(right_jump);
            compiler.emit_number(short_value)?;
            compiler.chunk.patch(end);
        }
        TokenKind::OpNotEquals => {
            compile_expr(compiler, tree, left)?;
            compile_opt_expr(compiler, tree, right, id, "operand")?;
            compiler.emit(Opcode::Eq);
            compiler.emit(Opcode::Not);
        }
        _ => {
            let Some(opcode) = simple_op(op_kind) else {
                return Err(CompileError::Unsupported {
                    op: op_kind.spelling().to_string(),
                    pos: tree.terminal(op).token.range.beg,
                });
            };
            compile_expr(compiler, tree, left)?;
            compile_opt_expr(compiler, tree, right, id, "operand")?;
            compiler.emit(opcode);
        }
    }

    Ok(())
}

/// `=` 与复合赋值；目标只能是标识符或下标
fn compile_assign(
    compiler: &mut Compiler,
    tree: &mut SyntaxTree,
    id: NodeId,
    target: NodeId,
    value: Option<NodeId>,
    arith: Option<Opcode>,
) -> Result<(), CompileError> {
    match tree.kind(target).clone() {
        NodeKind::Identifier { name } => {
            let name = tree.terminal(name).text().to_string();
            compiler.emit_named(&name)?;
            if let Some(arith) = arith {
                compiler.emit_named(&name)?;
                compile_opt_expr(compiler, tree, value, id, "value")?;
                compiler.emit(arith);
            } else {
                compile_opt_expr(compiler, tree, value, id, "value")?;
            }
            compiler.emit(Opcode::Assign);
        }
        NodeKind::Index { left, index } => {
            compile_expr(compiler, tree, left)?;
            compile_opt_expr(compiler, tree, index, target, "index")?;
            if let Some(arith) = arith {
                compile_expr(compiler, tree, left)?;
                compile_opt_expr(compiler, tree, index, target, "index")?;
                compiler.emit(Opcode::ArrGet);
                compile_opt_expr(compiler, tree, value, id, "value")?;
                compiler.emit(arith);
            } else {
                compile_opt_expr(compiler, tree, value, id, "value")?;
            }
            compiler.emit(Opcode::ArrSet);
        }
        _ => {
            return Err(CompileError::InvalidAssignTarget {
                text: tree.text(target),
                pos: tree.range(target).beg,
            })
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests_support::{compile_source, compile_with, ops_of};
    use crate::runtime::bytecode::Opcode;
    use crate::runtime::compiler::CompileError;
    use crate::Program;

    #[test]
    fn test_assign_and_arithmetic() {
        let (body, _) = compile_source("x = 1 + 2 * 3;");
        assert_eq!(
            ops_of(&body),
            vec![
                Opcode::Push,
                Opcode::Push,
                Opcode::Push,
                Opcode::Push,
                Opcode::Mul,
                Opcode::Add,
                Opcode::Assign
            ]
        );
    }

    #[test]
    fn test_compound_assign() {
        let (body, _) = compile_source("x += 2;");
        assert_eq!(
            ops_of(&body),
            vec![Opcode::Push, Opcode::Push, Opcode::Push, Opcode::Add, Opcode::Assign]
        );

        let (body, _) = compile_source("a[1] -= 2;");
        assert_eq!(
            ops_of(&body),
            vec![
                Opcode::Push,
                Opcode::Push,
                Opcode::Push,
                Opcode::Push,
                Opcode::ArrGet,
                Opcode::Push,
                Opcode::Sub,
                Opcode::ArrSet
            ]
        );
    }

    #[test]
    fn test_not_equals_and_negation() {
        let (body, _) = compile_source("a != b;");
        assert_eq!(ops_of(&body), vec![Opcode::Push, Opcode::Push, Opcode::Eq, Opcode::Not]);

        let (body, _) = compile_source("-a;");
        assert_eq!(ops_of(&body), vec![Opcode::Push, Opcode::Push, Opcode::Sub]);

        let (body, _) = compile_source("!a;");
        assert_eq!(ops_of(&body), vec![Opcode::Push, Opcode::Not]);
    }

    #[test]
    fn test_short_circuit_shape() {
        let (body, _) = compile_source("a && b;");
        assert_eq!(
            ops_of(&body),
            vec![
                Opcode::Push,
                Opcode::Jez,
                Opcode::Push,
                Opcode::Jez,
                Opcode::Push,
                Opcode::Jmp,
                Opcode::Push
            ]
        );

        let (body, _) = compile_source("a || b;");
        assert_eq!(ops_of(&body)[1], Opcode::Jnz);
        assert_eq!(ops_of(&body)[3], Opcode::Jnz);
    }

    #[test]
    fn test_increment_routing() {
        // 语句位置：只修改
        let (body, _) = compile_source("x++;");
        assert_eq!(ops_of(&body), vec![Opcode::Push, Opcode::Inc]);

        // 值位置后缀：修改并压入旧值
        let (body, _) = compile_source("y = x--;");
        assert_eq!(
            ops_of(&body),
            vec![Opcode::Push, Opcode::Push, Opcode::DecPush, Opcode::Assign]
        );

        // 值位置前缀：修改后重新读取
        let (body, _) = compile_source("y = ++x;");
        assert_eq!(
            ops_of(&body),
            vec![Opcode::Push, Opcode::Push, Opcode::Inc, Opcode::Push, Opcode::Assign]
        );

        // 三元条件中的 ++ 需要值
        let (body, _) = compile_source("x++ ? a : b;");
        assert_eq!(ops_of(&body)[1], Opcode::IncPush);

        // 语句位置的三元分支不需要值
        let (body, _) = compile_source("c ? x++ : y++;");
        assert!(ops_of(&body).contains(&Opcode::Inc));
        assert!(!ops_of(&body).contains(&Opcode::IncPush));
    }

    #[test]
    fn test_for_step_increment_is_statement() {
        let (body, _) = compile_source("for (i = 0; i < 3; i++) { }");
        let ops = ops_of(&body);
        assert!(ops.contains(&Opcode::Inc));
        assert!(!ops.contains(&Opcode::IncPush));
    }

    #[test]
    fn test_list_and_range_constants() {
        let (bytes, _) = compile_with("a = {1, 2, 3}; b = |3, 1|;");
        let program = Program::from_bytes(&bytes).unwrap();
        // 1 2 3 是元素，3 同时作为数组长度
        assert_eq!(program.numbers(), &[1.0, 2.0, 3.0]);
        assert_eq!(program.strings(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_user_function_call_becomes_jal() {
        let (body, _) = compile_source("f(); function f() { x = 1; }");
        assert_eq!(ops_of(&body)[0], Opcode::Jal);

        let (body, _) = compile_source("g();");
        assert_eq!(ops_of(&body), vec![Opcode::Call]);
    }

    #[test]
    fn test_compile_errors() {
        let err = super::super::tests_support::compile_err("1 = 2;");
        assert!(matches!(err, CompileError::InvalidAssignTarget { ref text, .. } if text == "1"));

        let err = super::super::tests_support::compile_err("a in b;");
        assert!(matches!(err, CompileError::Unsupported { ref op, .. } if op == "in"));

        let err = super::super::tests_support::compile_err("a[0].b;");
        assert!(matches!(err, CompileError::Unsupported { ref op, .. } if op == "."));

        let err = super::super::tests_support::compile_err("1++;");
        assert!(matches!(err, CompileError::InvalidIncrementTarget { .. }));

        let err = super::super::tests_support::compile_err("a = |0, 100000|;");
        assert!(matches!(err, CompileError::RangeTooLarge { limit: 4096, .. }));

        let err = super::super::tests_support::compile_err("a = 0x;");
        assert!(matches!(err, CompileError::InvalidNumber { ref text, .. } if text == "0x"));
    }
}

//! 语句编译

use gscript_log::trace;

use super::{expr, CompileError, Compiler, LoopFrame};
use crate::compiler::parser::{NodeId, NodeKind, SyntaxTree};
use crate::runtime::bytecode::{Opcode, PackedKind};

/// 编译语句
pub fn compile_stmt(compiler: &mut Compiler, tree: &mut SyntaxTree, id: NodeId) -> Result<(), CompileError> {
    let kind = tree.kind(id).clone();

    match kind {
        NodeKind::Empty => {}

        NodeKind::Block { statements } => {
            for stmt in statements {
                compile_stmt(compiler, tree, stmt)?;
            }
        }

        NodeKind::If {
            cond,
            then_body,
            else_body,
        } => {
            expr::compile_opt_expr(compiler, tree, cond, id, "condition")?;
            let skip_then = compiler.chunk.write_jump(Opcode::Jez);
            compile_opt_stmt(compiler, tree, then_body)?;

            match else_body {
                Some(else_body) => {
                    let skip_else = compiler.chunk.write_jump(Opcode::Jmp);
                    compiler.chunk.patch(skip_then);
                    compile_stmt(compiler, tree, else_body)?;
                    compiler.chunk.patch(skip_else);
                }
                None => compiler.chunk.patch(skip_then),
            }
        }

        NodeKind::While { cond, body, .. } => {
            let cond_pos = compiler.chunk.current_offset();
            expr::compile_opt_expr(compiler, tree, cond, id, "condition")?;
            let exit = compiler.chunk.write_jump(Opcode::Jez);

            compile_loop_body(compiler, tree, id, body, Some(cond_pos))?;
            compiler.chunk.write_jump_to(Opcode::Jmp, cond_pos);

            let exit_pos = compiler.chunk.current_offset();
            compiler.chunk.patch(exit);
            finish_loop(compiler, tree, exit_pos, cond_pos);
        }

        NodeKind::For {
            init,
            cond,
            step,
            body,
            ..
        } => {
            if let Some(init) = init {
                expr::compile_expr(compiler, tree, init)?;
            }

            let cond_pos = compiler.chunk.current_offset();
            // 没有条件时恒真
            let exit = match cond {
                Some(cond) => {
                    expr::compile_expr(compiler, tree, cond)?;
                    Some(compiler.chunk.write_jump(Opcode::Jez))
                }
                None => None,
            };

            compile_loop_body(compiler, tree, id, body, None)?;

            let step_pos = compiler.chunk.current_offset();
            if let Some(step) = step {
                expr::compile_expr(compiler, tree, step)?;
            }
            compiler.chunk.write_jump_to(Opcode::Jmp, cond_pos);

            let exit_pos = compiler.chunk.current_offset();
            if let Some(exit) = exit {
                compiler.chunk.patch(exit);
            }
            finish_loop(compiler, tree, exit_pos, step_pos);
        }

        NodeKind::Break | NodeKind::Continue => {
            let is_break = matches!(kind, NodeKind::Break);
            let Some(frame) = tree
                .enclosing_loop(id)
                .and_then(|node| compiler.loops.iter().position(|f| f.node == node))
            else {
                trace!(
                    compiler.logger,
                    target: "gscript::compiler",
                    "{} outside of a loop ignored",
                    if is_break { "break" } else { "continue" }
                );
                return Ok(());
            };

            if is_break {
                let reservation = compiler.chunk.write_jump(Opcode::Jmp);
                compiler.loops[frame].breaks.push(reservation);
            } else if let Some(target) = compiler.loops[frame].continue_target {
                compiler.chunk.write_jump_to(Opcode::Jmp, target);
            } else {
                let reservation = compiler.chunk.write_jump(Opcode::Jmp);
                compiler.loops[frame].continues.push(reservation);
            }
        }

        NodeKind::Return => compiler.emit(Opcode::Ret),

        NodeKind::Command { name, args } => {
            for arg in args {
                expr::compile_opt_expr(compiler, tree, arg, id, "argument")?;
            }
            let name = tree.terminal(name).text().to_string();
            let index = compiler.intern_string(&name)?;
            compiler.emit_packed(Opcode::CmdCall, PackedKind::ConstString, index);
        }

        NodeKind::FunctionDecl { name, body } => {
            // 顶层顺序执行时跳过函数体
            let guard = compiler.chunk.write_jump(Opcode::Jmp);
            let entry = compiler.chunk.current_offset();
            let name = tree.terminal(name).text().to_string();
            trace!(compiler.logger, target: "gscript::compiler", "function '{}' at {}", name, entry);
            compiler.functions.insert(name, entry);

            compile_opt_stmt(compiler, tree, body)?;
            compiler.emit(Opcode::Ret);
            compiler.chunk.patch(guard);
        }

        // 表达式语句：值留在栈上
        _ => expr::compile_expr(compiler, tree, id)?,
    }

    Ok(())
}

fn compile_opt_stmt(compiler: &mut Compiler, tree: &mut SyntaxTree, id: Option<NodeId>) -> Result<(), CompileError> {
    match id {
        Some(id) => compile_stmt(compiler, tree, id),
        None => Ok(()),
    }
}

/// 在循环帧内编译循环体；帧留在栈上，由 [`finish_loop`] 弹出
fn compile_loop_body(
    compiler: &mut Compiler,
    tree: &mut SyntaxTree,
    node: NodeId,
    body: Option<NodeId>,
    continue_target: Option<usize>,
) -> Result<(), CompileError> {
    compiler.loops.push(LoopFrame {
        node,
        continue_target,
        breaks: Vec::new(),
        continues: Vec::new(),
    });
    compile_opt_stmt(compiler, tree, body)
}

/// 修补 break/continue 并把目标回填到循环节点
fn finish_loop(compiler: &mut Compiler, tree: &mut SyntaxTree, exit_pos: usize, continue_pos: usize) {
    let Some(frame) = compiler.loops.pop() else {
        return;
    };
    for reservation in frame.breaks {
        compiler.chunk.patch_to(reservation, exit_pos);
    }
    for reservation in frame.continues {
        compiler.chunk.patch_to(reservation, continue_pos);
    }

    match tree.kind_mut(frame.node) {
        NodeKind::While {
            break_target,
            continue_target,
            ..
        }
        | NodeKind::For {
            break_target,
            continue_target,
            ..
        } => {
            *break_target = Some(exit_pos as u32);
            *continue_target = Some(continue_pos as u32);
        }
        _ => {}
    }
}

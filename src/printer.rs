// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Precedence-aware textual rendering of a fully analyzed [`Program`]:
//! one block per paragraph, a header naming its label (if any) and
//! entry stack shape, then one offset-prefixed line per materialized
//! expression.
use std::fmt::Write as _;

use crate::expr::Expression;
use crate::opcode;
use crate::program::{BasicBlock, Program};

/// Tightest-to-loosest infix/prefix binding power, used to decide
/// whether a sub-expression needs parenthesizing inside its parent.
fn precedence(op: u8) -> u8 {
    match op {
        opcode::NOT | opcode::ISZERO => 0,
        opcode::EXP => 1,
        opcode::MUL | opcode::DIV | opcode::SDIV | opcode::MOD | opcode::SMOD => 2,
        opcode::ADD | opcode::SUB => 3,
        opcode::AND => 4,
        opcode::XOR => 5,
        opcode::OR => 6,
        opcode::LT | opcode::GT | opcode::SLT | opcode::SGT | opcode::EQ => 7,
        _ => u8::MAX,
    }
}

fn infix_symbol(op: u8) -> Option<&'static str> {
    Some(match op {
        opcode::ADD => "+",
        opcode::SUB => "-",
        opcode::MUL => "*",
        opcode::DIV | opcode::SDIV => "/",
        opcode::MOD | opcode::SMOD => "%",
        opcode::EXP => "**",
        opcode::AND => "&",
        opcode::OR => "|",
        opcode::XOR => "^",
        opcode::LT | opcode::SLT => "<",
        opcode::GT | opcode::SGT => ">",
        opcode::EQ => "==",
        _ => return None,
    })
}

fn prefix_symbol(op: u8) -> Option<&'static str> {
    Some(match op {
        opcode::NOT => "~",
        opcode::ISZERO => "!",
        _ => return None,
    })
}

/// Render the whole program as a sequence of non-empty blocks.
pub fn print_program(program: &Program) -> String {
    let mut out = String::new();
    for block in program.blocks.iter() {
        if block.instructions.is_empty() {
            continue;
        }
        print_block(&mut out, program, block);
        out.push('\n');
    }
    out
}

fn print_block(out: &mut String, program: &Program, block: &BasicBlock) {
    if let Some(label) = block.annotations.jump_label() {
        let _ = writeln!(out, "label_{}:", label.id);
    }

    let _ = writeln!(out, "# Block 0x{:x}", block.offset);

    if let Some(reaching) = block.annotations.reaching() {
        if !reaching.is_empty() {
            let depths: Vec<String> = (0..reaching.len()).map(|d| format!("${d}")).collect();
            let _ = writeln!(out, "# Stack: {}", depths.join(", "));
        }
    }

    for (idx, inst) in block.instructions.iter().enumerate() {
        if let Some(expr) = inst.annotations.expression() {
            let rendered = render(program, expr);
            let text = if inst.stack_writes() == 1 && !inst.is_dup() {
                format!("PUSH({rendered})")
            } else {
                rendered
            };
            let addr = block.address_of(idx);
            let _ = writeln!(out, "0x{addr:x}\t{text}");
        }
    }
}

fn render(program: &Program, expr: &Expression) -> String {
    render_at(program, expr, u8::MAX)
}

fn render_at(program: &Program, expr: &Expression, parent_precedence: u8) -> String {
    match expr {
        Expression::Pop(Some(inner)) => format!("POP({})", render(program, inner)),
        Expression::Pop(None) => "POP()".to_string(),
        Expression::Operation { opcode: op, arg, args, label } => {
            if args.is_empty() {
                return match (label, arg) {
                    (Some(id), _) => format!("label_{id}"),
                    (None, Some(v)) => format!("0x{v:x}"),
                    (None, None) => opcode::mnemonic(*op),
                };
            }

            if args.len() == 1 {
                if let Some(sym) = prefix_symbol(*op) {
                    let this_prec = precedence(*op);
                    let inner = render_at(program, &args[0], this_prec);
                    return format!("{sym}{inner}");
                }
            }

            if args.len() == 2 {
                if let Some(sym) = infix_symbol(*op) {
                    let this_prec = precedence(*op);
                    // args[0] is the topmost-of-stack (last-pushed)
                    // operand; render the earlier-pushed one first.
                    let lhs = render_at(program, &args[1], this_prec);
                    let rhs = render_at(program, &args[0], this_prec);
                    let rendered = format!("{lhs} {sym} {rhs}");
                    return if this_prec > parent_precedence {
                        format!("({rendered})")
                    } else {
                        rendered
                    };
                }
            }

            let rendered_args: Vec<String> = args.iter().map(|a| render(program, a)).collect();
            format!("{}({})", opcode::mnemonic(*op), rendered_args.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::perform_expression_building;
    use crate::label::perform_label_creation;
    use crate::reaches::perform_reaches_analysis;
    use crate::reaching::perform_reaching_analysis;

    fn analyze(bytes: &[u8]) -> Program {
        let mut prog = Program::from_bytes(bytes);
        perform_reaching_analysis(&mut prog).unwrap();
        perform_reaches_analysis(&mut prog);
        perform_label_creation(&mut prog);
        perform_expression_building(&mut prog).unwrap();
        prog
    }

    #[test]
    fn renders_arithmetic_infix() {
        // PUSH1 5; PUSH1 3; ADD -- ADD pops 3 then 5, but the
        // earlier-pushed operand (5) renders first.
        let prog = analyze(&[0x60, 0x05, 0x60, 0x03, 0x01]);
        let text = print_program(&prog);
        assert!(text.contains("0x5 + 0x3"), "got: {text}");
    }

    #[test]
    fn mul_inside_add_is_not_parenthesized() {
        // PUSH1 2; PUSH1 3; PUSH1 4; MUL; ADD -- MUL consumes 4 then 3,
        // rendering as "3 * 4"; ADD then consumes that result and 2,
        // rendering the earlier-pushed 2 first. MUL binds tighter than
        // ADD so its rendering needs no parentheses.
        let prog = analyze(&[0x60, 0x02, 0x60, 0x03, 0x60, 0x04, 0x02, 0x01]);
        let text = print_program(&prog);
        assert!(text.contains("0x2 + 0x3 * 0x4"), "got: {text}");
    }

    #[test]
    fn single_write_non_dup_is_wrapped_and_addressed() {
        // ADD at offset 4 writes exactly one stack value, so its line
        // is prefixed with its own byte offset and wrapped in PUSH(..).
        let prog = analyze(&[0x60, 0x05, 0x60, 0x03, 0x01]);
        let text = print_program(&prog);
        assert!(text.contains("0x4\tPUSH(0x5 + 0x3)"), "got: {text}");
    }

    #[test]
    fn zero_write_instruction_is_not_wrapped() {
        // STOP writes nothing, so its line has no PUSH(..) wrapper.
        let prog = analyze(&[0x00]);
        let text = print_program(&prog);
        assert!(text.contains("0x0\tSTOP"), "got: {text}");
        assert!(!text.contains("PUSH(STOP"), "got: {text}");
    }

    #[test]
    fn empty_blocks_are_suppressed() {
        let prog = analyze(&[0x60, 0x00, 0x56, 0x5b]);
        let text = print_program(&prog);
        assert!(!text.contains("Block 0x4"));
    }
}

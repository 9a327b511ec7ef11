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
//! Expression reconstruction ("lifting"): within each
//! block, fold single-use producers directly into their consumer's
//! argument list instead of printing them as separate statements.
//!
//! `DUP`/`SWAP` never materialize into their own node here: they are
//! pure stack bookkeeping during this pass (mirroring how
//! [`crate::reaches`] already excludes them as consumers), so their
//! effect is captured entirely by which tag ends up in which stack
//! slot, not by anything printed.
use ruint::aliases::U256;

use crate::error::{Error, Result};
use crate::opcode;
use crate::program::{InstructionPointer, Program};

/// A reconstructed expression tree. Built bottom-up during the
/// per-block lifting pass and handed to the printer afterwards.
#[derive(Debug, Clone)]
pub enum Expression {
    /// An instruction and its (possibly lifted) operands, in the same
    /// order `Instruction::stack_reads` pops them (slot 0 = the
    /// operand nearest the top of the stack).
    Operation {
        opcode: u8,
        /// Only ever `Some` for `PUSH`, carrying its literal value.
        arg: Option<U256>,
        args: Vec<Expression>,
        /// Set only for a `PUSH` whose value was assigned a jump
        /// label; the printer renders the label name
        /// instead of the raw numeric value when present.
        label: Option<usize>,
    },
    /// A popped value with no identifying payload: either a value
    /// already on the stack when this block was entered, or a producer
    /// that doesn't qualify for lifting (more than one use, or its sole
    /// use lies in a different block). Also used for a `POP` whose
    /// operand wasn't lifted. Carries the popped expression only when
    /// it wraps a `POP` of a value that *was* lifted -- kept as its own
    /// node, rather than vanishing, so that a discarded but
    /// side-effecting expression (e.g. a `CALL` whose result is never
    /// used) still gets printed as a statement.
    Pop(Option<Box<Expression>>),
}

impl Expression {
    /// Attempt constant folding. Returns `Some` only for expressions
    /// built entirely out of literal pushes and pure arithmetic/
    /// bitwise/comparison opcodes.
    pub fn eval(&self) -> Option<U256> {
        match self {
            Expression::Operation { opcode: op, arg, args, .. } => {
                if args.is_empty() {
                    return *arg;
                }
                let mut vals = Vec::with_capacity(args.len());
                for a in args {
                    vals.push(a.eval()?);
                }
                eval_pure(*op, &vals)
            }
            _ => None,
        }
    }
}

fn eval_pure(op: u8, args: &[U256]) -> Option<U256> {
    use opcode::*;
    let r = match (op, args) {
        (ADD, [a, b]) => a.wrapping_add(*b),
        (MUL, [a, b]) => a.wrapping_mul(*b),
        (SUB, [a, b]) => a.wrapping_sub(*b),
        (DIV, [a, b]) => a.checked_div(*b).unwrap_or(U256::ZERO),
        (MOD, [a, b]) => a.checked_rem(*b).unwrap_or(U256::ZERO),
        (AND, [a, b]) => a & b,
        (OR, [a, b]) => a | b,
        (XOR, [a, b]) => a ^ b,
        (NOT, [a]) => !*a,
        (ISZERO, [a]) => if a.is_zero() { U256::from(1u64) } else { U256::ZERO },
        (LT, [a, b]) => if a < b { U256::from(1u64) } else { U256::ZERO },
        (GT, [a, b]) => if a > b { U256::from(1u64) } else { U256::ZERO },
        (EQ, [a, b]) => if a == b { U256::from(1u64) } else { U256::ZERO },
        (SHL, [shift, value]) => {
            let s = u256_to_small(*shift);
            if s >= 256 { U256::ZERO } else { *value << s }
        }
        (SHR, [shift, value]) => {
            let s = u256_to_small(*shift);
            if s >= 256 { U256::ZERO } else { *value >> s }
        }
        _ => return None,
    };
    Some(r)
}

fn u256_to_small(v: U256) -> usize {
    let limbs = v.as_limbs();
    if limbs[1..].iter().any(|&l| l != 0) {
        usize::MAX
    } else {
        limbs[0] as usize
    }
}

/// A tag tracked on the local, per-block abstract stack used while
/// lifting: either a value produced earlier in this same block, or
/// one that was already present when the block was entered.
#[derive(Clone, Copy)]
enum Slot {
    Local(InstructionPointer),
    Entry(usize),
}

fn peek(stack: &[Slot], n: usize) -> Slot {
    stack[stack.len() - 1 - n]
}

fn popn(stack: &mut Vec<Slot>, n: usize) -> Vec<Slot> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(stack.pop().expect("expression building underflowed the block's local stack"));
    }
    out
}

fn swap_at(stack: &mut [Slot], n: usize) {
    let len = stack.len();
    stack.swap(len - 1, len - 1 - n);
}

/// Resolve one popped operand tag to an `Expression`, moving the
/// producer's expression out of its annotations when it qualifies for
/// lifting (exactly one use, within this same block).
fn resolve(program: &mut Program, slot: Slot, block_idx: usize) -> Expression {
    match slot {
        Slot::Entry(_) => Expression::Pop(None),
        Slot::Local(ptr) => {
            let single_same_block_use = program
                .get(ptr)
                .annotations
                .reaches()
                .map(|r| r.len() == 1 && r[0].0.block == block_idx)
                .unwrap_or(false);
            if single_same_block_use {
                match program.get_mut(ptr).annotations.pop_expression() {
                    Some(expr) => expr,
                    None => Expression::Pop(None),
                }
            } else {
                Expression::Pop(None)
            }
        }
    }
}

/// Run the lifting pass over every block.
pub fn perform_expression_building(program: &mut Program) -> Result<()> {
    for block_idx in 0..program.blocks.len() {
        build_block(program, block_idx)?;
    }
    Ok(())
}

fn build_block(program: &mut Program, block_idx: usize) -> Result<()> {
    let entry_height = program.blocks[block_idx]
        .annotations
        .reaching()
        .map(|r| r.len())
        .unwrap_or(0);
    let mut stack: Vec<Slot> = (0..entry_height).rev().map(Slot::Entry).collect();

    let num_instrs = program.blocks[block_idx].instructions.len();
    for idx in 0..num_instrs {
        let ptr = InstructionPointer { block: block_idx, index: idx };
        let inst = program.get(ptr);
        let op = inst.opcode;
        let reads = inst.stack_reads();

        if opcode::is_dup(op) {
            let depth = reads - 1;
            let tag = peek(&stack, depth);
            stack.push(tag);
            continue;
        }
        if opcode::is_swap(op) {
            swap_at(&mut stack, reads - 1);
            continue;
        }

        let operand_tags = popn(&mut stack, reads);
        let mut args = Vec::with_capacity(reads);
        for tag in operand_tags {
            args.push(resolve(program, tag, block_idx));
        }

        let arg = if opcode::is_push(op) { program.get(ptr).arg } else { None };
        let label = if opcode::is_push(op) {
            program.get(ptr).annotations.jump_label().map(|l| l.id)
        } else {
            None
        };
        let base = Expression::Operation { opcode: op, arg, args, label };
        let expr = if op == opcode::POP {
            match base {
                Expression::Operation { args, .. } => Expression::Pop(Some(Box::new(
                    args.into_iter().next().expect("POP always reads one operand"),
                ))),
                _ => unreachable!(),
            }
        } else {
            base
        };

        program.get_mut(ptr).annotations.set_expression(expr);

        let writes = program.get(ptr).stack_writes();
        match writes {
            0 => {}
            1 => stack.push(Slot::Local(ptr)),
            n => {
                return Err(Error::UnexpectedStackWrites { address: program.address_of(ptr), writes: n })
            }
        }
    }

    for idx in 0..num_instrs {
        let ptr = InstructionPointer { block: block_idx, index: idx };
        let inst = program.get(ptr);
        let was_lift_candidate = inst
            .annotations
            .reaches()
            .map(|r| r.len() == 1 && r[0].0.block == block_idx)
            .unwrap_or(false);
        if was_lift_candidate && inst.annotations.expression().is_some() {
            return Err(Error::LiftedNotConsumed { block_offset: program.blocks[block_idx].offset });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::perform_label_creation;
    use crate::reaches::perform_reaches_analysis;
    use crate::reaching::perform_reaching_analysis;

    fn build(bytes: &[u8]) -> Program {
        let mut prog = Program::from_bytes(bytes);
        perform_reaching_analysis(&mut prog).unwrap();
        perform_reaches_analysis(&mut prog);
        perform_label_creation(&mut prog);
        perform_expression_building(&mut prog).unwrap();
        prog
    }

    #[test]
    fn single_use_push_lifts_into_add() {
        // PUSH1 5; PUSH1 3; ADD
        let prog = build(&[0x60, 0x05, 0x60, 0x03, 0x01]);
        let add = InstructionPointer { block: 0, index: 2 };
        let expr = prog.get(add).annotations.expression().unwrap();
        match expr {
            Expression::Operation { args, .. } => {
                assert_eq!(args.len(), 2);
                assert!(matches!(args[0], Expression::Operation { args: ref a, .. } if a.is_empty()));
            }
            _ => panic!("expected an operation"),
        }
        assert_eq!(expr.eval(), Some(U256::from(8u64)));
    }

    #[test]
    fn dup_does_not_break_lifting_of_its_source() {
        // PUSH1 5; DUP1; ADD  -- the DUP'd push now has two real uses
        let prog = build(&[0x60, 0x05, 0x80, 0x01]);
        let push = InstructionPointer { block: 0, index: 0 };
        // Two consumers means the push must remain materialized.
        assert!(prog.get(push).annotations.expression().is_some());
    }

    #[test]
    fn discarded_call_result_still_prints_as_a_pop_statement() {
        // PUSH1 0 (retSize); PUSH1 0 (retOff); PUSH1 0 (argsSize);
        // PUSH1 0 (argsOff); PUSH1 0 (value); PUSH1 0x10 (addr);
        // PUSH2 0xffff (gas); CALL; POP
        let prog = build(&[
            0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00, 0x60, 0x10, 0x61, 0xff, 0xff,
            0xf1, 0x50,
        ]);
        let pop_ptr = InstructionPointer { block: 0, index: 8 };
        let expr = prog.get(pop_ptr).annotations.expression().unwrap();
        assert!(matches!(expr, Expression::Pop(_)));
    }
}

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
//! Reaching-definition analysis: a stack-valued abstract
//! interpretation in which every stack slot carries the set of
//! instructions that might have produced it.
use std::cell::RefCell;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::mem;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::interpreter::{execute_abstractly, AbstractState};
use crate::opcode;
use crate::program::{u256_to_usize, Instruction, InstructionPointer, Program};
use crate::stack::Stack;

/// For a block or instruction, an ordered sequence (slot `0` = top)
/// of sets of [`InstructionPointer`]. A slot with more than one
/// pointer means multiple control-flow paths disagree on what
/// produced that value.
pub type ReachingDefinition = Vec<HashSet<InstructionPointer>>;

/// Run reaching analysis over the whole program, populating each
/// block's and instruction's `reaching` annotation. Errors out (see
/// [`Error::UnresolvableJump`], [`Error::UnexpectedStackWrites`]) on
/// the conditions designated fatal below.
pub fn perform_reaching_analysis(program: &mut Program) -> Result<()> {
    if program.blocks.is_empty() {
        return Ok(());
    }
    let owned = Rc::new(RefCell::new(mem::take(program)));
    let initial = ReachingState {
        program: owned.clone(),
        next_block: 0,
        stack: Stack::empty(),
    };
    execute_abstractly(initial)?;
    *program = Rc::try_unwrap(owned)
        .unwrap_or_else(|_| panic!("reaching analysis left dangling references to the program"))
        .into_inner();
    Ok(())
}

#[derive(Clone)]
struct ReachingState {
    program: Rc<RefCell<Program>>,
    next_block: usize,
    stack: Stack<InstructionPointer>,
}

impl PartialEq for ReachingState {
    fn eq(&self, other: &Self) -> bool {
        self.next_block == other.next_block && self.stack == other.stack
    }
}
impl Eq for ReachingState {}

impl Hash for ReachingState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.next_block.hash(state);
        self.stack.hash(state);
    }
}

/// Merge the given stack into a block's accumulated entry reaching
/// definition: union each slot in the common prefix, truncating the
/// recorded length down to the stack's height if it was longer.
fn merge_block_entry(reaching: &mut Option<ReachingDefinition>, stack: &Stack<InstructionPointer>) {
    let height = stack.height();
    if reaching.is_none() {
        *reaching = Some(vec![HashSet::new(); height]);
    }
    let def = reaching.as_mut().unwrap();
    let common = def.len().min(height);
    for i in 0..common {
        def[i].insert(stack.peek(i));
    }
    if height < def.len() {
        def.truncate(height);
    }
}

fn record_operand_reaching(inst: &mut Instruction, operands: &[InstructionPointer]) {
    if inst.annotations.reaching().is_none() {
        inst.annotations.set_reaching(vec![HashSet::new(); operands.len()]);
    }
    let def = inst.annotations.reaching_mut().unwrap();
    for (i, ptr) in operands.iter().enumerate() {
        def[i].insert(*ptr);
    }
}

impl AbstractState for ReachingState {
    fn advance(&self) -> Result<Vec<Self>> {
        let mut prog = self.program.borrow_mut();
        let block_idx = self.next_block;

        log::debug!(
            "entering block at offset {} with stack height {}",
            prog.blocks[block_idx].offset,
            self.stack.height()
        );

        {
            let block = &mut prog.blocks[block_idx];
            let mut reaching = mem::take(&mut block.annotations);
            let mut def = reaching.reaching().cloned();
            merge_block_entry(&mut def, &self.stack);
            if let Some(def) = def {
                reaching.set_reaching(def);
            }
            block.annotations = reaching;
        }

        let mut st = self.stack.clone();
        let num_instrs = prog.blocks[block_idx].instructions.len();

        for idx in 0..num_instrs {
            let ptr = InstructionPointer { block: block_idx, index: idx };
            let reads = prog.blocks[block_idx].instructions[idx].stack_reads();
            let (operands, rest) = st.popn(reads);

            record_operand_reaching(&mut prog.blocks[block_idx].instructions[idx], &operands);

            let op = prog.blocks[block_idx].instructions[idx].opcode;

            // `JUMP`/`JUMPI` are handled by their own branches below even
            // though `JUMP` is also classified as a terminator (it ends
            // the block, but -- unlike STOP/RETURN/REVERT/INVALID/
            // SELFDESTRUCT -- its successor still needs resolving).
            if opcode::is_terminator(op) && op != opcode::JUMP {
                return Ok(vec![]);
            }

            let new_stack = if opcode::is_push(op) {
                rest.push(ptr)
            } else if opcode::is_dup(op) {
                let depth = reads - 1;
                let value = st.peek(depth);
                st.push(value)
            } else if opcode::is_swap(op) {
                st.swap(reads - 1)
            } else if op == opcode::JUMP {
                let target = resolve_jump_target(&prog, operands[0], ptr)?;
                return Ok(match target.and_then(|off| prog.jump_destinations.get(&off).copied()) {
                    Some(dest) => vec![ReachingState {
                        program: self.program.clone(),
                        next_block: dest,
                        stack: rest,
                    }],
                    None => vec![],
                });
            } else if op == opcode::JUMPI {
                let target = resolve_jump_target(&prog, operands[0], ptr)?;
                let mut succs = Vec::new();
                if let Some(dest) = target.and_then(|off| prog.jump_destinations.get(&off).copied()) {
                    succs.push(ReachingState {
                        program: self.program.clone(),
                        next_block: dest,
                        stack: rest.clone(),
                    });
                }
                if let Some(next) = prog.blocks[block_idx].next {
                    succs.push(ReachingState {
                        program: self.program.clone(),
                        next_block: next,
                        stack: rest,
                    });
                }
                return Ok(succs);
            } else {
                let writes = prog.blocks[block_idx].instructions[idx].stack_writes();
                match writes {
                    0 => rest,
                    1 => rest.push(ptr),
                    n => {
                        return Err(Error::UnexpectedStackWrites {
                            address: prog.address_of(ptr),
                            writes: n,
                        })
                    }
                }
            };

            if new_stack.height() > 1024 {
                return Ok(vec![]);
            }
            st = new_stack;
        }

        match prog.blocks[block_idx].next {
            Some(next) => Ok(vec![ReachingState {
                program: self.program.clone(),
                next_block: next,
                stack: st,
            }]),
            None => Ok(vec![]),
        }
    }
}

/// Resolve a jump's target operand to a statically known byte offset.
/// `None` means the producer was a push but its value doesn't name
/// any reachable offset (treated the same as an absent jump
/// destination); an `Err` means the producer wasn't a push at all,
/// which is treated as a hard error.
fn resolve_jump_target(prog: &Program, source: InstructionPointer, at: InstructionPointer) -> Result<Option<usize>> {
    let producer = prog.get(source);
    if !producer.is_push() {
        return Err(Error::UnresolvableJump { address: prog.address_of(at) });
    }
    let offset = u256_to_usize(producer.arg.unwrap());
    Ok(Some(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_reaching_is_empty_for_entry_block() {
        let mut prog = Program::from_bytes(&[0x60, 0x05, 0x60, 0x03, 0x01]);
        perform_reaching_analysis(&mut prog).unwrap();
        let reaching = prog.blocks[0].annotations.reaching().unwrap();
        assert!(reaching.is_empty());
        // ADD's two operands both resolve to singleton producers.
        let add_reaching = prog.blocks[0].instructions[2].annotations.reaching().unwrap();
        assert_eq!(add_reaching.len(), 2);
        assert_eq!(add_reaching[0].len(), 1);
        assert_eq!(add_reaching[1].len(), 1);
    }

    #[test]
    fn unresolvable_jump_is_an_error() {
        // PUSH1 0; ADD; JUMP -- JUMP's operand isn't a push
        let mut prog = Program::from_bytes(&[0x60, 0x00, 0x80, 0x01, 0x56]);
        let err = perform_reaching_analysis(&mut prog);
        assert!(matches!(err, Err(Error::UnresolvableJump { .. })));
    }

    #[test]
    fn jumpi_forks_into_target_and_fallthrough() {
        // PUSH1 1; PUSH1 5; JUMPI; STOP; JUMPDEST; STOP
        let mut prog = Program::from_bytes(&[
            0x60, 0x01, 0x60, 0x05, 0x57, 0x00, 0x5b, 0x00,
        ]);
        perform_reaching_analysis(&mut prog).unwrap();
        // Block 1 (after JUMPI) and block 2 (the JUMPDEST target)
        // should both have been visited with an empty entry stack.
        assert!(prog.blocks[1].annotations.reaching().is_some());
        assert!(prog.blocks[2].annotations.reaching().is_some());
    }
}

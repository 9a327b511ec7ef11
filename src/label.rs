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
//! Label creation: identify `PUSH` instructions whose
//! value is used exclusively as a resolvable jump target, and assign
//! each distinct destination block a dense, program-order label id.
//!
//! The id and its total reference count are stored twice: once on the
//! destination [`crate::program::BasicBlock`], so the printer can emit
//! a `label_N:` header there, and once on every qualifying `PUSH`
//! instruction that resolves to it, so the printer can render that
//! push's value as `label_N` instead of a raw offset.
use std::collections::HashMap;

use crate::opcode;
use crate::program::{u256_to_usize, InstructionPointer, Program};

/// A label assigned to a jump destination: its dense id, and how many
/// qualifying pushes resolve to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpLabel {
    pub id: usize,
    pub ref_count: usize,
}

/// A push instruction qualifies for a label if every one of its
/// reaches-edges feeds the first operand slot (the target slot) of a
/// `JUMP` or `JUMPI` -- vacuously true when it has no consumers at
/// all -- and its value resolves to a real `JUMPDEST`. A push used in
/// any other way -- arithmetic, a second `JUMPI` operand, discarded by
/// `POP`, or a value with no matching destination -- never gets a
/// label.
pub fn perform_label_creation(program: &mut Program) {
    let mut qualifying: Vec<(InstructionPointer, usize)> = Vec::new();

    'outer: for block_idx in 0..program.blocks.len() {
        for inst_idx in 0..program.blocks[block_idx].instructions.len() {
            let ptr = InstructionPointer { block: block_idx, index: inst_idx };
            let inst = program.get(ptr);
            if !inst.is_push() {
                continue;
            }
            if let Some(reaches) = inst.annotations.reaches() {
                for (consumer, slot) in reaches.clone() {
                    let consumer_inst = program.get(consumer);
                    let is_jump_target_slot = slot == 0
                        && (consumer_inst.opcode == opcode::JUMP || consumer_inst.opcode == opcode::JUMPI);
                    if !is_jump_target_slot {
                        continue 'outer;
                    }
                }
            }
            let destination = inst.arg.and_then(|v| {
                let offset = u256_to_usize(v);
                program.jump_destinations.get(&offset).copied()
            });
            if let Some(dest_block) = destination {
                qualifying.push((ptr, dest_block));
            }
        }
    }

    // Dense ids assigned in program order of first appearance.
    let mut next_id = 0usize;
    let mut block_ids: HashMap<usize, usize> = HashMap::new();
    let mut block_ref_counts: HashMap<usize, usize> = HashMap::new();
    for (_, dest_block) in &qualifying {
        block_ids.entry(*dest_block).or_insert_with(|| {
            let id = next_id;
            next_id += 1;
            id
        });
        *block_ref_counts.entry(*dest_block).or_insert(0) += 1;
    }

    for (dest_block, id) in &block_ids {
        let ref_count = block_ref_counts[dest_block];
        program.blocks[*dest_block]
            .annotations
            .set_jump_label(JumpLabel { id: *id, ref_count });
    }

    for (ptr, dest_block) in qualifying {
        let id = block_ids[&dest_block];
        let ref_count = block_ref_counts[&dest_block];
        program.get_mut(ptr).annotations.set_jump_label(JumpLabel { id, ref_count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaches::perform_reaches_analysis;
    use crate::reaching::perform_reaching_analysis;

    #[test]
    fn push_used_only_as_jump_target_labels_the_destination_block() {
        // PUSH1 3 (the JUMPDEST's offset); JUMP; JUMPDEST; STOP
        let mut prog = Program::from_bytes(&[0x60, 0x03, 0x56, 0x5b, 0x00]);
        perform_reaching_analysis(&mut prog).unwrap();
        perform_reaches_analysis(&mut prog);
        perform_label_creation(&mut prog);

        let push = InstructionPointer { block: 0, index: 0 };
        let push_label = prog.get(push).annotations.jump_label().unwrap();
        assert_eq!(push_label.id, 0);
        assert_eq!(push_label.ref_count, 1);

        let dest_block_label = prog.blocks[1].annotations.jump_label().unwrap();
        assert_eq!(*dest_block_label, *push_label);
    }

    #[test]
    fn push_with_no_consumers_still_labels_its_destination() {
        // PUSH1 3 (the JUMPDEST's offset), never consumed; JUMPDEST; STOP
        let mut prog = Program::from_bytes(&[0x60, 0x03, 0x5b, 0x00]);
        perform_reaching_analysis(&mut prog).unwrap();
        perform_reaches_analysis(&mut prog);
        perform_label_creation(&mut prog);

        let push = InstructionPointer { block: 0, index: 0 };
        let push_label = prog.get(push).annotations.jump_label().unwrap();
        assert_eq!(push_label.id, 0);

        let dest_block_label = prog.blocks[1].annotations.jump_label().unwrap();
        assert_eq!(*dest_block_label, *push_label);
    }

    #[test]
    fn push_used_in_arithmetic_never_gets_a_label() {
        // PUSH1 5; PUSH1 3; ADD
        let mut prog = Program::from_bytes(&[0x60, 0x05, 0x60, 0x03, 0x01]);
        perform_reaching_analysis(&mut prog).unwrap();
        perform_reaches_analysis(&mut prog);
        perform_label_creation(&mut prog);

        let push = InstructionPointer { block: 0, index: 0 };
        assert!(prog.get(push).annotations.jump_label().is_none());
    }
}

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
//! Reaches (use) analysis: the inverse of reaching
//! definitions. Where reaching records, per operand slot, which
//! instructions might have produced the value there, reaches records
//! the flip side on the producer: every consumer slot that the
//! producer's value reached.
use crate::program::{InstructionPointer, Program};

/// The instructions (and which operand slot of each) that consumed a
/// given producer's result. Unlike reaching, this is not
/// deduplicated: a producer used twice by the same consumer (e.g.
/// `DUP1` then both copies feeding the same opcode) appears twice.
pub type ReachesDefinition = Vec<(InstructionPointer, usize)>;

/// Walk every instruction's reaching definition and append the
/// reverse edge onto each producer's `reaches` annotation. `DUP`/
/// `SWAP` instructions are skipped: they don't consume their operands
/// in the sense of ending the value's life, they rearrange the stack
/// and reaching analysis already tracked who holds the result.
pub fn perform_reaches_analysis(program: &mut Program) {
    let mut edges: Vec<(InstructionPointer, InstructionPointer, usize)> = Vec::new();

    for (block_idx, block) in program.blocks.iter().enumerate() {
        for (inst_idx, inst) in block.instructions.iter().enumerate() {
            if inst.is_dup() || inst.is_swap() {
                continue;
            }
            let consumer = InstructionPointer { block: block_idx, index: inst_idx };
            if let Some(reaching) = inst.annotations.reaching() {
                for (slot, producers) in reaching.iter().enumerate() {
                    for producer in producers {
                        edges.push((*producer, consumer, slot));
                    }
                }
            }
        }
    }

    for (producer, consumer, slot) in edges {
        program.get_mut(producer).annotations.reaches_mut().push((consumer, slot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaching::perform_reaching_analysis;

    #[test]
    fn push_reaches_its_single_consumer() {
        // PUSH1 5; PUSH1 3; ADD
        let mut prog = Program::from_bytes(&[0x60, 0x05, 0x60, 0x03, 0x01]);
        perform_reaching_analysis(&mut prog).unwrap();
        perform_reaches_analysis(&mut prog);

        let first_push = InstructionPointer { block: 0, index: 0 };
        let reaches = prog.get(first_push).annotations.reaches().unwrap();
        assert_eq!(reaches.len(), 1);
        assert_eq!(reaches[0].0, InstructionPointer { block: 0, index: 2 });
        assert_eq!(reaches[0].1, 1);
    }

    #[test]
    fn dup_does_not_consume_its_operand() {
        // PUSH1 5; DUP1; ADD
        let mut prog = Program::from_bytes(&[0x60, 0x05, 0x80, 0x01]);
        perform_reaching_analysis(&mut prog).unwrap();
        perform_reaches_analysis(&mut prog);

        let push = InstructionPointer { block: 0, index: 0 };
        // ADD reads both slots, both produced by the PUSH; DUP1 is
        // skipped as a consumer so only ADD's two edges appear.
        let reaches = prog.get(push).annotations.reaches().unwrap();
        assert_eq!(reaches.len(), 2);
    }
}

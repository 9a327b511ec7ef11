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
//! Block-structured program model: [`Instruction`], [`BasicBlock`],
//! [`Program`], and the linear-scan constructor that turns a raw byte
//! string into them.
use std::collections::HashMap;
use std::mem;

use ruint::aliases::U256;

use crate::annotation::Annotations;
use crate::opcode;

/// A stable reference to an instruction: the index of its origin
/// block in `Program::blocks`, and its index within that block.
/// Blocks and instructions are never removed or reordered after
/// construction, so these stay valid for the program's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionPointer {
    pub block: usize,
    pub index: usize,
}

/// A single decoded instruction: its opcode byte, an optional
/// arbitrary-precision argument (only `PUSH` carries one), and the
/// annotation slots later passes attach results to.
#[derive(Debug)]
pub struct Instruction {
    pub opcode: u8,
    pub arg: Option<U256>,
    pub annotations: Annotations,
}

impl Instruction {
    fn new(opcode: u8, arg: Option<U256>) -> Self {
        Instruction { opcode, arg, annotations: Annotations::new() }
    }

    pub fn stack_reads(&self) -> usize {
        opcode::info(self.opcode).stack_reads as usize
    }

    pub fn stack_writes(&self) -> usize {
        opcode::info(self.opcode).stack_writes as usize
    }

    pub fn is_push(&self) -> bool {
        opcode::is_push(self.opcode)
    }

    pub fn is_dup(&self) -> bool {
        opcode::is_dup(self.opcode)
    }

    pub fn is_swap(&self) -> bool {
        opcode::is_swap(self.opcode)
    }

    pub fn is_jump(&self) -> bool {
        opcode::is_jump(self.opcode)
    }

    pub fn is_terminator(&self) -> bool {
        opcode::is_terminator(self.opcode)
    }

    pub fn mnemonic(&self) -> String {
        opcode::mnemonic(self.opcode)
    }

    /// Number of bytes this instruction occupies in the original
    /// bytecode (`1` plus any push operand width).
    pub fn length(&self) -> usize {
        1 + opcode::info(self.opcode).operand_width as usize
    }
}

/// A maximal run of instructions with a single entry (from a
/// `JUMPDEST` or fall-through) and single exit (to a terminator or a
/// `JUMPDEST` successor).
#[derive(Debug)]
pub struct BasicBlock {
    pub instructions: Vec<Instruction>,
    pub offset: usize,
    /// Index, in `Program::blocks`, of the block reached by falling
    /// off the end of this one. Only ever set when this block was
    /// closed by an upcoming `JUMPDEST` (never by a terminator).
    pub next: Option<usize>,
    pub annotations: Annotations,
}

impl BasicBlock {
    /// Byte offset, within the whole program, of the instruction at
    /// `index`.
    pub fn address_of(&self, index: usize) -> usize {
        let mut addr = self.offset;
        for inst in &self.instructions[..index] {
            addr += inst.length();
        }
        addr
    }
}

/// The disassembled program: its blocks in byte-offset order, and a
/// map from byte offset to the index of the block that starts there
/// (populated only for offsets whose byte was `JUMPDEST`).
#[derive(Debug, Default)]
pub struct Program {
    pub blocks: Vec<BasicBlock>,
    pub jump_destinations: HashMap<usize, usize>,
}

impl Program {
    pub fn get(&self, ptr: InstructionPointer) -> &Instruction {
        &self.blocks[ptr.block].instructions[ptr.index]
    }

    pub fn get_mut(&mut self, ptr: InstructionPointer) -> &mut Instruction {
        &mut self.blocks[ptr.block].instructions[ptr.index]
    }

    pub fn address_of(&self, ptr: InstructionPointer) -> usize {
        self.blocks[ptr.block].address_of(ptr.index)
    }

    /// Decode a raw EVM bytecode sequence into a block-structured
    /// program. Block boundaries open before a
    /// `JUMPDEST` and close after a terminator or any jump.
    pub fn from_bytes(bytes: &[u8]) -> Program {
        let mut blocks: Vec<BasicBlock> = Vec::new();
        let mut jump_destinations: HashMap<usize, usize> = HashMap::new();

        let mut cur_offset = 0usize;
        let mut cur_instrs: Vec<Instruction> = Vec::new();
        // Whether the block currently being accumulated is itself the
        // target of some JUMPDEST (and so must be retained even if it
        // ends up empty).
        let mut cur_is_target = false;

        let mut i = 0usize;
        while i < bytes.len() {
            let op = bytes[i];

            if op == opcode::JUMPDEST {
                if !cur_instrs.is_empty() {
                    let closed = BasicBlock {
                        instructions: mem::take(&mut cur_instrs),
                        offset: cur_offset,
                        next: None,
                        annotations: Annotations::new(),
                    };
                    blocks.push(closed);
                    let prev_index = blocks.len() - 1;
                    let next_index = blocks.len();
                    blocks[prev_index].next = Some(next_index);
                }
                cur_offset = i + 1;
                cur_is_target = true;
                jump_destinations.insert(i, blocks.len());
                i += 1;
                continue;
            }

            let meta = opcode::info(op);
            let width = meta.operand_width as usize;
            let arg = if opcode::is_push(op) {
                Some(read_push_arg(bytes, i + 1, width))
            } else {
                None
            };
            cur_instrs.push(Instruction::new(op, arg));
            let terminates = opcode::is_terminator(op);
            i += 1 + width;

            if terminates {
                blocks.push(BasicBlock {
                    instructions: mem::take(&mut cur_instrs),
                    offset: cur_offset,
                    next: None,
                    annotations: Annotations::new(),
                });
                cur_offset = i;
                cur_is_target = false;
            }
        }

        if !cur_instrs.is_empty() || cur_is_target {
            blocks.push(BasicBlock {
                instructions: cur_instrs,
                offset: cur_offset,
                next: None,
                annotations: Annotations::new(),
            });
        }

        Program { blocks, jump_destinations }
    }
}

/// Narrow a 256-bit value to a `usize`, saturating to `usize::MAX`
/// (never panicking) when it doesn't fit. Used anywhere a push's value
/// is interpreted as a byte offset: an oversized value simply can't
/// name any real location, the same as an absent one.
pub fn u256_to_usize(v: U256) -> usize {
    let limbs = v.as_limbs();
    if limbs[1..].iter().any(|&l| l != 0) || limbs[0] > usize::MAX as u64 {
        usize::MAX
    } else {
        limbs[0] as usize
    }
}

/// Read a big-endian push operand of `width` bytes starting at `pos`,
/// padding missing trailing bytes with zero when the operand runs off
/// the end of the buffer.
fn read_push_arg(bytes: &[u8], pos: usize, width: usize) -> U256 {
    let mut buf = [0u8; 32];
    let avail = bytes.len().saturating_sub(pos).min(width);
    if avail > 0 {
        let src = &bytes[pos..pos + avail];
        // Right-align within the 32-byte big-endian buffer; any
        // missing trailing bytes (avail < width) are already zero.
        buf[32 - width..32 - width + avail].copy_from_slice(src);
    }
    U256::from_be_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_block_no_jumps() {
        // PUSH1 5; PUSH1 3; ADD
        let prog = Program::from_bytes(&[0x60, 0x05, 0x60, 0x03, 0x01]);
        assert_eq!(prog.blocks.len(), 1);
        assert_eq!(prog.blocks[0].instructions.len(), 3);
        assert_eq!(prog.blocks[0].offset, 0);
        assert!(prog.blocks[0].next.is_none());
    }

    #[test]
    fn jump_splits_into_two_blocks() {
        // PUSH1 0; JUMP; JUMPDEST; STOP
        let prog = Program::from_bytes(&[0x60, 0x00, 0x56, 0x5b, 0x00]);
        assert_eq!(prog.blocks.len(), 2);
        assert_eq!(prog.blocks[0].offset, 0);
        assert_eq!(prog.blocks[0].instructions.len(), 2);
        assert!(prog.blocks[0].next.is_none(), "JUMP has no fall-through");
        assert_eq!(prog.blocks[1].offset, 4);
        assert_eq!(prog.blocks[1].instructions.len(), 1);
        assert_eq!(prog.jump_destinations.get(&3), Some(&1));
    }

    #[test]
    fn push_arg_padded_when_truncated() {
        // PUSH2 with only one byte of operand available
        let prog = Program::from_bytes(&[0x61, 0xff]);
        let arg = prog.blocks[0].instructions[0].arg.unwrap();
        assert_eq!(arg, U256::from(0xff00u64));
    }

    #[test]
    fn trailing_empty_jumpdest_block_is_retained() {
        // PUSH1 0; JUMP; JUMPDEST (target, nothing after)
        let prog = Program::from_bytes(&[0x60, 0x00, 0x56, 0x5b]);
        assert_eq!(prog.blocks.len(), 2);
        assert!(prog.blocks[1].instructions.is_empty());
    }
}

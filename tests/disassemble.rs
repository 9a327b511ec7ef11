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
use evmxp::error::Error;
use evmxp::{disassemble, Program};

#[test]
fn test_disassemble_straight_line_arithmetic() {
    // PUSH1 5; PUSH1 3; ADD; PUSH1 2; MUL; STOP
    let bytes = [0x60, 0x05, 0x60, 0x03, 0x01, 0x60, 0x02, 0x02, 0x00];
    let out = disassemble(&bytes).unwrap();
    assert!(out.contains("0x5 + 0x3"));
    assert!(out.contains("STOP"));
}

#[test]
fn test_disassemble_conditional_branch_forks_both_successors() {
    // PUSH1 1 (cond); PUSH1 6 (target, the JUMPDEST below); JUMPI;
    // STOP; JUMPDEST; STOP
    let bytes = [0x60, 0x01, 0x60, 0x06, 0x57, 0x00, 0x5b, 0x00];
    let out = disassemble(&bytes).unwrap();
    // Both the fall-through block and the jump target survive.
    assert!(out.contains("JUMPI"));
    assert!(out.contains("STOP"));
}

#[test]
fn test_disassemble_renders_jump_target_as_a_label_not_a_literal() {
    // PUSH1 3 (the JUMPDEST's own offset); JUMP; JUMPDEST; STOP
    let bytes = [0x60, 0x03, 0x56, 0x5b, 0x00];
    let out = disassemble(&bytes).unwrap();
    assert!(out.contains("label_0"));
    assert!(out.contains("label_0:"));
}

#[test]
fn test_disassemble_rejects_dynamic_jump_target() {
    // CALLDATALOAD result used directly as a jump target.
    let bytes = [0x60, 0x00, 0x35, 0x56]; // PUSH1 0; CALLDATALOAD; JUMP
    let err = disassemble(&bytes).unwrap_err();
    assert!(matches!(err, Error::UnresolvableJump { .. }));
}

#[test]
fn test_disassemble_reused_value_is_materialized_once() {
    // PUSH1 7; DUP1; ADD; STOP -- the PUSH is consumed twice (once per
    // copy DUP1 produces) so it must print as its own statement rather
    // than being inlined twice.
    let bytes = [0x60, 0x07, 0x80, 0x01, 0x00];
    let out = disassemble(&bytes).unwrap();
    assert!(out.contains("0x7"));
}

#[test]
fn test_disassemble_empty_bytecode_is_empty_output() {
    let out = disassemble(&[]).unwrap();
    assert!(out.trim().is_empty());
}

#[test]
fn test_block_construction_collapses_consecutive_jumpdests() {
    // JUMPDEST; JUMPDEST; STOP -- both offsets are valid jump targets,
    // but with no instructions between them they share one block.
    let bytes = [0x5b, 0x5b, 0x00];
    let program = Program::from_bytes(&bytes);
    assert_eq!(program.blocks.len(), 1);
    assert_eq!(program.jump_destinations.get(&0), Some(&0));
    assert_eq!(program.jump_destinations.get(&1), Some(&0));
}

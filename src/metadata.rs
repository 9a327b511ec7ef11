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
//! Bytecode preprocessing that has nothing to do with the analysis
//! pipeline itself: stripping the Solidity/Vyper "swarm hash" metadata
//! trailer, and splitting constructor bytecode into its constructor
//! and runtime parts.
use crate::error::{Error, Result};
use crate::opcode;
use crate::program::{u256_to_usize, Program};

const SWARM_HEADER: [u8; 2] = [0xa1, 0x65];
const SWARM_TRAILER: [u8; 2] = [0x00, 0x29];
const SWARM_BLOB_LEN: usize = 43;

/// Strip a trailing Solidity/Vyper metadata blob, if present. The
/// compiler appends a CBOR-encoded `{"ipfs": <hash>, "solc": <ver>}`
/// blob (or similar) ending in a 2-byte length field; recent solc
/// versions emit a fixed 43-byte blob starting `0xa1 0x65` and ending
/// `0x00 0x29`. Bytecode not matching the pattern is returned as-is.
pub fn strip_swarm_hash(bytes: &[u8]) -> &[u8] {
    if bytes.len() < SWARM_BLOB_LEN {
        return bytes;
    }
    let start = bytes.len() - SWARM_BLOB_LEN;
    let blob = &bytes[start..];
    if blob[0..2] == SWARM_HEADER && blob[SWARM_BLOB_LEN - 2..] == SWARM_TRAILER {
        &bytes[..start]
    } else {
        bytes
    }
}

/// Split constructor bytecode into its constructor part and the
/// runtime code it deploys. Solidity constructors end with a
/// `CODECOPY(destOffset, offset, size)` that copies the runtime code
/// out of itself before `RETURN`ing it; when several `CODECOPY`s
/// appear (e.g. for immutable-variable patching) the *last* one
/// statically resolvable is the one that copies the full runtime
/// body, so that is the heuristic used here.
///
/// Returns `(constructor_bytes, runtime_bytes)`.
pub fn split_constructor<'a>(full: &'a [u8], program: &Program) -> Result<(&'a [u8], &'a [u8])> {
    let mut entry_point: Option<usize> = None;

    for block in &program.blocks {
        for inst in &block.instructions {
            if inst.opcode != opcode::CODECOPY {
                continue;
            }
            // CODECOPY's operands are popped top-first: destOffset,
            // offset, size. The source `offset` (the second operand)
            // is what tells us where the runtime code begins.
            if let Some(reaching) = inst.annotations.reaching() {
                if reaching.len() == 3 {
                    if let Some(producer) = single_producer(&reaching[1]) {
                        let producer_inst = program.get(producer);
                        if producer_inst.is_push() {
                            if let Some(v) = producer_inst.arg {
                                entry_point = Some(u256_to_usize(v));
                            }
                        }
                    }
                }
            }
        }
    }

    let offset = entry_point.ok_or(Error::NoEntryPoint)?;
    if offset > full.len() {
        return Err(Error::EntryPointOutOfRange { offset, code_len: full.len() });
    }
    Ok((&full[..offset], &full[offset..]))
}

fn single_producer(set: &std::collections::HashSet<crate::program::InstructionPointer>) -> Option<crate::program::InstructionPointer> {
    if set.len() == 1 {
        set.iter().next().copied()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_exact_swarm_blob() {
        let mut code = vec![0x60, 0x00]; // PUSH1 0
        let mut blob = vec![0u8; SWARM_BLOB_LEN];
        blob[0] = 0xa1;
        blob[1] = 0x65;
        blob[SWARM_BLOB_LEN - 2] = 0x00;
        blob[SWARM_BLOB_LEN - 1] = 0x29;
        code.extend_from_slice(&blob);
        let stripped = strip_swarm_hash(&code);
        assert_eq!(stripped, &[0x60, 0x00]);
    }

    #[test]
    fn leaves_non_matching_tail_untouched() {
        let code = vec![0x60, 0x00, 0x00, 0x00];
        assert_eq!(strip_swarm_hash(&code), code.as_slice());
    }

    #[test]
    fn splits_on_resolvable_codecopy() {
        // PUSH1 0x0a (size); PUSH1 0x08 (offset, the runtime entry
        // point within the full buffer); PUSH1 0x00 (destOffset);
        // CODECOPY; STOP; <10 bytes of "runtime">
        let mut code = vec![0x60, 0x0a, 0x60, 0x08, 0x60, 0x00, 0x39, 0x00];
        code.extend(std::iter::repeat(0x5b).take(10));
        let mut prog = Program::from_bytes(&code);
        crate::reaching::perform_reaching_analysis(&mut prog).unwrap();
        let (ctor, runtime) = split_constructor(&code, &prog).unwrap();
        assert_eq!(ctor.len(), 8);
        assert_eq!(runtime.len(), 10);
    }
}

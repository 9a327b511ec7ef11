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
use std::fmt;

/// Errors which can arise from any pass in the analysis pipeline.
#[derive(Debug)]
pub enum Error {
    /// A `JUMP`/`JUMPI` target operand was not produced by a `PUSH`,
    /// so the destination cannot be resolved statically.
    UnresolvableJump { address: usize },
    /// An instruction's recorded operand count disagrees with its
    /// opcode metadata.
    StackReadMismatch {
        address: usize,
        expected: usize,
        actual: usize,
    },
    /// An opcode other than `PUSH`/`DUP`/`SWAP` wrote more than one
    /// value to the stack.
    UnexpectedStackWrites { address: usize, writes: usize },
    /// A block ended with a lifted value that was never consumed.
    LiftedNotConsumed { block_offset: usize },
    /// Constructor-mode splitting found no statically resolvable
    /// `CODECOPY` to use as the runtime-code entry point.
    NoEntryPoint,
    /// The entry point found for constructor-mode splitting lies
    /// beyond the end of the supplied bytecode.
    EntryPointOutOfRange { offset: usize, code_len: usize },
    /// Propagated I/O failure from the command-line front-end.
    Io(std::io::Error),
    /// The input could not be parsed as a hex string.
    HexDecode(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnresolvableJump { address } => {
                write!(f, "0x{address:x}: could not determine jump location statically")
            }
            Error::StackReadMismatch { address, expected, actual } => write!(
                f,
                "0x{address:x}: expected {expected} operand(s), found {actual}"
            ),
            Error::UnexpectedStackWrites { address, writes } => write!(
                f,
                "0x{address:x}: unexpected op makes {writes} writes to the stack"
            ),
            Error::LiftedNotConsumed { block_offset } => write!(
                f,
                "block at 0x{block_offset:x}: a lifted value was never consumed"
            ),
            Error::NoEntryPoint => write!(f, "no code entrypoint found in constructor"),
            Error::EntryPointOutOfRange { offset, code_len } => write!(
                f,
                "code entrypoint 0x{offset:x} lies outside the {code_len} available bytes"
            ),
            Error::Io(e) => write!(f, "io error: {e}"),
            Error::HexDecode(s) => write!(f, "invalid hex string: {s}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

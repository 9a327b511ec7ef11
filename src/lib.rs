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
//! A static disassembler for EVM bytecode that reconstructs
//! expression trees instead of printing a flat stack-machine listing.
//!
//! The pipeline runs in five passes over a [`program::Program`] built
//! by [`program::Program::from_bytes`]:
//!
//! 1. [`reaching`] -- reaching-definition analysis over an abstract
//!    stack, recording which instruction(s) could have produced each
//!    operand.
//! 2. [`reaches`] -- the inverse of reaching: which instructions
//!    consume each producer's result.
//! 3. [`label`] -- identify pushes used exclusively as resolvable
//!    jump targets and assign them dense label ids.
//! 4. [`expr`] -- lift single-use producers into their consumer's
//!    expression tree.
//! 5. [`printer`] -- render the result with precedence-aware infix
//!    notation.
pub mod annotation;
pub mod error;
pub mod expr;
pub mod hex;
pub mod interpreter;
pub mod label;
pub mod metadata;
pub mod opcode;
pub mod printer;
pub mod program;
pub mod reaches;
pub mod reaching;
pub mod stack;

pub use error::{Error, Result};
pub use program::Program;

/// Run the full analysis pipeline over a program and render it.
/// Equivalent to calling each pass in order followed by
/// [`printer::print_program`]; exposed as a single entry point for
/// the command-line front-end and for integration tests.
pub fn disassemble(bytes: &[u8]) -> Result<String> {
    let mut program = Program::from_bytes(bytes);
    reaching::perform_reaching_analysis(&mut program)?;
    reaches::perform_reaches_analysis(&mut program);
    label::perform_label_creation(&mut program);
    expr::perform_expression_building(&mut program)?;
    Ok(printer::print_program(&program))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disassembles_a_trivial_program() {
        let out = disassemble(&[0x60, 0x05, 0x60, 0x03, 0x01, 0x00]).unwrap();
        assert!(out.contains("0x3 + 0x5"));
    }
}

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

//! Static metadata for EVM opcodes: mnemonic, operand width, stack
//! effect and the category predicates the rest of the pipeline relies
//! on (push / dup / swap / jump / terminator).

// 0s: Stop and Arithmetic Operations
pub const STOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const MUL: u8 = 0x02;
pub const SUB: u8 = 0x03;
pub const DIV: u8 = 0x04;
pub const SDIV: u8 = 0x05;
pub const MOD: u8 = 0x06;
pub const SMOD: u8 = 0x07;
pub const ADDMOD: u8 = 0x08;
pub const MULMOD: u8 = 0x09;
pub const EXP: u8 = 0x0a;
pub const SIGNEXTEND: u8 = 0x0b;
// 10s: Comparison & Bitwise Logic Operations
pub const LT: u8 = 0x10;
pub const GT: u8 = 0x11;
pub const SLT: u8 = 0x12;
pub const SGT: u8 = 0x13;
pub const EQ: u8 = 0x14;
pub const ISZERO: u8 = 0x15;
pub const AND: u8 = 0x16;
pub const OR: u8 = 0x17;
pub const XOR: u8 = 0x18;
pub const NOT: u8 = 0x19;
pub const BYTE: u8 = 0x1a;
pub const SHL: u8 = 0x1b;
pub const SHR: u8 = 0x1c;
pub const SAR: u8 = 0x1d;
// 20s: SHA3
pub const SHA3: u8 = 0x20;
// 30s: Environment Information
pub const ADDRESS: u8 = 0x30;
pub const BALANCE: u8 = 0x31;
pub const ORIGIN: u8 = 0x32;
pub const CALLER: u8 = 0x33;
pub const CALLVALUE: u8 = 0x34;
pub const CALLDATALOAD: u8 = 0x35;
pub const CALLDATASIZE: u8 = 0x36;
pub const CALLDATACOPY: u8 = 0x37;
pub const CODESIZE: u8 = 0x38;
pub const CODECOPY: u8 = 0x39;
pub const GASPRICE: u8 = 0x3a;
pub const EXTCODESIZE: u8 = 0x3b;
pub const EXTCODECOPY: u8 = 0x3c;
pub const RETURNDATASIZE: u8 = 0x3d;
pub const RETURNDATACOPY: u8 = 0x3e;
pub const EXTCODEHASH: u8 = 0x3f;
// 40s: Block Information
pub const BLOCKHASH: u8 = 0x40;
pub const COINBASE: u8 = 0x41;
pub const TIMESTAMP: u8 = 0x42;
pub const NUMBER: u8 = 0x43;
pub const DIFFICULTY: u8 = 0x44;
pub const GASLIMIT: u8 = 0x45;
pub const CHAINID: u8 = 0x46;
pub const SELFBALANCE: u8 = 0x47;
// 50s: Stack, Memory, Storage and Flow Operations
pub const POP: u8 = 0x50;
pub const MLOAD: u8 = 0x51;
pub const MSTORE: u8 = 0x52;
pub const MSTORE8: u8 = 0x53;
pub const SLOAD: u8 = 0x54;
pub const SSTORE: u8 = 0x55;
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const PC: u8 = 0x58;
pub const MSIZE: u8 = 0x59;
pub const GAS: u8 = 0x5a;
pub const JUMPDEST: u8 = 0x5b;
// 60s & 70s: Push Operations
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7f;
// 80s: Duplication Operations
pub const DUP1: u8 = 0x80;
pub const DUP16: u8 = 0x8f;
// 90s: Exchange Operations
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9f;
// a0s: Logging Operations
pub const LOG0: u8 = 0xa0;
pub const LOG4: u8 = 0xa4;
// f0s: System Operations
pub const CREATE: u8 = 0xf0;
pub const CALL: u8 = 0xf1;
pub const CALLCODE: u8 = 0xf2;
pub const RETURN: u8 = 0xf3;
pub const DELEGATECALL: u8 = 0xf4;
pub const CREATE2: u8 = 0xf5;
pub const STATICCALL: u8 = 0xfa;
pub const REVERT: u8 = 0xfd;
pub const INVALID: u8 = 0xfe;
pub const SELFDESTRUCT: u8 = 0xff;

/// Static metadata attached to every opcode value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub mnemonic: &'static str,
    /// Number of bytes immediately following the opcode that form its
    /// operand (`0` for everything except `PUSH1..PUSH32`).
    pub operand_width: u8,
    pub stack_reads: u8,
    pub stack_writes: u8,
}

impl OpInfo {
    pub const fn new(mnemonic: &'static str, operand_width: u8, stack_reads: u8, stack_writes: u8) -> Self {
        OpInfo { mnemonic, operand_width, stack_reads, stack_writes }
    }
}

/// Look up the static metadata for a raw opcode byte. Bytes not
/// assigned to any instruction ("holes" in the table) are treated as a
/// zero-effect unknown instruction, matching the reference
/// implementation's behaviour of defaulting unmapped entries to a
/// no-op stack effect rather than rejecting them outright.
pub fn info(op: u8) -> OpInfo {
    match op {
        STOP => OpInfo::new("STOP", 0, 0, 0),
        ADD => OpInfo::new("ADD", 0, 2, 1),
        MUL => OpInfo::new("MUL", 0, 2, 1),
        SUB => OpInfo::new("SUB", 0, 2, 1),
        DIV => OpInfo::new("DIV", 0, 2, 1),
        SDIV => OpInfo::new("SDIV", 0, 2, 1),
        MOD => OpInfo::new("MOD", 0, 2, 1),
        SMOD => OpInfo::new("SMOD", 0, 2, 1),
        ADDMOD => OpInfo::new("ADDMOD", 0, 3, 1),
        MULMOD => OpInfo::new("MULMOD", 0, 3, 1),
        EXP => OpInfo::new("EXP", 0, 2, 1),
        SIGNEXTEND => OpInfo::new("SIGNEXTEND", 0, 2, 1),
        LT => OpInfo::new("LT", 0, 2, 1),
        GT => OpInfo::new("GT", 0, 2, 1),
        SLT => OpInfo::new("SLT", 0, 2, 1),
        SGT => OpInfo::new("SGT", 0, 2, 1),
        EQ => OpInfo::new("EQ", 0, 2, 1),
        ISZERO => OpInfo::new("ISZERO", 0, 1, 1),
        AND => OpInfo::new("AND", 0, 2, 1),
        OR => OpInfo::new("OR", 0, 2, 1),
        XOR => OpInfo::new("XOR", 0, 2, 1),
        NOT => OpInfo::new("NOT", 0, 1, 1),
        BYTE => OpInfo::new("BYTE", 0, 2, 1),
        SHL => OpInfo::new("SHL", 0, 2, 1),
        SHR => OpInfo::new("SHR", 0, 2, 1),
        SAR => OpInfo::new("SAR", 0, 2, 1),
        SHA3 => OpInfo::new("SHA3", 0, 2, 1),
        ADDRESS => OpInfo::new("ADDRESS", 0, 0, 1),
        BALANCE => OpInfo::new("BALANCE", 0, 1, 1),
        ORIGIN => OpInfo::new("ORIGIN", 0, 0, 1),
        CALLER => OpInfo::new("CALLER", 0, 0, 1),
        CALLVALUE => OpInfo::new("CALLVALUE", 0, 0, 1),
        CALLDATALOAD => OpInfo::new("CALLDATALOAD", 0, 1, 1),
        CALLDATASIZE => OpInfo::new("CALLDATASIZE", 0, 0, 1),
        CALLDATACOPY => OpInfo::new("CALLDATACOPY", 0, 3, 0),
        CODESIZE => OpInfo::new("CODESIZE", 0, 0, 1),
        CODECOPY => OpInfo::new("CODECOPY", 0, 3, 0),
        GASPRICE => OpInfo::new("GASPRICE", 0, 0, 1),
        EXTCODESIZE => OpInfo::new("EXTCODESIZE", 0, 1, 1),
        EXTCODECOPY => OpInfo::new("EXTCODECOPY", 0, 4, 0),
        RETURNDATASIZE => OpInfo::new("RETURNDATASIZE", 0, 0, 1),
        RETURNDATACOPY => OpInfo::new("RETURNDATACOPY", 0, 3, 0),
        EXTCODEHASH => OpInfo::new("EXTCODEHASH", 0, 1, 1),
        BLOCKHASH => OpInfo::new("BLOCKHASH", 0, 1, 1),
        COINBASE => OpInfo::new("COINBASE", 0, 0, 1),
        TIMESTAMP => OpInfo::new("TIMESTAMP", 0, 0, 1),
        NUMBER => OpInfo::new("NUMBER", 0, 0, 1),
        DIFFICULTY => OpInfo::new("DIFFICULTY", 0, 0, 1),
        GASLIMIT => OpInfo::new("GASLIMIT", 0, 0, 1),
        CHAINID => OpInfo::new("CHAINID", 0, 0, 1),
        SELFBALANCE => OpInfo::new("SELFBALANCE", 0, 0, 1),
        POP => OpInfo::new("POP", 0, 1, 0),
        MLOAD => OpInfo::new("MLOAD", 0, 1, 1),
        MSTORE => OpInfo::new("MSTORE", 0, 2, 0),
        MSTORE8 => OpInfo::new("MSTORE8", 0, 2, 0),
        SLOAD => OpInfo::new("SLOAD", 0, 1, 1),
        SSTORE => OpInfo::new("SSTORE", 0, 2, 0),
        JUMP => OpInfo::new("JUMP", 0, 1, 0),
        JUMPI => OpInfo::new("JUMPI", 0, 2, 0),
        PC => OpInfo::new("PC", 0, 0, 1),
        MSIZE => OpInfo::new("MSIZE", 0, 0, 1),
        GAS => OpInfo::new("GAS", 0, 0, 1),
        JUMPDEST => OpInfo::new("JUMPDEST", 0, 0, 0),
        PUSH1..=PUSH32 => OpInfo::new("PUSH", op - PUSH1 + 1, 0, 1),
        DUP1..=DUP16 => {
            let n = op - DUP1 + 1;
            OpInfo::new("DUP", 0, n, n + 1)
        }
        SWAP1..=SWAP16 => {
            let n = op - SWAP1 + 1;
            OpInfo::new("SWAP", 0, n + 1, n + 1)
        }
        LOG0..=LOG4 => {
            let n = op - LOG0;
            OpInfo::new("LOG", 0, n + 2, 0)
        }
        CREATE => OpInfo::new("CREATE", 0, 3, 1),
        CALL => OpInfo::new("CALL", 0, 7, 1),
        CALLCODE => OpInfo::new("CALLCODE", 0, 7, 1),
        RETURN => OpInfo::new("RETURN", 0, 2, 0),
        DELEGATECALL => OpInfo::new("DELEGATECALL", 0, 6, 1),
        CREATE2 => OpInfo::new("CREATE2", 0, 4, 1),
        STATICCALL => OpInfo::new("STATICCALL", 0, 6, 1),
        REVERT => OpInfo::new("REVERT", 0, 2, 0),
        INVALID => OpInfo::new("INVALID", 0, 0, 0),
        SELFDESTRUCT => OpInfo::new("SELFDESTRUCT", 0, 1, 0),
        _ => OpInfo::new("UNKNOWN", 0, 0, 0),
    }
}

pub fn is_push(op: u8) -> bool {
    (PUSH1..=PUSH32).contains(&op)
}

pub fn is_dup(op: u8) -> bool {
    (DUP1..=DUP16).contains(&op)
}

pub fn is_swap(op: u8) -> bool {
    (SWAP1..=SWAP16).contains(&op)
}

/// `JUMP`/`JUMPI` only. Does not include `JUMPDEST`, which is a
/// pseudo-terminator that *starts* a block rather than ending one.
pub fn is_jump(op: u8) -> bool {
    op == JUMP || op == JUMPI
}

/// STOP, RETURN, REVERT, INVALID, SELFDESTRUCT and unconditional JUMP.
/// `JUMPI` is not a terminator since it always has a fall-through
/// successor.
pub fn is_terminator(op: u8) -> bool {
    matches!(op, STOP | RETURN | REVERT | INVALID | SELFDESTRUCT | JUMP)
}

pub fn mnemonic(op: u8) -> String {
    let meta = info(op);
    match op {
        PUSH1..=PUSH32 => format!("{}{}", meta.mnemonic, meta.operand_width),
        DUP1..=DUP16 => format!("{}{}", meta.mnemonic, op - DUP1 + 1),
        SWAP1..=SWAP16 => format!("{}{}", meta.mnemonic, op - SWAP1 + 1),
        LOG0..=LOG4 => format!("{}{}", meta.mnemonic, op - LOG0),
        _ => meta.mnemonic.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_width_matches_opcode_offset() {
        assert_eq!(info(PUSH1).operand_width, 1);
        assert_eq!(info(PUSH32).operand_width, 32);
    }

    #[test]
    fn dup_and_swap_reads_writes() {
        assert_eq!(info(DUP1), OpInfo::new("DUP", 0, 1, 2));
        assert_eq!(info(SWAP1), OpInfo::new("SWAP", 0, 2, 2));
        assert_eq!(info(SWAP16), OpInfo::new("SWAP", 0, 17, 17));
    }

    #[test]
    fn terminator_set_matches_spec() {
        for op in [STOP, RETURN, REVERT, INVALID, SELFDESTRUCT, JUMP] {
            assert!(is_terminator(op));
        }
        assert!(!is_terminator(JUMPI));
        assert!(!is_terminator(JUMPDEST));
    }

    #[test]
    fn unknown_byte_is_zero_effect() {
        let meta = info(0x0c);
        assert_eq!(meta.stack_reads, 0);
        assert_eq!(meta.stack_writes, 0);
    }
}

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
use std::fmt::Write;
use crate::error::Error;

/// A simple trait allowing something to be converted into a hex
/// string.
pub trait ToHexString {
    fn to_hex_string(&self) -> String;
}

/// A simple trait allowing something to be converted from a hex
/// string.
pub trait FromHexString {
    fn from_hex_string(&self) -> Result<Vec<u8>, Error>;
}

impl ToHexString for [u8] {
    fn to_hex_string(&self) -> String {
        let mut hexstr = String::with_capacity(2 + 2 * self.len());
        write!(hexstr, "0x").unwrap();
        for b in self {
            write!(hexstr, "{:02x}", b).unwrap();
        }
        hexstr
    }
}

impl FromHexString for str {
    fn from_hex_string(&self) -> Result<Vec<u8>, Error> {
        let trimmed = self.trim();
        let slice = if trimmed.len() >= 2 && &trimmed[0..2] == "0x" {
            &trimmed[2..]
        } else {
            trimmed
        };
        let mut bytes = Vec::with_capacity((slice.len() + 1) / 2);
        let digit = |c: u8, pos: usize| -> Result<u8, Error> {
            (c as char)
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| Error::HexDecode(format!("invalid hex digit at position {pos}")))
        };
        let raw = slice.as_bytes();
        let mut i = 0;
        // Account for an odd number of digits by assuming the leading
        // digit is zero.
        if raw.len() % 2 != 0 {
            bytes.push(digit(raw[0], 0)?);
            i = 1;
        }
        while i < raw.len() {
            let hi = digit(raw[i], i)?;
            let lo = digit(raw[i + 1], i + 1)?;
            bytes.push((hi << 4) | lo);
            i += 2;
        }
        Ok(bytes)
    }
}

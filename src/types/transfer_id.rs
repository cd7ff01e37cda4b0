//! Transfer identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{LinkError, Result};

/// Identifies one logical transfer on the photo channel.
///
/// Built from the two header bytes at offsets 2 and 3 and rendered as four
/// lowercase hex digits, byte at offset 2 first (`[0xab, 0x01]` is `ab01`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TransferId([u8; 2]);

impl TransferId {
    /// Create an identifier from the raw header bytes.
    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self(bytes)
    }

    /// Raw header bytes in wire order.
    pub const fn to_bytes(self) -> [u8; 2] {
        self.0
    }

    /// Numeric value with the offset-2 byte as the high byte.
    pub const fn as_u16(self) -> u16 {
        u16::from_be_bytes(self.0)
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}", self.0[0], self.0[1])
    }
}

impl FromStr for TransferId {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(LinkError::config(format!(
                "transfer id '{}' must be exactly 4 hex digits",
                s
            )));
        }

        let value = u16::from_str_radix(s, 16).map_err(|e| {
            LinkError::config(format!("transfer id '{}' is not hexadecimal: {}", s, e))
        })?;

        Ok(Self(value.to_be_bytes()))
    }
}

impl From<TransferId> for String {
    fn from(id: TransferId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for TransferId {
    type Error = LinkError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

//! Fixed-layout claim bit vector
//!
//! A claim is a variable-length bit sequence: bits `[0, 32)` carry the schema
//! version (bit `i` holds `version >> i & 1`), and bits from 32 onward carry
//! per-resource permission flags at caller-assigned positions. Bits are
//! stored LSB-first within each byte, so the version equals the
//! little-endian `u32` of the first four bytes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Number of bits reserved for the schema version at the head of a claim.
pub const VERSION_BITS: usize = 32;

/// A byte-backed bit vector with the claim wire layout.
///
/// Writes past the vector length truncate silently: the vector never grows,
/// and no error is raised. Callers size vectors up front from the schema's
/// bit high-water mark.
#[derive(Clone, PartialEq, Eq)]
pub struct ClaimBits {
    bytes: Vec<u8>,
    len: usize,
}

impl ClaimBits {
    /// Allocate an all-zero vector of `len` bits.
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![0; len.div_ceil(8)],
            len,
        }
    }

    /// Wrap raw claim bytes; the bit length is `bytes.len() * 8`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            len: bytes.len() * 8,
        }
    }

    /// Decode a base64-encoded claim payload.
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        Ok(Self::from_bytes(&BASE64.decode(encoded)?))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read bit `index`. Out-of-range reads are unset.
    pub fn get(&self, index: usize) -> bool {
        index < self.len && self.bytes[index / 8] >> (index % 8) & 1 == 1
    }

    fn set(&mut self, index: usize) {
        self.bytes[index / 8] |= 1 << (index % 8);
    }

    fn assign(&mut self, index: usize, value: bool) {
        if value {
            self.bytes[index / 8] |= 1 << (index % 8);
        } else {
            self.bytes[index / 8] &= !(1 << (index % 8));
        }
    }

    /// Write the schema version into bits `[0, 32)`, overwriting any prior
    /// value in that range. Bits at and beyond 32 are untouched. A vector
    /// shorter than 32 bits receives only its in-range portion.
    pub fn set_version(&mut self, version: u32) {
        for i in 0..VERSION_BITS.min(self.len) {
            self.assign(i, version >> i & 1 == 1);
        }
    }

    /// Read the schema version back out of bits `[0, 32)`.
    pub fn version(&self) -> u32 {
        let mut version = 0;
        for i in 0..VERSION_BITS {
            if self.get(i) {
                version |= 1 << i;
            }
        }
        version
    }

    /// Set the bits of `mask` into the vector starting at `position`.
    ///
    /// For each set bit `i` of `mask`, vector bit `position + i` is set.
    /// The walk stops when `position + i` reaches the vector length or no
    /// set bits remain in the shifted mask. Bits are only ever set, never
    /// cleared; a zero mask performs no writes.
    pub fn set_permissions(&mut self, position: usize, mask: u32) {
        let mut i = 0;
        while i < 32 && position + i < self.len {
            let m = mask >> i;
            if m == 0 {
                break;
            }
            if m & 1 == 1 {
                self.set(position + i);
            }
            i += 1;
        }
    }

    /// Read `width` forward bits starting at `position` back into a mask.
    /// Out-of-range bits read as zero.
    pub fn mask_at(&self, position: usize, width: u32) -> u32 {
        let mut mask = 0;
        for i in 0..width.min(32) as usize {
            if self.get(position + i) {
                mask |= 1 << i;
            }
        }
        mask
    }

    /// The packed claim bytes. Trailing bits past `len` are always zero.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Encode the claim payload as base64.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

impl std::fmt::Debug for ClaimBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClaimBits(len={}, {})", self.len, self.to_base64())
    }
}

/// Width in bits of a permission mask: the index of its highest set bit
/// plus one. A zero mask has zero width.
pub fn mask_width(mask: u32) -> u32 {
    32 - mask.leading_zeros()
}

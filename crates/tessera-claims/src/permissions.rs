//! Read-side evaluation of a decoded permission claim

use crate::bits::ClaimBits;
use crate::error::{ClaimError, ClaimResult};

/// An indexable versioned permissions array.
///
/// The immutable read side of the claim codec: a decoded claim payload plus
/// the schema version it was granted against. Evaluation never panics; bits
/// outside the payload simply fail the check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permissions {
    version: u32,
    bits: ClaimBits,
}

impl Permissions {
    /// Wrap a pre-constructed claim vector.
    pub fn new(version: u32, bits: ClaimBits) -> Self {
        Self { version, bits }
    }

    /// Decode a raw claim payload. The version is the little-endian `u32`
    /// in the first four bytes, so anything shorter is rejected.
    pub fn from_bytes(bytes: &[u8]) -> ClaimResult<Self> {
        if bytes.len() < 4 {
            return Err(ClaimError::Truncated(bytes.len()));
        }
        let bits = ClaimBits::from_bytes(bytes);
        Ok(Self {
            version: bits.version(),
            bits,
        })
    }

    /// Decode a base64-encoded claim payload.
    pub fn from_base64(encoded: &str) -> ClaimResult<Self> {
        Self::from_bytes(&ClaimBits::from_base64(encoded)?.into_bytes())
    }

    /// The claim version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Check whether the masked bits are set at a specific position in the
    /// claim. All set bits of `mask` must be granted, and `version` must
    /// match the claim version exactly.
    pub fn has_permissions(&self, version: u32, position: usize, mask: u32) -> bool {
        if version != self.version {
            return false;
        }
        for i in 0..32 {
            let m = mask >> i;
            if m == 0 {
                break;
            }
            if m & 1 == 1 && !self.bits.get(position + i) {
                return false;
            }
        }
        true
    }

    /// The raw claim payload.
    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_bytes()
    }

    /// The claim payload as a base64 string, suitable for carrying as an
    /// opaque claim value.
    pub fn to_base64(&self) -> String {
        self.bits.to_base64()
    }
}

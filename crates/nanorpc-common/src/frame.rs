//! Call framing: the protocol header carried on every request and response.
//!
//! Every request buffer begins with a [`FrameHeader`] followed by the encoded
//! argument tuple; every response begins with the same header echoed verbatim,
//! followed by the encoded return value. The client compares the echoed header
//! against the one it sent, which catches responses cross-wired by connection
//! reuse after a truncated exchange.

use serde::{Deserialize, Serialize};

/// Stable identifier of a remote procedure.
///
/// Derived from the procedure name with [`procedure_id`], or supplied directly
/// by peers that want to bypass name hashing.
pub type ProcedureId = u64;

/// An opaque wire buffer. Ownership moves through the pipeline; buffers are
/// handed off, never shared.
pub type Buffer = Vec<u8>;

/// Version of the framing contract. Bumped only on incompatible changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// The `(protocol_version, procedure_id)` tuple prefixed to every request and
/// every response.
///
/// With the plain-text codec this encodes as `"1 <procedure_id> "`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub protocol: u32,
    pub procedure: ProcedureId,
}

impl FrameHeader {
    /// Header for a call to `procedure` under the current protocol version.
    pub fn new(procedure: ProcedureId) -> Self {
        Self {
            protocol: PROTOCOL_VERSION,
            procedure,
        }
    }
}

/// Derive the [`ProcedureId`] for a procedure name.
///
/// FNV-1a over the UTF-8 bytes of the name. Both peers must use the same
/// derivation for the same name; registering by raw id sidesteps the hash
/// entirely.
pub const fn procedure_id(name: &str) -> ProcedureId {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let bytes = name.as_bytes();
    let mut hash = FNV_OFFSET;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, Deserializer as _, PlainText, Serializer as _};

    #[test]
    fn procedure_id_is_stable() {
        // Locks the derivation: changing the hash silently breaks every
        // deployed peer pair.
        assert_eq!(procedure_id(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(procedure_id("test"), 0xf9e6_e6ef_197c_2b25);
    }

    #[test]
    fn procedure_id_distinguishes_names() {
        assert_ne!(procedure_id("create"), procedure_id("delete"));
    }

    #[test]
    fn header_encodes_as_version_then_id() {
        let header = FrameHeader::new(12345);
        let buffer = PlainText
            .serializer()
            .pack(&header)
            .unwrap()
            .into_buffer();
        assert_eq!(buffer, b"1 12345 ");
    }

    #[test]
    fn header_round_trips() {
        let header = FrameHeader::new(procedure_id("echo"));
        let buffer = PlainText
            .serializer()
            .pack(&header)
            .unwrap()
            .into_buffer();
        let decoded: FrameHeader = PlainText.deserializer(buffer).unpack().unwrap();
        assert_eq!(decoded, header);
    }
}

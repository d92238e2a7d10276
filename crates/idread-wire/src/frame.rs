use std::io::{self, Read};

use crate::error::WireError;

/// Size of the big-endian signed length prefix that opens every frame.
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Size of the big-endian signed frame-kind tag following the length.
pub const KIND_SIZE: usize = 2;

/// Bytes read before a frame body starts.
pub const FRAME_PREFIX_SIZE: usize = LENGTH_PREFIX_SIZE + KIND_SIZE;

/// Fixed metadata of a non-null event inside a value frame: IOC time,
/// pulse id and global time (i64 each), then status and severity (i8).
pub const EVENT_METADATA_SIZE: usize = 8 + 8 + 8 + 1 + 1;

/// Frame kind identifiers.
///
/// ```text
/// ┌──────┬──────────┬───────────────────────────────────────┐
/// │ Wire │ Variant  │ Body                                  │
/// ├──────┼──────────┼───────────────────────────────────────┤
/// │ 0    │ Values   │ one event per declared channel        │
/// │ 1    │ Header   │ hash + compression + channel JSON     │
/// │ *    │ Unknown  │ opaque, skipped by the decoder        │
/// └──────┴──────────┴───────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Values,
    Header,
    /// Any other tag. The raw value is kept for diagnostics.
    Unknown(i16),
}

impl FrameKind {
    /// Return the 2-byte wire tag for this kind.
    #[must_use]
    pub fn wire_id(self) -> i16 {
        match self {
            Self::Values => 0,
            Self::Header => 1,
            Self::Unknown(id) => id,
        }
    }

    /// Parse a wire tag. Unrecognised tags become `Unknown(id)`.
    #[must_use]
    pub fn from_wire_id(id: i16) -> Self {
        match id {
            0 => Self::Values,
            1 => Self::Header,
            other => Self::Unknown(other),
        }
    }
}

/// The 10-byte prefix of a frame.
///
/// ```text
/// ┌────────┬─────────┬──────────────────────────────────────────┐
/// │ Offset │ Size    │ Description                              │
/// ├────────┼─────────┼──────────────────────────────────────────┤
/// │ 0x00   │ 8 bytes │ size: i64 BE, bytes after this field     │
/// │ 0x08   │ 2 bytes │ kind: i16 BE                             │
/// │ 0x0A   │ size-2  │ body                                     │
/// └────────┴─────────┴──────────────────────────────────────────┘
/// ```
///
/// `size` includes the kind tag, so the body is always `size - 2` bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub size: i64,
    pub kind: FrameKind,
}

impl FrameHeader {
    /// Build the prefix for a frame carrying `body_len` bytes.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn for_body(kind: FrameKind, body_len: usize) -> Self {
        Self {
            size: body_len as i64 + KIND_SIZE as i64,
            kind,
        }
    }

    /// Number of body bytes following the prefix.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn body_len(&self) -> u64 {
        // `decode` rejects sizes below 2, so this never underflows for
        // headers read off the wire.
        (self.size - KIND_SIZE as i64).max(0) as u64
    }

    /// Append the 10-byte prefix to `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.size.to_be_bytes());
        buf.extend_from_slice(&self.kind.wire_id().to_be_bytes());
    }

    /// Parse a prefix that has already been read in full.
    ///
    /// `offset` is the stream offset of the prefix and is only used for
    /// error reporting.
    ///
    /// # Errors
    ///
    /// [`WireError::InvalidFrameSize`] if the length is smaller than the
    /// kind tag it must contain.
    pub fn decode(prefix: &[u8; FRAME_PREFIX_SIZE], offset: u64) -> Result<Self, WireError> {
        let mut size_bytes = [0u8; LENGTH_PREFIX_SIZE];
        size_bytes.copy_from_slice(&prefix[..LENGTH_PREFIX_SIZE]);
        let size = i64::from_be_bytes(size_bytes);

        if size < KIND_SIZE as i64 {
            return Err(WireError::InvalidFrameSize { size, offset });
        }

        let kind = i16::from_be_bytes([prefix[8], prefix[9]]);

        Ok(Self {
            size,
            kind: FrameKind::from_wire_id(kind),
        })
    }

    /// Read the next frame prefix from a blocking source.
    ///
    /// Returns `Ok(None)` when the source is exhausted exactly at a frame
    /// boundary: that is the clean end of the stream. Running dry part
    /// way through the prefix is a truncation.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnexpectedEof`] if the source ends inside the prefix.
    /// - [`WireError::InvalidFrameSize`] if the length is below 2.
    /// - [`WireError::Io`] if the source fails.
    pub fn read_from<R: Read>(reader: &mut R, offset: u64) -> Result<Option<Self>, WireError> {
        let mut prefix = [0u8; FRAME_PREFIX_SIZE];
        let filled = read_full(reader, &mut prefix)?;

        if filled == 0 {
            return Ok(None);
        }
        if filled < FRAME_PREFIX_SIZE {
            return Err(WireError::UnexpectedEof {
                offset: offset + filled as u64,
                needed: FRAME_PREFIX_SIZE - filled,
            });
        }

        Self::decode(&prefix, offset).map(Some)
    }
}

/// Read until `buf` is full or the source reports end of input.
///
/// Returns how many bytes were actually filled. Unlike `read_exact` this
/// lets the caller tell "nothing at all" apart from "some, then EOF".
///
/// # Errors
///
/// Propagates any I/O error other than `Interrupted`.
pub fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_roundtrip_through_wire_ids() {
        for kind in [FrameKind::Values, FrameKind::Header, FrameKind::Unknown(7)] {
            assert_eq!(FrameKind::from_wire_id(kind.wire_id()), kind);
        }
        assert_eq!(FrameKind::from_wire_id(-1), FrameKind::Unknown(-1));
    }

    #[test]
    fn prefix_layout_is_big_endian() {
        let mut buf = Vec::new();
        FrameHeader::for_body(FrameKind::Header, 3).write_to(&mut buf);
        assert_eq!(buf, [0, 0, 0, 0, 0, 0, 0, 5, 0, 1]);
    }

    #[test]
    fn read_prefix_then_body_length() {
        let mut buf = Vec::new();
        FrameHeader::for_body(FrameKind::Values, 40).write_to(&mut buf);
        let header = FrameHeader::read_from(&mut buf.as_slice(), 0).unwrap().unwrap();
        assert_eq!(header.kind, FrameKind::Values);
        assert_eq!(header.size, 42);
        assert_eq!(header.body_len(), 40);
    }

    #[test]
    fn empty_source_is_clean_end() {
        let mut empty: &[u8] = &[];
        assert!(FrameHeader::read_from(&mut empty, 0).unwrap().is_none());
    }

    #[test]
    fn partial_prefix_is_truncation() {
        let mut short: &[u8] = &[0, 0, 0, 0, 0, 0, 0, 2, 0];
        let result = FrameHeader::read_from(&mut short, 100);
        assert!(matches!(
            result,
            Err(WireError::UnexpectedEof {
                offset: 109,
                needed: 1
            })
        ));
    }

    #[test]
    fn reject_size_below_kind_tag() {
        let mut prefix = [0u8; FRAME_PREFIX_SIZE];
        prefix[7] = 1;
        let result = FrameHeader::decode(&prefix, 0);
        assert!(matches!(
            result,
            Err(WireError::InvalidFrameSize { size: 1, .. })
        ));
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let mut buf = Vec::new();
        FrameHeader::for_body(FrameKind::Unknown(9), 0).write_to(&mut buf);
        let header = FrameHeader::read_from(&mut buf.as_slice(), 0).unwrap().unwrap();
        assert_eq!(header.kind, FrameKind::Unknown(9));
        assert_eq!(header.body_len(), 0);
    }
}

use idread_types::{ChannelDescriptor, DataHeader};

use crate::decompression::decompress_bitshuffle_lz4;
use crate::error::DecodeError;

/// Length of the opaque hash at the start of a header body.
pub const HASH_SIZE: usize = 8;

/// How the header document is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderCompression {
    None,
    BitshuffleLz4,
}

impl HeaderCompression {
    /// Parse the compression byte that follows the hash.
    ///
    /// # Errors
    ///
    /// [`DecodeError::UnsupportedHeaderCompression`] for anything but 0 or 1.
    pub fn from_byte(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::BitshuffleLz4),
            value => Err(DecodeError::UnsupportedHeaderCompression { value }),
        }
    }
}

/// A decoded header frame.
///
/// ```text
/// ┌──────────┬─────────┬──────────────────────────────────────────┐
/// │ Offset   │ Size    │ Field                                    │
/// ├──────────┼─────────┼──────────────────────────────────────────┤
/// │ 0        │ 8       │ hash (opaque)                            │
/// │ 8        │ 1       │ compression: 0 none, 1 bitshuffle-LZ4    │
/// │ 9        │ rest    │ JSON document, possibly compressed       │
/// └──────────┴─────────┴──────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderFrame {
    /// Producer-assigned hash of the header document. Not verified.
    pub hash: [u8; HASH_SIZE],
    pub compression: HeaderCompression,
    pub htype: Option<String>,
    /// Channels in header order.
    pub channels: Vec<ChannelDescriptor>,
}

impl HeaderFrame {
    /// Decode a header body.
    ///
    /// `offset` is the stream offset of the frame, for error reporting.
    /// Compressed documents are inflated as single-byte elements and may
    /// not exceed `max_decompressed_size`.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::ShortHeader`] if the body is under 9 bytes.
    /// - [`DecodeError::UnsupportedHeaderCompression`] for an unknown
    ///   compression byte.
    /// - Decompression errors for a compressed document.
    /// - [`DecodeError::InvalidUtf8`] if the document is not UTF-8.
    /// - [`DecodeError::Type`] for malformed JSON or a channel that cannot
    ///   be decoded (unsupported type or compression).
    pub fn decode(
        body: &[u8],
        offset: u64,
        max_decompressed_size: usize,
    ) -> Result<Self, DecodeError> {
        if body.len() < HASH_SIZE + 1 {
            return Err(DecodeError::ShortHeader {
                len: body.len(),
                offset,
            });
        }

        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&body[..HASH_SIZE]);
        let compression = HeaderCompression::from_byte(body[HASH_SIZE])?;
        let document = &body[HASH_SIZE + 1..];

        let inflated;
        let json_bytes = match compression {
            HeaderCompression::None => document,
            HeaderCompression::BitshuffleLz4 => {
                inflated = decompress_bitshuffle_lz4(document, 1, max_decompressed_size)?;
                inflated.as_slice()
            }
        };

        let text = std::str::from_utf8(json_bytes)?;
        let header = DataHeader::from_json(text)?;
        let channels = header.descriptors()?;

        Ok(Self {
            hash,
            compression,
            htype: header.htype,
            channels,
        })
    }
}

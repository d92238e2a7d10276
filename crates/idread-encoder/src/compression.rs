//! Producer side of the bitshuffle-LZ4 payload scheme.
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────┐
//! │ 8 bytes BE   │ uncompressed length in bytes                 │
//! │ 4 bytes BE   │ block size in bytes (0 = default)            │
//! │ per block    │ 4 bytes BE compressed length + LZ4 block     │
//! │ tail         │ (n % 8) elements, stored verbatim            │
//! └──────────────┴──────────────────────────────────────────────┘
//! ```

use bytes::BufMut;
use idread_wire::WireError;
use idread_wire::bitshuffle::{self, BLOCK_MULTIPLE};

use crate::error::EncodeError;

/// Bytes before the first block: original length plus block size.
pub const COMPRESSED_PREFIX_SIZE: usize = 12;

/// Bit-shuffle and LZ4-compress `raw`, a run of `element_size`-byte
/// elements, in blocks of `block_elements` elements.
///
/// A `block_elements` of zero is written as-is and selects the default
/// block size on both sides.
///
/// # Errors
///
/// [`WireError::ShuffleMisaligned`] if `raw` is not a whole number of
/// elements or the block size is not a multiple of 8.
pub fn compress_bitshuffle_lz4(
    raw: &[u8],
    element_size: usize,
    block_elements: usize,
) -> Result<Vec<u8>, EncodeError> {
    if element_size == 0 || raw.len() % element_size != 0 {
        return Err(WireError::ShuffleMisaligned {
            len: raw.len(),
            element_size,
        }
        .into());
    }
    if block_elements % BLOCK_MULTIPLE != 0 {
        return Err(WireError::ShuffleMisaligned {
            len: block_elements * element_size,
            element_size,
        }
        .into());
    }

    let block = if block_elements == 0 {
        bitshuffle::default_block_elements(element_size)
    } else {
        block_elements
    };
    let count = raw.len() / element_size;
    let block_bytes = block * element_size;

    let mut out = Vec::with_capacity(COMPRESSED_PREFIX_SIZE + raw.len());
    out.put_u64(raw.len() as u64);
    #[allow(clippy::cast_possible_truncation)]
    out.put_u32((block_elements * element_size) as u32);

    let full_blocks = count / block;
    let leftover = count % block;
    let last_block = leftover - leftover % BLOCK_MULTIPLE;

    let (blocked, tail) = raw.split_at((full_blocks * block + last_block) * element_size);
    for chunk in blocked.chunks(block_bytes) {
        put_block(&mut out, chunk, element_size)?;
    }
    out.put_slice(tail);

    Ok(out)
}

fn put_block(out: &mut Vec<u8>, chunk: &[u8], element_size: usize) -> Result<(), EncodeError> {
    let shuffled = bitshuffle::shuffle(chunk, element_size)?;
    let compressed = lz4_flex::block::compress(&shuffled);
    #[allow(clippy::cast_possible_truncation)]
    out.put_u32(compressed.len() as u32);
    out.put_slice(&compressed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(out: &[u8]) -> (u64, u32) {
        let mut len = [0u8; 8];
        len.copy_from_slice(&out[..8]);
        let mut block = [0u8; 4];
        block.copy_from_slice(&out[8..12]);
        (u64::from_be_bytes(len), u32::from_be_bytes(block))
    }

    #[test]
    fn prefix_records_length_and_block_bytes() {
        let raw = vec![7u8; 64 * 4];
        let out = compress_bitshuffle_lz4(&raw, 4, 16).unwrap();
        assert_eq!(prefix(&out), (256, 64));
    }

    #[test]
    fn zero_block_size_is_kept_in_prefix() {
        let raw = vec![0u8; 80];
        let out = compress_bitshuffle_lz4(&raw, 8, 0).unwrap();
        assert_eq!(prefix(&out), (80, 0));
    }

    #[test]
    fn tail_elements_are_stored_verbatim() {
        // 11 one-byte elements: one 8-element block, then 3 raw bytes.
        let raw: Vec<u8> = (1..=11).collect();
        let out = compress_bitshuffle_lz4(&raw, 1, 8).unwrap();
        assert_eq!(&out[out.len() - 3..], &[9, 10, 11]);
    }

    #[test]
    fn fewer_than_eight_elements_are_not_compressed() {
        let raw: Vec<u8> = 3.5f64.to_le_bytes().to_vec();
        let out = compress_bitshuffle_lz4(&raw, 8, 0).unwrap();
        assert_eq!(out.len(), COMPRESSED_PREFIX_SIZE + 8);
        assert_eq!(&out[COMPRESSED_PREFIX_SIZE..], raw.as_slice());
    }

    #[test]
    fn reject_misaligned_input() {
        assert!(compress_bitshuffle_lz4(&[0u8; 7], 2, 8).is_err());
        assert!(compress_bitshuffle_lz4(&[0u8; 16], 2, 12).is_err());
    }
}

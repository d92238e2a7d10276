//! Inflate bitshuffle-LZ4 payloads.
//!
//! ```text
//! ┌──────────────┬───────────────────────────────────────────────┐
//! │ 8 bytes BE   │ uncompressed length in bytes                  │
//! │ 4 bytes BE   │ block size in bytes (0 = default)             │
//! │ n / B blocks │ 4 bytes BE compressed length + LZ4 block      │
//! │ last block   │ (n % B) rounded down to a multiple of 8       │
//! │ tail         │ (n % 8) elements, verbatim                    │
//! └──────────────┴───────────────────────────────────────────────┘
//!   n = elements in the payload, B = elements per block
//! ```

use idread_wire::bitshuffle::{self, BLOCK_MULTIPLE};

use crate::error::DecodeError;

/// Bytes before the first block.
pub const COMPRESSED_PREFIX_SIZE: usize = 12;

/// Inflate a bitshuffle-LZ4 payload of `element_size`-byte elements.
///
/// The output length comes from the payload's own prefix and must not
/// exceed `max_output`.
///
/// # Errors
///
/// - [`DecodeError::DecompressionBomb`] if the declared length exceeds
///   `max_output`.
/// - [`DecodeError::CorruptBlock`] for every framing problem: a short
///   prefix, a length that is not a whole number of elements, a block
///   size that is not a multiple of 8 elements, a block that runs past
///   the input or inflates to the wrong size, and input left over after
///   the tail.
pub fn decompress_bitshuffle_lz4(
    payload: &[u8],
    element_size: usize,
    max_output: usize,
) -> Result<Vec<u8>, DecodeError> {
    if payload.len() < COMPRESSED_PREFIX_SIZE {
        return Err(corrupt(format!(
            "payload of {} bytes is shorter than the {COMPRESSED_PREFIX_SIZE}-byte prefix",
            payload.len()
        )));
    }
    let (prefix, mut input) = payload.split_at(COMPRESSED_PREFIX_SIZE);
    let original = u64::from_be_bytes(prefix[..8].try_into().map_err(|_| corrupt("prefix"))?);
    let block_bytes = u32::from_be_bytes(prefix[8..].try_into().map_err(|_| corrupt("prefix"))?);

    let output_len = usize::try_from(original)
        .ok()
        .filter(|&len| len <= max_output)
        .ok_or(DecodeError::DecompressionBomb {
            actual: original,
            limit: max_output,
        })?;

    if element_size == 0 || output_len % element_size != 0 {
        return Err(corrupt(format!(
            "length {output_len} is not a whole number of {element_size}-byte elements"
        )));
    }

    let block = match block_bytes as usize / element_size {
        0 => bitshuffle::default_block_elements(element_size),
        b if b % BLOCK_MULTIPLE == 0 => b,
        b => return Err(corrupt(format!("block of {b} elements is not a multiple of 8"))),
    };

    let count = output_len / element_size;
    let leftover = count % block;
    let last_block = leftover - leftover % BLOCK_MULTIPLE;

    let mut out = Vec::with_capacity(output_len);
    for _ in 0..count / block {
        inflate_block(&mut input, block * element_size, element_size, &mut out)?;
    }
    if last_block > 0 {
        inflate_block(&mut input, last_block * element_size, element_size, &mut out)?;
    }

    let tail = (count % BLOCK_MULTIPLE) * element_size;
    if input.len() != tail {
        return Err(corrupt(format!(
            "expected {tail} trailing bytes after the last block, found {}",
            input.len()
        )));
    }
    out.extend_from_slice(input);

    Ok(out)
}

/// Inflate one `[len][LZ4 block]` unit holding `expected` shuffled bytes
/// and append the unshuffled bytes to `out`.
fn inflate_block(
    input: &mut &[u8],
    expected: usize,
    element_size: usize,
    out: &mut Vec<u8>,
) -> Result<(), DecodeError> {
    if input.len() < 4 {
        return Err(corrupt("block length runs past the payload"));
    }
    let (len_bytes, rest) = input.split_at(4);
    let len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    if len > rest.len() {
        return Err(corrupt(format!(
            "block of {len} bytes runs past the payload ({} left)",
            rest.len()
        )));
    }
    let (compressed, rest) = rest.split_at(len);

    let mut shuffled = vec![0u8; expected];
    let written = lz4_flex::block::decompress_into(compressed, &mut shuffled)
        .map_err(|e| corrupt(e.to_string()))?;
    if written != expected {
        return Err(corrupt(format!(
            "block inflated to {written} bytes, expected {expected}"
        )));
    }

    out.extend_from_slice(&bitshuffle::unshuffle(&shuffled, element_size)?);
    *input = rest;
    Ok(())
}

fn corrupt(detail: impl Into<String>) -> DecodeError {
    DecodeError::CorruptBlock(detail.into())
}

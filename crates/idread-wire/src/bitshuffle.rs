//! Bit-shuffle transpose used by the bitshuffle-LZ4 scheme.
//!
//! Bit-shuffling regroups a block of fixed-width elements by bit plane:
//! the output holds, for every byte position of an element and every bit
//! of that byte, one "bit row" with that bit taken from each element in
//! turn. Slowly varying sensor values share most of their high bits, so
//! the rows compress far better than the raw element stream.
//!
//! ```text
//!   elements e0..e(m-1), each `element_size` bytes, m a multiple of 8
//!
//!   out = [ row(j=0,k=0) | row(0,1) | … | row(0,7) | row(1,0) | … ]
//!   row(j,k) = m/8 bytes; bit (i % 8) of byte (i / 8) = bit k of byte j of e_i
//! ```
//!
//! This is the layout of the reference bitshuffle implementation, so the
//! kernels here interoperate with producers that use it.

use crate::error::WireError;

/// Element counts handed to the kernels must be multiples of this.
pub const BLOCK_MULTIPLE: usize = 8;

/// Target bytes per block when a producer leaves the block size at zero.
pub const TARGET_BLOCK_BYTES: usize = 8192;

/// Smallest default block, in elements.
pub const MIN_DEFAULT_BLOCK: usize = 128;

/// Elements per block when the compressed payload declares a block size
/// of zero: 8 KiB worth of elements, rounded down to a multiple of 8, but
/// never fewer than 128.
#[must_use]
pub fn default_block_elements(element_size: usize) -> usize {
    let elements = TARGET_BLOCK_BYTES / element_size.max(1);
    (elements - elements % BLOCK_MULTIPLE).max(MIN_DEFAULT_BLOCK)
}

fn check_layout(len: usize, element_size: usize) -> Result<usize, WireError> {
    if element_size == 0 || len % (element_size * BLOCK_MULTIPLE) != 0 {
        return Err(WireError::ShuffleMisaligned { len, element_size });
    }
    Ok(len / element_size)
}

/// Bit-shuffle a block of `element_size`-byte elements.
///
/// # Errors
///
/// [`WireError::ShuffleMisaligned`] unless `input` holds a multiple of 8
/// whole elements.
pub fn shuffle(input: &[u8], element_size: usize) -> Result<Vec<u8>, WireError> {
    let count = check_layout(input.len(), element_size)?;
    let row_len = count / BLOCK_MULTIPLE;
    let mut out = vec![0u8; input.len()];

    for (i, element) in input.chunks_exact(element_size).enumerate() {
        for (j, &byte) in element.iter().enumerate() {
            if byte == 0 {
                continue;
            }
            for k in 0..8 {
                if (byte >> k) & 1 == 1 {
                    out[(j * 8 + k) * row_len + i / 8] |= 1 << (i % 8);
                }
            }
        }
    }

    Ok(out)
}

/// Reverse [`shuffle`], recovering the original element bytes.
///
/// # Errors
///
/// [`WireError::ShuffleMisaligned`] unless `input` holds a multiple of 8
/// whole elements.
pub fn unshuffle(input: &[u8], element_size: usize) -> Result<Vec<u8>, WireError> {
    let count = check_layout(input.len(), element_size)?;
    let row_len = count / BLOCK_MULTIPLE;
    let mut out = vec![0u8; input.len()];

    for (row_index, row) in input.chunks_exact(row_len.max(1)).enumerate() {
        let j = row_index / 8;
        let k = row_index % 8;
        for (byte_index, &bits) in row.iter().enumerate() {
            if bits == 0 {
                continue;
            }
            for bit in 0..8 {
                if (bits >> bit) & 1 == 1 {
                    let i = byte_index * 8 + bit;
                    out[i * element_size + j] |= 1 << k;
                }
            }
        }
    }

    Ok(out)
}

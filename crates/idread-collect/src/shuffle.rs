//! Byte-plane shuffle for stored datasets.
//!
//! Rows of fixed-width elements are regrouped so byte 0 of every element
//! comes first, then byte 1, and so on. Neighbouring sensor readings share
//! their high bytes, which zstd then compresses well.

/// Transpose `input` into byte planes. Single-byte elements are copied.
pub(crate) fn shuffle(input: &[u8], element_size: usize) -> Vec<u8> {
    if element_size <= 1 {
        return input.to_vec();
    }
    let count = input.len() / element_size;
    let mut out = vec![0u8; input.len()];
    for (j, element) in input.chunks_exact(element_size).enumerate() {
        for (i, &byte) in element.iter().enumerate() {
            out[i * count + j] = byte;
        }
    }
    out
}

/// Inverse of [`shuffle`]. Returns `None` if `input` is not a whole
/// number of elements.
pub(crate) fn unshuffle(input: &[u8], element_size: usize) -> Option<Vec<u8>> {
    if element_size <= 1 {
        return Some(input.to_vec());
    }
    if input.len() % element_size != 0 {
        return None;
    }
    let count = input.len() / element_size;
    let mut out = vec![0u8; input.len()];
    for (i, plane) in input.chunks_exact(count.max(1)).enumerate() {
        for (j, &byte) in plane.iter().enumerate() {
            out[j * element_size + i] = byte;
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planes_are_grouped() {
        let input = [1, 2, 3, 4, 5, 6];
        assert_eq!(shuffle(&input, 2), [1, 3, 5, 2, 4, 6]);
        assert_eq!(unshuffle(&[1, 3, 5, 2, 4, 6], 2).unwrap(), input);
    }

    #[test]
    fn misaligned_input_is_rejected() {
        assert!(unshuffle(&[0; 5], 4).is_none());
        assert!(unshuffle(&[], 4).unwrap().is_empty());
    }
}

/// Resource limits applied while decoding.
///
/// Both limits guard against hostile or corrupt length fields: a frame
/// body is never allocated beyond `max_frame_size`, and a compressed
/// payload is never inflated beyond `max_decompressed_size`.
///
/// ```text
/// ┌────────────────────────┬──────────┐
/// │ Limit                  │ Default  │
/// ├────────────────────────┼──────────┤
/// │ max_frame_size         │ 256 MiB  │
/// │ max_decompressed_size  │ 256 MiB  │
/// └────────────────────────┴──────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Largest frame body (in bytes) that will be read into memory.
    pub max_frame_size: u64,
    /// Largest output a single compressed payload may inflate to.
    pub max_decompressed_size: usize,
}

/// 256 MiB.
pub const DEFAULT_LIMIT: usize = 256 * 1024 * 1024;

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_LIMIT as u64,
            max_decompressed_size: DEFAULT_LIMIT,
        }
    }
}

use crate::error::WireError;

/// Byte order of a channel's integers and elements.
///
/// Frame prefixes and compression framing are always big-endian; only the
/// per-event fields and element payloads follow the channel's order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Map the header's `encoding` attribute. Only `"big"` selects
    /// big-endian; anything else, including absence, is little-endian.
    #[must_use]
    pub fn from_encoding(encoding: Option<&str>) -> Self {
        match encoding {
            Some("big") => Self::Big,
            _ => Self::Little,
        }
    }

    /// The `encoding` attribute value for this order.
    #[must_use]
    pub fn encoding_name(self) -> &'static str {
        match self {
            Self::Little => "little",
            Self::Big => "big",
        }
    }

    #[must_use]
    pub fn is_big(self) -> bool {
        self == Self::Big
    }
}

/// Bounds-checked reader over one frame body.
///
/// Every read checks the remaining length first and reports a
/// [`WireError::UnexpectedEof`] carrying the body offset instead of
/// panicking, so a frame that under-declares its size surfaces as an
/// error the caller can classify.
///
/// ```text
///   let mut cursor = BodyCursor::new(body);
///   let event_size = cursor.read_i32(order)?;
///   let payload = cursor.take(n)?;
///   // cursor.position() == bytes consumed so far
/// ```
pub struct BodyCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BodyCursor<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left in the body.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Borrow the next `n` bytes and advance past them.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer than `n` bytes remain.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if n > self.remaining() {
            return Err(WireError::UnexpectedEof {
                offset: self.pos as u64,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Copy the next `N` bytes into a fixed array.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer than `N` bytes remain.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if the body is exhausted.
    pub fn read_i8(&mut self) -> Result<i8, WireError> {
        let [b] = self.read_array::<1>()?;
        Ok(i8::from_ne_bytes([b]))
    }

    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer than 4 bytes remain.
    pub fn read_i32(&mut self, order: ByteOrder) -> Result<i32, WireError> {
        let bytes = self.read_array::<4>()?;
        Ok(match order {
            ByteOrder::Little => i32::from_le_bytes(bytes),
            ByteOrder::Big => i32::from_be_bytes(bytes),
        })
    }

    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer than 8 bytes remain.
    pub fn read_i64(&mut self, order: ByteOrder) -> Result<i64, WireError> {
        let bytes = self.read_array::<8>()?;
        Ok(match order {
            ByteOrder::Little => i64::from_le_bytes(bytes),
            ByteOrder::Big => i64::from_be_bytes(bytes),
        })
    }

    /// Consume and return everything that is left.
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }
}

use bytes::BufMut;
use idread_wire::{ByteOrder, FrameHeader, FrameKind};

/// Serializer for one frame body.
///
/// Integer fields are written in the byte order the writer was created
/// with, matching how a channel's event metadata is laid out. Compression
/// framing is always big-endian and bypasses the order via
/// [`put_slice`](Self::put_slice).
pub struct BodyWriter {
    buf: Vec<u8>,
    order: ByteOrder,
}

impl BodyWriter {
    #[must_use]
    pub fn new(order: ByteOrder) -> Self {
        Self {
            buf: Vec::new(),
            order,
        }
    }

    /// Switch the byte order used by subsequent integer writes.
    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    pub fn put_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    pub fn put_i32(&mut self, value: i32) {
        match self.order {
            ByteOrder::Little => self.buf.put_i32_le(value),
            ByteOrder::Big => self.buf.put_i32(value),
        }
    }

    pub fn put_i64(&mut self, value: i64) {
        match self.order {
            ByteOrder::Little => self.buf.put_i64_le(value),
            ByteOrder::Big => self.buf.put_i64(value),
        }
    }

    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer and return the body bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Append a complete frame (prefix + body) to `out`.
pub fn write_frame(out: &mut Vec<u8>, kind: FrameKind, body: &[u8]) {
    FrameHeader::for_body(kind, body.len()).write_to(out);
    out.put_slice(body);
}

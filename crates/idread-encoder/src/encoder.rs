use idread_types::{ChannelDescriptor, Compression, DataHeader, EventData};
use idread_wire::frame::EVENT_METADATA_SIZE;
use idread_wire::{ByteOrder, FrameKind};

use crate::compression::compress_bitshuffle_lz4;
use crate::error::EncodeError;
use crate::frame_writer::{BodyWriter, write_frame};

/// Length of the opaque hash that opens a header body.
pub const HEADER_HASH_SIZE: usize = 8;

/// Header compression byte values.
pub const HEADER_UNCOMPRESSED: u8 = 0;
pub const HEADER_BITSHUFFLE_LZ4: u8 = 1;

/// Producer for idread streams.
///
/// The encoder appends frames to an in-memory buffer. It remembers the
/// channel list of the last header so value frames can be laid out and
/// checked against it.
///
/// # Usage
///
/// ```rust
/// use idread_encoder::StreamEncoder;
/// use idread_types::{ChannelDescriptor, ElementKind, EventData, Scalar};
///
/// let channels = [ChannelDescriptor::new("SINEG01:X1", "sf-databuffer", ElementKind::Float64)];
/// let mut encoder = StreamEncoder::new();
/// encoder.write_header(&channels).unwrap();
/// encoder
///     .write_values(&[Some(EventData::new(Scalar::Float64(2.5)).with_pulse_id(1))])
///     .unwrap();
/// let stream = encoder.into_bytes();
/// assert!(!stream.is_empty());
/// ```
///
/// # Output layout
///
/// ```text
/// ┌────────────────────────┬─────────────────────────────────────────┐
/// │ header frame (kind 1)  │ hash[8] | compression[1] | JSON         │
/// │ value frame (kind 0)   │ per channel: size[4] | meta[26] | data  │
/// │ value frame (kind 0)   │ ...                                     │
/// │ header frame (kind 1)  │ replaces the channel list               │
/// └────────────────────────┴─────────────────────────────────────────┘
/// ```
#[derive(Default)]
pub struct StreamEncoder {
    buf: Vec<u8>,
    channels: Vec<ChannelDescriptor>,
    compress_header: bool,
    block_elements: usize,
}

impl StreamEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compress subsequent header documents with bitshuffle-LZ4.
    pub fn compress_header(&mut self, enabled: bool) -> &mut Self {
        self.compress_header = enabled;
        self
    }

    /// Elements per compressed block for bitshuffle-LZ4 payloads.
    ///
    /// Zero (the default) writes a block size of zero, which selects the
    /// default block size on decode.
    pub fn block_elements(&mut self, elements: usize) -> &mut Self {
        self.block_elements = elements;
        self
    }

    /// The channel list value frames are currently encoded against.
    #[must_use]
    pub fn channels(&self) -> &[ChannelDescriptor] {
        &self.channels
    }

    /// Append a header frame describing `channels` and make it current.
    ///
    /// # Errors
    ///
    /// [`EncodeError::Type`] if the header cannot be serialized, or
    /// [`EncodeError::Wire`] if header compression fails.
    pub fn write_header(&mut self, channels: &[ChannelDescriptor]) -> Result<&mut Self, EncodeError> {
        let json = DataHeader::from_descriptors(channels).to_json()?;
        self.write_header_json(&json)?;
        self.channels = channels.to_vec();
        Ok(self)
    }

    /// Append a header frame carrying `json` verbatim.
    ///
    /// The current channel list is cleared, since the document may not
    /// describe anything this encoder can lay out.
    ///
    /// # Errors
    ///
    /// [`EncodeError::Wire`] if header compression fails.
    pub fn write_header_json(&mut self, json: &str) -> Result<&mut Self, EncodeError> {
        let hash = blake3::hash(json.as_bytes());

        let mut body = BodyWriter::new(ByteOrder::Big);
        body.put_slice(&hash.as_bytes()[..HEADER_HASH_SIZE]);
        if self.compress_header {
            body.put_slice(&[HEADER_BITSHUFFLE_LZ4]);
            body.put_slice(&compress_bitshuffle_lz4(json.as_bytes(), 1, self.block_elements)?);
        } else {
            body.put_slice(&[HEADER_UNCOMPRESSED]);
            body.put_slice(json.as_bytes());
        }

        write_frame(&mut self.buf, FrameKind::Header, &body.finish());
        self.channels.clear();
        Ok(self)
    }

    /// Append a value frame holding one event per current channel.
    ///
    /// `None` entries are written as null events (a zero event size).
    ///
    /// # Errors
    ///
    /// - [`EncodeError::ChannelCountMismatch`] unless there is exactly
    ///   one entry per channel.
    /// - [`EncodeError::KindMismatch`] if a value's element type differs
    ///   from its channel.
    /// - [`EncodeError::EventTooLarge`] if an event exceeds `i32::MAX`.
    pub fn write_values(&mut self, events: &[Option<EventData>]) -> Result<&mut Self, EncodeError> {
        self.write_values_padded(events, 0)
    }

    /// Like [`write_values`](Self::write_values), then append `padding`
    /// zero bytes the frame size accounts for but no event claims.
    ///
    /// # Errors
    ///
    /// As for [`write_values`](Self::write_values).
    pub fn write_values_padded(
        &mut self,
        events: &[Option<EventData>],
        padding: usize,
    ) -> Result<&mut Self, EncodeError> {
        if events.len() != self.channels.len() {
            return Err(EncodeError::ChannelCountMismatch {
                expected: self.channels.len(),
                actual: events.len(),
            });
        }

        let mut body = BodyWriter::new(ByteOrder::Little);
        for (channel, event) in self.channels.iter().zip(events) {
            body.set_order(channel.byte_order);
            match event {
                None => body.put_i32(0),
                Some(data) => self.put_event(&mut body, channel, data)?,
            }
        }
        body.put_slice(&vec![0u8; padding]);

        write_frame(&mut self.buf, FrameKind::Values, &body.finish());
        Ok(self)
    }

    fn put_event(
        &self,
        body: &mut BodyWriter,
        channel: &ChannelDescriptor,
        data: &EventData,
    ) -> Result<(), EncodeError> {
        if data.value.kind() != channel.kind {
            return Err(EncodeError::KindMismatch {
                channel: channel.name.clone(),
                expected: channel.kind,
                actual: data.value.kind(),
            });
        }

        let mut raw = Vec::new();
        data.value.write_bytes(channel.byte_order, &mut raw);
        let payload = match channel.compression {
            Compression::None => raw,
            Compression::BitshuffleLz4 => {
                compress_bitshuffle_lz4(&raw, channel.element_size(), self.block_elements)?
            }
        };

        let size = EVENT_METADATA_SIZE + payload.len();
        let size_field = i32::try_from(size).map_err(|_| EncodeError::EventTooLarge {
            channel: channel.name.clone(),
            size,
        })?;

        body.put_i32(size_field);
        body.put_i64(data.ioc_time_nanos);
        body.put_i64(data.pulse_id);
        body.put_i64(data.global_time_nanos);
        body.put_i8(data.status);
        body.put_i8(data.severity);
        body.put_slice(&payload);
        Ok(())
    }

    /// Append a frame of any kind with an arbitrary body.
    ///
    /// Used to produce frames a conforming decoder must skip, such as
    /// unknown kinds or value frames with no preceding header.
    pub fn write_raw_frame(&mut self, kind: FrameKind, body: &[u8]) -> &mut Self {
        write_frame(&mut self.buf, kind, body);
        self
    }

    /// Append bytes outside any frame, e.g. to simulate a cut stream.
    pub fn write_raw_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

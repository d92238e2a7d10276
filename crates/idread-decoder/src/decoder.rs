use std::io::Read;

use idread_types::{ChannelDescriptor, Collector};

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::frame_reader::FrameReader;
use crate::header::HeaderFrame;
use crate::report::{DecodeReport, FrameInfo};
use crate::session::{DecodeSession, Plan};

/// A finalized collector output together with the decode report.
#[derive(Debug)]
pub struct Decoded<T> {
    pub output: T,
    pub report: DecodeReport,
}

/// Blocking, pull-based idread decoder.
///
/// The decoder reads one frame per call to [`next_frame`](Self::next_frame)
/// and buffers at most one frame body. Frames are processed as follows:
///
///   1. **Header** (kind 1): decode the hash, compression byte and
///      channel document; the new channel list replaces the old one and
///      is announced to the collector.
///   2. **Values** (kind 0): decode one event per channel and hand each
///      to the collector. With no channels declared, the body is drained
///      and a warning recorded.
///   3. **Anything else**: drain the body and record a warning.
///
/// The stream ends cleanly when the source is exhausted exactly at a
/// frame boundary.
///
/// # Example
///
/// ```rust
/// use idread_decoder::StreamDecoder;
/// use idread_encoder::StreamEncoder;
/// use idread_types::{ChannelDescriptor, ElementKind, EventData, OwnedEvent, Scalar};
///
/// let mut encoder = StreamEncoder::new();
/// encoder
///     .write_header(&[ChannelDescriptor::new("X", "sf-databuffer", ElementKind::Int64)])
///     .unwrap()
///     .write_values(&[Some(EventData::new(Scalar::Int64(12)))])
///     .unwrap();
/// let stream = encoder.into_bytes();
///
/// let mut events: Vec<OwnedEvent> = Vec::new();
/// let mut decoder = StreamDecoder::new(stream.as_slice());
/// let report = decoder.run(&mut events).unwrap();
/// assert_eq!(report.events, 1);
/// assert!(!report.is_degraded());
/// ```
pub struct StreamDecoder<R> {
    frames: FrameReader<R>,
    session: DecodeSession,
    /// Reused across frames.
    buf: Vec<u8>,
}

impl<R: Read> StreamDecoder<R> {
    /// Create a decoder with the default limits.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, DecoderConfig::default())
    }

    #[must_use]
    pub fn with_config(reader: R, config: DecoderConfig) -> Self {
        Self {
            frames: FrameReader::new(reader),
            session: DecodeSession::new(config),
            buf: Vec::new(),
        }
    }

    /// Read and process the next frame.
    ///
    /// Returns `Ok(None)` at a clean end of stream.
    ///
    /// # Errors
    ///
    /// Any [`DecodeError`]. Errors are fatal: the stream position is left
    /// just past the failing frame (or wherever the source ran dry) and
    /// the decoder should not be driven further.
    pub fn next_frame<C: Collector>(
        &mut self,
        collector: &mut C,
    ) -> Result<Option<FrameInfo>, DecodeError> {
        let Some((offset, frame)) = self.frames.next_header()? else {
            return Ok(None);
        };

        let limit = self.session.config().max_frame_size;
        let info = match self.session.plan(&frame) {
            Plan::Skip => {
                let skipped = self.frames.skip_body(&frame)?;
                self.session.skipped(offset, &frame, skipped)
            }
            Plan::Header => {
                self.frames.read_body(&frame, limit, &mut self.buf)?;
                self.session.set_position(self.frames.position());
                self.session.apply_header(offset, &frame, &self.buf, collector)?
            }
            Plan::Values => {
                self.frames.read_body(&frame, limit, &mut self.buf)?;
                self.session.set_position(self.frames.position());
                self.session.apply_values(offset, &frame, &self.buf, collector)?
            }
        };

        self.session.set_position(self.frames.position());
        Ok(Some(info))
    }

    /// Decode every remaining frame into `collector`.
    ///
    /// The collector is not finalized; see [`decode`] for the one-shot
    /// form that does.
    ///
    /// # Errors
    ///
    /// The first [`DecodeError`] met.
    pub fn run<C: Collector>(&mut self, collector: &mut C) -> Result<&DecodeReport, DecodeError> {
        while self.next_frame(collector)?.is_some() {}
        Ok(self.session.report())
    }

    /// Channels of the most recent header, empty before the first one.
    #[must_use]
    pub fn channels(&self) -> &[ChannelDescriptor] {
        self.session.channels()
    }

    /// The most recent header frame.
    #[must_use]
    pub fn header(&self) -> Option<&HeaderFrame> {
        self.session.header()
    }

    #[must_use]
    pub fn report(&self) -> &DecodeReport {
        self.session.report()
    }

    /// Stream offset of the next unread byte.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.frames.position()
    }

    #[must_use]
    pub fn into_report(self) -> DecodeReport {
        self.session.into_report()
    }
}

/// Decode a whole stream into `collector` and finalize it.
///
/// # Errors
///
/// Any [`DecodeError`] from decoding, or [`DecodeError::Collector`] if
/// finalizing fails.
pub fn decode<R: Read, C: Collector>(
    reader: R,
    mut collector: C,
) -> Result<Decoded<C::Output>, DecodeError> {
    let mut decoder = StreamDecoder::new(reader);
    decoder.run(&mut collector)?;
    let report = decoder.into_report();
    let output = collector.finalize().map_err(DecodeError::collector)?;
    Ok(Decoded { output, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{DecodeWarning, FrameOutcome};
    use idread_encoder::StreamEncoder;
    use idread_types::{ElementKind, EventData, OwnedEvent, Scalar};
    use idread_wire::FrameKind;

    fn channel(name: &str) -> ChannelDescriptor {
        ChannelDescriptor::new(name, "sf", ElementKind::Int32)
    }

    fn event(v: i32) -> Option<EventData> {
        Some(EventData::new(Scalar::Int32(v)).with_pulse_id(i64::from(v)))
    }

    #[test]
    fn frame_by_frame() {
        let mut encoder = StreamEncoder::new();
        encoder
            .write_header(&[channel("A")])
            .unwrap()
            .write_values(&[event(1)])
            .unwrap();
        let stream = encoder.into_bytes();

        let mut events: Vec<OwnedEvent> = Vec::new();
        let mut decoder = StreamDecoder::new(stream.as_slice());

        let first = decoder.next_frame(&mut events).unwrap().unwrap();
        assert_eq!(first.outcome, FrameOutcome::Header { channels: 1 });
        assert_eq!(decoder.channels()[0].name, "A");

        let second = decoder.next_frame(&mut events).unwrap().unwrap();
        assert_eq!(second.kind, FrameKind::Values);
        assert!(matches!(second.outcome, FrameOutcome::Values { events: 1, .. }));

        assert!(decoder.next_frame(&mut events).unwrap().is_none());
        assert_eq!(decoder.position(), stream.len() as u64);
        assert_eq!(decoder.report().bytes, stream.len() as u64);
    }

    #[test]
    fn new_header_replaces_channels() {
        let mut encoder = StreamEncoder::new();
        encoder.write_header(&[channel("A"), channel("B")]).unwrap();
        encoder.write_values(&[event(1), event(2)]).unwrap();
        encoder.write_header(&[channel("C")]).unwrap();
        encoder.write_values(&[event(3)]).unwrap();

        let decoded = decode(encoder.as_bytes(), Vec::<OwnedEvent>::new()).unwrap();
        let names: Vec<_> = decoded.output.iter().map(|e| e.channel.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(decoded.report.header_frames, 2);
        assert_eq!(decoded.report.value_frames, 2);
    }

    #[test]
    fn values_before_header_are_skipped() {
        let mut encoder = StreamEncoder::new();
        encoder.write_raw_frame(FrameKind::Values, &[0; 6]);
        encoder.write_header(&[channel("A")]).unwrap();
        encoder.write_values(&[event(5)]).unwrap();

        let decoded = decode(encoder.as_bytes(), Vec::<OwnedEvent>::new()).unwrap();
        assert_eq!(decoded.output.len(), 1);
        assert_eq!(
            decoded.report.warnings,
            [DecodeWarning::ValuesBeforeHeader {
                offset: 0,
                skipped: 6
            }]
        );
        assert!(decoded.report.is_degraded());
    }

    #[test]
    fn oversize_frame_is_rejected() {
        let mut encoder = StreamEncoder::new();
        encoder.write_header(&[channel("A")]).unwrap();
        let config = DecoderConfig {
            max_frame_size: 4,
            ..DecoderConfig::default()
        };
        let mut decoder = StreamDecoder::with_config(encoder.as_bytes(), config);
        let result = decoder.run(&mut Vec::<OwnedEvent>::new());
        assert!(matches!(result, Err(DecodeError::FrameTooLarge { .. })));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("full")]
    struct Full;

    struct Refuse;

    impl Collector for Refuse {
        type Output = ();
        type Error = Full;

        fn accept(&mut self, _event: idread_types::Event<'_>) -> Result<(), Full> {
            Err(Full)
        }

        fn finalize(self) -> Result<(), Full> {
            Ok(())
        }
    }

    #[test]
    fn collector_error_is_classified() {
        let mut encoder = StreamEncoder::new();
        encoder.write_header(&[channel("A")]).unwrap();
        encoder.write_values(&[event(1)]).unwrap();
        let err = decode(encoder.as_bytes(), Refuse).unwrap_err();
        assert_eq!(err.kind(), crate::DecodeErrorKind::Collector);
    }
}

use idread_types::{ChannelDescriptor, Collector};
use idread_wire::FrameHeader;
use idread_wire::frame::FRAME_PREFIX_SIZE;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::DecoderConfig;
use crate::decoder::Decoded;
use crate::error::DecodeError;
use crate::frame_reader::checked_body_len;
use crate::header::HeaderFrame;
use crate::report::{DecodeReport, FrameInfo};
use crate::session::{DecodeSession, Plan};

/// Asynchronous idread decoder over any [`AsyncRead`] source.
///
/// Frame handling is identical to [`StreamDecoder`](crate::StreamDecoder);
/// only the byte source differs. Backpressure is natural: the next frame
/// is only read when the caller awaits it.
///
/// # Example
///
/// ```rust,no_run
/// use idread_decoder::AsyncStreamDecoder;
/// use idread_types::OwnedEvent;
/// use tokio::net::TcpStream;
///
/// async fn tail(addr: &str) -> Result<(), Box<dyn std::error::Error>> {
///     let socket = TcpStream::connect(addr).await?;
///     let mut decoder = AsyncStreamDecoder::new(socket);
///     let mut events: Vec<OwnedEvent> = Vec::new();
///     while let Some(frame) = decoder.next_frame(&mut events).await? {
///         println!("{} at {}", events.len(), frame.offset);
///     }
///     Ok(())
/// }
/// ```
pub struct AsyncStreamDecoder<R> {
  reader: R,
  offset: u64,
  session: DecodeSession,
  buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> AsyncStreamDecoder<R> {
  #[must_use]
  pub fn new(reader: R) -> Self {
    Self::with_config(reader, DecoderConfig::default())
  }

  #[must_use]
  pub fn with_config(reader: R, config: DecoderConfig) -> Self {
    Self {
      reader,
      offset: 0,
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
  /// Any [`DecodeError`]; errors are fatal.
  pub async fn next_frame<C: Collector>(
    &mut self,
    collector: &mut C,
  ) -> Result<Option<FrameInfo>, DecodeError> {
    let Some((offset, frame)) = self.read_prefix().await? else {
      return Ok(None);
    };

    let info = match self.session.plan(&frame) {
      Plan::Skip => {
        let skipped = self.skip_body(&frame).await?;
        self.session.skipped(offset, &frame, skipped)
      }
      Plan::Header => {
        self.read_body(&frame).await?;
        self.session.set_position(self.offset);
        self.session.apply_header(offset, &frame, &self.buf, collector)?
      }
      Plan::Values => {
        self.read_body(&frame).await?;
        self.session.set_position(self.offset);
        self.session.apply_values(offset, &frame, &self.buf, collector)?
      }
    };

    self.session.set_position(self.offset);
    Ok(Some(info))
  }

  /// Decode every remaining frame into `collector`.
  ///
  /// # Errors
  ///
  /// The first [`DecodeError`] met.
  pub async fn run<C: Collector>(
    &mut self,
    collector: &mut C,
  ) -> Result<&DecodeReport, DecodeError> {
    while self.next_frame(collector).await?.is_some() {}
    Ok(self.session.report())
  }

  #[must_use]
  pub fn channels(&self) -> &[ChannelDescriptor] {
    self.session.channels()
  }

  #[must_use]
  pub fn header(&self) -> Option<&HeaderFrame> {
    self.session.header()
  }

  #[must_use]
  pub fn report(&self) -> &DecodeReport {
    self.session.report()
  }

  #[must_use]
  pub fn position(&self) -> u64 {
    self.offset
  }

  #[must_use]
  pub fn into_report(self) -> DecodeReport {
    self.session.into_report()
  }

  async fn read_prefix(&mut self) -> Result<Option<(u64, FrameHeader)>, DecodeError> {
    let start = self.offset;
    let mut prefix = [0u8; FRAME_PREFIX_SIZE];
    let filled = self.read_full(&mut prefix).await?;

    if filled == 0 {
      return Ok(None);
    }
    if filled < FRAME_PREFIX_SIZE {
      return Err(DecodeError::Truncated {
        offset: self.offset,
        needed: (FRAME_PREFIX_SIZE - filled) as u64,
      });
    }
    let frame = FrameHeader::decode(&prefix, start)?;
    Ok(Some((start, frame)))
  }

  async fn read_body(&mut self, frame: &FrameHeader) -> Result<(), DecodeError> {
    let len = checked_body_len(frame, self.session.config().max_frame_size, self.offset)?;
    let mut buf = std::mem::take(&mut self.buf);
    buf.clear();
    buf.resize(len, 0);
    let filled = self.read_full(&mut buf).await;
    self.buf = buf;

    let filled = filled?;
    if filled < len {
      return Err(DecodeError::Truncated {
        offset: self.offset,
        needed: (len - filled) as u64,
      });
    }
    Ok(())
  }

  async fn skip_body(&mut self, frame: &FrameHeader) -> Result<u64, DecodeError> {
    let len = frame.body_len();
    let copied =
      tokio::io::copy(&mut (&mut self.reader).take(len), &mut tokio::io::sink()).await?;
    self.offset += copied;
    if copied < len {
      return Err(DecodeError::Truncated {
        offset: self.offset,
        needed: len - copied,
      });
    }
    Ok(copied)
  }

  /// Fill `buf` or stop at end of input, returning the bytes read.
  async fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut filled = 0;
    while filled < buf.len() {
      match self.reader.read(&mut buf[filled..]).await {
        Ok(0) => break,
        Ok(n) => filled += n,
        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
        Err(e) => return Err(e.into()),
      }
    }
    self.offset += filled as u64;
    Ok(filled)
  }
}

/// Decode a whole async stream into `collector` and finalize it.
///
/// # Errors
///
/// Any [`DecodeError`] from decoding, or [`DecodeError::Collector`] if
/// finalizing fails.
pub async fn decode_async<R, C>(
  reader: R,
  mut collector: C,
) -> Result<Decoded<C::Output>, DecodeError>
where
  R: AsyncRead + Unpin,
  C: Collector,
{
  let mut decoder = AsyncStreamDecoder::new(reader);
  decoder.run(&mut collector).await?;
  let report = decoder.into_report();
  let output = collector.finalize().map_err(DecodeError::collector)?;
  Ok(Decoded { output, report })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::decoder::decode;
  use idread_encoder::StreamEncoder;
  use idread_types::{ElementKind, EventData, OwnedEvent, Scalar};
  use idread_wire::FrameKind;

  fn sample_stream() -> Vec<u8> {
    let channels = [
      ChannelDescriptor::new("A", "sf", ElementKind::UInt16),
      ChannelDescriptor::new("B", "sf", ElementKind::Float32).with_shape(vec![4]),
    ];
    let mut encoder = StreamEncoder::new();
    encoder.write_header(&channels).unwrap();
    for pulse in 0..5u16 {
      let b = (pulse % 2 == 0).then(|| {
        EventData::new(idread_types::Array::flat(vec![f32::from(pulse); 4].into()))
          .with_pulse_id(i64::from(pulse))
      });
      encoder
        .write_values(&[Some(EventData::new(Scalar::UInt16(pulse))), b])
        .unwrap();
    }
    encoder.write_raw_frame(FrameKind::Unknown(42), b"ignored");
    encoder.into_bytes()
  }

  #[tokio::test]
  async fn async_matches_sync() {
    let stream = sample_stream();
    let sync = decode(stream.as_slice(), Vec::<OwnedEvent>::new()).unwrap();

    let reader = tokio::io::BufReader::new(std::io::Cursor::new(stream.clone()));
    let streamed = decode_async(reader, Vec::<OwnedEvent>::new()).await.unwrap();

    assert_eq!(sync.output, streamed.output);
    assert_eq!(sync.report, streamed.report);
    assert_eq!(streamed.report.events, 10);
    assert_eq!(streamed.report.null_events, 2);
  }

  #[tokio::test]
  async fn async_truncation_is_transport_error() {
    let mut stream = sample_stream();
    stream.truncate(stream.len() - 3);
    let reader = std::io::Cursor::new(stream);
    let err = decode_async(reader, Vec::<OwnedEvent>::new()).await.unwrap_err();
    assert_eq!(err.kind(), crate::DecodeErrorKind::Transport);
  }

  #[tokio::test]
  async fn async_clean_end_on_empty_input() {
    let mut decoder = AsyncStreamDecoder::new(std::io::Cursor::new(Vec::new()));
    let mut events: Vec<OwnedEvent> = Vec::new();
    assert!(decoder.next_frame(&mut events).await.unwrap().is_none());
    assert_eq!(decoder.position(), 0);
  }
}

use std::io::{self, Read};

use idread_wire::FrameHeader;
use idread_wire::frame::{FRAME_PREFIX_SIZE, read_full};

use crate::error::DecodeError;

/// Blocking frame reader over any [`Read`] source.
///
/// `FrameReader` only knows about frame boundaries: it reads the 10-byte
/// prefix, then either reads the body into a caller buffer or drains it.
/// It tracks the absolute stream offset so every error and warning can
/// point at the frame it came from.
///
/// # Usage pattern
///
/// ```text
///   let mut frames = FrameReader::new(source);
///   while let Some((offset, header)) = frames.next_header()? {
///       match header.kind {
///           FrameKind::Header | FrameKind::Values => frames.read_body(&header, limit, &mut buf)?,
///           FrameKind::Unknown(_) => frames.skip_body(&header)?,
///       }
///   }
/// ```
pub struct FrameReader<R> {
  reader: R,
  offset: u64,
}

impl<R: Read> FrameReader<R> {
  #[must_use]
  pub fn new(reader: R) -> Self {
    Self { reader, offset: 0 }
  }

  /// Stream offset of the next unread byte.
  #[must_use]
  pub fn position(&self) -> u64 {
    self.offset
  }

  /// Read the next frame prefix.
  ///
  /// Returns `Ok(None)` at a clean end of stream, or the prefix together
  /// with the offset it started at.
  ///
  /// # Errors
  ///
  /// - [`DecodeError::Truncated`] if the source ends inside the prefix.
  /// - [`DecodeError::InvalidFrameSize`] if the size is below 2.
  /// - [`DecodeError::Io`] if the source fails.
  pub fn next_header(&mut self) -> Result<Option<(u64, FrameHeader)>, DecodeError> {
    let start = self.offset;
    match FrameHeader::read_from(&mut self.reader, start)? {
      Some(header) => {
        self.offset += FRAME_PREFIX_SIZE as u64;
        Ok(Some((start, header)))
      }
      None => Ok(None),
    }
  }

  /// Read a frame body into `buf`, replacing its contents.
  ///
  /// # Errors
  ///
  /// - [`DecodeError::FrameTooLarge`] if the body exceeds `limit`; nothing
  ///   is read or allocated.
  /// - [`DecodeError::Truncated`] if the source ends inside the body.
  pub fn read_body(
    &mut self,
    header: &FrameHeader,
    limit: u64,
    buf: &mut Vec<u8>,
  ) -> Result<(), DecodeError> {
    let len = checked_body_len(header, limit, self.offset)?;
    buf.clear();
    buf.resize(len, 0);

    let filled = read_full(&mut self.reader, buf)?;
    self.offset += filled as u64;
    if filled < len {
      return Err(DecodeError::Truncated {
        offset: self.offset,
        needed: (len - filled) as u64,
      });
    }
    Ok(())
  }

  /// Drain a frame body without buffering it.
  ///
  /// # Errors
  ///
  /// [`DecodeError::Truncated`] if the source ends inside the body.
  pub fn skip_body(&mut self, header: &FrameHeader) -> Result<u64, DecodeError> {
    let len = header.body_len();
    let copied = io::copy(&mut (&mut self.reader).take(len), &mut io::sink())?;
    self.offset += copied;
    if copied < len {
      return Err(DecodeError::Truncated {
        offset: self.offset,
        needed: len - copied,
      });
    }
    Ok(copied)
  }

  /// Give back the underlying source.
  pub fn into_inner(self) -> R {
    self.reader
  }
}

/// Body length of `header` as a buffer size, if within `limit`.
pub(crate) fn checked_body_len(
  header: &FrameHeader,
  limit: u64,
  offset: u64,
) -> Result<usize, DecodeError> {
  let size = header.body_len();
  if size > limit {
    return Err(DecodeError::FrameTooLarge {
      size,
      limit,
      offset: offset - FRAME_PREFIX_SIZE as u64,
    });
  }
  usize::try_from(size).map_err(|_| DecodeError::FrameTooLarge {
    size,
    limit,
    offset: offset - FRAME_PREFIX_SIZE as u64,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use idread_wire::FrameKind;

  fn frame(kind: FrameKind, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    FrameHeader::for_body(kind, body.len()).write_to(&mut out);
    out.extend_from_slice(body);
    out
  }

  #[test]
  fn reads_frames_in_sequence() {
    let mut stream = frame(FrameKind::Header, b"abc");
    stream.extend(frame(FrameKind::Unknown(5), b"zz"));
    let mut frames = FrameReader::new(stream.as_slice());
    let mut buf = Vec::new();

    let (offset, header) = frames.next_header().unwrap().unwrap();
    assert_eq!((offset, header.kind), (0, FrameKind::Header));
    frames.read_body(&header, 1024, &mut buf).unwrap();
    assert_eq!(buf, b"abc");

    let (offset, header) = frames.next_header().unwrap().unwrap();
    assert_eq!((offset, header.kind), (13, FrameKind::Unknown(5)));
    assert_eq!(frames.skip_body(&header).unwrap(), 2);

    assert!(frames.next_header().unwrap().is_none());
    assert_eq!(frames.position(), stream.len() as u64);
  }

  #[test]
  fn truncated_body() {
    let mut stream = frame(FrameKind::Values, &[1, 2, 3, 4]);
    stream.truncate(stream.len() - 1);
    let mut frames = FrameReader::new(stream.as_slice());
    let (_, header) = frames.next_header().unwrap().unwrap();
    let result = frames.read_body(&header, 1024, &mut Vec::new());
    assert!(matches!(
      result,
      Err(DecodeError::Truncated {
        offset: 13,
        needed: 1
      })
    ));
  }

  #[test]
  fn truncated_skip() {
    let mut stream = frame(FrameKind::Unknown(3), &[0; 10]);
    stream.truncate(15);
    let mut frames = FrameReader::new(stream.as_slice());
    let (_, header) = frames.next_header().unwrap().unwrap();
    assert!(matches!(
      frames.skip_body(&header),
      Err(DecodeError::Truncated { needed: 5, .. })
    ));
  }

  #[test]
  fn oversize_body_is_not_read() {
    let stream = frame(FrameKind::Values, &[0; 64]);
    let mut frames = FrameReader::new(stream.as_slice());
    let (_, header) = frames.next_header().unwrap().unwrap();
    let mut buf = Vec::new();
    let result = frames.read_body(&header, 16, &mut buf);
    assert!(matches!(
      result,
      Err(DecodeError::FrameTooLarge {
        size: 64,
        limit: 16,
        offset: 0
      })
    ));
    assert!(buf.is_empty());
  }
}

use idread_types::{ChannelDescriptor, Collector};
use idread_wire::{FrameHeader, FrameKind};
use tracing::{debug, warn};

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::header::HeaderFrame;
use crate::report::{DecodeReport, DecodeWarning, FrameInfo, FrameOutcome};
use crate::value::decode_values;

/// What to do with a frame once its prefix is known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Plan {
    Header,
    Values,
    Skip,
}

/// Protocol state shared by the blocking and async decoders.
///
/// The session never touches the byte source. The decoders read prefixes
/// and bodies their own way and hand the bytes in here, so both follow
/// exactly the same frame rules.
pub(crate) struct DecodeSession {
    config: DecoderConfig,
    header: Option<HeaderFrame>,
    report: DecodeReport,
}

impl DecodeSession {
    pub(crate) fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            header: None,
            report: DecodeReport::default(),
        }
    }

    pub(crate) fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub(crate) fn header(&self) -> Option<&HeaderFrame> {
        self.header.as_ref()
    }

    pub(crate) fn channels(&self) -> &[ChannelDescriptor] {
        match &self.header {
            Some(header) => &header.channels,
            None => &[],
        }
    }

    pub(crate) fn report(&self) -> &DecodeReport {
        &self.report
    }

    pub(crate) fn into_report(self) -> DecodeReport {
        self.report
    }

    /// Record how far into the stream the decoder has read.
    pub(crate) fn set_position(&mut self, position: u64) {
        self.report.bytes = position;
    }

    pub(crate) fn plan(&self, frame: &FrameHeader) -> Plan {
        match frame.kind {
            FrameKind::Header => Plan::Header,
            FrameKind::Values if !self.channels().is_empty() => Plan::Values,
            FrameKind::Values | FrameKind::Unknown(_) => Plan::Skip,
        }
    }

    /// Account for a frame whose body was drained.
    pub(crate) fn skipped(&mut self, offset: u64, frame: &FrameHeader, skipped: u64) -> FrameInfo {
        let warning = match frame.kind {
            FrameKind::Unknown(kind) => DecodeWarning::UnknownFrameKind {
                kind,
                offset,
                skipped,
            },
            FrameKind::Values | FrameKind::Header => {
                DecodeWarning::ValuesBeforeHeader { offset, skipped }
            }
        };
        warn!(offset, size = frame.size, "{warning}");

        self.report.frames += 1;
        self.report.warnings.push(warning.clone());
        FrameInfo {
            offset,
            kind: frame.kind,
            size: frame.size,
            outcome: FrameOutcome::Skipped(warning),
        }
    }

    /// Decode a header body and install its channels.
    ///
    /// The previous channel list stays in place if decoding fails or the
    /// collector rejects the new one.
    pub(crate) fn apply_header<C: Collector>(
        &mut self,
        offset: u64,
        frame: &FrameHeader,
        body: &[u8],
        collector: &mut C,
    ) -> Result<FrameInfo, DecodeError> {
        self.report.frames += 1;
        let header = HeaderFrame::decode(body, offset, self.config.max_decompressed_size)?;
        debug!(
            offset,
            channels = header.channels.len(),
            htype = header.htype.as_deref().unwrap_or(""),
            "header frame"
        );

        collector
            .on_header(&header.channels)
            .map_err(DecodeError::collector)?;

        let channels = header.channels.len();
        self.header = Some(header);
        self.report.header_frames += 1;
        Ok(FrameInfo {
            offset,
            kind: frame.kind,
            size: frame.size,
            outcome: FrameOutcome::Header { channels },
        })
    }

    /// Decode a value body against the current channels and feed every
    /// event to `collector`.
    pub(crate) fn apply_values<C: Collector>(
        &mut self,
        offset: u64,
        frame: &FrameHeader,
        body: &[u8],
        collector: &mut C,
    ) -> Result<FrameInfo, DecodeError> {
        self.report.frames += 1;
        let channels = self.channels();
        let stats = decode_values(
            body,
            frame.size,
            offset,
            channels,
            self.config.max_decompressed_size,
            |event| collector.accept(event).map_err(DecodeError::collector),
        )?;
        debug!(offset, events = stats.events, nulls = stats.null_events, "value frame");

        self.report.value_frames += 1;
        self.report.events += stats.events as u64;
        self.report.null_events += stats.null_events as u64;
        if stats.trailing > 0 {
            let warning = DecodeWarning::TrailingBytes {
                offset,
                bytes: stats.trailing,
            };
            warn!(offset, size = frame.size, "{warning}");
            self.report.warnings.push(warning);
        }

        Ok(FrameInfo {
            offset,
            kind: frame.kind,
            size: frame.size,
            outcome: FrameOutcome::Values {
                events: stats.events,
                null_events: stats.null_events,
                trailing: stats.trailing,
            },
        })
    }
}

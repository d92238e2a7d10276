use std::convert::Infallible;

use crate::channel::ChannelDescriptor;
use crate::event::{Event, OwnedEvent};

/// A sink for decoded events.
///
/// The decoder calls [`on_header`](Self::on_header) whenever a header frame
/// installs a new descriptor list, then [`accept`](Self::accept) once per
/// channel per value frame, in header order. Nothing is called after an
/// error. [`finalize`](Self::finalize) is called by the owner once the
/// stream has ended.
///
/// ```text
///   header(A, B)  values  values  header(C)  values
///   on_header     A B     A B     on_header  C       finalize
/// ```
pub trait Collector {
    /// What the collector produces once the stream is done.
    type Output;

    /// Failure raised by the sink. It aborts the decode.
    type Error: std::error::Error + Send + Sync + 'static;

    /// A header frame replaced the channel list.
    ///
    /// # Errors
    ///
    /// Implementations may refuse a channel layout they cannot store.
    fn on_header(&mut self, channels: &[ChannelDescriptor]) -> Result<(), Self::Error> {
        let _ = channels;
        Ok(())
    }

    /// Record one event.
    ///
    /// # Errors
    ///
    /// Any sink failure; the decoder stops and reports it.
    fn accept(&mut self, event: Event<'_>) -> Result<(), Self::Error>;

    /// Flush buffered state and produce the output.
    ///
    /// # Errors
    ///
    /// Any failure while flushing.
    fn finalize(self) -> Result<Self::Output, Self::Error>
    where
        Self: Sized;
}

/// Collects every event verbatim.
impl Collector for Vec<OwnedEvent> {
    type Output = Vec<OwnedEvent>;
    type Error = Infallible;

    fn accept(&mut self, event: Event<'_>) -> Result<(), Self::Error> {
        self.push(event.to_owned_event());
        Ok(())
    }

    fn finalize(self) -> Result<Self::Output, Self::Error> {
        Ok(self)
    }
}

impl<C: Collector + ?Sized> Collector for &mut C {
    type Output = ();
    type Error = C::Error;

    fn on_header(&mut self, channels: &[ChannelDescriptor]) -> Result<(), Self::Error> {
        (**self).on_header(channels)
    }

    fn accept(&mut self, event: Event<'_>) -> Result<(), Self::Error> {
        (**self).accept(event)
    }

    /// Borrowed collectors are finalized by their owner.
    fn finalize(self) -> Result<Self::Output, Self::Error> {
        Ok(())
    }
}

//! The boundary to the raw report transport.
//!
//! A transport enumerates pads by serial number and opens a duplex
//! 64-byte report channel to one of them. The engine only ever touches
//! these traits; the hidapi-backed implementation lives in [`crate::hid`].

use std::future::Future;

use snafu::Snafu;

use reflex_protocol::packets::Packet;

#[derive(Debug, Snafu)]
pub enum TransportError {
    #[snafu(transparent)]
    Hid { source: hidapi::HidError },
    #[snafu(display("report channel closed"))]
    ChannelClosed,
}

/// Why a connection attempt failed. Always recoverable: the caller stays
/// disconnected and may retry with a fresh enumeration.
#[derive(Debug, Snafu)]
pub enum ConnectError {
    #[snafu(display("pad {serial:?} is not enumerated"))]
    TransportUnavailable { serial: String },
    #[snafu(display("failed to open pad {serial:?}: {source}"))]
    TransportOpenFailed {
        serial: String,
        source: TransportError,
    },
}

/// Reading half of a pad's report channel.
pub trait FrameSource: Send + 'static {
    /// Resolves with the next report from the device, or an error once the
    /// transport is gone.
    fn read_frame(&mut self) -> impl Future<Output = Result<Packet, TransportError>> + Send;
}

/// Writing half of a pad's report channel.
pub trait FrameSink: Send + 'static {
    fn write_frame(
        &mut self,
        frame: &Packet,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Enumerates pads and opens report channels to them.
pub trait PadTransport {
    type Source: FrameSource;
    type Sink: FrameSink;

    /// Serial numbers of every pad the backend currently sees.
    fn connected_pads(&mut self) -> Vec<String>;

    /// Opens the duplex report channel for `serial`.
    fn open(&mut self, serial: &str) -> Result<(Self::Source, Self::Sink), TransportError>;
}

//! One live pad connection and its background I/O loops.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use reflex_protocol::packets::Packet;

use crate::mailbox::FrameMailbox;
use crate::transport::{ConnectError, FrameSink, FrameSource, PadTransport};

/// A connected pad: the mailbox pair plus the two background loops that
/// shuttle reports between the mailboxes and the transport.
///
/// At most one session exists per process; it is created and destroyed
/// only by [`SessionController`](crate::controller::SessionController).
pub struct DeviceSession {
    serial: String,
    inbound: Arc<FrameMailbox>,
    outbound: Arc<FrameMailbox>,
    shutdown: CancellationToken,
}

impl DeviceSession {
    /// Opens the report channel for `serial` and starts the read and write
    /// loops. The serial must be present in the transport's current
    /// enumeration.
    pub(crate) fn open<T: PadTransport>(
        transport: &mut T,
        serial: &str,
    ) -> Result<Self, ConnectError> {
        if !transport.connected_pads().iter().any(|s| s == serial) {
            return Err(ConnectError::TransportUnavailable {
                serial: serial.to_owned(),
            });
        }
        let (source, sink) =
            transport
                .open(serial)
                .map_err(|source| ConnectError::TransportOpenFailed {
                    serial: serial.to_owned(),
                    source,
                })?;

        let inbound = Arc::new(FrameMailbox::new());
        let outbound = Arc::new(FrameMailbox::new());
        let shutdown = CancellationToken::new();

        tokio::spawn(read_loop(source, Arc::clone(&inbound), shutdown.clone()));
        tokio::spawn(write_loop(sink, Arc::clone(&outbound), shutdown.clone()));

        debug!(serial, "pad session opened");
        Ok(Self {
            serial: serial.to_owned(),
            inbound,
            outbound,
            shutdown,
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Hands `packet` to the write loop, overwriting any unsent command.
    pub fn send_command(&self, packet: &Packet) {
        self.outbound.send(packet);
    }

    /// The most recent report the read loop took off the device.
    pub fn latest_frame(&self) -> Packet {
        self.inbound.latest()
    }

    /// A cloneable handle onto the outbound channel, used by the light
    /// renderer for its own writes outside config sequences.
    pub fn command_sender(&self) -> CommandSender {
        CommandSender {
            outbound: Arc::clone(&self.outbound),
        }
    }

    /// Whether both background loops are still servicing the transport.
    pub fn is_open(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Stops both loops, letting them drop the transport handles. Closing
    /// an already-closed session is a no-op.
    pub(crate) fn close(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Handle onto a session's outbound mailbox.
#[derive(Clone)]
pub struct CommandSender {
    outbound: Arc<FrameMailbox>,
}

impl CommandSender {
    pub fn send(&self, packet: &Packet) {
        self.outbound.send(packet);
    }
}

/// Pulls reports off the device into the inbound mailbox until cancelled
/// or the transport fails. A failure cancels the shared token so the
/// session as a whole is torn down, not just this loop.
async fn read_loop<R: FrameSource>(
    mut source: R,
    inbound: Arc<FrameMailbox>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            report = source.read_frame() => match report {
                Ok(frame) => inbound.send(&frame),
                Err(e) => {
                    warn!(error = %e, "pad read failed, dropping link");
                    shutdown.cancel();
                    break;
                }
            }
        }
    }
    debug!("read loop stopped");
}

/// Parks on the outbound ready signal and writes the current slot
/// contents to the device.
async fn write_loop<W: FrameSink>(
    mut sink: W,
    outbound: Arc<FrameMailbox>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = outbound.ready() => {
                let frame = outbound.latest();
                if let Err(e) = sink.write_frame(&frame).await {
                    warn!(error = %e, "pad write failed, dropping link");
                    shutdown.cancel();
                    break;
                }
            }
        }
    }
    debug!("write loop stopped");
}

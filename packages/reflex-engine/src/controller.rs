//! The config-mode and push-profile state machine.
//!
//! Connecting and pushing a profile share one envelope: enter config
//! mode, issue the command, request a read-back, and exit config mode
//! once the reply shows up on the inbound channel. The reply is
//! recognized opportunistically by [`SessionController::tick`] rather
//! than by a blocking wait, so a pad that never answers leaves the
//! sequence open indefinitely; callers that need a bound apply their own
//! deadline.

use tokio::task;
use tracing::{debug, info, warn};

use reflex_protocol::packets::{self, Packet, headers};
use reflex_protocol::profile::DeviceProfile;

use crate::session::{CommandSender, DeviceSession};
use crate::transport::{ConnectError, PadTransport};

/// Which operation opened the in-flight config sequence. Decides which
/// consumer the read-back reply belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOrigin {
    PlainRead,
    ProfilePush,
}

/// Connection state as observable between foreground ticks.
///
/// Entering and exiting config mode are fire-and-forget sends, so the
/// machine never rests in those phases; an in-flight sequence is entirely
/// described by the `AwaitingProfileReply` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
    AwaitingProfileReply(ReadOrigin),
}

/// What one foreground tick observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickEvent {
    /// The pad answered a profile read request; config mode was exited.
    ProfileRead {
        origin: ReadOrigin,
        profile: DeviceProfile,
    },
    /// A live sensor frame, handed through uninterpreted.
    Frame(Packet),
    /// A background loop hit a transport failure; the session was
    /// released.
    LinkLost,
}

/// Owns the transport, at most one [`DeviceSession`], and the profile
/// values flowing to and from the pad.
pub struct SessionController<T: PadTransport> {
    transport: T,
    serials: Vec<String>,
    session: Option<DeviceSession>,
    link: LinkState,
    profile: DeviceProfile,
    device_profile: Option<DeviceProfile>,
}

impl<T: PadTransport> SessionController<T> {
    pub fn new(transport: T) -> Self {
        let mut controller = Self {
            transport,
            serials: Vec::new(),
            session: None,
            link: LinkState::Disconnected,
            profile: DeviceProfile::new(),
            device_profile: None,
        };
        controller.enumerate_pads();
        controller
    }

    /// Re-runs transport enumeration and returns the refreshed pad list.
    pub fn enumerate_pads(&mut self) -> &[String] {
        self.serials = self.transport.connected_pads();
        &self.serials
    }

    pub fn pads(&self) -> &[String] {
        &self.serials
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    pub fn connected_serial(&self) -> Option<&str> {
        self.session.as_ref().map(DeviceSession::serial)
    }

    /// The profile the next push will send.
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut DeviceProfile {
        &mut self.profile
    }

    pub fn set_profile(&mut self, profile: DeviceProfile) {
        self.profile = profile;
    }

    /// The profile last read back from the pad, if any arrived this
    /// session.
    pub fn device_profile(&self) -> Option<&DeviceProfile> {
        self.device_profile.as_ref()
    }

    /// The latest raw inbound report, for the sensor collaborator.
    pub fn latest_frame(&self) -> Option<Packet> {
        self.session.as_ref().map(DeviceSession::latest_frame)
    }

    /// Outbound handle for the light renderer.
    pub fn command_sender(&self) -> Option<CommandSender> {
        self.session.as_ref().map(DeviceSession::command_sender)
    }

    /// Connects to `serial` and starts the initial read sequence: enter
    /// config mode and request the on-device profile. The exit is sent by
    /// [`tick`](Self::tick) once the reply is observed.
    ///
    /// A failed open leaves the state untouched.
    pub async fn connect(&mut self, serial: &str) -> Result<(), ConnectError> {
        if self.session.is_some() {
            debug!(serial, "connect requested while a session is live");
            return Ok(());
        }
        let session = DeviceSession::open(&mut self.transport, serial)?;
        send_spaced(&session, &packets::ENTER_CONFIG).await;
        send_spaced(&session, &packets::encode_read_request()).await;
        self.session = Some(session);
        self.link = LinkState::AwaitingProfileReply(ReadOrigin::PlainRead);
        info!(serial, "pad connected, reading on-device profile");
        Ok(())
    }

    /// Closes the session. Valid from any state; a no-op when already
    /// disconnected.
    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
            info!(serial = session.serial(), "pad disconnected");
        }
        self.link = LinkState::Disconnected;
    }

    /// The single connect/disconnect affordance the front end exposes:
    /// connects when disconnected, disconnects otherwise. Returns whether
    /// a pad is connected afterwards.
    pub async fn toggle_connection(&mut self, serial: &str) -> bool {
        if self.session.is_some() {
            self.disconnect();
            false
        } else {
            match self.connect(serial).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(serial, error = %e, "pad connection failed");
                    false
                }
            }
        }
    }

    /// Pushes the current profile inside a config sequence: enter, push,
    /// request read-back. Returns whether the push was sent; it is not
    /// sent without a session or while another sequence is in flight.
    pub async fn push_profile(&mut self) -> bool {
        let Some(session) = &self.session else {
            warn!("profile push requested with no pad connected");
            return false;
        };
        if self.link != LinkState::Connected {
            warn!(state = ?self.link, "profile push requested mid-sequence");
            return false;
        }
        send_spaced(session, &packets::ENTER_CONFIG).await;
        send_spaced(session, &packets::encode_profile_push(&self.profile)).await;
        send_spaced(session, &packets::encode_read_request()).await;
        self.link = LinkState::AwaitingProfileReply(ReadOrigin::ProfilePush);
        debug!("profile pushed, awaiting read-back");
        true
    }

    /// One foreground poll: notices a dead link, recognizes an in-flight
    /// profile reply, and otherwise hands back the latest live frame.
    /// Returns `None` while disconnected.
    pub fn tick(&mut self) -> Option<TickEvent> {
        let (open, frame) = {
            let session = self.session.as_ref()?;
            (session.is_open(), session.latest_frame())
        };
        if !open {
            warn!("pad transport dropped, releasing session");
            self.disconnect();
            return Some(TickEvent::LinkLost);
        }

        if let LinkState::AwaitingProfileReply(origin) = self.link {
            if frame[0] == headers::PROFILE_READ {
                match packets::decode_profile_reply(&frame) {
                    Ok(profile) => {
                        self.device_profile = Some(profile.clone());
                        if let Some(session) = &self.session {
                            session.send_command(&packets::EXIT_CONFIG);
                        }
                        self.link = LinkState::Connected;
                        info!(?origin, "device profile received, left config mode");
                        return Some(TickEvent::ProfileRead { origin, profile });
                    }
                    Err(e) => warn!(error = %e, "unrecognized profile reply"),
                }
            }
        }
        Some(TickEvent::Frame(frame))
    }
}

/// Hands one command to the write loop, then yields so the loop can drain
/// the single outbound slot before the next send overwrites it.
async fn send_spaced(session: &DeviceSession, packet: &Packet) {
    session.send_command(packet);
    task::yield_now().await;
}

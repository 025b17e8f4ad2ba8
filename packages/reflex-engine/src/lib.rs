//! Device session and protocol engine for RE:Flex v2 dance pads.
//!
//! The engine discovers pads over USB-HID, holds at most one live
//! [`DeviceSession`] for the process, and drives the config-mode handshake
//! through a [`SessionController`]. Each session runs two background loops
//! that shuttle 64-byte reports between the transport and a pair of
//! single-slot [`mailbox::FrameMailbox`]es, so the foreground never blocks
//! on device I/O.
//!
//! The [`transport`] module is the seam to the raw HID layer: production
//! code uses [`hid::UsbHidTransport`], tests substitute an in-memory
//! implementation of [`PadTransport`].

pub mod controller;
pub mod hid;
pub mod mailbox;
pub mod router;
pub mod session;
pub mod transport;

pub use controller::{LinkState, ReadOrigin, SessionController, TickEvent};
pub use router::{Notification, Request, dispatch};
pub use session::{CommandSender, DeviceSession};
pub use transport::{ConnectError, FrameSink, FrameSource, PadTransport, TransportError};

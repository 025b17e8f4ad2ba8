//! hidapi-backed transport for physical pads.

use std::sync::{Arc, Mutex};

use hidapi::{HidApi, HidDevice};
use tokio::task;
use tracing::warn;

use reflex_protocol::packets::{PACKET_SIZE, Packet};

use crate::transport::{FrameSink, FrameSource, PadTransport, TransportError};

/// USB vendor id of the RE:Flex v2 interface board.
pub const VENDOR_ID: u16 = 0x0483;
/// USB product id of the RE:Flex v2 interface board.
pub const PRODUCT_ID: u16 = 0x5750;

/// Upper bound on one blocking read. Keeps the worker responsive to
/// shutdown without busy-polling the device.
const READ_TIMEOUT_MS: i32 = 250;

/// Pad transport over the system HID stack.
///
/// Each direction gets its own device handle, so a parked read never
/// delays a write.
pub struct UsbHidTransport {
    api: HidApi,
}

impl UsbHidTransport {
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            api: HidApi::new()?,
        })
    }
}

impl PadTransport for UsbHidTransport {
    type Source = HidFrameSource;
    type Sink = HidFrameSink;

    fn connected_pads(&mut self) -> Vec<String> {
        if let Err(e) = self.api.refresh_devices() {
            warn!(error = %e, "usb enumeration failed");
            return Vec::new();
        }
        self.api
            .device_list()
            .filter(|dev| dev.vendor_id() == VENDOR_ID && dev.product_id() == PRODUCT_ID)
            .filter_map(|dev| dev.serial_number().map(str::to_owned))
            .collect()
    }

    fn open(&mut self, serial: &str) -> Result<(Self::Source, Self::Sink), TransportError> {
        let reader = self.api.open_serial(VENDOR_ID, PRODUCT_ID, serial)?;
        let writer = self.api.open_serial(VENDOR_ID, PRODUCT_ID, serial)?;
        Ok((
            HidFrameSource {
                device: Arc::new(Mutex::new(reader)),
            },
            HidFrameSink {
                device: Arc::new(Mutex::new(writer)),
            },
        ))
    }
}

pub struct HidFrameSource {
    device: Arc<Mutex<HidDevice>>,
}

impl FrameSource for HidFrameSource {
    async fn read_frame(&mut self) -> Result<Packet, TransportError> {
        loop {
            let device = Arc::clone(&self.device);
            let report = task::spawn_blocking(move || {
                let device = device.lock().expect("hid handle lock poisoned");
                let mut frame = [0u8; PACKET_SIZE];
                let read = device.read_timeout(&mut frame, READ_TIMEOUT_MS)?;
                Ok::<_, TransportError>((read > 0).then_some(frame))
            })
            .await
            .map_err(|_| TransportError::ChannelClosed)??;

            if let Some(frame) = report {
                return Ok(frame);
            }
        }
    }
}

pub struct HidFrameSink {
    device: Arc<Mutex<HidDevice>>,
}

impl FrameSink for HidFrameSink {
    async fn write_frame(&mut self, frame: &Packet) -> Result<(), TransportError> {
        // hidapi wants a leading report id; the pad uses unnumbered reports.
        let mut report = [0u8; PACKET_SIZE + 1];
        report[1..].copy_from_slice(frame);

        let device = Arc::clone(&self.device);
        task::spawn_blocking(move || {
            let device = device.lock().expect("hid handle lock poisoned");
            device.write(&report)?;
            Ok(())
        })
        .await
        .map_err(|_| TransportError::ChannelClosed)?
    }
}

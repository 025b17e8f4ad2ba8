//! Explicit routing between front-end requests and controller handlers.
//!
//! One request may fan out to several handlers, and each handler answers
//! with at most one notification, so an arm returns however many replies
//! its handlers produced.

use reflex_protocol::packets::Packet;
use reflex_protocol::profile::{DeviceProfile, PanelCoord, SensorCalibration, SensorCoord};

use crate::controller::{SessionController, TickEvent};
use crate::transport::PadTransport;

/// Requests a front end can raise against the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Front end came up; report everything it needs to render.
    Init,
    RefreshPads,
    ToggleConnection {
        serial: String,
    },
    SetSensor {
        panel: PanelCoord,
        sensor: SensorCoord,
        calibration: SensorCalibration,
    },
    AssignKey {
        panel: PanelCoord,
        key: Option<char>,
    },
    PushProfile,
    /// Foreground frame tick.
    FrameReady,
    Quit,
}

/// Replies routed back to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    PadList(Vec<String>),
    ConnectionChanged(bool),
    SensorUpdated {
        panel: PanelCoord,
        sensor: SensorCoord,
        calibration: SensorCalibration,
    },
    KeyAssigned {
        panel: PanelCoord,
        key: Option<char>,
    },
    ProfilePushed(bool),
    DeviceProfileRead(DeviceProfile),
    Frame(Packet),
    LinkLost,
}

/// Routes one request to its handlers.
pub async fn dispatch<T: PadTransport>(
    controller: &mut SessionController<T>,
    request: Request,
) -> Vec<Notification> {
    match request {
        Request::Init => {
            vec![Notification::PadList(controller.enumerate_pads().to_vec())]
        }
        Request::RefreshPads => {
            controller.enumerate_pads();
            vec![Notification::PadList(controller.pads().to_vec())]
        }
        Request::ToggleConnection { serial } => {
            let connected = controller.toggle_connection(&serial).await;
            vec![Notification::ConnectionChanged(connected)]
        }
        Request::SetSensor {
            panel,
            sensor,
            calibration,
        } => {
            controller.profile_mut().set_calibration(panel, sensor, calibration);
            vec![Notification::SensorUpdated {
                panel,
                sensor,
                calibration,
            }]
        }
        Request::AssignKey { panel, key } => {
            controller.profile_mut().set_key(panel, key);
            vec![Notification::KeyAssigned { panel, key }]
        }
        Request::PushProfile => {
            let sent = controller.push_profile().await;
            vec![Notification::ProfilePushed(sent)]
        }
        Request::FrameReady => match controller.tick() {
            Some(TickEvent::ProfileRead { profile, .. }) => {
                vec![Notification::DeviceProfileRead(profile)]
            }
            Some(TickEvent::Frame(frame)) => vec![Notification::Frame(frame)],
            Some(TickEvent::LinkLost) => {
                vec![Notification::LinkLost, Notification::ConnectionChanged(false)]
            }
            None => Vec::new(),
        },
        Request::Quit => {
            controller.disconnect();
            vec![Notification::ConnectionChanged(false)]
        }
    }
}

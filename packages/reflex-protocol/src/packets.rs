//! Codec between [`DeviceProfile`] values and 64-byte HID reports.
//!
//! Byte 0 of every report is a command header; all remaining bytes are
//! addressed by fixed protocol offset. The transport delivers discrete
//! 64-byte reports, so there is no framing or length prefix.

use snafu::Snafu;

use crate::profile::{DeviceProfile, PanelCoord, SensorCalibration, SensorCoord};

pub const PACKET_SIZE: usize = 64;

/// One HID report.
pub type Packet = [u8; PACKET_SIZE];

/// Command header bytes recognized by the pad firmware.
pub mod headers {
    /// Host pushes a full calibration profile to the pad.
    pub const PROFILE_PUSH: u8 = 0xF0;
    /// Host requests the stored profile; the pad replies under the same
    /// header.
    pub const PROFILE_READ: u8 = 0xF1;
}

/// Magic sequence that switches the pad into config mode. Opaque to the
/// host; transmitted verbatim.
pub const ENTER_CONFIG: Packet = [
    0xb6, 0xda, 0x3d, 0xc8, 0x90, 0x4a, 0xae, 0x15, 0x87, 0xf7, 0xee, 0x99, 0x13, 0xc8, 0xbc, 0x5f,
    0x4e, 0x61, 0x6d, 0x7b, 0x75, 0x05, 0xc4, 0xb3, 0x62, 0x20, 0xc9, 0xa7, 0x84, 0x18, 0x66, 0xd1,
    0x87, 0x27, 0x82, 0xb8, 0x7c, 0xaa, 0xe1, 0xbf, 0x41, 0xc0, 0x01, 0xc4, 0x57, 0xd4, 0xe1, 0xe3,
    0xd5, 0x4b, 0x5d, 0xb6, 0xa6, 0xc1, 0x67, 0x68, 0xa6, 0x15, 0x73, 0x5f, 0x43, 0xc9, 0x5a, 0xb3,
];

/// Counterpart of [`ENTER_CONFIG`]; returns the pad to live streaming.
pub const EXIT_CONFIG: Packet = [
    0x7f, 0x54, 0x55, 0xb2, 0x0d, 0x20, 0x11, 0x05, 0xe6, 0x4b, 0x98, 0x52, 0xcf, 0x49, 0x11, 0x47,
    0x5c, 0xef, 0xae, 0x3d, 0x39, 0xbd, 0xe6, 0xba, 0xa1, 0x2d, 0x69, 0xb1, 0x4d, 0xf3, 0xc6, 0x1d,
    0x71, 0xff, 0xbc, 0x33, 0x09, 0x1f, 0xd4, 0x10, 0x34, 0xe5, 0x45, 0xb0, 0xfa, 0xe1, 0x89, 0xda,
    0xfc, 0x3a, 0x32, 0xdf, 0xe9, 0x7a, 0x8d, 0xd6, 0xb7, 0x23, 0x8b, 0x33, 0xbd, 0xd6, 0x5e, 0xa6,
];

#[derive(Debug, Snafu, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[snafu(display("unexpected profile reply header {header:#04x}"))]
    UnexpectedHeader { header: u8 },
}

/// Encodes `profile` into a profile push packet.
///
/// Layout: header, then `threshold, hysteresis` for all 16 sensors in
/// panel-major wire order (offsets 1..=32), then one key byte per panel
/// (offsets 33..=36, ASCII or 0 for unbound), zeros to the end. Missing
/// panel or sensor entries encode as the default calibration and no key.
pub fn encode_profile_push(profile: &DeviceProfile) -> Packet {
    let mut packet = [0u8; PACKET_SIZE];
    packet[0] = headers::PROFILE_PUSH;

    let mut pos = 1;
    for panel in PanelCoord::ALL {
        for sensor in SensorCoord::ALL {
            let calibration = profile
                .panel(panel)
                .map(|p| p.calibration(sensor))
                .unwrap_or_default();
            packet[pos] = calibration.threshold;
            packet[pos + 1] = calibration.hysteresis;
            pos += 2;
        }
    }
    for panel in PanelCoord::ALL {
        packet[pos] = profile
            .panel(panel)
            .and_then(|p| p.key)
            .map(|key| key as u8)
            .unwrap_or(0);
        pos += 1;
    }
    packet
}

/// Encodes a profile read request: the read header followed by zeros.
pub fn encode_read_request() -> Packet {
    let mut packet = [0u8; PACKET_SIZE];
    packet[0] = headers::PROFILE_READ;
    packet
}

/// Decodes a profile reply, the exact inverse of [`encode_profile_push`]'s
/// payload layout under the read header.
///
/// Fails only on a wrong header byte. All 4 panels and 16 sensors are
/// always populated; a key byte of 0 decodes to an unbound key. Bytes
/// 37..=63 are ignored.
pub fn decode_profile_reply(packet: &Packet) -> Result<DeviceProfile, DecodeError> {
    if packet[0] != headers::PROFILE_READ {
        return Err(DecodeError::UnexpectedHeader { header: packet[0] });
    }

    let mut profile = DeviceProfile::new();
    let mut pos = 1;
    for panel in PanelCoord::ALL {
        for sensor in SensorCoord::ALL {
            let calibration = SensorCalibration::new(packet[pos], packet[pos + 1]);
            profile.set_calibration(panel, sensor, calibration);
            pos += 2;
        }
    }
    for panel in PanelCoord::ALL {
        let raw = packet[pos];
        profile.set_key(panel, (raw != 0).then(|| raw as char));
        pos += 1;
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_profile() -> DeviceProfile {
        let mut profile = DeviceProfile::new();
        for (i, panel) in PanelCoord::ALL.into_iter().enumerate() {
            for (j, sensor) in SensorCoord::ALL.into_iter().enumerate() {
                let calibration = SensorCalibration::new(40 + (i * 4 + j) as u8, 2 + j as u8);
                profile.set_calibration(panel, sensor, calibration);
            }
            profile.set_key(panel, Some((b'a' + i as u8) as char));
        }
        profile
    }

    /// Turns a push packet into the reply the pad would send for it.
    fn as_reply(mut packet: Packet) -> Packet {
        packet[0] = headers::PROFILE_READ;
        packet
    }

    #[test]
    fn push_then_decode_round_trips() {
        let profile = full_profile();
        let reply = as_reply(encode_profile_push(&profile));
        assert_eq!(decode_profile_reply(&reply).unwrap(), profile);
    }

    #[test]
    fn missing_panel_encodes_defaults() {
        let mut profile = DeviceProfile::new();
        profile.set_calibration(
            PanelCoord::Left,
            SensorCoord::TopLeft,
            SensorCalibration::new(50, 10),
        );
        profile.set_key(PanelCoord::Left, Some('A'));

        let packet = encode_profile_push(&profile);
        assert_eq!(packet[0], headers::PROFILE_PUSH);
        assert_eq!(packet[1], 50);
        assert_eq!(packet[2], 10);
        // Every other sensor slot carries the default pair.
        for pair in packet[3..33].chunks(2) {
            assert_eq!(pair, [30, 5]);
        }
        assert_eq!(packet[33], b'A');
        assert_eq!(&packet[34..37], [0, 0, 0]);
        assert!(packet[37..].iter().all(|&b| b == 0));
    }

    #[test]
    fn wire_example_round_trips() {
        let mut profile = DeviceProfile::new();
        profile.set_calibration(
            PanelCoord::Left,
            SensorCoord::TopLeft,
            SensorCalibration::new(50, 10),
        );
        profile.set_key(PanelCoord::Left, Some('A'));

        let reply = as_reply(encode_profile_push(&profile));
        let decoded = decode_profile_reply(&reply).unwrap();
        assert_eq!(
            decoded
                .panel(PanelCoord::Left)
                .unwrap()
                .calibration(SensorCoord::TopLeft),
            SensorCalibration::new(50, 10)
        );
        assert_eq!(decoded.panel(PanelCoord::Left).unwrap().key, Some('A'));
        // Absent panels come back fully populated with the defaults.
        assert_eq!(
            decoded
                .panel(PanelCoord::Right)
                .unwrap()
                .calibration(SensorCoord::BottomRight),
            SensorCalibration::default()
        );
        assert_eq!(decoded.panel(PanelCoord::Right).unwrap().key, None);
    }

    #[test]
    fn read_request_is_header_then_zeros() {
        let packet = encode_read_request();
        assert_eq!(packet[0], headers::PROFILE_READ);
        assert!(packet[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn decode_rejects_wrong_header() {
        let packet = encode_profile_push(&full_profile());
        assert_eq!(
            decode_profile_reply(&packet),
            Err(DecodeError::UnexpectedHeader {
                header: headers::PROFILE_PUSH
            })
        );
    }

    #[test]
    fn space_key_survives_but_zero_means_unbound() {
        let mut profile = DeviceProfile::new();
        profile.set_key(PanelCoord::Down, Some(' '));

        let reply = as_reply(encode_profile_push(&profile));
        let decoded = decode_profile_reply(&reply).unwrap();
        assert_eq!(decoded.panel(PanelCoord::Down).unwrap().key, Some(' '));
        assert_eq!(decoded.panel(PanelCoord::Up).unwrap().key, None);
    }

    #[test]
    fn config_packets_are_distinct_and_opaque() {
        assert_ne!(ENTER_CONFIG, EXIT_CONFIG);
        assert_ne!(ENTER_CONFIG[0], headers::PROFILE_PUSH);
        assert_ne!(ENTER_CONFIG[0], headers::PROFILE_READ);
    }
}

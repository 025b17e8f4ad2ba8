//! Calibration profile model for a four-panel pad.

use std::collections::HashMap;

/// One of the four pressure-sensitive panels a player steps on.
///
/// Variant order is the canonical wire order: every packet carrying
/// per-panel data emits panels in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelCoord {
    Left,
    Down,
    Up,
    Right,
}

impl PanelCoord {
    pub const ALL: [PanelCoord; 4] = [Self::Left, Self::Down, Self::Up, Self::Right];

    /// Position of this panel within the wire order.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One of the four pressure sensors within a panel, in canonical wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorCoord {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl SensorCoord {
    pub const ALL: [SensorCoord; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Trigger calibration for a single sensor. Any byte values are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorCalibration {
    pub threshold: u8,
    pub hysteresis: u8,
}

impl SensorCalibration {
    pub const fn new(threshold: u8, hysteresis: u8) -> Self {
        Self {
            threshold,
            hysteresis,
        }
    }
}

impl Default for SensorCalibration {
    fn default() -> Self {
        Self::new(30, 5)
    }
}

/// Calibration and key binding for one panel.
///
/// Sensor entries may be absent; the encoder substitutes the default
/// calibration for them. `key: None` means the panel has no key bound,
/// which is distinct from a bound space character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelProfile {
    pub sensors: HashMap<SensorCoord, SensorCalibration>,
    pub key: Option<char>,
}

impl PanelProfile {
    /// The calibration for `sensor`, falling back to the default when the
    /// entry is absent.
    pub fn calibration(&self, sensor: SensorCoord) -> SensorCalibration {
        self.sensors.get(&sensor).copied().unwrap_or_default()
    }
}

/// A full pad profile: per-panel sensor calibration plus key bindings.
///
/// Panels may be absent; the encoder treats a missing panel as an empty
/// sensor map with no key bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProfile {
    panels: HashMap<PanelCoord, PanelProfile>,
}

impl DeviceProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panel(&self, panel: PanelCoord) -> Option<&PanelProfile> {
        self.panels.get(&panel)
    }

    pub fn panel_mut(&mut self, panel: PanelCoord) -> &mut PanelProfile {
        self.panels.entry(panel).or_default()
    }

    pub fn set_calibration(
        &mut self,
        panel: PanelCoord,
        sensor: SensorCoord,
        calibration: SensorCalibration,
    ) {
        self.panel_mut(panel).sensors.insert(sensor, calibration);
    }

    pub fn set_key(&mut self, panel: PanelCoord, key: Option<char>) {
        self.panel_mut(panel).key = key;
    }
}

//! Per-button configuration.
//!
//! One record per button: the line to watch, which level means "pressed",
//! and the three timing windows. Values typically arrive from NVS or a
//! provisioning channel, hence the serde derives. A window left at 0
//! selects the documented default.

use embedded_hal::digital::PinState;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{ButtonError, Result};

/// Debounce window substituted when the config gives 0.
pub const DEFAULT_DEBOUNCE_MS: u32 = 20;
/// Long-press threshold substituted when the config gives 0.
pub const DEFAULT_LONG_PRESS_MS: u32 = 1000;
/// Double-click window substituted when the config gives 0.
pub const DEFAULT_DOUBLE_CLICK_MS: u32 = 300;

/// Line level that signifies a physically pressed button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveLevel {
    /// Pressing drives the line high (wired with a pull-down).
    High,
    /// Pressing drives the line low (the common pull-up wiring).
    Low,
}

impl ActiveLevel {
    /// The [`PinState`] a pressed button drives the line to.
    pub fn pin_state(self) -> PinState {
        match self {
            Self::High => PinState::High,
            Self::Low => PinState::Low,
        }
    }
}

/// Button configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonConfig {
    /// GPIO line the button is wired to.
    pub pin: i32,
    /// Level that means "pressed".
    pub active_level: ActiveLevel,
    /// Quiet time required after the last edge before the line is sampled.
    pub debounce_ms: u32,
    /// Hold time that promotes a press to a long-press.
    pub long_press_ms: u32,
    /// Window after a release in which a second press counts as a double-click.
    pub double_click_ms: u32,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            pin: 0,
            active_level: ActiveLevel::Low,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            long_press_ms: DEFAULT_LONG_PRESS_MS,
            double_click_ms: DEFAULT_DOUBLE_CLICK_MS,
        }
    }
}

impl ButtonConfig {
    /// Config for `pin` with the default windows.
    pub fn new(pin: i32, active_level: ActiveLevel) -> Self {
        Self {
            pin,
            active_level,
            ..Self::default()
        }
    }

    /// Check the record against the platform's pin range. Call on a
    /// normalized record. `long_press_ms <= debounce_ms` leaves the
    /// promotion timing unspecified and is the caller's problem, so it
    /// only draws a warning.
    pub fn validate(&self, max_pin: i32) -> Result<()> {
        if self.pin < 0 || self.pin >= max_pin {
            return Err(ButtonError::InvalidArg("pin outside platform range"));
        }
        if self.long_press_ms <= self.debounce_ms {
            warn!(
                "button pin {}: long_press_ms ({}) <= debounce_ms ({}); promotion timing unspecified",
                self.pin, self.long_press_ms, self.debounce_ms
            );
        }
        Ok(())
    }

    /// Substitute the documented default for any window left at 0.
    pub(crate) fn normalized(mut self) -> Self {
        if self.debounce_ms == 0 {
            self.debounce_ms = DEFAULT_DEBOUNCE_MS;
        }
        if self.long_press_ms == 0 {
            self.long_press_ms = DEFAULT_LONG_PRESS_MS;
        }
        if self.double_click_ms == 0 {
            self.double_click_ms = DEFAULT_DOUBLE_CLICK_MS;
        }
        self
    }
}

//! Button events delivered to the application's event sink.
//!
//! Discriminant values match the C component ABI, so a sink that bridges
//! to foreign code can forward the raw `u8`. [`event_from_u8`] is the
//! fallible inverse.

/// Events emitted by the recognizer.
///
/// `Pressed` and `Released` fire on every confirmed physical transition.
/// Exactly one of `Click`, `LongPress`, or `DoubleClick` terminates each
/// interaction chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ButtonEvent {
    /// Debounced press confirmed.
    Pressed = 0,
    /// Debounced release confirmed.
    Released = 1,
    /// Single click, reported once the double-click window has closed.
    Click = 2,
    /// Press held past the long-press threshold.
    LongPress = 3,
    /// Two presses inside the double-click window.
    DoubleClick = 4,
}

/// Convert a raw discriminant back to a [`ButtonEvent`].
pub fn event_from_u8(raw: u8) -> Option<ButtonEvent> {
    match raw {
        0 => Some(ButtonEvent::Pressed),
        1 => Some(ButtonEvent::Released),
        2 => Some(ButtonEvent::Click),
        3 => Some(ButtonEvent::LongPress),
        4 => Some(ButtonEvent::DoubleClick),
        _ => None,
    }
}

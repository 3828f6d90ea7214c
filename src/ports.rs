//! Port traits — the seam between the recognizer and the platform.
//!
//! ```text
//!   GPIO / timer adapter ──▶ Port trait ──▶ ButtonRegistry (domain)
//! ```
//!
//! Adapters implement these for real hardware (see [`crate::adapters`]) or
//! for the simulated platform the host tests drive. Methods take `&self`:
//! a platform service is a shared facility, and the registry calls into it
//! from both the API thread and the timer dispatch path.

use core::fmt;

use embedded_hal::digital::PinState;

use crate::events::ButtonEvent;
use crate::registry::ButtonHandle;

// ───────────────────────────────────────────────────────────────
// GPIO port
// ───────────────────────────────────────────────────────────────

/// Pull resistor selection for the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Up,
    Down,
}

/// Digital input access plus edge-interrupt registration.
///
/// The interrupt is always any-edge: the debounce filter wants to see both
/// flanks of a bounce storm so it can keep pushing the sample point out.
pub trait GpioPort {
    /// Number of lines the platform exposes; valid pins are `0..max_pin()`.
    fn max_pin(&self) -> i32;

    /// Configure `pin` as an input with the given pull and an any-edge
    /// interrupt.
    fn configure_input(&self, pin: i32, pull: Pull) -> core::result::Result<(), PlatformError>;

    /// Current line level.
    fn read_level(&self, pin: i32) -> PinState;

    /// Install the per-pin ISR dispatch service. Idempotent.
    fn install_isr_service(&self) -> core::result::Result<(), PlatformError>;

    /// Register the edge handler for `pin`, carrying `cookie` back on every
    /// edge.
    fn add_edge_handler(&self, pin: i32, cookie: ButtonHandle)
    -> core::result::Result<(), PlatformError>;

    /// Remove the edge handler for `pin`. No edges are delivered after this
    /// returns.
    fn remove_edge_handler(&self, pin: i32);
}

// ───────────────────────────────────────────────────────────────
// Timer port
// ───────────────────────────────────────────────────────────────

/// Which deadline a timer drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Debounce,
    LongPress,
    DoubleClick,
}

/// Expiry cookie handed back by the platform when a timer fires: enough for
/// the registry to find the owning instance (O(1) handle lookup) and the
/// deadline kind, without owning pointers in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerCookie {
    pub button: ButtonHandle,
    pub kind: TimerKind,
}

/// One-shot software timers dispatched from a single service thread.
pub trait TimerPort {
    /// Platform timer handle.
    type Handle: Copy + fmt::Debug;

    /// Convert a period in milliseconds to platform ticks. The registry
    /// rounds the result up to at least one tick.
    fn ms_to_ticks(&self, ms: u32) -> u32;

    /// Ticks since boot.
    fn now_ticks(&self) -> u64;

    /// Create a stopped one-shot timer.
    fn create(
        &self,
        name: &'static str,
        period_ticks: u32,
        cookie: TimerCookie,
    ) -> core::result::Result<Self::Handle, PlatformError>;

    /// Start (or restart) the timer; it expires one period from now.
    fn start(&self, timer: Self::Handle) -> core::result::Result<(), PlatformError>;

    /// Stop the timer if running. Advisory: an expiry already handed to the
    /// service thread may still be dispatched.
    fn stop(&self, timer: Self::Handle);

    /// ISR-safe restart, used by the edge shim.
    fn reset_from_isr(&self, timer: Self::Handle);

    /// Stop and release the timer.
    fn delete(&self, timer: Self::Handle);
}

// ───────────────────────────────────────────────────────────────
// Event sink port
// ───────────────────────────────────────────────────────────────

/// The recognizer emits classified [`ButtonEvent`]s through this port.
/// Adapters decide where they go — an event queue, a log, a BLE
/// characteristic.
pub trait EventSink {
    fn emit(&mut self, event: ButtonEvent);
}

impl<F: FnMut(ButtonEvent)> EventSink for F {
    fn emit(&mut self, event: ButtonEvent) {
        self(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Error type
// ───────────────────────────────────────────────────────────────

/// Non-OK returns from the platform layer. Raw codes are carried where the
/// platform reports one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    /// GPIO line configuration failed.
    GpioConfigFailed(i32),
    /// Installing the ISR dispatch service failed.
    IsrInstallFailed(i32),
    /// Registering the per-pin edge handler failed.
    IsrAddFailed(i32),
    /// The timer service could not allocate a timer.
    TimerCreateFailed,
    /// The timer service rejected a start request.
    TimerStartFailed,
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={rc})"),
            Self::IsrInstallFailed(rc) => write!(f, "ISR service install failed (rc={rc})"),
            Self::IsrAddFailed(rc) => write!(f, "ISR handler add failed (rc={rc})"),
            Self::TimerCreateFailed => write!(f, "timer create failed"),
            Self::TimerStartFailed => write!(f, "timer start failed"),
        }
    }
}

impl std::error::Error for PlatformError {}

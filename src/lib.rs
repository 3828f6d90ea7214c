//! Debounced button gesture recognizer.
//!
//! Turns a single noisy GPIO line into a clean stream of user-intent
//! events — pressed, released, click, double-click, long-press — using an
//! any-edge interrupt and three one-shot timers:
//!
//! ```text
//! ┌──────────┐ any edge  ┌──────────────┐ quiet for    ┌─────────────────┐
//! │ edge ISR │──────────▶│   debounce   │ debounce_ms  │ sample line,    │
//! │  (shim)  │  restart  │    timer     │─────────────▶│ run recognizer  │
//! └──────────┘           └──────────────┘              └────────┬────────┘
//!                                                               │ arm / cancel
//!                                           ┌───────────────────┴─────────┐
//!                                           │ long-press and double-click │
//!                                           │ deadline timers             │
//!                                           └─────────────────────────────┘
//! ```
//!
//! The ISR never touches recognizer state — it only restarts the debounce
//! timer, so every transition runs serialized on the timer-service dispatch
//! path. Platform access goes through the [`ports`] traits, which lets the
//! whole engine run under host tests against a simulated timer wheel. The
//! ESP-IDF adapters live behind the `espidf` cargo feature.

#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod error;
pub mod events;
pub mod ports;
pub mod recognizer;
pub mod registry;

pub use config::{ActiveLevel, ButtonConfig};
pub use error::{ButtonError, Result};
pub use events::ButtonEvent;
pub use ports::{EventSink, GpioPort, TimerPort};
pub use recognizer::ButtonState;
pub use registry::{ButtonHandle, ButtonRegistry};

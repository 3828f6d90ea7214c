//! Platform adapters implementing the [`crate::ports`] traits.
//!
//! Only the ESP-IDF adapter ships here; host tests bring their own
//! simulated platform.

#[cfg(all(feature = "espidf", target_os = "espidf"))]
pub mod esp;

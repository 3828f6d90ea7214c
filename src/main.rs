//! Demo entry point: one button on the boot-button GPIO, gestures logged.
//!
//! ```text
//! edge ISR ──▶ debounce timer ──▶ registry dispatch ──▶ LogSink
//! ```
//!
//! Built only for ESP-IDF targets (`--features espidf`).

#![deny(unused_must_use)]

#[cfg(target_os = "espidf")]
mod demo {
    use std::sync::OnceLock;
    use std::thread;
    use std::time::Duration;

    use anyhow::Result;
    use log::info;

    use button_gesture::adapters::esp::{self, EspGpio, EspTimers};
    use button_gesture::{ActiveLevel, ButtonConfig, ButtonEvent, ButtonRegistry, EventSink};

    /// The ESP32 boot button: active-low with an external pull-up.
    const BUTTON_GPIO: i32 = 0;

    struct LogSink;

    impl EventSink for LogSink {
        fn emit(&mut self, event: ButtonEvent) {
            info!("gesture: {:?}", event);
        }
    }

    static REGISTRY: OnceLock<ButtonRegistry<EspGpio, EspTimers, LogSink>> = OnceLock::new();

    pub fn run() -> Result<()> {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;

        info!("button-gesture demo v{}", env!("CARGO_PKG_VERSION"));

        let (gpio, timers) = esp::platform();
        let registry = REGISTRY.get_or_init(|| ButtonRegistry::new(gpio, timers));
        esp::install_dispatch(|cookie| {
            if let Some(registry) = REGISTRY.get() {
                registry.dispatch_timer(cookie);
            }
        });

        let handle = registry.create(
            ButtonConfig::new(BUTTON_GPIO, ActiveLevel::Low),
            Some(LogSink),
        )?;
        info!("button ready (handle {})", handle.raw());

        loop {
            thread::sleep(Duration::from_secs(5));
            info!(
                "state={:?} pressed={}",
                registry.get_state(handle),
                registry.is_pressed(handle)
            );
        }
    }
}

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    demo::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("button-demo targets ESP-IDF; build with the espidf feature for an ESP32 target");
}

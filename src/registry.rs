//! Button instance registry and timer dispatch.
//!
//! Owns the live instances, maps opaque handles to per-button state, and
//! hosts the two entry points the platform calls back into:
//! [`handle_edge`](ButtonRegistry::handle_edge) from the edge-interrupt
//! path and [`dispatch_timer`](ButtonRegistry::dispatch_timer) from the
//! timer service. All state mutation happens on the dispatch path; API
//! reads take the per-instance guard briefly, so a control task can poll
//! [`get_state`](ButtonRegistry::get_state) while the timer thread is
//! mid-transition.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::config::{ActiveLevel, ButtonConfig};
use crate::error::{ButtonError, Result};
use crate::events::ButtonEvent;
use crate::ports::{EventSink, GpioPort, Pull, TimerCookie, TimerKind, TimerPort};
use crate::recognizer::{ButtonCore, ButtonState, Step, TimerOp};

/// Opaque button identity. Unique for the process lifetime; a value is
/// never reissued while any instance is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonHandle(u32);

impl ButtonHandle {
    /// Raw value, e.g. for embedding in a platform timer cookie.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// The three one-shot timers every instance owns.
struct TimerSet<H> {
    debounce: H,
    long_press: H,
    double_click: H,
}

/// Recognition state plus the liveness flag `delete` uses to squelch
/// callbacks that raced the teardown.
struct Guarded {
    core: ButtonCore,
    alive: bool,
}

/// One live button instance.
struct ButtonDev<S, H> {
    pin: i32,
    active_level: ActiveLevel,
    debounce_ticks: u32,
    timers: TimerSet<H>,
    guarded: Mutex<Guarded>,
    sink: Mutex<Option<S>>,
}

/// Recover the guard even if a sink panic poisoned the mutex; the engine
/// must keep serving events afterwards.
fn lock<'a, D>(mutex: &'a Mutex<D>) -> MutexGuard<'a, D> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of live button instances, generic over the platform ports and
/// the event sink type.
pub struct ButtonRegistry<G, T, S>
where
    G: GpioPort,
    T: TimerPort,
    S: EventSink,
{
    gpio: G,
    timers: T,
    instances: Mutex<HashMap<u32, Arc<ButtonDev<S, T::Handle>>>>,
    next_handle: AtomicU32,
}

impl<G, T, S> ButtonRegistry<G, T, S>
where
    G: GpioPort,
    T: TimerPort,
    S: EventSink,
{
    pub fn new(gpio: G, timers: T) -> Self {
        Self {
            gpio,
            timers,
            instances: Mutex::new(HashMap::new()),
            next_handle: AtomicU32::new(1),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Register a new button. All-or-nothing: on any failure every
    /// partially-acquired resource is released before the error returns.
    pub fn create(&self, config: ButtonConfig, sink: Option<S>) -> Result<ButtonHandle> {
        let config = config.normalized();
        config.validate(self.gpio.max_pin())?;

        let handle = ButtonHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));

        // Pressing must pull the line away from its resting level.
        let pull = match config.active_level {
            ActiveLevel::Low => Pull::Up,
            ActiveLevel::High => Pull::Down,
        };
        self.gpio.configure_input(config.pin, pull)?;
        self.gpio.install_isr_service()?;

        let debounce_ticks = self.timers.ms_to_ticks(config.debounce_ms).max(1);
        let long_press_ticks = self.timers.ms_to_ticks(config.long_press_ms).max(1);
        let double_click_ticks = self.timers.ms_to_ticks(config.double_click_ms).max(1);

        let debounce = self.timers.create(
            "btn-debounce",
            debounce_ticks,
            TimerCookie {
                button: handle,
                kind: TimerKind::Debounce,
            },
        )?;
        let long_press = match self.timers.create(
            "btn-long-press",
            long_press_ticks,
            TimerCookie {
                button: handle,
                kind: TimerKind::LongPress,
            },
        ) {
            Ok(t) => t,
            Err(e) => {
                self.timers.delete(debounce);
                return Err(e.into());
            }
        };
        let double_click = match self.timers.create(
            "btn-double-click",
            double_click_ticks,
            TimerCookie {
                button: handle,
                kind: TimerKind::DoubleClick,
            },
        ) {
            Ok(t) => t,
            Err(e) => {
                self.timers.delete(debounce);
                self.timers.delete(long_press);
                return Err(e.into());
            }
        };
        if let Err(e) = self.gpio.add_edge_handler(config.pin, handle) {
            self.timers.delete(debounce);
            self.timers.delete(long_press);
            self.timers.delete(double_click);
            return Err(e.into());
        }

        let dev = Arc::new(ButtonDev {
            pin: config.pin,
            active_level: config.active_level,
            debounce_ticks,
            timers: TimerSet {
                debounce,
                long_press,
                double_click,
            },
            guarded: Mutex::new(Guarded {
                core: ButtonCore::new(),
                alive: true,
            }),
            sink: Mutex::new(sink),
        });
        lock(&self.instances).insert(handle.raw(), dev);

        info!(
            "button {}: created on pin {} (debounce {} ms, long-press {} ms, double-click {} ms)",
            handle.raw(),
            config.pin,
            config.debounce_ms,
            config.long_press_ms,
            config.double_click_ms
        );
        Ok(handle)
    }

    /// Tear down a button. The edge handler goes first so no new edges can
    /// arrive, then the three timers, then the instance itself. A second
    /// delete of the same handle reports an invalid argument.
    pub fn delete(&self, handle: ButtonHandle) -> Result<()> {
        let dev = self
            .instance(handle)
            .ok_or(ButtonError::InvalidArg("unknown handle"))?;
        {
            let mut guarded = lock(&dev.guarded);
            if !guarded.alive {
                return Err(ButtonError::InvalidArg("handle already deleted"));
            }
            guarded.alive = false;
        }

        self.gpio.remove_edge_handler(dev.pin);
        self.timers.stop(dev.timers.debounce);
        self.timers.stop(dev.timers.long_press);
        self.timers.stop(dev.timers.double_click);
        self.timers.delete(dev.timers.debounce);
        self.timers.delete(dev.timers.long_press);
        self.timers.delete(dev.timers.double_click);
        lock(&self.instances).remove(&handle.raw());

        info!("button {}: deleted (pin {})", handle.raw(), dev.pin);
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────

    /// Logical state; unknown handles read as `Idle`.
    pub fn get_state(&self, handle: ButtonHandle) -> ButtonState {
        match self.instance(handle) {
            Some(dev) => lock(&dev.guarded).core.state,
            None => ButtonState::Idle,
        }
    }

    /// Debounced line status; unknown handles read as released.
    pub fn is_pressed(&self, handle: ButtonHandle) -> bool {
        match self.instance(handle) {
            Some(dev) => lock(&dev.guarded).core.is_pressed,
            None => false,
        }
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        lock(&self.instances).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Platform entry points ─────────────────────────────────

    /// Edge notification for `handle`: restart the debounce window.
    ///
    /// The hardware ISR shim performs the equivalent directly against the
    /// debounce timer; this entry point serves dispatch paths that deliver
    /// edges as messages.
    pub fn handle_edge(&self, handle: ButtonHandle) {
        if let Some(dev) = self.instance(handle) {
            self.timers.reset_from_isr(dev.timers.debounce);
        }
    }

    /// Timer-service entry point: one expired one-shot timer.
    pub fn dispatch_timer(&self, cookie: TimerCookie) {
        let Some(dev) = self.instance(cookie.button) else {
            debug!(
                "{:?} expiry for dead button {} dropped",
                cookie.kind,
                cookie.button.raw()
            );
            return;
        };
        let step = match cookie.kind {
            TimerKind::Debounce => self.debounce_expired(&dev),
            TimerKind::LongPress => self.long_press_expired(&dev),
            TimerKind::DoubleClick => self.double_click_expired(&dev),
        };
        self.apply(&dev, &step);
    }

    // ── Internal ──────────────────────────────────────────────

    fn instance(&self, handle: ButtonHandle) -> Option<Arc<ButtonDev<S, T::Handle>>> {
        lock(&self.instances).get(&handle.raw()).cloned()
    }

    fn debounce_expired(&self, dev: &ButtonDev<S, T::Handle>) -> Step {
        let is_active = self.gpio.read_level(dev.pin) == dev.active_level.pin_state();
        let now = self.timers.now_ticks();
        let min_gap = u64::from(dev.debounce_ticks / 2);

        let mut guarded = lock(&dev.guarded);
        if !guarded.alive {
            return Step::none();
        }
        debug!(
            "button pin {}: stable sample active={} at tick {}",
            dev.pin, is_active, now
        );
        guarded.core.debounce_sample(is_active, now, min_gap)
    }

    fn long_press_expired(&self, dev: &ButtonDev<S, T::Handle>) -> Step {
        // Re-sample: a release may have arrived just before the deadline.
        let still_active = self.gpio.read_level(dev.pin) == dev.active_level.pin_state();

        let mut guarded = lock(&dev.guarded);
        if !guarded.alive {
            return Step::none();
        }
        guarded.core.long_press_deadline(still_active)
    }

    fn double_click_expired(&self, dev: &ButtonDev<S, T::Handle>) -> Step {
        let mut guarded = lock(&dev.guarded);
        if !guarded.alive {
            return Step::none();
        }
        guarded.core.double_click_deadline()
    }

    fn apply(&self, dev: &ButtonDev<S, T::Handle>, step: &Step) {
        for op in &step.timer_ops {
            let result = match op {
                TimerOp::StartLongPress => self.timers.start(dev.timers.long_press),
                TimerOp::StartDoubleClick => self.timers.start(dev.timers.double_click),
                TimerOp::StopLongPress => {
                    self.timers.stop(dev.timers.long_press);
                    Ok(())
                }
                TimerOp::StopDoubleClick => {
                    self.timers.stop(dev.timers.double_click);
                    Ok(())
                }
            };
            if let Err(e) = result {
                // A deadline that failed to arm resolves on the next edge.
                warn!("button pin {}: {:?} failed: {}", dev.pin, op, e);
            }
        }
        for event in &step.events {
            self.emit(dev, *event);
        }
    }

    fn emit(&self, dev: &ButtonDev<S, T::Handle>, event: ButtonEvent) {
        debug!("button pin {}: {:?}", dev.pin, event);
        let mut sink = lock(&dev.sink);
        if let Some(sink) = sink.as_mut() {
            // State is committed before the sink runs; a fault in user code
            // stays contained here and must not reach the timer service.
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| sink.emit(event)));
            if outcome.is_err() {
                warn!("button pin {}: event sink panicked on {:?}", dev.pin, event);
            }
        }
    }
}

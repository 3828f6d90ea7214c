//! ESP-IDF adapters: GPIO over the gpio driver, timers over `esp_timer`.
//!
//! Written against the raw `esp_idf_svc::sys` bindings. Timer callbacks
//! are dispatched in the esp_timer task (not ISR context), so they may
//! take locks and re-enter the registry through the installed dispatch
//! hook. The edge ISR shim is allocation- and lock-free: its cookie is a
//! per-button slot holding the debounce timer handle and period, so the
//! interrupt does nothing but kick that timer.

use core::ffi::c_void;
use std::collections::HashMap;
use std::ffi::CString;
use std::sync::{Arc, Mutex, OnceLock};

use embedded_hal::digital::PinState;
use esp_idf_svc::sys::*;
use log::{info, warn};

use crate::ports::{GpioPort, PlatformError, Pull, TimerCookie, TimerKind, TimerPort};
use crate::registry::ButtonHandle;

/// Build the paired GPIO and timer adapters. They share the table that
/// maps a button to its debounce timer, which the edge ISR needs.
pub fn platform() -> (EspGpio, EspTimers) {
    let shared = Arc::new(Mutex::new(HashMap::new()));
    (
        EspGpio {
            debounce_timers: shared.clone(),
            slots: Mutex::new(HashMap::new()),
        },
        EspTimers {
            debounce_timers: shared,
            meta: Mutex::new(HashMap::new()),
        },
    )
}

/// Hook timer expirations are dispatched through; the application installs
/// a plain `fn` that forwards the cookie to its registry.
static DISPATCH: OnceLock<fn(TimerCookie)> = OnceLock::new();

/// Install the expiry dispatch hook. Call once, before creating buttons.
pub fn install_dispatch(hook: fn(TimerCookie)) {
    if DISPATCH.set(hook).is_err() {
        warn!("esp adapter: dispatch hook already installed");
    }
}

// ───────────────────────────────────────────────────────────────
// Timer port
// ───────────────────────────────────────────────────────────────

/// Opaque wrapper over `esp_timer_handle_t`; raw pointers are not `Send`,
/// the registry only needs an identity to hand back.
#[derive(Debug, Clone, Copy)]
pub struct EspTimerHandle(usize);

impl EspTimerHandle {
    fn raw(self) -> esp_timer_handle_t {
        self.0 as esp_timer_handle_t
    }
}

/// Leaked per-timer context handed to the C callback.
struct TimerCtx {
    cookie: TimerCookie,
}

/// Debounce timer info the edge ISR shim needs, keyed by button handle.
type DebounceTable = Arc<Mutex<HashMap<u32, (usize, u64)>>>;

/// Sidecar bookkeeping per live timer.
struct TimerMeta {
    ctx: usize,
    period_us: u64,
    cookie: TimerCookie,
    /// Keeps the C-string name alive for the lifetime of the timer.
    _name: CString,
}

pub struct EspTimers {
    debounce_timers: DebounceTable,
    meta: Mutex<HashMap<usize, TimerMeta>>,
}

unsafe extern "C" fn timer_trampoline(arg: *mut c_void) {
    // SAFETY: `arg` is the TimerCtx leaked in `create`, freed only in
    // `delete` after the timer is stopped and destroyed.
    let ctx = unsafe { &*(arg.cast::<TimerCtx>()) };
    if let Some(hook) = DISPATCH.get() {
        hook(ctx.cookie);
    }
}

impl TimerPort for EspTimers {
    type Handle = EspTimerHandle;

    /// esp_timer schedules in microseconds.
    fn ms_to_ticks(&self, ms: u32) -> u32 {
        ms.saturating_mul(1000)
    }

    fn now_ticks(&self) -> u64 {
        // SAFETY: esp_timer_get_time is a monotonic counter read.
        (unsafe { esp_timer_get_time() }) as u64
    }

    fn create(
        &self,
        name: &'static str,
        period_ticks: u32,
        cookie: TimerCookie,
    ) -> Result<Self::Handle, PlatformError> {
        let c_name = CString::new(name).map_err(|_| PlatformError::TimerCreateFailed)?;
        let ctx = Box::into_raw(Box::new(TimerCtx { cookie }));

        let args = esp_timer_create_args_t {
            callback: Some(timer_trampoline),
            arg: ctx.cast::<c_void>(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c_name.as_ptr(),
            skip_unhandled_events: false,
        };
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        // SAFETY: args points to a fully initialised struct; the name and
        // ctx it references outlive the timer via TimerMeta.
        let rc = unsafe { esp_timer_create(&args, &mut handle) };
        if rc != ESP_OK {
            // SAFETY: ctx was never registered; reclaim it.
            drop(unsafe { Box::from_raw(ctx) });
            return Err(PlatformError::TimerCreateFailed);
        }

        let period_us = u64::from(period_ticks);
        self.meta.lock().unwrap_or_else(|e| e.into_inner()).insert(
            handle as usize,
            TimerMeta {
                ctx: ctx as usize,
                period_us,
                cookie,
                _name: c_name,
            },
        );
        if cookie.kind == TimerKind::Debounce {
            self.debounce_timers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(cookie.button.raw(), (handle as usize, period_us));
        }
        Ok(EspTimerHandle(handle as usize))
    }

    fn start(&self, timer: Self::Handle) -> Result<(), PlatformError> {
        let period_us = self
            .meta
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&timer.0)
            .map(|m| m.period_us)
            .ok_or(PlatformError::TimerStartFailed)?;
        // SAFETY: handle came from esp_timer_create and is still live.
        // A stopped one-shot rejects esp_timer_stop with INVALID_STATE,
        // which is fine — the point is a clean restart either way.
        unsafe {
            esp_timer_stop(timer.raw());
            let rc = esp_timer_start_once(timer.raw(), period_us);
            if rc != ESP_OK {
                return Err(PlatformError::TimerStartFailed);
            }
        }
        Ok(())
    }

    fn stop(&self, timer: Self::Handle) {
        // SAFETY: handle came from esp_timer_create and is still live.
        unsafe {
            esp_timer_stop(timer.raw());
        }
    }

    fn reset_from_isr(&self, timer: Self::Handle) {
        // On this adapter the hardware edge shim kicks the timer directly
        // (see `edge_isr`); this path only runs from task context, e.g.
        // when edges arrive as messages.
        if let Err(e) = self.start(timer) {
            warn!("esp adapter: debounce restart failed: {e}");
        }
    }

    fn delete(&self, timer: Self::Handle) {
        let meta = self
            .meta
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&timer.0);
        // SAFETY: stop before delete per esp_timer contract; the leaked
        // TimerCtx is reclaimed only after the timer can no longer fire.
        unsafe {
            esp_timer_stop(timer.raw());
            esp_timer_delete(timer.raw());
        }
        if let Some(meta) = meta {
            if meta.cookie.kind == TimerKind::Debounce {
                self.debounce_timers
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&meta.cookie.button.raw());
            }
            // SAFETY: ctx was leaked in `create` and unregistered above.
            drop(unsafe { Box::from_raw(meta.ctx as *mut TimerCtx) });
        }
    }
}

// ───────────────────────────────────────────────────────────────
// GPIO port
// ───────────────────────────────────────────────────────────────

/// Per-pin slot the edge ISR reads. Leaked by `add_edge_handler`, freed
/// after `gpio_isr_handler_remove` when no further edges can arrive.
struct EdgeSlot {
    timer: usize,
    period_us: u64,
}

pub struct EspGpio {
    debounce_timers: DebounceTable,
    /// pin → leaked EdgeSlot pointer.
    slots: Mutex<HashMap<i32, usize>>,
}

unsafe extern "C" fn edge_isr(arg: *mut c_void) {
    // SAFETY: `arg` is the EdgeSlot leaked in add_edge_handler; it is
    // freed only after the handler is removed.
    let slot = unsafe { &*(arg.cast::<EdgeSlot>()) };
    // Restart the debounce window. esp_timer start/stop are ISR-safe.
    // SAFETY: the slot's timer outlives the edge registration.
    unsafe {
        esp_timer_stop(slot.timer as esp_timer_handle_t);
        esp_timer_start_once(slot.timer as esp_timer_handle_t, slot.period_us);
    }
}

impl GpioPort for EspGpio {
    fn max_pin(&self) -> i32 {
        gpio_num_t_GPIO_NUM_MAX as i32
    }

    fn configure_input(&self, pin: i32, pull: Pull) -> Result<(), PlatformError> {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: match pull {
                Pull::Up => gpio_pullup_t_GPIO_PULLUP_ENABLE,
                Pull::Down => gpio_pullup_t_GPIO_PULLUP_DISABLE,
            },
            pull_down_en: match pull {
                Pull::Up => gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                Pull::Down => gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            },
            intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
        };
        // SAFETY: cfg is a fully initialised gpio_config_t.
        let rc = unsafe { gpio_config(&cfg) };
        if rc != ESP_OK {
            return Err(PlatformError::GpioConfigFailed(rc));
        }
        Ok(())
    }

    fn read_level(&self, pin: i32) -> PinState {
        // SAFETY: gpio_get_level is a register read on a configured input.
        PinState::from(unsafe { gpio_get_level(pin) } != 0)
    }

    fn install_isr_service(&self) -> Result<(), PlatformError> {
        // SAFETY: gpio_install_isr_service is idempotent; INVALID_STATE
        // means it was already installed.
        let rc = unsafe { gpio_install_isr_service(0) };
        if rc != ESP_OK && rc != ESP_ERR_INVALID_STATE {
            return Err(PlatformError::IsrInstallFailed(rc));
        }
        Ok(())
    }

    fn add_edge_handler(&self, pin: i32, cookie: ButtonHandle) -> Result<(), PlatformError> {
        let (timer, period_us) = self
            .debounce_timers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&cookie.raw())
            .copied()
            .ok_or(PlatformError::IsrAddFailed(ESP_ERR_INVALID_STATE))?;

        let slot = Box::into_raw(Box::new(EdgeSlot { timer, period_us }));
        // SAFETY: slot stays leaked until remove_edge_handler; the ISR only
        // reads it.
        let rc = unsafe { gpio_isr_handler_add(pin, Some(edge_isr), slot.cast::<c_void>()) };
        if rc != ESP_OK {
            // SAFETY: registration failed, the ISR never saw the slot.
            drop(unsafe { Box::from_raw(slot) });
            return Err(PlatformError::IsrAddFailed(rc));
        }
        // SAFETY: pin was configured for any-edge interrupts in
        // configure_input.
        unsafe {
            gpio_intr_enable(pin);
        }
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(pin, slot as usize);
        info!("esp adapter: edge handler armed on pin {pin}");
        Ok(())
    }

    fn remove_edge_handler(&self, pin: i32) {
        // SAFETY: disabling and removing the handler stops edge delivery;
        // only then is the slot reclaimed.
        unsafe {
            gpio_intr_disable(pin);
            gpio_isr_handler_remove(pin);
        }
        if let Some(slot) = self
            .slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&pin)
        {
            // SAFETY: the ISR is unregistered; the leaked slot is ours again.
            drop(unsafe { Box::from_raw(slot as *mut EdgeSlot) });
        }
    }
}

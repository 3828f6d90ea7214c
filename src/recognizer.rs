//! Per-button recognition core.
//!
//! Pure state, no platform access, no locking. Each entry point consumes
//! one input — a stable debounce sample or a deadline expiry — and returns
//! the [`Step`] to apply: events to emit, in order, plus deadline timers to
//! arm or cancel. The registry owns the clock, the GPIO read, and the
//! guard; this module owns the decisions.
//!
//! Every entry point starts by re-validating the flags that gated its
//! arming, so a deadline that raced its own cancellation lands as a no-op.

use heapless::Vec;

use crate::events::ButtonEvent;

/// Logical recognition state. Discriminants match the C component ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ButtonState {
    /// No interaction in flight.
    Idle = 0,
    /// Press confirmed, long-press deadline armed.
    Pressed = 1,
    /// Press held past the long-press threshold.
    LongPress = 2,
    /// Release seen, click classification pending. Retained for wire
    /// compatibility; the click-after-timeout policy reports `Idle` during
    /// the wait.
    ShortPress = 3,
    /// Second press of a chain released inside the double-click window.
    DoubleClick = 4,
}

/// Convert a raw discriminant back to a [`ButtonState`].
pub fn state_from_u8(raw: u8) -> Option<ButtonState> {
    match raw {
        0 => Some(ButtonState::Idle),
        1 => Some(ButtonState::Pressed),
        2 => Some(ButtonState::LongPress),
        3 => Some(ButtonState::ShortPress),
        4 => Some(ButtonState::DoubleClick),
        _ => None,
    }
}

/// Deadline operations a step asks the registry to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerOp {
    StartLongPress,
    StopLongPress,
    StartDoubleClick,
    StopDoubleClick,
}

/// Outcome of one recognizer entry: events in emission order plus timer
/// operations. A single input produces at most two of each.
#[derive(Debug, Default)]
pub(crate) struct Step {
    pub events: Vec<ButtonEvent, 2>,
    pub timer_ops: Vec<TimerOp, 2>,
}

impl Step {
    pub fn none() -> Self {
        Self::default()
    }

    fn emit(&mut self, event: ButtonEvent) {
        let pushed = self.events.push(event).is_ok();
        debug_assert!(pushed, "event batch capacity exceeded");
    }

    fn op(&mut self, op: TimerOp) {
        let pushed = self.timer_ops.push(op).is_ok();
        debug_assert!(pushed, "timer op capacity exceeded");
    }
}

/// Dynamic per-button state.
#[derive(Debug)]
pub(crate) struct ButtonCore {
    pub state: ButtonState,
    pub is_pressed: bool,
    pub click_count: u8,
    pub waiting_for_double_click: bool,
    /// Tick of the last emitted press/release edge, for the residual-noise
    /// guard.
    last_event_tick: u64,
}

impl ButtonCore {
    pub fn new() -> Self {
        Self {
            state: ButtonState::Idle,
            is_pressed: false,
            click_count: 0,
            waiting_for_double_click: false,
            last_event_tick: 0,
        }
    }

    /// Stable debounce sample: the line has been quiet for the debounce
    /// window and currently reads `is_active`.
    pub fn debounce_sample(&mut self, is_active: bool, now_ticks: u64, min_gap_ticks: u64) -> Step {
        let mut step = Step::none();

        // Self-heal: a release can slip in between the long-press deadline
        // and its dispatch, leaving LongPress with the line already up.
        if self.state == ButtonState::LongPress && !self.is_pressed {
            self.state = ButtonState::Idle;
        }

        // A flip arriving sooner than half the debounce window after the
        // last emitted edge is residual contact noise.
        if is_active != self.is_pressed
            && now_ticks.saturating_sub(self.last_event_tick) < min_gap_ticks
        {
            return step;
        }

        if is_active && !self.is_pressed {
            // Press confirmed.
            self.is_pressed = true;
            self.state = ButtonState::Pressed;
            if self.waiting_for_double_click {
                // Second press of the chain.
                self.waiting_for_double_click = false;
                self.click_count = 2;
                step.op(TimerOp::StopDoubleClick);
            } else {
                self.click_count = 1;
            }
            step.op(TimerOp::StartLongPress);
            step.emit(ButtonEvent::Pressed);
            self.last_event_tick = now_ticks;
        } else if !is_active && self.is_pressed {
            // Release confirmed.
            self.is_pressed = false;
            step.op(TimerOp::StopLongPress);

            let was_long_press = self.state == ButtonState::LongPress;
            step.emit(ButtonEvent::Released);

            if was_long_press {
                // The chain already terminated at the long-press.
                self.state = ButtonState::Idle;
                self.click_count = 0;
            } else if self.click_count == 2 {
                self.state = ButtonState::DoubleClick;
                step.emit(ButtonEvent::DoubleClick);
                self.click_count = 0;
            } else {
                // Single click so far; classification waits out the
                // double-click window.
                self.state = ButtonState::Idle;
                self.waiting_for_double_click = true;
                step.op(TimerOp::StartDoubleClick);
            }
            self.last_event_tick = now_ticks;
        }

        step
    }

    /// Long-press deadline fired `long_press_ms` after a confirmed press.
    /// `still_active` is a fresh line sample taken by the caller.
    pub fn long_press_deadline(&mut self, still_active: bool) -> Step {
        let mut step = Step::none();

        if !self.is_pressed {
            // Cancelled by a release that beat the dispatch.
            return step;
        }
        if !still_active {
            // Released between expiry and dispatch; stop claiming the line
            // is down and let the pending release sample land as a no-op.
            self.is_pressed = false;
            return step;
        }
        if self.state != ButtonState::Pressed {
            return step;
        }

        // Long-press supersedes any pending click chain.
        self.waiting_for_double_click = false;
        step.op(TimerOp::StopDoubleClick);
        self.click_count = 0;
        self.state = ButtonState::LongPress;
        step.emit(ButtonEvent::LongPress);
        step
    }

    /// Double-click deadline fired `double_click_ms` after a lone release.
    pub fn double_click_deadline(&mut self) -> Step {
        let mut step = Step::none();

        if !self.waiting_for_double_click {
            // A second press or a long-press already resolved the chain.
            return step;
        }
        self.waiting_for_double_click = false;

        let lone_click = self.click_count == 1;
        self.click_count = 0;
        if lone_click {
            step.emit(ButtonEvent::Click);
            if !self.is_pressed {
                self.state = ButtonState::Idle;
            }
        }
        step
    }
}

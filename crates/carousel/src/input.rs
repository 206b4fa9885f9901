//! Input coordinator: normalizes wheel, touch, keyboard, pointer and tilt
//! input into rate-limited discrete navigation intents plus one continuous
//! pointer offset in [-1, 1].

use std::time::Instant;

use showconfig::Tuning;

use crate::nav::Navigator;

/// Tilt-to-pointer mapping used by the original show: gamma maps through
/// `/30`, beta is centred on the 45 degree hold angle.
const TILT_GAMMA_SCALE: f32 = 30.0;
const TILT_BETA_CENTER: f32 = 45.0;
const TILT_BETA_SCALE: f32 = 30.0;

/// A discrete navigation intent produced by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavIntent {
    /// Advance (+1) or retreat (-1) by one panel.
    Step(i32),
    Home,
    About,
    /// Absolute target, already 0-indexed and range-checked.
    Goto(usize),
}

/// Keyboard keys the coordinator understands; mapping from the window
/// toolkit's key type happens at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Next,
    Prev,
    Home,
    End,
}

/// Which device currently drives the continuous pointer signal. The
/// transition is one-way: the first tilt sample latches `Tilt` for the rest
/// of the session and mouse updates are ignored from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Mouse,
    Tilt,
}

/// Continuous pointer offset, last-write-wins, both axes in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
}

pub struct InputCoordinator {
    tuning: InputTuning,
    last_advance: Option<Instant>,
    touch_start_y: Option<f32>,
    pointer: PointerState,
    source: PointerSource,
    pending: Vec<NavIntent>,
    unlock_requested: bool,
    unlocked: bool,
}

struct InputTuning {
    cooldown: std::time::Duration,
    wheel_threshold: f32,
    touch_threshold: f32,
}

impl InputCoordinator {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            tuning: InputTuning {
                cooldown: tuning.cooldown,
                wheel_threshold: tuning.wheel_threshold,
                touch_threshold: tuning.touch_threshold,
            },
            last_advance: None,
            touch_start_y: None,
            pointer: PointerState::default(),
            source: PointerSource::Mouse,
            pending: Vec::new(),
            unlock_requested: false,
            unlocked: false,
        }
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    pub fn pointer_source(&self) -> PointerSource {
        self.source
    }

    /// Drains the accepted discrete intents, in arrival order.
    pub fn take_intents(&mut self) -> Vec<NavIntent> {
        std::mem::take(&mut self.pending)
    }

    /// True exactly once, after the first user gesture: the caller should
    /// run the play-then-pause unlock cycle over every media handle.
    pub fn take_unlock_request(&mut self) -> bool {
        std::mem::take(&mut self.unlock_requested)
    }

    /// Wheel input; magnitude at or below the threshold is noise.
    pub fn wheel(&mut self, delta_y: f32, nav: &Navigator, now: Instant) {
        self.request_unlock();
        if delta_y.abs() <= self.tuning.wheel_threshold {
            return;
        }
        self.step(if delta_y > 0.0 { 1 } else { -1 }, nav, now);
    }

    pub fn touch_start(&mut self, y: f32) {
        self.request_unlock();
        self.touch_start_y = Some(y);
    }

    /// Ends a touch gesture; short swipes are ignored.
    pub fn touch_end(&mut self, y: f32, nav: &Navigator, now: Instant) {
        let Some(start_y) = self.touch_start_y.take() else {
            return;
        };
        let delta = start_y - y;
        if delta.abs() <= self.tuning.touch_threshold {
            return;
        }
        self.step(if delta > 0.0 { 1 } else { -1 }, nav, now);
    }

    pub fn key(&mut self, key: NavKey, nav: &Navigator, now: Instant) {
        match key {
            NavKey::Next => self.step(1, nav, now),
            NavKey::Prev => self.step(-1, nav, now),
            NavKey::Home => self.pending.push(NavIntent::Home),
            NavKey::End => self.pending.push(NavIntent::About),
        }
    }

    /// Absolute navigation (console `goto`, home/about triggers); bypasses
    /// the cooldown the same way the original menu clicks do.
    pub fn goto(&mut self, target: usize) {
        self.pending.push(NavIntent::Goto(target));
    }

    /// Mouse movement in viewport pixels; ignored once tilt has latched.
    pub fn mouse_moved(&mut self, x: f32, y: f32, viewport: (f32, f32)) {
        if self.source == PointerSource::Tilt {
            return;
        }
        let (width, height) = viewport;
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.pointer.x = (x / width) * 2.0 - 1.0;
        self.pointer.y = -((y / height) * 2.0 - 1.0);
    }

    /// Device tilt sample in degrees. The first sample permanently latches
    /// tilt as the pointer source for this session.
    pub fn tilt(&mut self, gamma: f32, beta: f32) {
        self.source = PointerSource::Tilt;
        self.pointer.x = (gamma / TILT_GAMMA_SCALE).clamp(-1.0, 1.0);
        self.pointer.y = ((beta - TILT_BETA_CENTER) / TILT_BETA_SCALE).clamp(-1.0, 1.0);
    }

    /// Marks the unlock cycle as done so later gestures stay no-ops.
    pub fn mark_unlocked(&mut self) {
        self.unlocked = true;
    }

    fn request_unlock(&mut self) {
        if !self.unlocked {
            self.unlock_requested = true;
        }
    }

    fn step(&mut self, direction: i32, nav: &Navigator, now: Instant) {
        if nav.is_transitioning() {
            return;
        }
        if let Some(last) = self.last_advance {
            if now.saturating_duration_since(last) < self.tuning.cooldown {
                return;
            }
        }
        self.last_advance = Some(now);
        self.pending.push(NavIntent::Step(direction));
    }
}

/// Resolves an intent against the current navigation state. Returns the
/// target index, or `None` when the step would leave the valid range.
pub fn resolve_intent(intent: NavIntent, nav: &Navigator) -> Option<usize> {
    match intent {
        NavIntent::Step(direction) => {
            let current = nav.current()?;
            let target = current as i64 + direction as i64;
            if (0..nav.panel_count() as i64).contains(&target) {
                Some(target as usize)
            } else {
                None
            }
        }
        NavIntent::Home => Some(0),
        NavIntent::About => Some(nav.last_index()),
        NavIntent::Goto(target) => Some(target),
    }
}

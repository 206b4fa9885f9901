//! Navigation state machine: discrete index-based scene navigation with a
//! timed, phase-overlapped transition. `request` guards and starts a
//! transition; `tick` is the only place state advances.

use std::time::{Duration, Instant};

use showconfig::Tuning;

/// Vertical drop applied to the info panel while it is faded out.
pub const INFO_DROP_OFFSET: f32 = 20.0;

/// Easing curves used by the transition phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease {
    /// Accelerating cubic, used for the fade-out.
    In,
    /// Decelerating cubic, used for the fade-in.
    Out,
    /// Symmetric quadratic, used for the camera fly-through.
    InOut,
}

impl Ease {
    pub fn sample(self, t: f32) -> f32 {
        let clamped = t.clamp(0.0, 1.0);
        match self {
            Ease::In => clamped * clamped * clamped,
            Ease::Out => {
                let inv = 1.0 - clamped;
                1.0 - inv * inv * inv
            }
            Ease::InOut => {
                if clamped < 0.5 {
                    2.0 * clamped * clamped
                } else {
                    -1.0 + (4.0 - 2.0 * clamped) * clamped
                }
            }
        }
    }
}

/// Phase anchors for one transition, as fractions of the total duration.
///
/// The camera moves over the whole interval; the content swap is hidden in
/// the gap between the fades (`fade_out_duration <= swap_offset <
/// fade_in_start`, enforced by config validation).
#[derive(Debug, Clone, Copy)]
pub struct Timeline {
    pub total: Duration,
    pub fade_out_duration: f32,
    pub swap_offset: f32,
    pub fade_in_start: f32,
    pub fade_in_duration: f32,
}

impl Timeline {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self {
            total: tuning.transition,
            fade_out_duration: tuning.fade_out_duration,
            swap_offset: tuning.swap_offset,
            fade_in_start: tuning.fade_in_start,
            fade_in_duration: tuning.fade_in_duration,
        }
    }

    /// Fraction at which every phase has finished; the machine returns to
    /// `Idle` no earlier than this.
    fn end_fraction(&self) -> f32 {
        (self.fade_in_start + self.fade_in_duration).max(1.0)
    }

    /// Info panel opacity and vertical offset at progress `p`.
    fn info_style(&self, p: f32) -> (f32, f32) {
        if self.fade_out_duration > 0.0 && p < self.fade_out_duration {
            let faded = Ease::In.sample(p / self.fade_out_duration);
            (1.0 - faded, INFO_DROP_OFFSET * faded)
        } else if p < self.fade_in_start {
            (0.0, INFO_DROP_OFFSET)
        } else {
            let t = if self.fade_in_duration > 0.0 {
                (p - self.fade_in_start) / self.fade_in_duration
            } else {
                1.0
            };
            let restored = Ease::Out.sample(t);
            (restored, INFO_DROP_OFFSET * (1.0 - restored))
        }
    }
}

/// Media side effect requested by a navigation; best-effort downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEffect {
    /// Pause the previously active panel's stream.
    Pause { panel: usize },
    /// Seek the target panel's stream to zero and start it.
    Restart { panel: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    /// The UI content must be rewritten for `index` (fires mid-fade).
    ContentSwap { index: usize },
    /// The terminal panel gained or lost focus.
    InteractiveChanged(bool),
    /// The transition finished; the machine is `Idle(index)` again.
    Completed { index: usize },
}

/// Per-frame output consumed by the render loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavFrame {
    pub camera_z: f32,
    pub info_opacity: f32,
    pub info_offset: f32,
    pub transitioning: bool,
}

#[derive(Debug)]
struct Transition {
    from: Option<usize>,
    to: usize,
    started: Instant,
    swapped: bool,
}

/// Result of an accepted navigation request.
#[derive(Debug)]
pub struct RequestOutcome {
    pub effects: Vec<NavEffect>,
    pub events: Vec<NavEvent>,
}

/// The navigation state machine. `Uninitialized` until the first request,
/// then alternating `Idle(index)` / `Transitioning { from, to }`; at most
/// one transition is in flight at any time.
pub struct Navigator {
    panel_count: usize,
    spacing: f32,
    timeline: Timeline,
    current: Option<usize>,
    transition: Option<Transition>,
    interactive: bool,
}

impl Navigator {
    pub fn new(panel_count: usize, tuning: &Tuning) -> Self {
        Self {
            panel_count,
            spacing: tuning.spacing,
            timeline: Timeline::from_tuning(tuning),
            current: None,
            transition: None,
            interactive: false,
        }
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn panel_count(&self) -> usize {
        self.panel_count
    }

    pub fn last_index(&self) -> usize {
        self.panel_count.saturating_sub(1)
    }

    /// Fixed travel-axis coordinate of a panel.
    pub fn panel_z(&self, index: usize) -> f32 {
        -(index as f32) * self.spacing
    }

    /// Requests navigation to `target`. Returns `None` (silently, no error)
    /// when a transition is in flight, the target is already active, or the
    /// target is out of range. On acceptance the caller receives the media
    /// effects and any immediately-due events; with `instant` the machine
    /// lands in `Idle(target)` with no intermediate frame.
    pub fn request(&mut self, target: usize, instant: bool, now: Instant) -> Option<RequestOutcome> {
        if self.transition.is_some() || Some(target) == self.current || target >= self.panel_count {
            return None;
        }

        let previous = self.current;
        self.current = Some(target);

        let mut effects = Vec::with_capacity(2);
        if let Some(prev) = previous {
            effects.push(NavEffect::Pause { panel: prev });
        }
        effects.push(NavEffect::Restart { panel: target });

        let mut events = Vec::new();
        let interactive = target == self.last_index();
        if interactive != self.interactive {
            self.interactive = interactive;
            events.push(NavEvent::InteractiveChanged(interactive));
        }

        if instant {
            events.push(NavEvent::ContentSwap { index: target });
            events.push(NavEvent::Completed { index: target });
        } else {
            tracing::debug!(from = ?previous, to = target, "transition started");
            self.transition = Some(Transition {
                from: previous,
                to: target,
                started: now,
                swapped: false,
            });
        }

        Some(RequestOutcome { effects, events })
    }

    /// Advances the transition clock and produces the frame values for the
    /// render loop plus any events that became due.
    pub fn tick(&mut self, now: Instant) -> (NavFrame, Vec<NavEvent>) {
        let Some(transition) = &mut self.transition else {
            let camera_z = self
                .current
                .map(|index| -(index as f32) * self.spacing)
                .unwrap_or(0.0);
            let info_opacity = if self.current.is_some() { 1.0 } else { 0.0 };
            return (
                NavFrame {
                    camera_z,
                    info_opacity,
                    info_offset: 0.0,
                    transitioning: false,
                },
                Vec::new(),
            );
        };

        let elapsed = now.saturating_duration_since(transition.started);
        let p = elapsed.as_secs_f32() / self.timeline.total.as_secs_f32().max(f32::EPSILON);

        let mut events = Vec::new();
        if !transition.swapped && p >= self.timeline.swap_offset {
            transition.swapped = true;
            events.push(NavEvent::ContentSwap {
                index: transition.to,
            });
        }

        let to_z = -(transition.to as f32) * self.spacing;
        let from_z = transition
            .from
            .map(|index| -(index as f32) * self.spacing)
            .unwrap_or(to_z);
        let camera_z = from_z + (to_z - from_z) * Ease::InOut.sample(p);
        let (info_opacity, info_offset) = self.timeline.info_style(p);

        let finished = p >= self.timeline.end_fraction();
        let frame = NavFrame {
            camera_z,
            info_opacity,
            info_offset,
            transitioning: !finished,
        };

        if finished {
            let index = transition.to;
            // Late swap guard: a tick can jump straight past the swap point.
            if !transition.swapped {
                events.push(NavEvent::ContentSwap { index });
            }
            self.transition = None;
            events.push(NavEvent::Completed { index });
            tracing::debug!(index, "transition completed");
        }

        (frame, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn navigator(count: usize) -> Navigator {
        Navigator::new(count, &Tuning::default())
    }

    fn complete(nav: &mut Navigator, started: Instant) -> Vec<NavEvent> {
        nav.tick(started + Duration::from_secs(10)).1
    }

    #[test]
    fn idle_request_lands_on_exact_target() {
        let mut nav = navigator(4);
        let now = Instant::now();
        nav.request(0, true, now).expect("initial");
        let outcome = nav.request(2, false, now).expect("accepted");
        assert!(outcome
            .effects
            .contains(&NavEffect::Restart { panel: 2 }));
        assert!(nav.is_transitioning());
        let events = complete(&mut nav, now);
        assert!(events.contains(&NavEvent::Completed { index: 2 }));
        assert_eq!(nav.current(), Some(2));
        assert!(!nav.is_transitioning());
    }

    #[test]
    fn request_during_transition_is_dropped() {
        let mut nav = navigator(4);
        let now = Instant::now();
        nav.request(0, true, now);
        nav.request(1, false, now).expect("accepted");
        assert!(nav.request(3, false, now).is_none());
        assert_eq!(nav.current(), Some(1));
        complete(&mut nav, now);
        assert_eq!(nav.current(), Some(1));
    }

    #[test]
    fn same_index_request_never_starts_a_transition() {
        let mut nav = navigator(4);
        let now = Instant::now();
        nav.request(0, true, now);
        assert!(nav.request(0, false, now).is_none());
        assert!(!nav.is_transitioning());
    }

    #[test]
    fn out_of_range_target_is_silently_ignored() {
        let mut nav = navigator(4);
        let now = Instant::now();
        assert!(nav.request(4, false, now).is_none());
        assert!(nav.request(99, true, now).is_none());
        assert_eq!(nav.current(), None);
    }

    #[test]
    fn instant_request_completes_synchronously() {
        let mut nav = navigator(4);
        let now = Instant::now();
        let outcome = nav.request(0, true, now).expect("accepted");
        assert_eq!(
            outcome.events,
            vec![
                NavEvent::ContentSwap { index: 0 },
                NavEvent::Completed { index: 0 }
            ]
        );
        assert!(!nav.is_transitioning());
        let (frame, _) = nav.tick(now);
        assert_eq!(frame.camera_z, 0.0);
        assert_eq!(frame.info_opacity, 1.0);
    }

    #[test]
    fn content_swap_fires_while_info_is_invisible() {
        let mut nav = navigator(4);
        let now = Instant::now();
        nav.request(0, true, now);
        nav.request(1, false, now);

        let half = Tuning::default().transition.mul_f32(0.5);
        let (frame, events) = nav.tick(now + half);
        assert!(events.contains(&NavEvent::ContentSwap { index: 1 }));
        assert_eq!(frame.info_opacity, 0.0);
        assert_eq!(frame.info_offset, INFO_DROP_OFFSET);
        assert!(frame.transitioning);
    }

    #[test]
    fn swap_fires_exactly_once() {
        let mut nav = navigator(4);
        let now = Instant::now();
        nav.request(0, true, now);
        nav.request(1, false, now);

        let total = Tuning::default().transition;
        let (_, first) = nav.tick(now + total.mul_f32(0.5));
        let (_, second) = nav.tick(now + total.mul_f32(0.6));
        let swaps = |events: &[NavEvent]| {
            events
                .iter()
                .filter(|e| matches!(e, NavEvent::ContentSwap { .. }))
                .count()
        };
        assert_eq!(swaps(&first), 1);
        assert_eq!(swaps(&second), 0);
    }

    #[test]
    fn frame_flags_the_whole_flight_and_clears_when_settled() {
        let tuning = Tuning::default();
        let mut nav = navigator(3);
        let now = Instant::now();
        nav.request(0, true, now);
        let (frame, _) = nav.tick(now);
        assert!(!frame.transitioning, "idle frames never report a flight");

        nav.request(2, false, now);
        for fraction in [0.0, 0.4, 0.9] {
            let (frame, _) = nav.tick(now + tuning.transition.mul_f32(fraction));
            assert!(frame.transitioning, "in flight at p = {fraction}");
        }
        let (frame, _) = nav.tick(now + tuning.transition.mul_f32(2.0));
        assert!(!frame.transitioning);
    }

    #[test]
    fn camera_eases_from_previous_to_target_z() {
        let tuning = Tuning::default();
        let mut nav = navigator(3);
        let now = Instant::now();
        nav.request(0, true, now);
        nav.request(2, false, now);

        let (start_frame, _) = nav.tick(now);
        assert!((start_frame.camera_z - 0.0).abs() < 1e-3);
        let (end_frame, _) = nav.tick(now + tuning.transition);
        assert!((end_frame.camera_z - (-2.0 * tuning.spacing)).abs() < 1e-3);
    }

    #[test]
    fn terminal_panel_toggles_interactive_mode() {
        let mut nav = navigator(3);
        let now = Instant::now();
        nav.request(0, true, now);
        assert!(!nav.is_interactive());

        let outcome = nav.request(2, false, now).expect("accepted");
        assert!(outcome
            .events
            .contains(&NavEvent::InteractiveChanged(true)));
        complete(&mut nav, now);

        let outcome = nav.request(0, false, now).expect("accepted");
        assert!(outcome
            .events
            .contains(&NavEvent::InteractiveChanged(false)));
    }

    #[test]
    fn effects_pause_previous_and_restart_target() {
        let mut nav = navigator(4);
        let now = Instant::now();
        nav.request(0, true, now);
        let outcome = nav.request(3, false, now).expect("accepted");
        assert_eq!(
            outcome.effects,
            vec![
                NavEffect::Pause { panel: 0 },
                NavEffect::Restart { panel: 3 }
            ]
        );
    }

    #[test]
    fn easing_endpoints_are_exact() {
        for ease in [Ease::In, Ease::Out, Ease::InOut] {
            assert!((ease.sample(0.0) - 0.0).abs() < 1e-6);
            assert!((ease.sample(1.0) - 1.0).abs() < 1e-6);
        }
        assert!((Ease::InOut.sample(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn late_tick_still_delivers_swap_before_completion() {
        let mut nav = navigator(2);
        let now = Instant::now();
        nav.request(0, true, now);
        nav.request(1, false, now);
        let events = complete(&mut nav, now);
        assert_eq!(
            events,
            vec![
                NavEvent::ContentSwap { index: 1 },
                NavEvent::Completed { index: 1 }
            ]
        );
    }
}

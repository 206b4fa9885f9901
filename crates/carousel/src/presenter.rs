//! Presenter: applies navigation events to the UI collaborator. The
//! collaborator contract mirrors the original page's write targets (title,
//! caption, counter pair, interactive flag); how they are displayed is the
//! embedder's business.

use crate::nav::{NavEvent, NavFrame};
use crate::PanelDescriptor;

/// Write targets the navigation core drives. Implementations must be cheap;
/// they are called from the render loop.
pub trait ContentSink {
    fn set_title(&mut self, title: &str);
    fn set_caption(&mut self, caption: &str);
    /// Both values zero-padded to two digits, e.g. `01 / 05`.
    fn set_counter(&mut self, current: String, total: String);
    fn set_interactive(&mut self, interactive: bool);
    /// Info container style for this frame: opacity in [0, 1] and a
    /// vertical drop in UI units. Called every frame; during a transition
    /// the values trace the fade-out/fade-in envelope.
    fn set_info_style(&mut self, opacity: f32, y_offset: f32);
}

pub fn format_counter(value: usize) -> String {
    format!("{value:02}")
}

/// Forwards the per-frame info style to the sink. Content is written by
/// [`apply_events`]; this carries the container's fade envelope.
pub fn apply_frame(sink: &mut dyn ContentSink, frame: &NavFrame) {
    sink.set_info_style(frame.info_opacity, frame.info_offset);
}

/// Applies swap and mode events to the sink. Content is only written on
/// `ContentSwap`, which the state machine schedules inside the invisible
/// fade gap.
pub fn apply_events(sink: &mut dyn ContentSink, panels: &[PanelDescriptor], events: &[NavEvent]) {
    for event in events {
        match event {
            NavEvent::ContentSwap { index } => {
                let Some(panel) = panels.get(*index) else {
                    tracing::warn!(index, "content swap for unknown panel");
                    continue;
                };
                sink.set_title(&panel.title);
                sink.set_caption(&panel.caption);
                sink.set_counter(format_counter(index + 1), format_counter(panels.len()));
            }
            NavEvent::InteractiveChanged(interactive) => {
                sink.set_interactive(*interactive);
            }
            NavEvent::Completed { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use showconfig::Tuning;

    use super::*;
    use crate::nav::{Navigator, INFO_DROP_OFFSET};

    #[derive(Default)]
    struct FakeSink {
        title: String,
        caption: String,
        counter: Option<(String, String)>,
        interactive: bool,
        info_style: Option<(f32, f32)>,
        writes: usize,
    }

    impl ContentSink for FakeSink {
        fn set_title(&mut self, title: &str) {
            self.title = title.to_string();
            self.writes += 1;
        }

        fn set_caption(&mut self, caption: &str) {
            self.caption = caption.to_string();
        }

        fn set_counter(&mut self, current: String, total: String) {
            self.counter = Some((current, total));
        }

        fn set_interactive(&mut self, interactive: bool) {
            self.interactive = interactive;
        }

        fn set_info_style(&mut self, opacity: f32, y_offset: f32) {
            self.info_style = Some((opacity, y_offset));
        }
    }

    fn panels() -> Vec<PanelDescriptor> {
        (0..5)
            .map(|index| PanelDescriptor {
                index,
                title: format!("PANEL {index}"),
                caption: format!("caption {index}"),
                media: "reel".into(),
            })
            .collect()
    }

    #[test]
    fn instant_navigation_round_trips_with_no_intermediate_values() {
        let panels = panels();
        let mut nav = Navigator::new(panels.len(), &Tuning::default());
        let mut sink = FakeSink::default();

        let outcome = nav.request(0, true, Instant::now()).expect("accepted");
        apply_events(&mut sink, &panels, &outcome.events);

        assert_eq!(sink.title, "PANEL 0");
        assert_eq!(sink.caption, "caption 0");
        assert_eq!(sink.counter, Some(("01".into(), "05".into())));
        assert_eq!(sink.writes, 1, "exactly one content write, no stale value");
    }

    #[test]
    fn fade_envelope_reaches_the_sink_every_frame() {
        let panels = panels();
        let tuning = Tuning::default();
        let mut nav = Navigator::new(panels.len(), &tuning);
        let mut sink = FakeSink::default();
        let now = Instant::now();
        nav.request(0, true, now);
        nav.request(1, false, now);

        // Mid-gap: the info container is fully faded and dropped.
        let (frame, _) = nav.tick(now + tuning.transition.mul_f32(0.4));
        apply_frame(&mut sink, &frame);
        assert_eq!(sink.info_style, Some((0.0, INFO_DROP_OFFSET)));

        // After completion it is fully restored.
        let (frame, _) = nav.tick(now + tuning.transition + Duration::from_secs(1));
        apply_frame(&mut sink, &frame);
        assert_eq!(sink.info_style, Some((1.0, 0.0)));
    }

    #[test]
    fn counters_are_zero_padded() {
        assert_eq!(format_counter(1), "01");
        assert_eq!(format_counter(12), "12");
    }

    #[test]
    fn interactive_flag_reaches_the_sink() {
        let panels = panels();
        let mut nav = Navigator::new(panels.len(), &Tuning::default());
        let mut sink = FakeSink::default();
        let now = Instant::now();

        nav.request(0, true, now);
        let outcome = nav.request(4, true, now).expect("accepted");
        apply_events(&mut sink, &panels, &outcome.events);
        assert!(sink.interactive);
        assert_eq!(sink.title, "PANEL 4");
    }
}

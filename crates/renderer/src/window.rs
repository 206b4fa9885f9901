use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use crossbeam_channel::Receiver;
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, MouseScrollDelta, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use carousel::console;
use carousel::input::{InputCoordinator, NavKey};
use carousel::nav::{NavEffect, NavEvent, Navigator, RequestOutcome};
use carousel::presenter::{self, ContentSink};
use carousel::PanelDescriptor;
use media::MediaRegistry;
use showconfig::Tuning;

use crate::gpu::{FrameInputs, GpuState};
use crate::scene::{layout_panels, CameraRig};

// One wheel "line" in DOM-pixel terms, so the noise threshold keeps its
// original meaning across both delta encodings.
const WHEEL_LINE_PIXELS: f32 = 40.0;

/// Everything the viewer session owns. Built by the binary, consumed by
/// [`run`], which does not return until the window closes.
pub struct ViewerParams {
    pub tuning: Tuning,
    pub panels: Vec<PanelDescriptor>,
    pub navigator: Navigator,
    pub input: InputCoordinator,
    pub registry: MediaRegistry,
    pub sink: Box<dyn ContentSink>,
    pub console_lines: Receiver<String>,
    pub surface_size: (u32, u32),
    pub target_fps: Option<f32>,
    pub window_title: String,
}

/// Optional FPS cap; uncapped, every presented frame immediately re-arms
/// the next redraw and vsync paces the loop.
struct FrameLimiter {
    interval: Option<Duration>,
    next_frame: Instant,
}

impl FrameLimiter {
    fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| *fps > 0.0)
            .map(|fps| Duration::from_secs_f32(1.0 / fps));
        Self {
            interval,
            next_frame: Instant::now(),
        }
    }

    fn ready(&self, now: Instant) -> bool {
        self.interval.is_none() || now >= self.next_frame
    }

    fn mark_rendered(&mut self, now: Instant) {
        if let Some(interval) = self.interval {
            self.next_frame = now + interval;
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.interval.map(|_| self.next_frame)
    }
}

pub fn run(params: ViewerParams) -> Result<()> {
    let ViewerParams {
        tuning,
        panels,
        mut navigator,
        mut input,
        mut registry,
        mut sink,
        console_lines,
        surface_size,
        target_fps,
        window_title,
    } = params;

    let instances = layout_panels(&panels, &tuning);
    let mut rig = CameraRig::new();

    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window_size = PhysicalSize::new(surface_size.0, surface_size.1);
    let window = WindowBuilder::new()
        .with_title(&window_title)
        .with_inner_size(window_size)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create viewer window: {err}"))?;

    let mut gpu = GpuState::new(&window, window.inner_size(), panels.len(), &tuning)?;
    let mut limiter = FrameLimiter::new(target_fps);
    let start = Instant::now();

    // First navigation: the opening panel snaps into place with its content
    // written synchronously, no intermediate frame.
    let now = Instant::now();
    if let Some(outcome) = navigator.request(0, true, now) {
        sync_window_title(&window, &window_title, &panels, &outcome.events);
        apply_outcome(outcome, &panels, &registry, sink.as_mut(), now);
    }

    window.request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::Resized(new_size) => {
                    gpu.resize(new_size);
                    window.request_redraw();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state == ElementState::Pressed && !event.repeat {
                        let now = Instant::now();
                        match event.logical_key {
                            Key::Named(NamedKey::ArrowDown)
                            | Key::Named(NamedKey::ArrowRight)
                            | Key::Named(NamedKey::PageDown) => {
                                input.key(NavKey::Next, &navigator, now);
                            }
                            Key::Named(NamedKey::ArrowUp)
                            | Key::Named(NamedKey::ArrowLeft)
                            | Key::Named(NamedKey::PageUp) => {
                                input.key(NavKey::Prev, &navigator, now);
                            }
                            Key::Named(NamedKey::Home) => {
                                input.key(NavKey::Home, &navigator, now);
                            }
                            Key::Named(NamedKey::End) => {
                                input.key(NavKey::End, &navigator, now);
                            }
                            _ => {}
                        }
                    }
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    // DOM convention: positive deltaY scrolls down/advances.
                    let delta_y = match delta {
                        MouseScrollDelta::LineDelta(_, y) => -y * WHEEL_LINE_PIXELS,
                        MouseScrollDelta::PixelDelta(position) => -position.y as f32,
                    };
                    input.wheel(delta_y, &navigator, Instant::now());
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let size = gpu.size();
                    input.mouse_moved(
                        position.x as f32,
                        position.y as f32,
                        (size.width as f32, size.height as f32),
                    );
                }
                WindowEvent::Touch(Touch {
                    phase, location, ..
                }) => match phase {
                    TouchPhase::Started => input.touch_start(location.y as f32),
                    TouchPhase::Ended => {
                        input.touch_end(location.y as f32, &navigator, Instant::now());
                    }
                    _ => {}
                },
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();

                    drain_console(
                        &console_lines,
                        &panels,
                        &mut input,
                        &navigator,
                    );

                    if input.take_unlock_request() {
                        let active = navigator
                            .current()
                            .and_then(|index| panels.get(index))
                            .map(|panel| panel.media.clone());
                        registry.unlock_all(now, active.as_deref());
                        input.mark_unlocked();
                        info!("media unlocked by first user gesture");
                    }

                    for intent in input.take_intents() {
                        let Some(target) = carousel::input::resolve_intent(intent, &navigator)
                        else {
                            continue;
                        };
                        if let Some(outcome) = navigator.request(target, false, now) {
                            apply_outcome(outcome, &panels, &registry, sink.as_mut(), now);
                        }
                    }

                    let (nav_frame, events) = navigator.tick(now);
                    sync_window_title(&window, &window_title, &panels, &events);
                    presenter::apply_events(sink.as_mut(), &panels, &events);
                    presenter::apply_frame(sink.as_mut(), &nav_frame);

                    registry.poll_events();
                    // Parallax holds still while the camera is flying.
                    if navigator.current().is_some() && !nav_frame.transitioning {
                        rig.update(input.pointer(), &tuning);
                    }

                    let result = gpu.render(FrameInputs {
                        now,
                        elapsed_secs: now.duration_since(start).as_secs_f32(),
                        camera_z: nav_frame.camera_z,
                        view: rig.view_matrix(nav_frame.camera_z, &tuning),
                        pointer: input.pointer(),
                        tilt: rig.tilt(),
                        active: navigator.current(),
                        panels: &instances,
                        tuning: &tuning,
                        registry: &registry,
                    });
                    match result {
                        Ok(()) => limiter.mark_rendered(now),
                        Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                            gpu.resize(gpu.size());
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("surface out of memory; exiting viewer");
                            elwt.exit();
                        }
                        Err(err) => {
                            warn!(error = ?err, "surface error; retrying next frame");
                        }
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                // The session never idles: the lens and any playing stream
                // animate even without navigation.
                let now = Instant::now();
                if limiter.ready(now) {
                    window.request_redraw();
                    elwt.set_control_flow(ControlFlow::Poll);
                } else if let Some(deadline) = limiter.deadline() {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                }
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}

/// Mirrors the active panel's title into the window title whenever a
/// content swap fires.
fn sync_window_title(
    window: &Window,
    base_title: &str,
    panels: &[PanelDescriptor],
    events: &[NavEvent],
) {
    for event in events {
        if let NavEvent::ContentSwap { index } = event {
            if let Some(descriptor) = panels.get(*index) {
                window.set_title(&format!("{base_title} - {}", descriptor.title));
            }
        }
    }
}

/// Routes an accepted navigation's media effects to the registry and its
/// events to the content sink. Playback failures are logged downstream,
/// never surfaced here.
fn apply_outcome(
    outcome: RequestOutcome,
    panels: &[PanelDescriptor],
    registry: &MediaRegistry,
    sink: &mut dyn ContentSink,
    now: Instant,
) {
    for effect in &outcome.effects {
        match effect {
            NavEffect::Pause { panel } => {
                if let Some(descriptor) = panels.get(*panel) {
                    registry.pause(&descriptor.media, now);
                }
            }
            NavEffect::Restart { panel } => {
                if let Some(descriptor) = panels.get(*panel) {
                    registry.restart(&descriptor.media, now);
                }
            }
        }
    }
    presenter::apply_events(sink, panels, &outcome.events);
}

/// Applies any lines the stdin console thread has queued. Output goes
/// through tracing like the rest of the HUD.
fn drain_console(
    lines: &Receiver<String>,
    panels: &[PanelDescriptor],
    input: &mut InputCoordinator,
    navigator: &Navigator,
) {
    for line in lines.try_iter() {
        let command = match console::parse(&line, panels.len()) {
            Ok(command) => command,
            Err(console::ConsoleError::Empty) => continue,
            Err(err) => {
                warn!(%err, "console command rejected");
                continue;
            }
        };
        match command {
            console::Command::Help => {
                for entry in console::help_lines() {
                    info!("{entry}");
                }
            }
            console::Command::List => {
                for entry in console::list_lines(panels) {
                    info!("{entry}");
                }
            }
            console::Command::Home => input.goto(0),
            console::Command::About => input.goto(navigator.last_index()),
            console::Command::Goto(index) => input.goto(index),
        }
        // A navigation command closes the console; anything still queued
        // behind it waits for the next frame.
        if command.closes_console() {
            debug!("console closed by navigation command");
            break;
        }
    }
}

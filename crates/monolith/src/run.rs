use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use carousel::input::InputCoordinator;
use carousel::nav::Navigator;
use media::MediaRegistry;
use renderer::ViewerParams;
use showconfig::ShowConfig;

use crate::cli::Cli;
use crate::console_io::spawn_console_reader;
use crate::hud::LogHud;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let toml_text = std::fs::read_to_string(&cli.show)
        .with_context(|| format!("failed to read show file {}", cli.show.display()))?;
    let config = ShowConfig::from_toml_str(&toml_text)
        .with_context(|| format!("invalid show file {}", cli.show.display()))?;

    let panels = carousel::panels_from_config(&config);
    info!(
        panels = panels.len(),
        media = config.media.len(),
        show = %cli.show.display(),
        "show loaded"
    );

    info!(
        peak = renderer::lens::peak_displacement(&config.tuning.lens),
        radius = config.tuning.lens.ripple_radius,
        "lens ripple configured"
    );

    let navigator = Navigator::new(panels.len(), &config.tuning);
    let input = InputCoordinator::new(&config.tuning);

    let mut registry = MediaRegistry::new(&config, &cli.assets_root)
        .context("failed to start media loaders")?;
    if cli.mute {
        registry.set_all_muted(true);
    }
    let deadline = Instant::now() + config.tuning.load_deadline;
    if !registry.wait_ready(deadline) {
        warn!("some media streams are not ready; the show starts anyway");
    }
    for status in registry.statuses() {
        info!(id = %status.id, state = ?status.state, "media stream");
    }

    let (console_lines, _console_thread) = spawn_console_reader()?;

    renderer::run(ViewerParams {
        tuning: config.tuning.clone(),
        panels,
        navigator,
        input,
        registry,
        sink: Box::new(LogHud::new()),
        console_lines,
        surface_size: cli.size,
        target_fps: cli.fps,
        window_title: "Monolith Carousel".to_string(),
    })
}

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "monolith",
    author,
    version,
    about = "Scroll-driven 3D monolith carousel viewer",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Show definition TOML (panels, media sources, tuning).
    #[arg(long, value_name = "FILE", default_value = "shows/default.toml")]
    pub show: PathBuf,

    /// Directory sequence paths in the show file are resolved against.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub assets_root: PathBuf,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size, default_value = "1280x720")]
    pub size: (u32, u32),

    /// Optional FPS cap (uncapped by default; vsync paces the loop).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Start with all media muted.
    #[arg(long)]
    pub mute: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid width in window size".to_string())?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid height in window size".to_string())?;
    if width == 0 || height == 0 {
        return Err("window size must be greater than zero".into());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_surface_size_variants() {
        assert_eq!(parse_surface_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_surface_size("1920X1080").unwrap(), (1920, 1080));
        assert_eq!(parse_surface_size(" 640 x 480 ").unwrap(), (640, 480));
    }

    #[test]
    fn rejects_malformed_surface_sizes() {
        assert!(parse_surface_size("1280").is_err());
        assert!(parse_surface_size("0x720").is_err());
        assert!(parse_surface_size("widexhigh").is_err());
    }
}

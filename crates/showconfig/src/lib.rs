use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse show definition: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid show definition: {0}")]
    Invalid(String),
}

/// Complete show definition: the ordered panel list, the tuning constants,
/// and the media sources the panels reference.
///
/// Every numeric constant the runtime consumes lives in `[tuning]`; the
/// defaults reproduce the original show, but nothing in the engine treats
/// them as invariants.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShowConfig {
    pub version: u32,
    #[serde(default)]
    pub tuning: Tuning,
    #[serde(default)]
    pub panels: Vec<PanelConfig>,
    #[serde(default)]
    pub media: BTreeMap<String, MediaSourceConfig>,
}

/// One project panel in navigation order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PanelConfig {
    pub title: String,
    /// Caption text; may span multiple lines.
    #[serde(default)]
    pub caption: String,
    /// Key into the `[media]` table. Panels naming the same key share one
    /// decoded stream.
    pub media: String,
}

/// Where a media stream's frames come from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaSourceConfig {
    /// Directory of still frames played as a loop.
    Sequence {
        path: PathBuf,
        #[serde(default = "default_sequence_fps")]
        fps: f32,
    },
    /// Procedural fallback pattern; needs no assets on disk.
    Pattern,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Tuning {
    /// Distance between consecutive panels along the travel axis.
    pub spacing: f32,
    /// Camera rest distance in front of the active panel.
    pub camera_distance: f32,
    /// Camera height above the floor plane.
    pub camera_height: f32,
    /// Panel face dimensions (world units, 16:9 by default).
    pub panel_width: f32,
    pub panel_height: f32,
    /// Vertical lift so panels stand on the floor plane.
    pub panel_lift: f32,
    /// Minimum interval between accepted discrete navigation requests.
    #[serde(deserialize_with = "deserialize_duration")]
    pub cooldown: Duration,
    /// Total camera fly-through duration for one transition.
    #[serde(deserialize_with = "deserialize_duration")]
    pub transition: Duration,
    /// Phase anchors, as fractions of `transition`.
    pub fade_out_duration: f32,
    pub swap_offset: f32,
    pub fade_in_start: f32,
    pub fade_in_duration: f32,
    /// Pointer-driven camera offset scale.
    pub parallax_scale: f32,
    /// Pointer-driven active-panel tilt scale.
    pub tilt_scale: f32,
    /// Exponential smoothing blend factor per frame, in (0, 1].
    pub smoothing: f32,
    /// Wheel deltas at or below this magnitude are ignored as noise.
    pub wheel_threshold: f32,
    /// Touch swipes shorter than this many pixels are ignored.
    pub touch_threshold: f32,
    /// How long startup waits for media before proceeding anyway.
    #[serde(deserialize_with = "deserialize_duration")]
    pub load_deadline: Duration,
    pub lens: LensTuning,
}

/// Parameters of the liquid-lens distortion pass.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LensTuning {
    /// Amplitude of the hash noise added to the base coordinate.
    pub noise_amplitude: f32,
    /// Amplitude of the two sinusoidal warps.
    pub warp_amplitude: f32,
    /// Ripple influence radius in shader space; displacement is exactly
    /// zero outside it.
    pub ripple_radius: f32,
    /// Peak radial displacement at the ripple centre.
    pub ripple_strength: f32,
    /// Chromatic aberration offset per unit of (noise + ripple).
    pub aberration: f32,
}

fn default_sequence_fps() -> f32 {
    24.0
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            spacing: 25.0,
            camera_distance: 10.0,
            camera_height: 3.0,
            panel_width: 20.0,
            panel_height: 11.25,
            panel_lift: 0.5,
            cooldown: Duration::from_millis(1000),
            transition: Duration::from_millis(1500),
            fade_out_duration: 0.33,
            swap_offset: 0.5,
            fade_in_start: 0.53,
            fade_in_duration: 0.47,
            parallax_scale: 0.1,
            tilt_scale: 0.05,
            smoothing: 0.05,
            wheel_threshold: 5.0,
            touch_threshold: 50.0,
            load_deadline: Duration::from_secs(4),
            lens: LensTuning::default(),
        }
    }
}

impl Default for LensTuning {
    fn default() -> Self {
        Self {
            noise_amplitude: 0.004,
            warp_amplitude: 0.006,
            ripple_radius: 0.1,
            ripple_strength: 0.035,
            aberration: 1.5,
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl ShowConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: ShowConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn media_source(&self, id: &str) -> Option<&MediaSourceConfig> {
        self.media.get(id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported show version {}; expected 1",
                self.version
            )));
        }

        if self.panels.is_empty() {
            return Err(ConfigError::Invalid(
                "show must define at least one panel".into(),
            ));
        }

        for (index, panel) in self.panels.iter().enumerate() {
            if panel.title.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "panel {} has an empty title",
                    index + 1
                )));
            }
            if !self.media.contains_key(&panel.media) {
                return Err(ConfigError::Invalid(format!(
                    "panel '{}' references unknown media '{}'",
                    panel.title, panel.media
                )));
            }
        }

        for (id, source) in &self.media {
            if id.trim().is_empty() {
                return Err(ConfigError::Invalid("media id may not be empty".into()));
            }
            if let MediaSourceConfig::Sequence { fps, .. } = source {
                if !fps.is_finite() || *fps <= 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "media '{id}' fps must be > 0"
                    )));
                }
            }
        }

        self.tuning.validate()
    }
}

impl Tuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spacing <= 0.0 {
            return Err(ConfigError::Invalid("tuning.spacing must be > 0".into()));
        }
        if self.panel_width <= 0.0 || self.panel_height <= 0.0 {
            return Err(ConfigError::Invalid(
                "tuning panel dimensions must be > 0".into(),
            ));
        }
        if self.transition.is_zero() {
            return Err(ConfigError::Invalid(
                "tuning.transition must be greater than zero".into(),
            ));
        }

        for (name, value) in [
            ("fade_out_duration", self.fade_out_duration),
            ("swap_offset", self.swap_offset),
            ("fade_in_start", self.fade_in_start),
            ("fade_in_duration", self.fade_in_duration),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "tuning.{name} must be within [0, 1]"
                )));
            }
        }

        // The swap must land inside the invisible gap between fades,
        // otherwise stale text is visible during camera motion.
        if self.swap_offset < self.fade_out_duration {
            return Err(ConfigError::Invalid(
                "tuning.swap_offset must not precede the end of the fade-out".into(),
            ));
        }
        if self.swap_offset >= self.fade_in_start {
            return Err(ConfigError::Invalid(
                "tuning.swap_offset must precede the fade-in start".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.smoothing) || self.smoothing == 0.0 {
            return Err(ConfigError::Invalid(
                "tuning.smoothing must be within (0, 1]".into(),
            ));
        }
        if self.lens.ripple_radius <= 0.0 {
            return Err(ConfigError::Invalid(
                "tuning.lens.ripple_radius must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[tuning]
spacing = 25.0
cooldown = "1s"
transition = "1500ms"

[tuning.lens]
ripple_radius = 0.1

[[panels]]
title = "FLORIS VROEGH"
caption = "VIDEOGRAPHER & WEB DESIGN HOBBYIST"
media = "reel"

[[panels]]
title = "ABOUT & CONTACT"
caption = """
Videography & Editing
Web Design & Development
"""
media = "reel"

[media.reel]
kind = "sequence"
path = "assets/reel"
fps = 24
"#;

    #[test]
    fn parses_sample_show() {
        let config = ShowConfig::from_toml_str(SAMPLE).expect("parse show");
        assert_eq!(config.version, 1);
        assert_eq!(config.panel_count(), 2);
        assert_eq!(config.tuning.cooldown, Duration::from_secs(1));
        assert_eq!(config.tuning.transition, Duration::from_millis(1500));
        assert!(matches!(
            config.media_source("reel"),
            Some(MediaSourceConfig::Sequence { .. })
        ));
        assert!(config.panels[1].caption.contains("Web Design"));
    }

    #[test]
    fn rejects_unknown_media_reference() {
        let config = r#"
version = 1

[[panels]]
title = "Demo"
media = "missing"
"#;
        let err = ShowConfig::from_toml_str(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_panel_list() {
        let err = ShowConfig::from_toml_str("version = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_swap_outside_fade_gap() {
        let config = r#"
version = 1

[tuning]
swap_offset = 0.2
fade_out_duration = 0.33

[[panels]]
title = "Demo"
media = "fallback"

[media.fallback]
kind = "pattern"
"#;
        let err = ShowConfig::from_toml_str(config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("swap_offset"), "unexpected error: {message}");
    }

    #[test]
    fn rejects_swap_at_or_after_fade_in() {
        let config = r#"
version = 1

[tuning]
swap_offset = 0.53
fade_in_start = 0.53

[[panels]]
title = "Demo"
media = "fallback"

[media.fallback]
kind = "pattern"
"#;
        assert!(ShowConfig::from_toml_str(config).is_err());
    }

    #[test]
    fn defaults_reproduce_original_show_constants() {
        let tuning = Tuning::default();
        assert_eq!(tuning.spacing, 25.0);
        assert_eq!(tuning.camera_distance, 10.0);
        assert_eq!(tuning.cooldown, Duration::from_millis(1000));
        assert_eq!(tuning.transition, Duration::from_millis(1500));
        assert_eq!(tuning.lens.ripple_radius, 0.1);
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_sequence_fps() {
        let config = r#"
version = 1

[[panels]]
title = "Demo"
media = "reel"

[media.reel]
kind = "sequence"
path = "assets/reel"
fps = 0.0
"#;
        assert!(ShowConfig::from_toml_str(config).is_err());
    }
}

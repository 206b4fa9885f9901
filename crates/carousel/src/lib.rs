//! Core navigation logic for the monolith carousel: the discrete navigation
//! state machine, the input coordinator that feeds it, the console command
//! grammar, and the presenter that writes panel content into the UI
//! collaborator. Everything here is time-driven through explicit `Instant`
//! parameters and free of GPU or windowing concerns.

pub mod console;
pub mod input;
pub mod nav;
pub mod presenter;

use showconfig::ShowConfig;

/// Immutable description of one panel, in navigation order.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelDescriptor {
    pub index: usize,
    pub title: String,
    pub caption: String,
    /// Key into the media registry; shared across panels with equal keys.
    pub media: String,
}

/// Builds the panel list once at startup. Ordering is significant: it
/// defines both spatial placement and navigation order.
pub fn panels_from_config(config: &ShowConfig) -> Vec<PanelDescriptor> {
    config
        .panels
        .iter()
        .enumerate()
        .map(|(index, panel)| PanelDescriptor {
            index,
            title: panel.title.clone(),
            caption: panel.caption.clone(),
            media: panel.media.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_order_follows_config_order() {
        let config = ShowConfig::from_toml_str(
            r#"
version = 1

[[panels]]
title = "First"
media = "fallback"

[[panels]]
title = "Second"
media = "fallback"

[media.fallback]
kind = "pattern"
"#,
        )
        .unwrap();
        let panels = panels_from_config(&config);
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].index, 0);
        assert_eq!(panels[0].title, "First");
        assert_eq!(panels[1].index, 1);
    }
}

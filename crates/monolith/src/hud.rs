use carousel::presenter::ContentSink;
use tracing::{debug, info};

/// Tracing-backed implementation of the UI write targets. The original
/// page wrote these into DOM nodes; here they land in the log stream, one
/// line per swap, which is enough to follow a show from a terminal.
pub struct LogHud {
    title: String,
    caption: String,
    visible: bool,
}

impl LogHud {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            caption: String::new(),
            visible: false,
        }
    }
}

impl ContentSink for LogHud {
    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_caption(&mut self, caption: &str) {
        self.caption = caption.replace('\n', " ");
    }

    // The counter arrives last in a swap; emit the whole line then.
    fn set_counter(&mut self, current: String, total: String) {
        info!("[{current} / {total}] {} - {}", self.title, self.caption);
    }

    fn set_interactive(&mut self, interactive: bool) {
        if interactive {
            info!("terminal panel active; contact surface enabled");
        } else {
            info!("contact surface disabled");
        }
    }

    // The fade envelope arrives every frame; only the edges are worth a
    // log line here.
    fn set_info_style(&mut self, opacity: f32, _y_offset: f32) {
        let visible = opacity > 0.0;
        if visible != self.visible {
            self.visible = visible;
            debug!(visible, "info panel visibility changed");
        }
    }
}

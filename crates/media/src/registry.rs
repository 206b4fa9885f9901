use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use showconfig::{MediaSourceConfig, ShowConfig};
use tracing::{debug, info, warn};

use crate::source::{decode_sequence, test_pattern, DecodedStream, MediaFrame};
use crate::{MediaError, MediaState};

/// Loader thread outcome for one media id.
enum MediaEvent {
    Loaded { id: String, stream: DecodedStream },
    Failed { id: String, error: MediaError },
}

struct HandleInner {
    state: MediaState,
    stream: Option<Arc<DecodedStream>>,
    playing: bool,
    muted: bool,
    /// Wall-clock anchor while playing; `offset` accumulates across pauses.
    started_at: Option<Instant>,
    offset_secs: f32,
}

/// Shared playback handle for one media id. Panels referencing the same id
/// get clones of the same handle, so a pause or restart reaches every user.
#[derive(Clone)]
pub struct MediaHandle {
    id: String,
    inner: Arc<Mutex<HandleInner>>,
}

impl MediaHandle {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            inner: Arc::new(Mutex::new(HandleInner {
                state: MediaState::Unloaded,
                stream: None,
                playing: false,
                muted: false,
                started_at: None,
                offset_secs: 0.0,
            })),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> MediaState {
        self.inner.lock().state
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().playing
    }

    pub fn is_muted(&self) -> bool {
        self.inner.lock().muted
    }

    /// Begins playback from the current offset. Fails until the stream has
    /// decoded; callers treat that as retry-later, not fatal.
    pub fn play(&self, now: Instant) -> Result<(), MediaError> {
        let mut inner = self.inner.lock();
        if inner.state != MediaState::Ready {
            return Err(MediaError::NotReady);
        }
        if !inner.playing {
            inner.playing = true;
            inner.started_at = Some(now);
        }
        Ok(())
    }

    /// Stops playback and banks the elapsed position so a later `play`
    /// resumes where it left off.
    pub fn pause(&self, now: Instant) {
        let mut inner = self.inner.lock();
        if inner.playing {
            if let Some(started) = inner.started_at.take() {
                inner.offset_secs += now.duration_since(started).as_secs_f32();
            }
            inner.playing = false;
        }
    }

    /// Rewinds to the first frame and plays.
    pub fn restart(&self, now: Instant) -> Result<(), MediaError> {
        let mut inner = self.inner.lock();
        if inner.state != MediaState::Ready {
            return Err(MediaError::NotReady);
        }
        inner.offset_secs = 0.0;
        inner.started_at = Some(now);
        inner.playing = true;
        Ok(())
    }

    pub fn set_muted(&self, muted: bool) {
        self.inner.lock().muted = muted;
    }

    fn position_secs(&self, now: Instant) -> f32 {
        let inner = self.inner.lock();
        match inner.started_at {
            Some(started) if inner.playing => {
                inner.offset_secs + now.duration_since(started).as_secs_f32()
            }
            _ => inner.offset_secs,
        }
    }

    /// Frame index at the current playback position, once the stream is
    /// decoded. Stable while paused.
    pub fn current_frame_index(&self, now: Instant) -> Option<usize> {
        let stream = self.inner.lock().stream.clone()?;
        Some(stream.frame_at(self.position_secs(now)))
    }

    /// Runs `f` on the frame for the current playback position. Paused
    /// handles yield their held frame, so a paused panel keeps its image.
    pub fn with_current_frame<R>(
        &self,
        now: Instant,
        f: impl FnOnce(&MediaFrame) -> R,
    ) -> Option<R> {
        let stream = self.inner.lock().stream.clone()?;
        let index = stream.frame_at(self.position_secs(now));
        stream.frames.get(index).map(f)
    }

    fn mark_loaded(&self, stream: DecodedStream) {
        let mut inner = self.inner.lock();
        inner.stream = Some(Arc::new(stream));
        inner.state = MediaState::Ready;
    }

    fn mark_failed(&self) {
        self.inner.lock().state = MediaState::Error;
    }

    fn mark_loading(&self) {
        self.inner.lock().state = MediaState::Loading;
    }
}

/// Snapshot of one registry entry, for logs and the console `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStatus {
    pub id: String,
    pub state: MediaState,
    pub playing: bool,
}

/// Owns every media handle in a show and the loader threads that fill
/// them. Streams stay paused until `unlock_all` flips the one-shot
/// autoplay gate after the first user gesture.
pub struct MediaRegistry {
    handles: BTreeMap<String, MediaHandle>,
    events: Receiver<MediaEvent>,
    loaders: Vec<JoinHandle<()>>,
    unlocked: bool,
    globally_muted: bool,
}

impl MediaRegistry {
    /// Spawns one loader thread per unique media id. Sequence paths are
    /// resolved against `assets_root`; a missing or broken sequence falls
    /// back to the procedural pattern so the show still runs.
    pub fn new(config: &ShowConfig, assets_root: &Path) -> Result<Self, MediaError> {
        let (tx, rx) = unbounded();
        let mut handles = BTreeMap::new();
        let mut loaders = Vec::new();
        for (id, source) in &config.media {
            let handle = MediaHandle::new(id);
            handle.mark_loading();
            loaders.push(spawn_loader(
                id.clone(),
                source.clone(),
                assets_root.to_path_buf(),
                tx.clone(),
            )?);
            handles.insert(id.clone(), handle);
        }
        Ok(Self {
            handles,
            events: rx,
            loaders,
            unlocked: false,
            globally_muted: false,
        })
    }

    pub fn handle(&self, id: &str) -> Option<MediaHandle> {
        self.handles.get(id).cloned()
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Applies any loader results that have arrived. Cheap; called once per
    /// frame from the render loop.
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                MediaEvent::Loaded { id, stream } => {
                    debug!(media = %id, frames = stream.frames.len(), "media stream ready");
                    if let Some(handle) = self.handles.get(&id) {
                        handle.mark_loaded(stream);
                        handle.set_muted(self.globally_muted);
                    }
                }
                MediaEvent::Failed { id, error } => {
                    warn!(media = %id, %error, "media stream failed to load");
                    if let Some(handle) = self.handles.get(&id) {
                        handle.mark_failed();
                    }
                }
            }
        }
    }

    /// Blocks until every loader reports in or the deadline passes. Returns
    /// whether all streams came up ready; callers proceed either way.
    pub fn wait_ready(&mut self, deadline: Instant) -> bool {
        let total = self.loaders.len();
        let mut settled = self
            .handles
            .values()
            .filter(|h| h.state() != MediaState::Loading)
            .count();
        while settled < total {
            let now = Instant::now();
            if now >= deadline {
                warn!(
                    settled,
                    total, "media still loading at deadline, starting anyway"
                );
                break;
            }
            match self.events.recv_timeout(deadline - now) {
                Ok(event) => {
                    match event {
                        MediaEvent::Loaded { id, stream } => {
                            if let Some(handle) = self.handles.get(&id) {
                                handle.mark_loaded(stream);
                                handle.set_muted(self.globally_muted);
                            }
                        }
                        MediaEvent::Failed { id, error } => {
                            warn!(media = %id, %error, "media stream failed to load");
                            if let Some(handle) = self.handles.get(&id) {
                                handle.mark_failed();
                            }
                        }
                    }
                    settled += 1;
                }
                Err(_) => {
                    warn!(
                        settled,
                        total, "media still loading at deadline, starting anyway"
                    );
                    break;
                }
            }
        }
        let ready = self
            .handles
            .values()
            .all(|h| h.state() == MediaState::Ready);
        if ready && total > 0 {
            info!(streams = total, "all media streams ready");
        }
        ready
    }

    /// One-shot autoplay gate, run on the first user gesture; repeat calls
    /// are no-ops. Every ready stream is cycled play-then-pause except the
    /// one backing `active`, which keeps playing, so exactly one stream
    /// runs afterwards.
    pub fn unlock_all(&mut self, now: Instant, active: Option<&str>) {
        if self.unlocked {
            return;
        }
        self.unlocked = true;
        for (id, handle) in &self.handles {
            match handle.play(now) {
                Ok(()) => {
                    if active != Some(id.as_str()) {
                        handle.pause(now);
                    }
                }
                Err(err) => debug!(media = %id, %err, "stream not ready at unlock"),
            }
        }
    }

    pub fn set_all_muted(&mut self, muted: bool) {
        self.globally_muted = muted;
        for handle in self.handles.values() {
            handle.set_muted(muted);
        }
    }

    /// Best-effort pause by id; unknown ids and unready streams only log.
    pub fn pause(&self, id: &str, now: Instant) {
        match self.handles.get(id) {
            Some(handle) => handle.pause(now),
            None => warn!(media = %id, "pause requested for unknown media id"),
        }
    }

    /// Best-effort restart by id. No-op before unlock so nothing plays
    /// ahead of the first gesture.
    pub fn restart(&self, id: &str, now: Instant) {
        if !self.unlocked {
            return;
        }
        match self.handles.get(id) {
            Some(handle) => {
                if let Err(err) = handle.restart(now) {
                    warn!(media = %id, %err, "restart on unready stream ignored");
                }
            }
            None => warn!(media = %id, "restart requested for unknown media id"),
        }
    }

    pub fn playing_ids(&self) -> Vec<String> {
        self.handles
            .iter()
            .filter(|(_, handle)| handle.is_playing())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn statuses(&self) -> Vec<MediaStatus> {
        self.handles
            .iter()
            .map(|(id, handle)| MediaStatus {
                id: id.clone(),
                state: handle.state(),
                playing: handle.is_playing(),
            })
            .collect()
    }
}

impl Drop for MediaRegistry {
    fn drop(&mut self) {
        for loader in self.loaders.drain(..) {
            let _ = loader.join();
        }
    }
}

fn spawn_loader(
    id: String,
    source: MediaSourceConfig,
    assets_root: PathBuf,
    tx: Sender<MediaEvent>,
) -> Result<JoinHandle<()>, MediaError> {
    let loader_id = id.clone();
    std::thread::Builder::new()
        .name(format!("media-{id}"))
        .spawn(move || {
            let event = match source {
                MediaSourceConfig::Pattern => MediaEvent::Loaded {
                    id,
                    stream: test_pattern(),
                },
                MediaSourceConfig::Sequence { path, fps } => {
                    let dir = if path.is_absolute() {
                        path
                    } else {
                        assets_root.join(path)
                    };
                    match decode_sequence(&id, &dir, fps) {
                        Ok(stream) => MediaEvent::Loaded { id, stream },
                        Err(error) => MediaEvent::Failed { id, error },
                    }
                }
            };
            let _ = tx.send(event);
        })
        .map_err(|source| MediaError::Spawn {
            id: loader_id,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pattern_show(ids: &[&str]) -> ShowConfig {
        let media = ids
            .iter()
            .map(|id| format!("[media.{id}]\nkind = \"pattern\""))
            .collect::<Vec<_>>()
            .join("\n");
        let panels = ids
            .iter()
            .map(|id| format!("[[panels]]\ntitle = \"{id}\"\nmedia = \"{id}\""))
            .collect::<Vec<_>>()
            .join("\n");
        showconfig::ShowConfig::from_toml_str(&format!("version = 1\n{panels}\n{media}\n"))
            .expect("valid show")
    }

    fn ready_registry(ids: &[&str]) -> MediaRegistry {
        let config = pattern_show(ids);
        let mut registry = MediaRegistry::new(&config, Path::new(".")).expect("spawn loaders");
        assert!(registry.wait_ready(Instant::now() + Duration::from_secs(4)));
        registry
    }

    #[test]
    fn wait_ready_settles_pattern_sources() {
        let registry = ready_registry(&["a", "b"]);
        for status in registry.statuses() {
            assert_eq!(status.state, MediaState::Ready);
            assert!(!status.playing, "nothing plays before unlock");
        }
    }

    #[test]
    fn unlock_is_idempotent_and_leaves_only_the_active_stream_playing() {
        let mut registry = ready_registry(&["a", "b"]);
        let now = Instant::now();
        registry.unlock_all(now, Some("a"));
        registry.unlock_all(now, Some("b"));
        assert!(registry.is_unlocked());
        assert_eq!(registry.playing_ids(), vec!["a".to_string()]);
    }

    #[test]
    fn pause_then_restart_leaves_one_stream_playing() {
        let mut registry = ready_registry(&["a", "b"]);
        let now = Instant::now();
        registry.unlock_all(now, Some("a"));

        // Transition away from panel a, onto panel b.
        registry.pause("a", now);
        registry.restart("b", now);
        assert_eq!(registry.playing_ids(), vec!["b".to_string()]);

        // And back again.
        registry.pause("b", now);
        registry.restart("a", now);
        assert_eq!(registry.playing_ids(), vec!["a".to_string()]);
    }

    #[test]
    fn restart_before_unlock_is_ignored() {
        let registry = {
            let mut r = ready_registry(&["a"]);
            r.restart("a", Instant::now());
            r
        };
        assert!(registry.playing_ids().is_empty());
    }

    #[test]
    fn play_on_unready_stream_fails() {
        let handle = MediaHandle::new("pending");
        assert!(matches!(
            handle.play(Instant::now()),
            Err(MediaError::NotReady)
        ));
    }

    #[test]
    fn pause_banks_position_and_play_resumes() {
        let handle = MediaHandle::new("clip");
        handle.mark_loaded(test_pattern());
        let start = Instant::now();
        handle.play(start).unwrap();
        let later = start + Duration::from_millis(500);
        handle.pause(later);
        assert!(!handle.is_playing());
        let paused_pos = handle.position_secs(later + Duration::from_secs(5));
        assert!((paused_pos - 0.5).abs() < 0.01, "position frozen at pause");
        handle.play(later).unwrap();
        assert!(handle.is_playing());
    }

    #[test]
    fn restart_rewinds_to_frame_zero() {
        let handle = MediaHandle::new("clip");
        handle.mark_loaded(test_pattern());
        let start = Instant::now();
        handle.play(start).unwrap();
        let later = start + Duration::from_secs(1);
        handle.restart(later).unwrap();
        let index = handle
            .with_current_frame(later, |_| ())
            .map(|_| handle.position_secs(later));
        assert_eq!(index, Some(0.0));
    }

    #[test]
    fn shared_handles_observe_each_other() {
        let registry = {
            let mut r = ready_registry(&["shared"]);
            r.unlock_all(Instant::now(), Some("shared"));
            r
        };
        let a = registry.handle("shared").unwrap();
        let b = registry.handle("shared").unwrap();
        a.pause(Instant::now());
        assert!(!b.is_playing());
    }

    #[test]
    fn mute_reaches_every_handle() {
        let mut registry = ready_registry(&["a", "b"]);
        registry.set_all_muted(true);
        assert!(registry.handle("a").unwrap().is_muted());
        assert!(registry.handle("b").unwrap().is_muted());
    }
}

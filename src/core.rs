use crate::controller::PlaybackController;
use crate::cursor::PlaybackCursor;
use crate::error::StoreError;
use crate::media::MediaWidget;
use crate::model::{PersistedState, Track};
use crate::playlist::{PlaylistEntry, SharedPlaylist};
use crate::store::TrackStore;
use crate::upload::{UploadEvent, Uploader};
use log::{error, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

pub struct PlayerCore<W: MediaWidget> {
    store: Arc<dyn TrackStore>,
    playlist: SharedPlaylist,
    cursor: PlaybackCursor,
    controller: PlaybackController<W>,
    uploader: Uploader,
    settings: PersistedState,
    synced_revision: Option<u64>,
    pub selected: usize,
    pub dirty: bool,
    pub status: String,
}

impl<W: MediaWidget> PlayerCore<W> {
    pub fn new(store: Arc<dyn TrackStore>, widget: W, settings: PersistedState) -> Self {
        let playlist = SharedPlaylist::new();
        let uploader = Uploader::new(
            Arc::clone(&store),
            playlist.clone(),
            settings.accepted_extensions.clone(),
        );
        let mut controller = PlaybackController::new(widget);
        controller.widget_mut().set_volume(settings.saved_volume);

        Self {
            store,
            playlist,
            cursor: PlaybackCursor::new(),
            controller,
            uploader,
            settings,
            synced_revision: None,
            selected: 0,
            dirty: true,
            status: String::from("Ready"),
        }
    }

    /// Rebuilds the playlist from the store. A store failure leaves the
    /// playlist empty and is reported on the status line as well as
    /// returned.
    pub fn initialize(&mut self) -> Result<usize, StoreError> {
        let result = self.playlist.initialize(self.store.as_ref());
        match &result {
            Ok(count) => self.set_status(&format!("Loaded {count} tracks")),
            Err(err) => {
                error!("failed to load playlist: {err}");
                self.set_status(&format!("storage error: {err}"));
            }
        }
        self.sync_playlist();
        result
    }

    pub fn reload(&mut self) -> Result<usize, StoreError> {
        self.initialize()
    }

    /// Brings cursor, list highlight and widget in line with the playlist.
    /// Called after every mutation and once per UI tick, since upload workers
    /// append from other threads. Does nothing while the playlist revision is
    /// unchanged.
    pub fn sync_playlist(&mut self) {
        let revision = self.playlist.revision();
        if self.synced_revision == Some(revision) {
            return;
        }
        self.synced_revision = Some(revision);

        let len = self.playlist.len();
        if self.cursor.resolve(len) {
            self.dirty = true;
        }
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
        self.sync_widget();
    }

    fn sync_widget(&mut self) {
        let current_id = self.cursor.index().and_then(|idx| self.playlist.id_at(idx));
        if self.controller.is_loaded(current_id) {
            return;
        }
        let current = self.current_track();
        if let Err(err) = self.controller.sync(current.as_ref()) {
            warn!("failed to load track into widget: {err:#}");
            self.set_status(&format!("playback error: {err:#}"));
        }
        self.dirty = true;
    }

    pub fn select_index(&mut self, index: usize) -> bool {
        if !self.cursor.select_index(index, self.playlist.len()) {
            self.set_status("No track at that position");
            return false;
        }
        self.selected = index;
        if self.settings.autoplay_on_select {
            self.controller.set_playing(true);
        }
        self.sync_widget();
        self.dirty = true;
        true
    }

    pub fn next(&mut self) -> Option<usize> {
        let idx = self.cursor.next(self.playlist.len());
        self.sync_widget();
        self.dirty = true;
        idx
    }

    pub fn previous(&mut self) -> Option<usize> {
        let idx = self.cursor.previous(self.playlist.len());
        self.sync_widget();
        self.dirty = true;
        idx
    }

    pub fn toggle_play_pause(&mut self) -> bool {
        let playing = self.controller.toggle_play_pause();
        self.set_status(if playing { "Playing" } else { "Paused" });
        playing
    }

    /// Natural end of the current track: advance like `next`. With a single
    /// track the cursor wraps onto itself, so that track starts over.
    pub fn handle_ended(&mut self) {
        let before = self.controller.loaded_id();
        self.next();
        if before.is_some() && self.controller.loaded_id() == before {
            let current = self.current_track();
            if let Err(err) = self.controller.reload(current.as_ref()) {
                self.set_status(&format!("playback error: {err:#}"));
            }
        }
    }

    /// Polls the widget's ended event and advances if it fired.
    pub fn poll_ended(&mut self) -> bool {
        if !self.controller.take_ended() {
            return false;
        }
        self.handle_ended();
        true
    }

    pub fn upload(&mut self, path: PathBuf) -> JoinHandle<Option<Track>> {
        self.set_status(&format!("Uploading {}", path.display()));
        self.uploader.spawn(path)
    }

    /// Drains finished uploads into the status line.
    pub fn pump_upload_events(&mut self) {
        let mut any = false;
        while let Some(event) = self.uploader.try_recv_event() {
            any = true;
            match event {
                UploadEvent::Stored { name, .. } => self.set_status(&format!("Added {name}")),
                UploadEvent::Failed { path, reason } => {
                    self.set_status(&format!("upload of {} failed: {reason}", path.display()))
                }
            }
        }
        if any {
            self.sync_playlist();
        }
    }

    pub fn select_next(&mut self) {
        let len = self.playlist.len();
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1).min(len - 1);
        self.dirty = true;
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.dirty = true;
    }

    pub fn activate_selected(&mut self) -> bool {
        self.select_index(self.selected)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor.index()
    }

    pub fn current_track(&self) -> Option<Track> {
        self.cursor.index().and_then(|idx| self.playlist.get(idx))
    }

    pub fn entries(&self) -> Vec<PlaylistEntry> {
        self.playlist.entries()
    }

    pub fn playlist(&self) -> &SharedPlaylist {
        &self.playlist
    }

    pub fn is_playing(&self) -> bool {
        self.controller.is_playing()
    }

    pub fn widget(&self) -> &W {
        self.controller.widget()
    }

    pub fn widget_mut(&mut self) -> &mut W {
        self.controller.widget_mut()
    }

    pub fn volume(&self) -> f32 {
        self.controller.widget().volume()
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.controller.widget_mut().set_volume(volume);
        self.settings.saved_volume = self.controller.widget().volume();
        self.set_status(&format!(
            "Volume: {}%",
            (self.settings.saved_volume * 100.0).round() as u16
        ));
    }

    pub fn persisted_state(&self) -> PersistedState {
        self.settings.clone()
    }

    pub fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }
}

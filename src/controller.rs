use crate::media::MediaWidget;
use crate::model::Track;
use anyhow::Result;
use log::debug;

/// Keeps the media widget's loaded source in line with the current track
/// and applies the transport intent (`is_playing`) to it.
///
/// Cursor position and transport intent are independent: loading a new
/// track never changes `is_playing`, it only decides whether the new source
/// is started.
pub struct PlaybackController<W: MediaWidget> {
    widget: W,
    is_playing: bool,
    loaded_id: Option<i64>,
}

impl<W: MediaWidget> PlaybackController<W> {
    pub fn new(widget: W) -> Self {
        Self {
            widget,
            is_playing: false,
            loaded_id: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn loaded_id(&self) -> Option<i64> {
        self.loaded_id
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    /// Whether the widget already holds the track with `id` (or nothing, for
    /// `None`). Track payloads never change for a given id.
    pub fn is_loaded(&self, id: Option<i64>) -> bool {
        self.loaded_id == id
    }

    /// Points the widget at `current` if it is not loaded yet. Returns true
    /// when a new source was pushed.
    pub fn sync(&mut self, current: Option<&Track>) -> Result<bool> {
        if self.is_loaded(current.map(|track| track.id)) {
            return Ok(false);
        }
        self.load(current)?;
        Ok(true)
    }

    /// Loads `current` even if it is already the loaded track, so it starts
    /// over from the beginning.
    pub fn reload(&mut self, current: Option<&Track>) -> Result<()> {
        self.load(current)
    }

    fn load(&mut self, current: Option<&Track>) -> Result<()> {
        // Recorded before decoding so a bad payload is not retried every tick.
        self.loaded_id = current.map(|track| track.id);
        let source = current.map(|track| track.data.as_str()).unwrap_or("");
        self.widget.set_source(source)?;
        debug!("widget source set to track {:?}", self.loaded_id);

        if self.is_playing && self.widget.has_source() {
            self.widget.play();
        }
        Ok(())
    }

    /// Flips the transport intent. Without a loaded source only the intent
    /// changes; it is applied once a source arrives.
    pub fn toggle_play_pause(&mut self) -> bool {
        self.set_playing(!self.is_playing);
        self.is_playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
        if !self.widget.has_source() {
            return;
        }
        if playing {
            self.widget.play();
        } else {
            self.widget.pause();
        }
    }

    pub fn take_ended(&mut self) -> bool {
        self.widget.take_ended()
    }
}

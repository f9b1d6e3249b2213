use crate::ingest::decode_data_uri;
use anyhow::{Context, Result};
use log::{debug, warn};
use rodio::Source;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
#[cfg(unix)]
use std::ffi::CString;
use std::io::Cursor;
use std::time::{Duration, Instant};

const MAX_VOLUME: f32 = 2.0;

/// The playback surface the controller drives. Any implementation that
/// honours this contract can stand in for the real audio output.
pub trait MediaWidget {
    /// Loads a data URI, or clears the widget when `source` is empty. A newly
    /// loaded source starts paused.
    fn set_source(&mut self, source: &str) -> Result<()>;
    fn play(&mut self);
    fn pause(&mut self);
    fn has_source(&self) -> bool;
    fn is_paused(&self) -> bool;
    /// Reports natural completion of the loaded source, once per source.
    fn take_ended(&mut self) -> bool;
    /// Elapsed time in the loaded source.
    fn position(&self) -> Option<Duration>;
    /// Total length of the loaded source, when the decoder reports one.
    fn duration(&self) -> Option<Duration>;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn output_name(&self) -> Option<String>;
}

impl MediaWidget for Box<dyn MediaWidget> {
    fn set_source(&mut self, source: &str) -> Result<()> {
        (**self).set_source(source)
    }

    fn play(&mut self) {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn has_source(&self) -> bool {
        (**self).has_source()
    }

    fn is_paused(&self) -> bool {
        (**self).is_paused()
    }

    fn take_ended(&mut self) -> bool {
        (**self).take_ended()
    }

    fn position(&self) -> Option<Duration> {
        (**self).position()
    }

    fn duration(&self) -> Option<Duration> {
        (**self).duration()
    }

    fn volume(&self) -> f32 {
        (**self).volume()
    }

    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume)
    }

    fn output_name(&self) -> Option<String> {
        (**self).output_name()
    }
}

fn decoder_for(source: &str) -> Result<Decoder<Cursor<Vec<u8>>>> {
    let (mime, bytes) = decode_data_uri(source)?;
    Decoder::new(Cursor::new(bytes)).with_context(|| format!("failed to decode {mime} payload"))
}

pub struct RodioMediaWidget {
    stream: OutputStream,
    sink: Sink,
    loaded: bool,
    ended_reported: bool,
    volume: f32,
    track_duration: Option<Duration>,
}

impl RodioMediaWidget {
    pub fn new() -> Result<Self> {
        let stream = Self::open_output_stream()?;
        let sink = Sink::connect_new(stream.mixer());
        sink.pause();

        Ok(Self {
            stream,
            sink,
            loaded: false,
            ended_reported: false,
            volume: 1.0,
            track_duration: None,
        })
    }

    fn open_output_stream() -> Result<OutputStream> {
        let mut stream = with_silenced_stderr(|| {
            OutputStreamBuilder::from_default_device()
                .context("failed to open default system output stream")
                .and_then(|builder| {
                    builder
                        .with_error_callback(|_| {})
                        .open_stream_or_fallback()
                        .context("failed to start default output stream")
                })
        })?;
        stream.log_on_drop(false);
        Ok(stream)
    }
}

impl MediaWidget for RodioMediaWidget {
    fn set_source(&mut self, source: &str) -> Result<()> {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());
        self.sink.pause();
        self.sink.set_volume(self.volume);
        self.loaded = false;
        self.ended_reported = false;
        self.track_duration = None;

        if source.is_empty() {
            return Ok(());
        }

        let decoder = decoder_for(source)?;
        self.track_duration = decoder.total_duration();
        debug!("loaded source, duration {:?}", self.track_duration);
        self.sink.append(decoder);
        self.loaded = true;
        Ok(())
    }

    fn play(&mut self) {
        if self.loaded {
            self.sink.play();
        }
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn has_source(&self) -> bool {
        self.loaded
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn take_ended(&mut self) -> bool {
        if !self.loaded || self.ended_reported || self.sink.is_paused() || !self.sink.empty() {
            return false;
        }
        self.ended_reported = true;
        true
    }

    fn position(&self) -> Option<Duration> {
        self.loaded.then(|| self.sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, MAX_VOLUME);
        self.sink.set_volume(self.volume);
    }

    fn output_name(&self) -> Option<String> {
        Some(String::from("Default output"))
    }
}

#[cfg(unix)]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
    if saved < 0 {
        return operation();
    }

    let devnull = CString::new("/dev/null")
        .ok()
        .map(|path| unsafe { libc::open(path.as_ptr(), libc::O_WRONLY) })
        .unwrap_or(-1);

    if devnull >= 0 {
        unsafe {
            libc::dup2(devnull, libc::STDERR_FILENO);
            libc::close(devnull);
        }
    }

    let result = operation();

    unsafe {
        libc::dup2(saved, libc::STDERR_FILENO);
        libc::close(saved);
    }

    result
}

#[cfg(not(unix))]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    operation()
}

/// Silent stand-in used when no output device can be opened. Keeps a logical
/// clock so that sources with a known duration still end.
///
/// A source whose length the decoder cannot report (common for mp3 without
/// a Xing/VBRI header) never ends here, so auto-advance stops on it.
pub struct NullMediaWidget {
    loaded: bool,
    paused: bool,
    ended_reported: bool,
    volume: f32,
    started_at: Option<Instant>,
    position_offset: Duration,
    track_duration: Option<Duration>,
}

impl NullMediaWidget {
    pub fn new() -> Self {
        Self {
            loaded: false,
            paused: true,
            ended_reported: false,
            volume: 1.0,
            started_at: None,
            position_offset: Duration::ZERO,
            track_duration: None,
        }
    }

    fn estimate_duration(source: &str) -> Option<Duration> {
        decoder_for(source)
            .ok()?
            .total_duration()
            .filter(|duration| !duration.is_zero())
    }

    fn current_position(&self) -> Duration {
        let mut position = self.position_offset;
        if !self.paused
            && self.loaded
            && let Some(started_at) = self.started_at
        {
            position = position.saturating_add(started_at.elapsed());
        }
        if let Some(duration) = self.track_duration {
            return position.min(duration);
        }
        position
    }

}

impl Default for NullMediaWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaWidget for NullMediaWidget {
    fn set_source(&mut self, source: &str) -> Result<()> {
        self.paused = true;
        self.started_at = None;
        self.position_offset = Duration::ZERO;
        self.ended_reported = false;
        self.loaded = !source.is_empty();
        self.track_duration = if self.loaded {
            let duration = Self::estimate_duration(source);
            if duration.is_none() {
                warn!("null output cannot tell when this source ends; it will not auto-advance");
            }
            duration
        } else {
            None
        };
        Ok(())
    }

    fn play(&mut self) {
        if self.loaded && self.paused {
            self.started_at = Some(Instant::now());
            self.paused = false;
        }
    }

    fn pause(&mut self) {
        self.position_offset = self.current_position();
        self.started_at = None;
        self.paused = true;
    }

    fn has_source(&self) -> bool {
        self.loaded
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn take_ended(&mut self) -> bool {
        let Some(duration) = self.track_duration else {
            return false;
        };
        if self.ended_reported || self.paused || self.current_position() < duration {
            return false;
        }
        self.ended_reported = true;
        true
    }

    fn position(&self) -> Option<Duration> {
        self.loaded.then(|| self.current_position())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, MAX_VOLUME);
    }

    fn output_name(&self) -> Option<String> {
        Some(String::from("Null output"))
    }
}

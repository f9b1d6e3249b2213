use anyhow::Result;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tunebox::core::PlayerCore;
use tunebox::error::StoreError;
use tunebox::media::MediaWidget;
use tunebox::model::{NewTrack, PersistedState, Track};
use tunebox::store::{SqliteTrackStore, TrackStore};

#[derive(Default)]
struct RecordingWidget {
    source: String,
    paused: bool,
    ended: bool,
    play_calls: usize,
}

impl MediaWidget for RecordingWidget {
    fn set_source(&mut self, source: &str) -> Result<()> {
        self.source = source.to_string();
        self.paused = true;
        self.ended = false;
        Ok(())
    }

    fn play(&mut self) {
        self.play_calls += 1;
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn has_source(&self) -> bool {
        !self.source.is_empty()
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn take_ended(&mut self) -> bool {
        std::mem::take(&mut self.ended)
    }

    fn position(&self) -> Option<Duration> {
        None
    }

    fn duration(&self) -> Option<Duration> {
        None
    }

    fn volume(&self) -> f32 {
        1.0
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn output_name(&self) -> Option<String> {
        None
    }
}

struct QuotaExceededStore {
    inner: SqliteTrackStore,
}

impl TrackStore for QuotaExceededStore {
    fn open(&self) -> Result<(), StoreError> {
        self.inner.open()
    }

    fn insert(&self, _track: NewTrack) -> Result<Track, StoreError> {
        Err(StoreError::WriteFailed {
            context: String::from("quota exceeded"),
            source: None,
        })
    }

    fn load_all(&self) -> Result<Vec<Track>, StoreError> {
        self.inner.load_all()
    }
}

#[test]
fn empty_store_starts_with_nothing_to_play() {
    let dir = tempdir().expect("tempdir");
    let store = Arc::new(SqliteTrackStore::new(dir.path().join("tracks.sqlite3")));
    let mut core = PlayerCore::new(store, RecordingWidget::default(), PersistedState::default());

    assert_eq!(core.initialize().expect("initialize"), 0);
    assert!(core.entries().is_empty());
    assert_eq!(core.cursor(), None);
    assert_eq!(core.next(), None);
    assert_eq!(core.cursor(), None);
}

#[test]
fn uploaded_track_loads_into_widget() {
    let dir = tempdir().expect("tempdir");
    let store = Arc::new(SqliteTrackStore::new(dir.path().join("tracks.sqlite3")));
    let mut core = PlayerCore::new(store, RecordingWidget::default(), PersistedState::default());
    core.initialize().expect("initialize");

    let file = dir.path().join("a.mp3");
    fs::write(&file, b"ID3").expect("write");
    let track = core.upload(file).join().expect("join").expect("stored");
    core.pump_upload_events();

    assert_eq!(core.entries().len(), 1);
    assert_eq!(core.cursor(), Some(0));
    assert!(core.select_index(0));
    assert_eq!(core.widget().source, track.data);
    assert_eq!(core.widget().source, "data:audio/mpeg;base64,SUQz");
}

#[test]
fn ended_on_last_track_wraps_and_keeps_playing() {
    let dir = tempdir().expect("tempdir");
    let store = Arc::new(SqliteTrackStore::new(dir.path().join("tracks.sqlite3")));
    let a = store
        .insert(NewTrack {
            name: String::from("a.mp3"),
            data: String::from("data:audio/mpeg;base64,YQ=="),
        })
        .expect("insert a");
    store
        .insert(NewTrack {
            name: String::from("b.mp3"),
            data: String::from("data:audio/mpeg;base64,Yg=="),
        })
        .expect("insert b");

    let mut core = PlayerCore::new(store, RecordingWidget::default(), PersistedState::default());
    core.initialize().expect("initialize");
    core.select_index(1);
    core.toggle_play_pause();
    assert!(core.is_playing());

    core.widget_mut().ended = true;
    assert!(core.poll_ended());

    assert_eq!(core.cursor(), Some(0));
    assert_eq!(core.widget().source, a.data);
    assert!(!core.widget().paused);
    assert!(core.is_playing());
}

#[test]
fn failed_insert_leaves_playlist_unchanged() {
    let dir = tempdir().expect("tempdir");
    let inner = SqliteTrackStore::new(dir.path().join("tracks.sqlite3"));
    inner
        .insert(NewTrack {
            name: String::from("kept.mp3"),
            data: String::from("data:audio/mpeg;base64,YQ=="),
        })
        .expect("insert");
    let store = Arc::new(QuotaExceededStore { inner });
    let mut core = PlayerCore::new(store, RecordingWidget::default(), PersistedState::default());
    core.initialize().expect("initialize");
    let before = core.entries();

    let file = dir.path().join("new.mp3");
    fs::write(&file, b"abc").expect("write");
    assert!(core.upload(file).join().expect("join").is_none());
    core.pump_upload_events();

    assert_eq!(core.entries(), before);
    assert!(core.status.contains("write failed"), "{}", core.status);
}

#[test]
fn restart_rebuilds_identical_playlist() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("tracks.sqlite3");
    let file = dir.path().join("a.mp3");
    fs::write(&file, b"abc").expect("write");

    let mut first = PlayerCore::new(
        Arc::new(SqliteTrackStore::new(&path)),
        RecordingWidget::default(),
        PersistedState::default(),
    );
    first.initialize().expect("initialize");
    first.upload(file.clone()).join().expect("join").expect("stored");
    first.upload(file).join().expect("join").expect("stored");
    let session_one = first.playlist().snapshot();
    drop(first);

    let mut second = PlayerCore::new(
        Arc::new(SqliteTrackStore::new(&path)),
        RecordingWidget::default(),
        PersistedState::default(),
    );
    second.initialize().expect("initialize");
    assert_eq!(second.playlist().snapshot(), session_one);
    second.initialize().expect("initialize again");
    assert_eq!(second.playlist().snapshot(), session_one);
}

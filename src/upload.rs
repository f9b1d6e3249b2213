use crate::ingest;
use crate::model::Track;
use crate::playlist::SharedPlaylist;
use crate::store::TrackStore;
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Stored { id: i64, name: String },
    Failed { path: PathBuf, reason: String },
}

/// Runs uploads: read file, encode, store, then append to the playlist.
///
/// The append only ever follows a committed insert, on the same thread that
/// observed the insert result.
pub struct Uploader {
    store: Arc<dyn TrackStore>,
    playlist: SharedPlaylist,
    accepted_extensions: Arc<[String]>,
    event_tx: Sender<UploadEvent>,
    event_rx: Receiver<UploadEvent>,
}

impl Uploader {
    pub fn new(
        store: Arc<dyn TrackStore>,
        playlist: SharedPlaylist,
        accepted_extensions: Vec<String>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            store,
            playlist,
            accepted_extensions: accepted_extensions.into(),
            event_tx,
            event_rx,
        }
    }

    /// Starts an upload on its own worker thread. Joining the handle yields
    /// the stored track, or `None` if any step failed.
    pub fn spawn(&self, path: PathBuf) -> JoinHandle<Option<Track>> {
        let store = Arc::clone(&self.store);
        let playlist = self.playlist.clone();
        let accepted = Arc::clone(&self.accepted_extensions);
        let event_tx = self.event_tx.clone();

        thread::spawn(move || {
            let outcome = store_and_append(store.as_ref(), &playlist, &path, &accepted);
            let event = match &outcome {
                Ok(track) => UploadEvent::Stored {
                    id: track.id,
                    name: track.name.clone(),
                },
                Err(err) => UploadEvent::Failed {
                    path: path.clone(),
                    reason: format!("{err:#}"),
                },
            };
            let _ = event_tx.send(event);
            outcome.ok()
        })
    }

    /// Same chain as [`Uploader::spawn`], on the calling thread.
    pub fn upload_blocking(&self, path: &Path) -> Result<Track> {
        store_and_append(
            self.store.as_ref(),
            &self.playlist,
            path,
            &self.accepted_extensions,
        )
    }

    pub fn try_recv_event(&self) -> Option<UploadEvent> {
        self.event_rx.try_recv().ok()
    }
}

fn store_and_append(
    store: &dyn TrackStore,
    playlist: &SharedPlaylist,
    path: &Path,
    accepted_extensions: &[String],
) -> Result<Track> {
    let new_track = ingest::track_from_file(path, accepted_extensions).inspect_err(|err| {
        warn!("upload of {} rejected: {err:#}", path.display());
    })?;

    let track = store
        .insert(new_track)
        .inspect_err(|err| warn!("upload of {} not stored: {err}", path.display()))
        .with_context(|| format!("failed to store {}", path.display()))?;

    playlist.append(track.clone());
    info!("uploaded {} as track {}", track.name, track.id);
    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::model::NewTrack;
    use crate::store::SqliteTrackStore;
    use std::fs;
    use tempfile::tempdir;

    struct RejectingStore;

    impl TrackStore for RejectingStore {
        fn open(&self) -> Result<(), StoreError> {
            Ok(())
        }

        fn insert(&self, _track: NewTrack) -> Result<Track, StoreError> {
            Err(StoreError::WriteFailed {
                context: String::from("quota exceeded"),
                source: None,
            })
        }

        fn load_all(&self) -> Result<Vec<Track>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn mp3_only() -> Vec<String> {
        vec![String::from("mp3")]
    }

    #[test]
    fn stored_upload_is_appended_and_reported() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("a.mp3");
        fs::write(&file, b"abc").expect("write");

        let playlist = SharedPlaylist::new();
        let store = Arc::new(SqliteTrackStore::new(dir.path().join("db.sqlite3")));
        let uploader = Uploader::new(store, playlist.clone(), mp3_only());

        let track = uploader.spawn(file).join().expect("join").expect("stored");
        assert_eq!(playlist.snapshot(), vec![track.clone()]);
        assert_eq!(
            uploader.try_recv_event(),
            Some(UploadEvent::Stored {
                id: track.id,
                name: String::from("a.mp3"),
            })
        );
    }

    #[test]
    fn failed_insert_never_appends() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("a.mp3");
        fs::write(&file, b"abc").expect("write");

        let playlist = SharedPlaylist::new();
        let uploader = Uploader::new(Arc::new(RejectingStore), playlist.clone(), mp3_only());

        assert!(uploader.spawn(file.clone()).join().expect("join").is_none());
        assert!(playlist.is_empty());
        match uploader.try_recv_event() {
            Some(UploadEvent::Failed { path, reason }) => {
                assert_eq!(path, file);
                assert!(reason.contains("write failed"), "{reason}");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn rejected_file_never_reaches_store() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("a.wav");
        fs::write(&file, b"RIFF").expect("write");

        let playlist = SharedPlaylist::new();
        let store = Arc::new(SqliteTrackStore::new(dir.path().join("db.sqlite3")));
        let uploader = Uploader::new(store.clone(), playlist.clone(), mp3_only());

        assert!(uploader.upload_blocking(&file).is_err());
        assert!(playlist.is_empty());
        assert!(store.load_all().expect("load").is_empty());
    }

    #[test]
    fn racing_uploads_both_land_once() {
        let dir = tempdir().expect("tempdir");
        let playlist = SharedPlaylist::new();
        let store = Arc::new(SqliteTrackStore::new(dir.path().join("db.sqlite3")));
        store.open().expect("open");
        let uploader = Uploader::new(store.clone(), playlist.clone(), mp3_only());

        let handles: Vec<_> = ["a.mp3", "b.mp3", "c.mp3", "d.mp3"]
            .into_iter()
            .map(|name| {
                let file = dir.path().join(name);
                fs::write(&file, name.as_bytes()).expect("write");
                uploader.spawn(file)
            })
            .collect();
        for handle in handles {
            assert!(handle.join().expect("join").is_some());
        }

        let mut in_memory: Vec<i64> = playlist.entries().iter().map(|entry| entry.id).collect();
        in_memory.sort_unstable();
        let stored: Vec<i64> = store
            .load_all()
            .expect("load")
            .iter()
            .map(|track| track.id)
            .collect();
        assert_eq!(in_memory, stored);
        assert_eq!(stored.len(), 4);
    }
}

use crate::error::StoreError;
use crate::model::Track;
use crate::store::TrackStore;
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Name and id of a playlist entry, cheap to hand to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub id: i64,
    pub name: String,
}

/// In-memory ordered cache of the track store.
///
/// Only two mutations exist: a full replace from the store and a
/// single-track append after that track was durably stored.
#[derive(Debug, Default)]
pub struct PlaylistState {
    tracks: Vec<Track>,
    revision: u64,
}

impl PlaylistState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the list with the store contents. On failure the list is
    /// left empty and the error is returned.
    pub fn initialize(&mut self, store: &dyn TrackStore) -> Result<usize, StoreError> {
        let loaded = store.open().and_then(|()| store.load_all());
        self.revision += 1;
        match loaded {
            Ok(tracks) => {
                self.tracks = tracks;
                info!("playlist loaded with {} tracks", self.tracks.len());
                Ok(self.tracks.len())
            }
            Err(err) => {
                self.tracks.clear();
                warn!("playlist left empty: {err}");
                Err(err)
            }
        }
    }

    /// Adds a stored track as the new last element. A track whose id is
    /// already present is not added twice.
    pub fn append(&mut self, track: Track) -> bool {
        if self.tracks.iter().any(|existing| existing.id == track.id) {
            return false;
        }
        self.tracks.push(track);
        self.revision += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Thread-safe handle to one [`PlaylistState`], shared by the UI loop and
/// upload workers.
#[derive(Debug, Clone, Default)]
pub struct SharedPlaylist {
    inner: Arc<Mutex<PlaylistState>>,
}

impl SharedPlaylist {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PlaylistState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn initialize(&self, store: &dyn TrackStore) -> Result<usize, StoreError> {
        self.lock().initialize(store)
    }

    pub fn append(&self, track: Track) -> bool {
        self.lock().append(track)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision()
    }

    pub fn get(&self, index: usize) -> Option<Track> {
        self.lock().get(index).cloned()
    }

    pub fn id_at(&self, index: usize) -> Option<i64> {
        self.lock().get(index).map(|track| track.id)
    }

    pub fn entries(&self) -> Vec<PlaylistEntry> {
        self.lock()
            .tracks()
            .iter()
            .map(|track| PlaylistEntry {
                id: track.id,
                name: track.name.clone(),
            })
            .collect()
    }

    pub fn snapshot(&self) -> Vec<Track> {
        self.lock().tracks().to_vec()
    }
}

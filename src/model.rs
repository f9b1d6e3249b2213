use serde::{Deserialize, Serialize};

/// A stored audio asset. `id` is assigned by the track store and never
/// supplied by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: i64,
    pub name: String,
    pub data: String,
}

/// A track that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrack {
    pub name: String,
    pub data: String,
}

impl NewTrack {
    pub fn into_track(self, id: i64) -> Track {
        Track {
            id,
            name: self.name,
            data: self.data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    #[serde(default = "default_saved_volume")]
    pub saved_volume: f32,
    #[serde(default = "default_accepted_extensions")]
    pub accepted_extensions: Vec<String>,
    #[serde(default)]
    pub autoplay_on_select: bool,
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

fn default_saved_volume() -> f32 {
    1.0
}

fn default_accepted_extensions() -> Vec<String> {
    vec![String::from("mp3")]
}

fn default_database_file() -> String {
    String::from("tracks.sqlite3")
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            saved_volume: default_saved_volume(),
            accepted_extensions: default_accepted_extensions(),
            autoplay_on_select: false,
            database_file: default_database_file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let state: PersistedState = serde_json::from_str(r#"{"saved_volume": 0.4}"#).expect("parse");
        assert_eq!(state.saved_volume, 0.4);
        assert_eq!(state.accepted_extensions, vec![String::from("mp3")]);
        assert!(!state.autoplay_on_select);
        assert_eq!(state.database_file, "tracks.sqlite3");
    }
}

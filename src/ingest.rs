use crate::model::NewTrack;
use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fs;
use std::path::Path;

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";
const FALLBACK_MIME: &str = "application/octet-stream";

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("{DATA_PREFIX}{mime}{BASE64_MARKER}{}", STANDARD.encode(bytes))
}

/// Splits a base64 data URI into its media type and decoded payload.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let Some(rest) = uri.strip_prefix(DATA_PREFIX) else {
        bail!("not a data URI");
    };
    let Some((mime, payload)) = rest.split_once(BASE64_MARKER) else {
        bail!("data URI is not base64 encoded");
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .context("invalid base64 payload in data URI")?;
    Ok((mime.to_string(), bytes))
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("aac") => "audio/aac",
        Some("opus") => "audio/opus",
        _ => FALLBACK_MIME,
    }
}

pub fn is_accepted(path: &Path, accepted_extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            accepted_extensions
                .iter()
                .any(|accepted| accepted.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

/// Reads one audio file and encodes it for the track store.
pub fn track_from_file(path: &Path, accepted_extensions: &[String]) -> Result<NewTrack> {
    if !path.is_file() {
        bail!("{} is not a file", path.display());
    }
    if !is_accepted(path, accepted_extensions) {
        bail!(
            "{} is not an accepted audio file (accepted: {})",
            path.display(),
            accepted_extensions.join(", ")
        );
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    Ok(NewTrack {
        name,
        data: encode_data_uri(mime_for_path(path), &bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn mp3_only() -> Vec<String> {
        vec![String::from("mp3")]
    }

    #[test]
    fn data_uri_carries_mime_and_payload() {
        let uri = encode_data_uri("audio/mpeg", b"ID3\x03");
        assert_eq!(uri, "data:audio/mpeg;base64,SUQzAw==");

        let (mime, bytes) = decode_data_uri(&uri).expect("decode");
        assert_eq!(mime, "audio/mpeg");
        assert_eq!(bytes, b"ID3\x03");
    }

    #[test]
    fn decode_rejects_malformed_uris() {
        assert!(decode_data_uri("").is_err());
        assert!(decode_data_uri("http://example.com/a.mp3").is_err());
        assert!(decode_data_uri("data:audio/mpeg,plain").is_err());
        assert!(decode_data_uri("data:audio/mpeg;base64,@@@").is_err());
    }

    #[test]
    fn mime_lookup_ignores_case() {
        assert_eq!(mime_for_path(Path::new("Song.MP3")), "audio/mpeg");
        assert_eq!(mime_for_path(Path::new("a.flac")), "audio/flac");
        assert_eq!(mime_for_path(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn accepted_extensions_tolerate_leading_dot() {
        let accepted = vec![String::from(".mp3"), String::from("OGG")];
        assert!(is_accepted(Path::new("a.mp3"), &accepted));
        assert!(is_accepted(Path::new("b.ogg"), &accepted));
        assert!(!is_accepted(Path::new("c.wav"), &accepted));
        assert!(!is_accepted(Path::new("mp3"), &accepted));
    }

    #[test]
    fn file_becomes_named_track() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("a.mp3");
        fs::write(&path, b"abc").expect("write");

        let track = track_from_file(&path, &mp3_only()).expect("ingest");
        assert_eq!(track.name, "a.mp3");
        assert_eq!(track.data, "data:audio/mpeg;base64,YWJj");
    }

    #[test]
    fn rejects_directories_and_other_formats() {
        let dir = tempdir().expect("tempdir");
        assert!(track_from_file(dir.path(), &mp3_only()).is_err());

        let wav = dir.path().join("a.wav");
        fs::write(&wav, b"RIFF").expect("write");
        assert!(track_from_file(&wav, &mp3_only()).is_err());
        assert!(track_from_file(&dir.path().join("missing.mp3"), &mp3_only()).is_err());
    }
}

//! Audio input validation.
//!
//! Checked before the transcription step runs so obviously broken
//! uploads never reach a remote speech backend.

use crate::error::CoreError;

/// Audio container formats accepted for transcription.
pub const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "m4a", "ogg"];

/// Upload size cap (10 MiB). Free-tier speech endpoints reject more.
pub const MAX_AUDIO_BYTES: u64 = 10 * 1024 * 1024;

/// Lowercased extension of a filename, without the dot.
fn extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Validate an audio reference by filename and size.
///
/// Rules:
/// - The extension must be one of [`SUPPORTED_AUDIO_EXTENSIONS`].
/// - The payload must not exceed [`MAX_AUDIO_BYTES`].
/// - Empty payloads are rejected.
pub fn validate_audio_ref(filename: &str, size_bytes: u64) -> Result<(), CoreError> {
    let ext = extension(filename).ok_or_else(|| {
        CoreError::Validation(format!("Audio file '{filename}' has no extension"))
    })?;

    if !SUPPORTED_AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "Unsupported audio format '.{ext}'. Supported: {}",
            SUPPORTED_AUDIO_EXTENSIONS.join(", ")
        )));
    }

    if size_bytes == 0 {
        return Err(CoreError::Validation(
            "Audio file is empty".to_string(),
        ));
    }

    if size_bytes > MAX_AUDIO_BYTES {
        return Err(CoreError::Validation(format!(
            "Audio file too large ({size_bytes} bytes, max {MAX_AUDIO_BYTES})"
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_supported_formats() {
        for ext in SUPPORTED_AUDIO_EXTENSIONS {
            assert!(validate_audio_ref(&format!("clip.{ext}"), 1024).is_ok());
        }
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert!(validate_audio_ref("CLIP.WAV", 1024).is_ok());
    }

    #[test]
    fn rejects_unsupported_extension() {
        assert!(validate_audio_ref("clip.aiff", 1024).is_err());
    }

    #[test]
    fn rejects_missing_extension() {
        assert!(validate_audio_ref("clip", 1024).is_err());
    }

    #[test]
    fn rejects_oversized_payload() {
        assert!(validate_audio_ref("clip.wav", MAX_AUDIO_BYTES + 1).is_err());
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(validate_audio_ref("clip.wav", 0).is_err());
    }
}

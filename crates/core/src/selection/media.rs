/// Extensions the player is expected to handle.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "mkv", "avi", "mp4", "wmv", "vp8", "mov", "mpg", "ts", "m3u8", "webm", "flac", "mp3", "wav",
    "wma", "aac", "ogg",
];

/// Whether a file name has a playable media extension (case-insensitive).
pub fn is_supported_media(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| MEDIA_EXTENSIONS.iter().any(|m| m.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Classification of a stored file, decided by its extension.
///
/// The table in [`FileKind::classify`] is the single place that maps
/// extensions to kinds. Upload allow-lists, text editing and media browsing
/// all consult it instead of inspecting names themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Human-readable text that may be edited in place.
    Text,
    /// Still images.
    Image,
    /// Video containers.
    Video,
    /// Audio files.
    Audio,
    /// Anything else that is stored but never interpreted.
    Binary,
    /// Executable or script formats that are never accepted for upload.
    Disallowed,
}

/// (extension, kind, mime type). Extensions are lower-case without the dot.
const TABLE: &[(&str, FileKind, &str)] = &[
    ("txt", FileKind::Text, "text/plain"),
    ("md", FileKind::Text, "text/markdown"),
    ("csv", FileKind::Text, "text/csv"),
    ("log", FileKind::Text, "text/plain"),
    ("json", FileKind::Text, "application/json"),
    ("toml", FileKind::Text, "application/toml"),
    ("yaml", FileKind::Text, "application/yaml"),
    ("yml", FileKind::Text, "application/yaml"),
    ("xml", FileKind::Text, "application/xml"),
    ("html", FileKind::Text, "text/html"),
    ("htm", FileKind::Text, "text/html"),
    ("css", FileKind::Text, "text/css"),
    ("js", FileKind::Text, "text/javascript"),
    ("py", FileKind::Text, "text/x-python"),
    ("rs", FileKind::Text, "text/x-rust"),
    ("ini", FileKind::Text, "text/plain"),
    ("png", FileKind::Image, "image/png"),
    ("jpg", FileKind::Image, "image/jpeg"),
    ("jpeg", FileKind::Image, "image/jpeg"),
    ("gif", FileKind::Image, "image/gif"),
    ("webp", FileKind::Image, "image/webp"),
    ("bmp", FileKind::Image, "image/bmp"),
    ("svg", FileKind::Image, "image/svg+xml"),
    ("mp4", FileKind::Video, "video/mp4"),
    ("mov", FileKind::Video, "video/quicktime"),
    ("avi", FileKind::Video, "video/x-msvideo"),
    ("mkv", FileKind::Video, "video/x-matroska"),
    ("webm", FileKind::Video, "video/webm"),
    ("mp3", FileKind::Audio, "audio/mpeg"),
    ("wav", FileKind::Audio, "audio/wav"),
    ("ogg", FileKind::Audio, "audio/ogg"),
    ("flac", FileKind::Audio, "audio/flac"),
    ("m4a", FileKind::Audio, "audio/mp4"),
    ("exe", FileKind::Disallowed, "application/octet-stream"),
    ("dll", FileKind::Disallowed, "application/octet-stream"),
    ("bat", FileKind::Disallowed, "application/octet-stream"),
    ("cmd", FileKind::Disallowed, "application/octet-stream"),
    ("com", FileKind::Disallowed, "application/octet-stream"),
    ("msi", FileKind::Disallowed, "application/octet-stream"),
    ("scr", FileKind::Disallowed, "application/octet-stream"),
    ("ps1", FileKind::Disallowed, "application/octet-stream"),
    ("sh", FileKind::Disallowed, "application/octet-stream"),
];

const OCTET_STREAM: &str = "application/octet-stream";

impl FileKind {
    /// All kinds, in declaration order.
    pub const ALL: [FileKind; 6] = [
        FileKind::Text,
        FileKind::Image,
        FileKind::Video,
        FileKind::Audio,
        FileKind::Binary,
        FileKind::Disallowed,
    ];

    /// Classify a file name by its extension (case-insensitive).
    ///
    /// Names without an extension, and unknown extensions, are `Binary`.
    pub fn classify(name: &str) -> Self {
        lookup(name).map(|(_, kind, _)| kind).unwrap_or(FileKind::Binary)
    }

    /// Lower-case label, as used in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Binary => "binary",
            Self::Disallowed => "disallowed",
        }
    }
}

/// MIME type for a file name, falling back to `application/octet-stream`.
pub fn mime_for(name: &str) -> &'static str {
    lookup(name).map(|(_, _, mime)| mime).unwrap_or(OCTET_STREAM)
}

fn lookup(name: &str) -> Option<(&'static str, FileKind, &'static str)> {
    let (_, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    TABLE.iter().copied().find(|(e, _, _)| *e == ext)
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypeError::UnknownKind(s.to_string()))
    }
}

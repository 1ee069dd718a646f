//! Per-request upload values and the extension allow-list.

use std::collections::HashMap;

use crate::error::{Result, ReelpressError};

/// Extensions accepted by the upload form.
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "webm", "mp3", "wav", "aac", "m4a", "flac"];

/// Audio containers whose extension is preserved on audio-only output.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "m4a", "flac"];

/// Container tags that can be written into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataTag {
    Title,
    Artist,
    Album,
    Genre,
    Year,
    Comment,
    Copyright,
}

impl MetadataTag {
    /// All tags, in the order they are written.
    pub const ALL: [MetadataTag; 7] = [
        MetadataTag::Title,
        MetadataTag::Artist,
        MetadataTag::Album,
        MetadataTag::Genre,
        MetadataTag::Year,
        MetadataTag::Comment,
        MetadataTag::Copyright,
    ];

    /// Tag name as passed to `-metadata`.
    pub fn key(self) -> &'static str {
        match self {
            MetadataTag::Title => "TITLE",
            MetadataTag::Artist => "ARTIST",
            MetadataTag::Album => "ALBUM",
            MetadataTag::Genre => "GENRE",
            MetadataTag::Year => "YEAR",
            MetadataTag::Comment => "COMMENT",
            MetadataTag::Copyright => "COPYRIGHT",
        }
    }

    /// Name of the form field carrying this tag's value.
    pub fn form_field(self) -> &'static str {
        match self {
            MetadataTag::Title => "title",
            MetadataTag::Artist => "artist",
            MetadataTag::Album => "album",
            MetadataTag::Genre => "genre",
            MetadataTag::Year => "year",
            MetadataTag::Comment => "comment",
            MetadataTag::Copyright => "copyright",
        }
    }

    pub fn from_form_field(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.form_field() == name)
    }
}

/// User-selected processing options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingOptions {
    pub overlay_enabled: bool,
    pub metadata_enabled: bool,
    pub metadata: HashMap<MetadataTag, String>,
}

impl ProcessingOptions {
    pub fn with_metadata<S: Into<String>>(mut self, tag: MetadataTag, value: S) -> Self {
        self.metadata.insert(tag, value.into());
        self
    }

    /// Non-empty tag values in write order. Empty when metadata is disabled.
    pub fn metadata_pairs(&self) -> Vec<(MetadataTag, &str)> {
        if !self.metadata_enabled {
            return Vec::new();
        }
        MetadataTag::ALL
            .into_iter()
            .filter_map(|tag| {
                self.metadata
                    .get(&tag)
                    .map(String::as_str)
                    .filter(|value| !value.is_empty())
                    .map(|value| (tag, value))
            })
            .collect()
    }
}

/// A parsed upload, alive for the duration of one request.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Filename as sent by the client; `None` when no file part was present.
    pub filename: Option<String>,
    pub data: Vec<u8>,
    pub options: ProcessingOptions,
}

/// Checkbox values submitted by HTML forms.
pub fn is_checked(value: &str) -> bool {
    value == "on"
}

/// Lowercased extension of `filename`, if it is on the allow-list.
pub fn validate_extension(filename: &str) -> Result<String> {
    let (_, extension) = filename
        .rsplit_once('.')
        .ok_or_else(|| ReelpressError::DisallowedFileType(filename.to_string()))?;
    let extension = extension.to_lowercase();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ReelpressError::DisallowedFileType(filename.to_string()));
    }

    Ok(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_extension() {
        assert_eq!(validate_extension("clip.mp4").unwrap(), "mp4");
        assert_eq!(validate_extension("Song.Final.WAV").unwrap(), "wav");
        assert!(validate_extension("evil.exe").is_err());
        assert!(validate_extension("noext").is_err());
        assert!(validate_extension("clip.avi").is_err());
        assert!(validate_extension("trailing.").is_err());
    }

    #[test]
    fn test_metadata_pairs_order_and_empties() {
        let options = ProcessingOptions {
            metadata_enabled: true,
            ..Default::default()
        }
        .with_metadata(MetadataTag::Copyright, "2024")
        .with_metadata(MetadataTag::Title, "Test")
        .with_metadata(MetadataTag::Album, "");

        let keys: Vec<_> = options.metadata_pairs().iter().map(|(tag, _)| tag.key()).collect();
        assert_eq!(keys, vec!["TITLE", "COPYRIGHT"]);
    }

    #[test]
    fn test_metadata_pairs_disabled() {
        let options = ProcessingOptions::default().with_metadata(MetadataTag::Title, "Test");
        assert!(options.metadata_pairs().is_empty());
    }

    #[test]
    fn test_form_field_lookup() {
        assert_eq!(MetadataTag::from_form_field("copyright"), Some(MetadataTag::Copyright));
        assert_eq!(MetadataTag::from_form_field("input_file"), None);
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReelpressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No file provided")]
    NoFileProvided,

    #[error("File type not allowed: {0}")]
    DisallowedFileType(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Multipart error: {0}")]
    Multipart(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Media tool error: {0}")]
    Media(String),

    #[error("Transcode failed: {0}")]
    TranscodeFailure(String),

    #[error("Transcode timed out after {0} seconds")]
    TranscodeTimeout(u64),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl ReelpressError {
    /// Message shown to the person who submitted the upload form.
    ///
    /// Returns `None` for failures that must not leak detail to the client.
    pub fn user_message(&self) -> Option<String> {
        match self {
            ReelpressError::NoFileProvided => Some("Please upload a file.".to_string()),
            ReelpressError::DisallowedFileType(_) => Some("File type not allowed.".to_string()),
            ReelpressError::Multipart(_) => Some("Could not read the uploaded form.".to_string()),
            ReelpressError::TranscodeFailure(diagnostics) => {
                Some(format!("FFmpeg failed: {}", diagnostics))
            }
            ReelpressError::TranscodeTimeout(secs) => {
                Some(format!("FFmpeg timed out after {} seconds.", secs))
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReelpressError>;

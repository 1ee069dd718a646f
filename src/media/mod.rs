// Media tooling seam
//
// - Commands: argv builders for ffprobe / ffmpeg
// - Prober: video-stream detection
// - Runner: process execution and the ffmpeg transcoder

pub mod commands;
pub mod prober;
pub mod runner;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub use commands::*;
pub use prober::*;
pub use runner::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// What the probing tool reported for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Video,
    NoVideo,
    /// The tool could not be run or exited non-zero. Treated as no video.
    Failed(String),
}

impl ProbeOutcome {
    pub fn has_video(&self) -> bool {
        matches!(self, ProbeOutcome::Video)
    }
}

/// Detects whether a file carries a video stream
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> ProbeOutcome;
}

/// Runs a prepared transcode command
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn run(&self, command: &MediaCommand) -> Result<()>;
}

/// Factory for the ffmpeg-backed implementations
pub struct MediaToolsFactory;

impl MediaToolsFactory {
    pub fn create_prober(config: &MediaConfig) -> Arc<dyn MediaProber> {
        Arc::new(FfprobeProber::new(config))
    }

    pub fn create_transcoder(config: &MediaConfig) -> Arc<dyn Transcoder> {
        Arc::new(FfmpegTranscoder::new(config))
    }
}

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::MediaConfig;
use super::{execute, MediaCommandBuilder, MediaProber, ProbeOutcome};

/// Prober backed by the ffprobe command line
pub struct FfprobeProber {
    builder: MediaCommandBuilder,
    timeout: Option<Duration>,
}

impl FfprobeProber {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            builder: MediaCommandBuilder::new(config),
            timeout: config.timeout(),
        }
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> ProbeOutcome {
        let command = self.builder.probe_video_streams(path);

        let outcome = match execute(&command, self.timeout).await {
            Ok(output) if output.success => classify(&output.combined),
            Ok(output) => ProbeOutcome::Failed(output.combined.trim().to_string()),
            Err(e) => ProbeOutcome::Failed(e.to_string()),
        };

        match &outcome {
            ProbeOutcome::Failed(reason) => {
                warn!("Probe of {} failed, assuming no video: {}", path.display(), reason)
            }
            other => debug!("Probe of {}: {:?}", path.display(), other),
        }
        outcome
    }
}

/// Interpret ffprobe's `codec_type` listing.
pub fn classify(output: &str) -> ProbeOutcome {
    if output.to_lowercase().contains("video") {
        ProbeOutcome::Video
    } else {
        ProbeOutcome::NoVideo
    }
}

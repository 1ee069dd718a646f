use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::error::{Result, ReelpressError};
use crate::media::{MediaCommandBuilder, MediaProber, MediaToolsFactory, Transcoder};
use crate::storage::Storage;
use crate::upload::{validate_extension, UploadRequest};

/// Steps an upload passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReceivingUpload,
    Validating,
    Storing,
    Probing,
    BuildingCommand,
    Transcoding,
    Succeeded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ReceivingUpload => "receiving",
            Stage::Validating => "validating",
            Stage::Storing => "storing",
            Stage::Probing => "probing",
            Stage::BuildingCommand => "building-command",
            Stage::Transcoding => "transcoding",
            Stage::Succeeded => "succeeded",
        };
        f.write_str(name)
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct ProcessedOutput {
    pub input_path: PathBuf,
    pub output_filename: String,
    pub output_path: PathBuf,
    pub has_video: bool,
    pub overlay_applied: bool,
}

pub struct Workflow {
    storage: Storage,
    builder: MediaCommandBuilder,
    prober: Arc<dyn MediaProber>,
    transcoder: Arc<dyn Transcoder>,
}

impl Workflow {
    /// Workflow using ffprobe and ffmpeg from the configuration.
    pub fn new(config: &Config) -> Self {
        Self::with_tools(
            config,
            MediaToolsFactory::create_prober(&config.media),
            MediaToolsFactory::create_transcoder(&config.media),
        )
    }

    pub fn with_tools(
        config: &Config,
        prober: Arc<dyn MediaProber>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            storage: Storage::new(&config.storage),
            builder: MediaCommandBuilder::new(&config.media),
            prober,
            transcoder,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Validate, store, probe, build and transcode one upload.
    pub async fn process(&self, request: UploadRequest) -> Result<ProcessedOutput> {
        let filename = request
            .filename
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or(ReelpressError::NoFileProvided)?;
        info!(stage = %Stage::ReceivingUpload, "Received {} ({} bytes)", filename, request.data.len());

        info!(stage = %Stage::Validating, "Checking file type");
        let extension = validate_extension(filename)?;

        info!(stage = %Stage::Storing, "Saving upload");
        let stored = self.storage.store_upload(filename, &request.data).await?;

        info!(stage = %Stage::Probing, "Probing {}", stored.path.display());
        let probe = self.prober.probe(&stored.path).await;
        let has_video = probe.has_video();

        info!(stage = %Stage::BuildingCommand, has_video, overlay = request.options.overlay_enabled, "Building command");
        let spec = self.builder.transcode(
            &request.options,
            has_video,
            &extension,
            &stored.path,
            stored.base_name(),
            self.storage.output_dir(),
        )?;

        info!(stage = %Stage::Transcoding, "Writing {}", spec.output_path.display());
        self.transcoder.run(&spec.command).await?;

        info!(stage = %Stage::Succeeded, "Produced {}", spec.output_filename);
        Ok(ProcessedOutput {
            input_path: stored.path,
            output_filename: spec.output_filename,
            output_path: spec.output_path,
            has_video,
            overlay_applied: spec.overlay_applied,
        })
    }
}

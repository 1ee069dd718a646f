use std::path::{Path, PathBuf};

use crate::config::MediaConfig;
use crate::error::Result;
use crate::storage::contained_join;
use crate::upload::{ProcessingOptions, AUDIO_EXTENSIONS};

/// Software encoder used whenever video is re-encoded
pub const VIDEO_ENCODER: &str = "libx264";
/// Fastest x264 preset
pub const VIDEO_PRESET: &str = "ultrafast";
/// Portrait frame produced by the overlay chain
pub const OVERLAY_WIDTH: u32 = 720;
pub const OVERLAY_HEIGHT: u32 = 1280;

/// Abstract media processing command representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy audio stream
    pub fn copy_audio(self) -> Self {
        self.audio_codec("copy")
    }

    /// Set encoder preset
    pub fn preset<S: Into<String>>(self, preset: S) -> Self {
        self.arg("-preset").arg(preset)
    }

    /// Add a complex filter graph
    pub fn filter_complex<S: Into<String>>(self, graph: S) -> Self {
        self.arg("-filter_complex").arg(graph)
    }

    /// Select an output stream
    pub fn map<S: Into<String>>(self, stream: S) -> Self {
        self.arg("-map").arg(stream)
    }

    /// Write a container tag
    pub fn metadata(self, key: &str, value: &str) -> Self {
        self.arg("-metadata").arg(format!("{}={}", key, value))
    }

    /// Binary followed by its arguments
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.binary_path.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// Everything needed to run one transcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeSpec {
    pub output_filename: String,
    pub output_path: PathBuf,
    pub command: MediaCommand,
    pub overlay_applied: bool,
}

/// Builder for common media processing operations
pub struct MediaCommandBuilder {
    ffmpeg_path: String,
    ffprobe_path: String,
    overlay_text: String,
    overlay_font: String,
}

impl MediaCommandBuilder {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            overlay_text: config.overlay_text.clone(),
            overlay_font: config.overlay_font.clone(),
        }
    }

    /// Build the stream probe: one `codec_type` line per video stream.
    pub fn probe_video_streams<P: AsRef<Path>>(&self, path: P) -> MediaCommand {
        MediaCommand::new(&self.ffprobe_path, "Video stream probe")
            .args(["-v", "error"])
            .args(["-select_streams", "v"])
            .args(["-show_entries", "stream=codec_type"])
            .args(["-of", "csv=p=0"])
            .output(path)
    }

    /// Decide the output name and ffmpeg invocation for an upload.
    pub fn transcode<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        options: &ProcessingOptions,
        has_video: bool,
        original_extension: &str,
        input_path: P,
        base_name: &str,
        output_dir: Q,
    ) -> Result<TranscodeSpec> {
        let output_filename = output_filename(base_name, has_video, original_extension);
        let output_path = contained_join(output_dir.as_ref(), &output_filename)?;
        let overlay_applied = has_video && options.overlay_enabled;

        let mut cmd = MediaCommand::new(&self.ffmpeg_path, "Transcode")
            .overwrite()
            .input(input_path);

        if overlay_applied {
            cmd = cmd
                .filter_complex(self.overlay_filter())
                .map("[v]")
                .map("0:a?")
                .video_codec(VIDEO_ENCODER)
                .preset(VIDEO_PRESET)
                .copy_audio();
        } else if has_video {
            cmd = cmd.video_codec(VIDEO_ENCODER).preset(VIDEO_PRESET).copy_audio();
        } else {
            cmd = cmd.copy_audio();
        }

        for (tag, value) in options.metadata_pairs() {
            cmd = cmd.metadata(tag.key(), value);
        }

        Ok(TranscodeSpec {
            output_filename,
            command: cmd.output(&output_path),
            output_path,
            overlay_applied,
        })
    }

    /// Build version check command
    pub fn version_check(&self, binary_path: &str) -> MediaCommand {
        MediaCommand::new(binary_path, "Version check").arg("-version")
    }

    /// Portrait crop with a vertically bouncing caption.
    fn overlay_filter(&self) -> String {
        let drawtext = format!(
            "drawtext=fontfile={}:fontsize=20:fontcolor=gray:\
             x=(w-text_w)/2+20:\
             y=abs(mod(t*100\\,2*h)-h/2):\
             text={}",
            quote_filter_value(&self.overlay_font),
            quote_filter_value(&self.overlay_text),
        );

        format!(
            "[0:v]scale=1.0*iw:-1,\
             crop=ih*9/16:ih:(iw-ih*9/16)/2:0,\
             scale={}:{},\
             split[base][txt];\
             [txt]{}[captioned];\
             [base][captioned]overlay[v]",
            OVERLAY_WIDTH, OVERLAY_HEIGHT, drawtext
        )
    }
}

/// `<base>_processed.<ext>`: mp4 for video, the source extension for known
/// audio containers, mp3 otherwise.
pub fn output_filename(base_name: &str, has_video: bool, original_extension: &str) -> String {
    let extension = original_extension.to_lowercase();
    let extension = if has_video {
        "mp4"
    } else if AUDIO_EXTENSIONS.contains(&extension.as_str()) {
        extension.as_str()
    } else {
        "mp3"
    };
    format!("{}_processed.{}", base_name, extension)
}

/// Single-quote a filter option value.
fn quote_filter_value(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::MediaConfig;
use crate::error::{Result, ReelpressError};
use super::{MediaCommand, MediaCommandBuilder, Transcoder};

/// Longest diagnostic excerpt surfaced to users
pub const MAX_DIAGNOSTIC_CHARS: usize = 1000;

/// Exit status and captured text of one tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    /// stdout followed by stderr
    pub combined: String,
}

/// Run `command` to completion, killing it if `timeout` elapses first.
pub async fn execute(command: &MediaCommand, timeout: Option<Duration>) -> Result<ToolOutput> {
    debug!("Executing media processing command: {} {:?}", command.binary_path, command.args);
    debug!("Description: {}", command.description);

    let child = Command::new(&command.binary_path)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            ReelpressError::Media(format!("Failed to execute {}: {}", command.binary_path, e))
        })?;

    let output = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                // Dropping the wait future drops the child, which kills it.
                warn!("{} exceeded {}s and was killed", command.description, limit.as_secs());
                return Err(ReelpressError::TranscodeTimeout(limit.as_secs()));
            }
        },
        None => child.wait_with_output().await?,
    };

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(ToolOutput {
        success: output.status.success(),
        combined,
    })
}

/// First `MAX_DIAGNOSTIC_CHARS` characters of tool output.
pub fn truncate_diagnostics(text: &str) -> String {
    text.chars().take(MAX_DIAGNOSTIC_CHARS).collect()
}

/// First line of `<binary> -version`.
pub async fn version_info(binary_path: &str, builder: &MediaCommandBuilder) -> Result<String> {
    let output = execute(&builder.version_check(binary_path), Some(Duration::from_secs(10))).await?;

    if output.success {
        Ok(output.combined.lines().next().unwrap_or("Unknown version").to_string())
    } else {
        Err(ReelpressError::Media(format!("{} version check failed", binary_path)))
    }
}

/// Transcoder backed by the ffmpeg command line
pub struct FfmpegTranscoder {
    timeout: Option<Duration>,
}

impl FfmpegTranscoder {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            timeout: config.timeout(),
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn run(&self, command: &MediaCommand) -> Result<()> {
        info!("Running {}", command.description);

        let output = execute(command, self.timeout).await?;
        if !output.success {
            warn!("{} failed", command.description);
            return Err(ReelpressError::TranscodeFailure(truncate_diagnostics(&output.combined)));
        }

        info!("{} completed", command.description);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_diagnostics() {
        let long = "é".repeat(1500);
        assert_eq!(truncate_diagnostics(&long).chars().count(), MAX_DIAGNOSTIC_CHARS);
        assert_eq!(truncate_diagnostics("short"), "short");
    }

    #[tokio::test]
    async fn test_missing_binary_is_media_error() {
        let command = MediaCommand::new("/nonexistent/reelpress-ffmpeg", "Transcode");
        let err = execute(&command, None).await.unwrap_err();
        assert!(matches!(err, ReelpressError::Media(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_both_streams() {
        let command = MediaCommand::new("sh", "Shell")
            .args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = execute(&command, None).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.combined, "out\nerr\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills() {
        let command = MediaCommand::new("sleep", "Sleep").arg("5");
        let err = execute(&command, Some(Duration::from_millis(100))).await.unwrap_err();
        assert!(matches!(err, ReelpressError::TranscodeTimeout(0)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transcoder_failure_carries_diagnostics() {
        let transcoder = FfmpegTranscoder { timeout: None };
        let command = MediaCommand::new("sh", "Transcode")
            .args(["-c", "echo 'Unknown encoder' >&2; exit 1"]);

        match transcoder.run(&command).await {
            Err(ReelpressError::TranscodeFailure(text)) => assert_eq!(text, "Unknown encoder\n"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

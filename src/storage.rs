//! On-disk layout for uploads and outputs.

use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{Result, ReelpressError};

const MAX_FILENAME_LENGTH: usize = 200;
/// Hex characters of the random prefix (48 bits).
const ID_LENGTH: usize = 12;

/// An uploaded file written into the upload directory.
#[derive(Debug, Clone)]
pub struct StoredInput {
    pub path: PathBuf,
    /// `<id>_<sanitized filename>`
    pub name: String,
}

impl StoredInput {
    /// Stored name without its final extension.
    pub fn base_name(&self) -> &str {
        self.name.rsplit_once('.').map_or(self.name.as_str(), |(base, _)| base)
    }
}

#[derive(Debug, Clone)]
pub struct Storage {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl Storage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create both directories if absent.
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.upload_dir, &self.output_dir] {
            fs::create_dir_all(dir).await.map_err(|e| {
                ReelpressError::Storage(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }
        info!(
            "Storage ready - uploads: {}, outputs: {}",
            self.upload_dir.display(),
            self.output_dir.display()
        );
        Ok(())
    }

    /// Write `data` under a fresh `<id>_<sanitized filename>` name.
    pub async fn store_upload(&self, original_filename: &str, data: &[u8]) -> Result<StoredInput> {
        let name = format!("{}_{}", generate_id(), sanitize_filename(original_filename));
        let path = contained_join(&self.upload_dir, &name)?;

        fs::write(&path, data).await.map_err(|e| {
            ReelpressError::Storage(format!("Failed to write {}: {}", path.display(), e))
        })?;

        debug!("Stored upload {} ({} bytes)", path.display(), data.len());
        Ok(StoredInput { path, name })
    }

    /// Path in the output directory for a produced file.
    pub fn output_path(&self, filename: &str) -> Result<PathBuf> {
        contained_join(&self.output_dir, filename)
    }

    /// Locate an existing output for download.
    pub async fn resolve_download(&self, filename: &str) -> Result<PathBuf> {
        let path = contained_join(&self.output_dir, filename)?;

        let root = fs::canonicalize(&self.output_dir)
            .await
            .map_err(|_| ReelpressError::NotFound(filename.to_string()))?;
        let resolved = fs::canonicalize(&path)
            .await
            .map_err(|_| ReelpressError::NotFound(filename.to_string()))?;

        // Symlinks inside the output directory must not escape it either.
        if !resolved.starts_with(&root) {
            return Err(ReelpressError::InvalidFilename(filename.to_string()));
        }
        if !fs::metadata(&resolved).await?.is_file() {
            return Err(ReelpressError::NotFound(filename.to_string()));
        }

        Ok(resolved)
    }
}

/// Short random identifier used to prefix stored uploads.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()[..ID_LENGTH].to_string()
}

/// Reduce a client-supplied filename to a single safe path component.
///
/// Directory parts are dropped and every character outside
/// `[A-Za-z0-9._-]` becomes `_`. Overlong names lose the end of their stem,
/// never their extension.
pub fn sanitize_filename(filename: &str) -> String {
    let filename_only = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let mut sanitized: String = filename_only
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Only ASCII survives the mapping above, so byte offsets are char offsets.
    if sanitized.len() > MAX_FILENAME_LENGTH {
        sanitized = match sanitized.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && ext.len() < MAX_FILENAME_LENGTH / 2 => {
                let keep = MAX_FILENAME_LENGTH - ext.len() - 1;
                format!("{}.{}", &stem[..keep.min(stem.len())], ext)
            }
            _ => sanitized[..MAX_FILENAME_LENGTH].to_string(),
        };
    }

    if sanitized.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

/// Join a single filename onto `root`, refusing anything that could leave it.
pub fn contained_join(root: &Path, filename: &str) -> Result<PathBuf> {
    let invalid = || ReelpressError::InvalidFilename(filename.to_string());

    if filename.is_empty() || filename.contains(['/', '\\', '\0']) {
        return Err(invalid());
    }

    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(root.join(filename)),
        _ => Err(invalid()),
    }
}

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

use crate::shared::AppError;

/// Writes book cover images below the static directory as
/// `<static>/covers/<slug>.jpg`.
#[derive(Debug, Clone)]
pub struct CoverStore {
    static_root: PathBuf,
}

impl CoverStore {
    pub fn new(static_root: impl Into<PathBuf>) -> Self {
        Self {
            static_root: static_root.into(),
        }
    }

    /// Directory served under `/static`
    pub fn static_root(&self) -> &Path {
        &self.static_root
    }

    pub fn cover_path(&self, slug: &str) -> PathBuf {
        self.static_root.join("covers").join(format!("{}.jpg", slug))
    }

    /// Decodes a base64 cover and writes it for `slug`, replacing any
    /// previous cover of that slug.
    #[instrument(skip(self, encoded), fields(encoded_len = encoded.len()))]
    pub async fn save_base64(&self, slug: &str, encoded: &str) -> Result<PathBuf, AppError> {
        let bytes = decode_cover(encoded)?;
        let path = self.cover_path(slug);

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                warn!(error = %e, dir = %dir.display(), "Failed to create cover directory");
                AppError::Internal(format!("cannot create cover directory: {}", e))
            })?;
        }

        tokio::fs::write(&path, &bytes).await.map_err(|e| {
            warn!(error = %e, path = %path.display(), "Failed to write cover image");
            AppError::Internal(format!("cannot write cover image: {}", e))
        })?;

        debug!(path = %path.display(), size = bytes.len(), "Cover image written");
        Ok(path)
    }
}

/// Decodes a standard base64 payload, accepting an optional
/// `data:<mime>;base64,` prefix.
pub fn decode_cover(encoded: &str) -> Result<Vec<u8>, AppError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };

    STANDARD.decode(payload.trim()).map_err(|e| {
        warn!(error = %e, "Cover image is not valid base64");
        AppError::BadRequest("cover image is not valid base64".to_string())
    })
}

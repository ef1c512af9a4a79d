//! Book cover storage

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    config::ImagesConfig,
    error::{AppError, AppResult},
    models::validation::FieldError,
};

pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// An uploaded image file as received from a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Lowercased extension without the dot
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

/// Reject empty files, unknown extensions and files above `max_bytes`
pub fn validate_image(upload: &ImageUpload, max_bytes: usize) -> AppResult<()> {
    let reject = |message: String| Err(AppError::Validation(vec![FieldError::new("image", message)]));

    if upload.bytes.is_empty() {
        return reject("No file was provided".to_string());
    }

    match upload.extension() {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return reject(format!(
                "The file type is not allowed. Allowed types: {}",
                ALLOWED_EXTENSIONS
                    .iter()
                    .map(|e| format!(".{}", e))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        }
    }

    if upload.bytes.len() > max_bytes {
        return reject(format!("File size exceeds {} MB", max_bytes / 1024 / 1024));
    }

    Ok(())
}

/// Where book covers are kept
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the file and return the URL it is served under
    async fn upload(&self, upload: &ImageUpload) -> AppResult<String>;

    /// Remove a previously uploaded file; unknown URLs are ignored
    async fn delete(&self, url: &str) -> AppResult<()>;
}

/// Stores covers in a local directory served as static files
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    directory: PathBuf,
    url_prefix: String,
}

impl LocalImageStore {
    pub fn new(config: &ImagesConfig) -> Self {
        Self {
            directory: PathBuf::from(&config.directory),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn upload(&self, upload: &ImageUpload) -> AppResult<String> {
        let ext = upload.extension().unwrap_or_else(|| "bin".to_string());
        let file_name = format!("{}.{}", Uuid::new_v4(), ext);

        tokio::fs::create_dir_all(&self.directory).await?;
        tokio::fs::write(self.directory.join(&file_name), &upload.bytes).await?;

        tracing::debug!("Stored image {} ({} bytes)", file_name, upload.bytes.len());
        Ok(format!("{}/{}", self.url_prefix, file_name))
    }

    async fn delete(&self, url: &str) -> AppResult<()> {
        let Some(file_name) = Path::new(url).file_name() else {
            return Ok(());
        };

        match tokio::fs::remove_file(self.directory.join(file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

//! Multipart upload helpers shared by remark photos and the file store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// The `file` part of an upload.
#[derive(Debug)]
pub struct UploadedPart {
    /// Client file name with any directory components removed.
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A parsed multipart form: at most one `file` part plus text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    file: Option<UploadedPart>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Drain the multipart stream. Later parts with the same name win.
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                let filename = sanitize_filename(field.file_name().unwrap_or(""));
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.file = Some(UploadedPart {
                    filename,
                    content_type,
                    data: data.to_vec(),
                });
            } else if !name.is_empty() {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }

    /// The uploaded file; it must be present and carry a usable name.
    pub fn take_file(&mut self) -> AppResult<UploadedPart> {
        let part = self
            .file
            .take()
            .ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
        if part.filename.is_empty() {
            return Err(AppError::BadRequest("Uploaded file has no name".into()));
        }
        Ok(part)
    }

    /// A text field, trimmed. Blank values count as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// A numeric text field. A value that does not parse is a bad request.
    pub fn id(&self, name: &str) -> AppResult<Option<i64>> {
        self.text(name)
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| AppError::BadRequest(format!("Field '{name}' must be an integer")))
            })
            .transpose()
    }
}

/// Name a file is stored under: unique even for same-second uploads of the
/// same client name.
pub fn stored_name(prefix: &str, filename: &str) -> String {
    format!(
        "{prefix}_{}_{}_{filename}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        Uuid::new_v4().simple()
    )
}

/// Write `data` to `dir/name`, creating `dir` as needed.
pub async fn save(dir: &Path, name: &str, data: &[u8]) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let path = dir.join(name);
    tokio::fs::write(&path, data)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    Ok(path)
}

/// Failure to remove the file is logged, not returned.
pub async fn remove(path: &str) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path, error = %e, "Failed to remove uploaded file");
    }
}

/// Strip any directory components a client put in the upload's file name.
pub fn sanitize_filename(raw: &str) -> String {
    let normalized = raw.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

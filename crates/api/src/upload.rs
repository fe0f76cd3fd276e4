//! Multipart form handling for endpoints that take files.
//!
//! File parts are streamed into a server-owned staging directory under
//! generated names. Only those staged paths are handed to the blob store;
//! the client's filename contributes nothing but a sanitized extension.

use std::collections::HashMap;
use std::path::Path;

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use domain::DomainError;
use media::LocalFile;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::ApiError;

const MAX_EXTENSION_LEN: usize = 8;

/// Text fields and staged files of one multipart request.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, LocalFile>,
}

impl UploadForm {
    /// Reads every part, staging files under `staging_dir`.
    ///
    /// On error, files staged so far are removed again.
    pub async fn read(multipart: Multipart, staging_dir: &Path) -> Result<Self, ApiError> {
        tokio::fs::create_dir_all(staging_dir)
            .await
            .map_err(|e| staging_failed(staging_dir, e))?;

        let mut form = Self::default();
        if let Err(e) = form.collect(multipart, staging_dir).await {
            form.discard().await;
            return Err(e);
        }
        Ok(form)
    }

    async fn collect(
        &mut self,
        mut multipart: Multipart,
        staging_dir: &Path,
    ) -> Result<(), ApiError> {
        while let Some(field) = multipart.next_field().await.map_err(bad_part)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                // Browsers send an empty file part when nothing was chosen.
                Some(file_name) if file_name.is_empty() => continue,
                Some(file_name) => {
                    let staged = stage(field, &file_name, staging_dir).await?;
                    if let Some(previous) = self.files.insert(name, staged) {
                        remove_staged(&previous).await;
                    }
                }
                None => {
                    let value = field.text().await.map_err(bad_part)?;
                    self.fields.insert(name, value);
                }
            }
        }
        Ok(())
    }

    /// A text field, empty when absent.
    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// A staged file, if the part was sent.
    pub fn file(&self, name: &str) -> Option<LocalFile> {
        self.files.get(name).cloned()
    }

    /// Removes every staged file. Call once the request has been handled.
    pub async fn discard(self) {
        for file in self.files.values() {
            remove_staged(file).await;
        }
    }
}

async fn stage(
    mut field: Field<'_>,
    file_name: &str,
    staging_dir: &Path,
) -> Result<LocalFile, ApiError> {
    let path = staging_dir.join(staged_name(file_name));
    let mut out = tokio::fs::File::create(&path)
        .await
        .map_err(|e| staging_failed(&path, e))?;

    let written = async {
        while let Some(chunk) = field.chunk().await.map_err(bad_part)? {
            out.write_all(&chunk)
                .await
                .map_err(|e| staging_failed(&path, e))?;
        }
        out.flush().await.map_err(|e| staging_failed(&path, e))
    }
    .await;

    let staged = LocalFile::new(path);
    match written {
        Ok(()) => {
            tracing::debug!(file = %staged.file_name(), "upload staged");
            Ok(staged)
        }
        Err(e) => {
            remove_staged(&staged).await;
            Err(e)
        }
    }
}

/// A fresh name keeping only a short alphanumeric extension from the client.
fn staged_name(client_name: &str) -> String {
    let extension = Path::new(client_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= MAX_EXTENSION_LEN)
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);
    let stem = Uuid::new_v4().simple().to_string();
    match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

async fn remove_staged(file: &LocalFile) {
    if let Err(e) = tokio::fs::remove_file(file.path()).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(file = %file.path().display(), error = %e, "cannot remove staged upload");
    }
}

fn bad_part(e: MultipartError) -> ApiError {
    ApiError::BadRequest(e.body_text())
}

fn staging_failed(path: &Path, e: std::io::Error) -> ApiError {
    tracing::error!(path = %path.display(), error = %e, "cannot stage upload");
    DomainError::Internal("cannot store the uploaded file".to_string()).into()
}

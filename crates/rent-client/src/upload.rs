//! # Upload API
//!
//! Image upload for catalog editing (`POST /upload/`). Not used by the
//! reservation flow.

use crate::http::{ApiClient, Auth};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use rent_core::{RentError, RentResult};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

/// Where the upload service stored the file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    /// Relative public path, e.g. `/uploads/<uuid>.png`
    pub url: String,
}

pub struct UploadApi {
    api: ApiClient,
}

impl UploadApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Upload raw image bytes
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn upload_image(
        &self,
        data: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> RentResult<UploadedFile> {
        if !content_type.starts_with("image/") {
            return Err(RentError::InvalidRequest(format!(
                "only images can be uploaded, got {}",
                content_type
            )));
        }

        let part = Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| RentError::InvalidRequest(format!("bad content type: {}", e)))?;
        let form = Form::new().part("file", part);

        let builder = self
            .api
            .request(Method::POST, "/upload/", Auth::Required)?
            .multipart(form);
        let uploaded: UploadedFile = self.api.fetch(builder).await?;

        info!("Uploaded image: {}", uploaded.url);
        Ok(uploaded)
    }

    /// Upload an image file from disk; the type is taken from the extension
    pub async fn upload_path(&self, path: &Path) -> RentResult<UploadedFile> {
        let content_type = image_content_type(path).ok_or_else(|| {
            RentError::InvalidRequest(format!("{} is not a supported image", path.display()))
        })?;

        // Checked before touching the disk so a logged-out user gets the right error
        if !self.api.session().is_logged_in() {
            return Err(RentError::NotAuthenticated);
        }

        let data = tokio::fs::read(path).await.map_err(|e| {
            RentError::InvalidRequest(format!("cannot read {}: {}", path.display(), e))
        })?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");

        self.upload_image(data, filename, content_type).await
    }
}

fn image_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

//! Multipart form collection.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;

use parley_core::error::AppError;
use parley_storage::ImageUpload;

use crate::error::ApiError;

/// Text fields and files of a multipart form, keyed by field name.
#[derive(Debug, Default)]
pub struct UploadForm {
    /// Non-file fields.
    pub fields: HashMap<String, String>,
    /// File fields.
    pub files: HashMap<String, ImageUpload>,
}

impl UploadForm {
    /// Drain every part of `multipart`. Later parts with the same name win.
    pub async fn collect(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    let data = field.bytes().await.map_err(multipart_error)?;
                    form.files.insert(
                        name,
                        ImageUpload {
                            file_name,
                            content_type,
                            data,
                        },
                    );
                }
                None => {
                    let value = field.text().await.map_err(multipart_error)?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Remove and return the file part named `name`.
    pub fn take_file(&mut self, name: &str) -> Option<ImageUpload> {
        self.files.remove(name)
    }

    /// Remove and return the text part named `name`.
    pub fn take_field(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large("Upload exceeds the maximum allowed size").into()
    } else {
        AppError::validation(format!("Malformed multipart body: {}", err.body_text())).into()
    }
}

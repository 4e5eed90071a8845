//! Profile forms and avatar uploads
//!
//! The browser client posts `multipart/form-data` with a `name` field and a
//! `profileImage` field that is either a URL (text) or a file. JSON bodies
//! with the same field names are accepted too.

use crate::error::ApiError;
use async_trait::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// URL prefix uploaded avatars are served from
pub const UPLOADS_ROUTE: &str = "/uploads/images";

const IMAGE_FIELD: &str = "profileImage";
const MAX_EXTENSION_LEN: usize = 8;

/// A file part from a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Fields shared by "add user" and "change avatar"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: Option<String>,
    /// Avatar URL sent as text
    pub profile_image: Option<String>,
    /// Avatar sent as a file; wins over the URL
    pub image_file: Option<UploadedFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileJson {
    name: Option<String>,
    profile_image: Option<String>,
}

#[async_trait]
impl<S> FromRequest<S> for ProfileForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await?;
            return read_multipart(multipart).await;
        }

        if content_type.starts_with("application/json") {
            let Json(body) = Json::<ProfileJson>::from_request(req, state).await?;
            return Ok(ProfileForm {
                name: body.name,
                profile_image: body.profile_image,
                image_file: None,
            });
        }

        // No body at all: nothing was submitted
        Ok(ProfileForm::default())
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<ProfileForm, ApiError> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(field_name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) if field_name == IMAGE_FIELD => {
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was picked
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.image_file = Some(UploadedFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            Some(_) => {}
            None => {
                let text = field.text().await?;
                match field_name.as_str() {
                    "name" => form.name = Some(text),
                    IMAGE_FIELD => form.profile_image = Some(text),
                    _ => {}
                }
            }
        }
    }

    Ok(form)
}

/// Writes avatar files to disk
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save the file and return the public path to store on the user
    pub async fn save(&self, file: &UploadedFile) -> Result<String, ApiError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let stored_name = stored_file_name(&file.file_name);
        let path = self.dir.join(&stored_name);
        tokio::fs::write(&path, &file.bytes).await?;
        info!(file = %path.display(), bytes = file.bytes.len(), "Avatar uploaded");

        Ok(format!("{UPLOADS_ROUTE}/{stored_name}"))
    }

    /// Remove a file saved by [`UploadStore::save`] whose user write failed
    pub async fn discard(&self, public_path: &str) {
        let Some(stored_name) = public_path
            .strip_prefix(UPLOADS_ROUTE)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return;
        };
        if stored_name.is_empty() || stored_name.contains(['/', '\\']) {
            return;
        }

        let path = self.dir.join(stored_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!(file = %path.display(), "Orphaned avatar removed"),
            Err(err) => warn!(file = %path.display(), error = %err, "Failed to remove avatar"),
        }
    }

    /// Avatar value for a submitted form: the saved file's path, else the text URL, else empty
    pub async fn resolve_image(&self, form: &ProfileForm) -> Result<String, ApiError> {
        if let Some(file) = &form.image_file {
            return self.save(file).await;
        }
        Ok(form.profile_image.clone().unwrap_or_default())
    }
}

/// `profileImage-<millis>-<random>.<ext>`; the extension is kept only if it is short and alphanumeric
fn stored_file_name(original: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen();
    let stem = format!(
        "{IMAGE_FIELD}-{}-{suffix:08x}",
        Utc::now().timestamp_millis()
    );

    match extension_of(original) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

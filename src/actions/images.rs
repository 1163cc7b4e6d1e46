use bytes::Bytes;
use rand::Rng;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, info, instrument};

use super::{ActionError, ActionResult};
use crate::{auth::Session, state::AppState};

const CACHE_CONTROL: &str = "max-age=3600";
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
}

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub path: String,
    pub public_url: String,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

fn ext_from_name(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    (!ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}

/// `<random base36>-<unix millis>.<ext>`, keeping the uploaded file's extension.
fn storage_key(file_name: &str, content_type: &str) -> String {
    let mut rng = rand::thread_rng();
    let random: String = (0..11)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let ext = ext_from_name(file_name)
        .or_else(|| ext_from_mime(content_type).map(String::from))
        .unwrap_or_else(|| "bin".into());
    format!("{random}-{millis}.{ext}")
}

/// Stores the payload as-is; size limits are the caller's job.
#[instrument(skip(state, session, upload), fields(file_name = %upload.file_name, size = upload.body.len()))]
pub async fn upload_image(
    state: &AppState,
    session: &Session,
    upload: ImageUpload,
) -> ActionResult<UploadedImage> {
    let admin = session.require()?;
    let key = storage_key(&upload.file_name, &upload.content_type);

    state
        .storage
        .put_object(&key, upload.body, &upload.content_type, CACHE_CONTROL)
        .await
        .map_err(|e| {
            error!(error = %e, %key, "image upload failed");
            ActionError::Backend(e.to_string())
        })?;

    let public_url = state.storage.public_url(&key);
    info!(%key, admin_id = %admin.id, "image uploaded");
    Ok(UploadedImage {
        path: key,
        public_url,
    })
}

use bytes::Bytes;
use warp::{Rejection, Reply};

use crate::exif_extractor;

/// Server-side counterpart of the dashboard's EXIF prefill: raw image bytes
/// in, extracted metadata out. Unreadable input yields an empty object.
pub async fn extract_exif(body: Bytes) -> Result<impl Reply, Rejection> {
    let metadata = exif_extractor::extract(&body);
    Ok(warp::reply::json(&metadata))
}

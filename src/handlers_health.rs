use std::convert::Infallible;
use std::sync::Arc;

use serde_json::json;
use warp::{reject, Rejection, Reply};

use crate::storage::ImageStore;
use crate::warp_helpers::StorageFailure;

pub async fn health_check() -> Result<impl Reply, Infallible> {
    Ok(warp::reply::json(&json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Readiness probes the configured backend with a real list call.
pub async fn ready_check(images: Arc<dyn ImageStore>) -> Result<impl Reply, Rejection> {
    match images.list().await {
        Ok(_) => Ok(warp::reply::json(&json!({
            "status": "ready",
            "storage": "connected",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))),
        Err(e) => {
            log::error!("Storage backend not ready: {}", e);
            Err(reject::custom(StorageFailure {
                message: "Storage backend unavailable".to_string(),
            }))
        }
    }
}

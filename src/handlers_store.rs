use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use warp::{reject, Rejection, Reply};

use crate::storage::StoreDirectory;
use crate::warp_helpers::{reject_storage_error, ValidationError};

#[derive(Debug, Deserialize)]
pub struct AddStoreRequest {
    pub name: Option<String>,
}

pub async fn list_stores(stores: Arc<dyn StoreDirectory>) -> Result<impl Reply, Rejection> {
    let all = stores.list().await.map_err(reject_storage_error)?;
    Ok(warp::reply::json(&json!({
        "success": true,
        "data": all,
    })))
}

pub async fn add_store(
    request: AddStoreRequest,
    stores: Arc<dyn StoreDirectory>,
) -> Result<impl Reply, Rejection> {
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            reject::custom(ValidationError {
                message: "store name is required".to_string(),
            })
        })?;

    let store = stores.add(name).await.map_err(reject_storage_error)?;
    Ok(warp::reply::json(&json!({
        "success": true,
        "data": store,
    })))
}

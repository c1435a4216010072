use std::sync::Arc;

use serde::{Deserialize, Serialize};
use warp::{reject, Rejection, Reply};

use crate::enrichment;
use crate::filter::{self, DateRange, FilterOptions};
use crate::records::{NewImagePayload, UpdateImagePayload};
use crate::storage::ImageStore;
use crate::warp_helpers::{reject_storage_error, NotFoundError, ValidationError};

/// Mutation response envelope, matching the dashboard's expectations.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    fn wrap(data: T) -> warp::reply::Json {
        warp::reply::json(&ApiResponse {
            success: true,
            data,
        })
    }
}

/// Gallery list query. `stores`, `tags` and `weeks` are comma-separated;
/// `start`/`end` are inclusive ISO dates; `q` is free text.
#[derive(Debug, Default, Deserialize)]
pub struct ImageListQuery {
    pub stores: Option<String>,
    pub tags: Option<String>,
    pub weeks: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub q: Option<String>,
}

fn split_csv(value: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

impl ImageListQuery {
    fn into_filters(self) -> FilterOptions {
        let date_range = if self.start.is_some() || self.end.is_some() {
            Some(DateRange {
                start: self.start,
                end: self.end,
            })
        } else {
            None
        };
        FilterOptions {
            stores: split_csv(self.stores.as_deref()),
            tags: split_csv(self.tags.as_deref()),
            weeks: split_csv(self.weeks.as_deref())
                .map(|weeks| weeks.iter().filter_map(|w| w.parse().ok()).collect()),
            date_range,
            search_query: self.q,
        }
    }
}

pub async fn list_images(
    query: ImageListQuery,
    images: Arc<dyn ImageStore>,
) -> Result<impl Reply, Rejection> {
    let all = images.list().await.map_err(reject_storage_error)?;
    let filtered = filter::filter_images(all, &query.into_filters());
    Ok(warp::reply::json(&filtered))
}

pub async fn get_image(id: String, images: Arc<dyn ImageStore>) -> Result<impl Reply, Rejection> {
    match images.get(&id).await.map_err(reject_storage_error)? {
        Some(image) => Ok(ApiResponse::wrap(image)),
        None => Err(reject::custom(NotFoundError)),
    }
}

/// Upload intake. Accepts a single payload, a bare array, or `{items: []}`
/// for bulk creation, mirroring the dashboard's upload manager.
pub async fn create_images(
    body: serde_json::Value,
    images: Arc<dyn ImageStore>,
) -> Result<warp::reply::Json, Rejection> {
    fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, Rejection> {
        serde_json::from_value(value).map_err(|e| {
            reject::custom(ValidationError {
                message: format!("invalid payload: {}", e),
            })
        })
    }

    if body.is_array() {
        let payloads: Vec<NewImagePayload> = decode(body)?;
        let created = images
            .bulk_create(payloads)
            .await
            .map_err(reject_storage_error)?;
        return Ok(ApiResponse::wrap(created));
    }

    if let Some(items) = body.get("items").filter(|v| v.is_array()) {
        let payloads: Vec<NewImagePayload> = decode(items.clone())?;
        let created = images
            .bulk_create(payloads)
            .await
            .map_err(reject_storage_error)?;
        return Ok(ApiResponse::wrap(created));
    }

    let payload: NewImagePayload = decode(body)?;
    let created = images
        .create(payload)
        .await
        .map_err(reject_storage_error)?;
    Ok(ApiResponse::wrap(created))
}

pub async fn update_image(
    id: String,
    updates: UpdateImagePayload,
    images: Arc<dyn ImageStore>,
) -> Result<impl Reply, Rejection> {
    let updated = images
        .update(&id, updates)
        .await
        .map_err(reject_storage_error)?;
    Ok(ApiResponse::wrap(updated))
}

pub async fn delete_image(
    id: String,
    images: Arc<dyn ImageStore>,
) -> Result<impl Reply, Rejection> {
    let removed = images.delete(&id).await.map_err(reject_storage_error)?;
    Ok(ApiResponse::wrap(removed))
}

/// Distinct stores and tags across the gallery, for filter sidebars.
pub async fn get_filter_collections(
    images: Arc<dyn ImageStore>,
) -> Result<impl Reply, Rejection> {
    let all = images.list().await.map_err(reject_storage_error)?;
    Ok(warp::reply::json(&filter::filter_collections(&all)))
}

#[derive(Debug, Default, Deserialize)]
pub struct TagPreviewRequest {
    pub store: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TagPreviewResponse {
    pub tags: Vec<String>,
}

/// What enrichment would derive for a not-yet-saved record.
pub async fn preview_tags(request: TagPreviewRequest) -> Result<impl Reply, Rejection> {
    let tags = enrichment::preview_tags(
        request.store.as_deref(),
        request.date.as_deref(),
        request.notes.as_deref(),
        &request.tags,
    );
    Ok(warp::reply::json(&TagPreviewResponse { tags }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_splitting_trims_and_drops_empties() {
        assert_eq!(
            split_csv(Some("NEON, CYBER ,,")),
            Some(vec!["NEON".to_string(), "CYBER".to_string()])
        );
        assert_eq!(split_csv(Some("  ")), None);
        assert_eq!(split_csv(None), None);
    }

    #[test]
    fn query_maps_to_filter_options() {
        let query = ImageListQuery {
            stores: Some("NEON,CYBER".to_string()),
            tags: Some("WINDOW".to_string()),
            weeks: Some("46,47,bogus".to_string()),
            start: Some("2025-11-01".to_string()),
            end: None,
            q: Some("promo".to_string()),
        };
        let filters = query.into_filters();
        assert_eq!(filters.stores.as_ref().unwrap().len(), 2);
        assert_eq!(filters.weeks.as_ref().unwrap(), &vec![46, 47]);
        assert!(filters.date_range.as_ref().unwrap().end.is_none());
        assert_eq!(filters.search_query.as_deref(), Some("promo"));
    }

    #[test]
    fn empty_query_means_no_filters() {
        let filters = ImageListQuery::default().into_filters();
        assert!(filters.stores.is_none());
        assert!(filters.date_range.is_none());
        assert!(filters.weeks.is_none());
        assert!(filters.tags.is_none());
    }
}

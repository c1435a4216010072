use std::convert::Infallible;
use std::sync::Arc;

use serde::Serialize;
use warp::{reject, Filter, Rejection, Reply};

use crate::storage::{ImageStore, StorageError, StoreDirectory};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub timestamp: String,
}

#[derive(Debug)]
pub struct StorageFailure {
    pub message: String,
}

impl reject::Reject for StorageFailure {}

#[derive(Debug)]
pub struct NotFoundError;
impl reject::Reject for NotFoundError {}

#[derive(Debug)]
pub struct ValidationError {
    pub message: String,
}

impl reject::Reject for ValidationError {}

#[derive(Debug)]
pub struct UnauthorizedError;
impl reject::Reject for UnauthorizedError {}

/// Map adapter errors onto the rejection taxonomy. I/O and database failures
/// propagate unchanged as 500s; there is no retry and no backend fallback.
pub fn reject_storage_error(err: StorageError) -> Rejection {
    match err {
        StorageError::NotFound(_) => reject::custom(NotFoundError),
        StorageError::Validation(message) => reject::custom(ValidationError { message }),
        other => {
            log::error!("Storage error: {}", other);
            reject::custom(StorageFailure {
                message: other.to_string(),
            })
        }
    }
}

pub fn with_images(
    images: Arc<dyn ImageStore>,
) -> impl Filter<Extract = (Arc<dyn ImageStore>,), Error = Infallible> + Clone {
    warp::any().map(move || images.clone())
}

pub fn with_stores(
    stores: Arc<dyn StoreDirectory>,
) -> impl Filter<Extract = (Arc<dyn StoreDirectory>,), Error = Infallible> + Clone {
    warp::any().map(move || stores.clone())
}

/// Session-presence gate for write routes. With a configured token the
/// request must carry `Authorization: Bearer <token>`; without one the gate
/// is open (single-operator dev mode).
pub fn require_session(
    admin_token: Option<String>,
) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and_then(move |header: Option<String>| {
            let expected = admin_token.clone();
            async move {
                match expected {
                    None => Ok(()),
                    Some(token) => {
                        let presented = header
                            .as_deref()
                            .and_then(|h| h.strip_prefix("Bearer "))
                            .map(str::trim);
                        if presented == Some(token.as_str()) {
                            Ok(())
                        } else {
                            Err(reject::custom(UnauthorizedError))
                        }
                    }
                }
            }
        })
        .untuple_one()
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;
    let timestamp = chrono::Utc::now().to_rfc3339();

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if err.find::<NotFoundError>().is_some() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Record not found".to_string();
    } else if let Some(validation_error) = err.find::<ValidationError>() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = validation_error.message.clone();
    } else if err.find::<UnauthorizedError>().is_some() {
        code = warp::http::StatusCode::UNAUTHORIZED;
        message = "Unauthorized".to_string();
    } else if let Some(storage_failure) = err.find::<StorageFailure>() {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = storage_failure.message.clone();
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        code = warp::http::StatusCode::PAYLOAD_TOO_LARGE;
        message = "Payload too large".to_string();
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        code = warp::http::StatusCode::UNSUPPORTED_MEDIA_TYPE;
        message = "Unsupported media type".to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method not allowed".to_string();
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal server error".to_string();
    }

    let error_response = ErrorResponse {
        error: message,
        code: code.as_u16(),
        timestamp,
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&error_response),
        code,
    ))
}

pub fn cors() -> warp::cors::Builder {
    warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
}

use std::sync::Arc;

use warp::Filter;

use crate::handlers_exif;
use crate::handlers_health;
use crate::handlers_image;
use crate::handlers_store;
use crate::records::UpdateImagePayload;
use crate::storage::{ImageStore, Storage, StoreDirectory};
use crate::warp_helpers::{cors, require_session, with_images, with_stores};

/// The full API surface. Adapters are injected here once; nothing below this
/// point consults the environment. Callers append
/// `.recover(warp_helpers::handle_rejection)` before serving.
pub fn api(
    storage: Storage,
    admin_token: Option<String>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let Storage { images, stores } = storage;

    build_health_routes(images.clone())
        .or(build_image_routes(images, admin_token.clone()))
        .or(build_store_routes(stores, admin_token.clone()))
        .or(build_exif_routes(admin_token))
        .with(cors())
        .with(warp::log("proofy"))
}

fn build_health_routes(
    images: Arc<dyn ImageStore>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::get())
        .and_then(handlers_health::health_check);

    let ready = warp::path("ready")
        .and(warp::get())
        .and(with_images(images))
        .and_then(handlers_health::ready_check);

    health.or(ready)
}

fn build_image_routes(
    images: Arc<dyn ImageStore>,
    admin_token: Option<String>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let session = require_session(admin_token);

    let api_images_list = warp::path("api")
        .and(warp::path("images"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<handlers_image::ImageListQuery>())
        .and(with_images(images.clone()))
        .and_then(handlers_image::list_images);

    let api_images_filters = warp::path("api")
        .and(warp::path("images"))
        .and(warp::path("filters"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_images(images.clone()))
        .and_then(handlers_image::get_filter_collections);

    let api_image_get = warp::path("api")
        .and(warp::path("images"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_images(images.clone()))
        .and_then(handlers_image::get_image);

    let api_images_create = warp::path("api")
        .and(warp::path("images"))
        .and(warp::path::end())
        .and(warp::post())
        .and(session.clone())
        .and(warp::body::json::<serde_json::Value>())
        .and(with_images(images.clone()))
        .and_then(handlers_image::create_images);

    let api_image_update = warp::path("api")
        .and(warp::path("images"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::put())
        .and(session.clone())
        .and(warp::body::json::<UpdateImagePayload>())
        .and(with_images(images.clone()))
        .and_then(handlers_image::update_image);

    let api_image_delete = warp::path("api")
        .and(warp::path("images"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::delete())
        .and(session)
        .and(with_images(images))
        .and_then(handlers_image::delete_image);

    let api_tags_preview = warp::path("api")
        .and(warp::path("tags"))
        .and(warp::path("preview"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json::<handlers_image::TagPreviewRequest>())
        .and_then(handlers_image::preview_tags);

    api_images_list
        .or(api_images_filters)
        .or(api_image_get)
        .or(api_images_create)
        .or(api_image_update)
        .or(api_image_delete)
        .or(api_tags_preview)
}

fn build_store_routes(
    stores: Arc<dyn StoreDirectory>,
    admin_token: Option<String>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let api_stores_list = warp::path("api")
        .and(warp::path("stores"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_stores(stores.clone()))
        .and_then(handlers_store::list_stores);

    let api_stores_add = warp::path("api")
        .and(warp::path("stores"))
        .and(warp::path::end())
        .and(warp::post())
        .and(require_session(admin_token))
        .and(warp::body::json::<handlers_store::AddStoreRequest>())
        .and(with_stores(stores))
        .and_then(handlers_store::add_store);

    api_stores_list.or(api_stores_add)
}

fn build_exif_routes(
    admin_token: Option<String>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("api")
        .and(warp::path("exif"))
        .and(warp::path::end())
        .and(warp::post())
        .and(require_session(admin_token))
        .and(warp::body::content_length_limit(16 * 1024 * 1024))
        .and(warp::body::bytes())
        .and_then(handlers_exif::extract_exif)
}

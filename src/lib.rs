pub mod config;
pub mod dates;
pub mod db_pool;
pub mod db_schema;
pub mod enrichment;
pub mod exif_extractor;
pub mod filter;
pub mod handlers_exif;
pub mod handlers_health;
pub mod handlers_image;
pub mod handlers_store;
pub mod records;
pub mod routes;
pub mod storage;
pub mod storage_db;
pub mod storage_file;
pub mod warp_helpers;

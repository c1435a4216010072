use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use uuid::Uuid;

use crate::config::{Config, StorageBackend};
use crate::dates;
use crate::db_pool;
use crate::enrichment;
use crate::records::{ImageRecord, NewImagePayload, StoreRecord, UpdateImagePayload};
use crate::storage_db::{DbImageStore, DbStoreDirectory};
use crate::storage_file::{FileImageStore, FileStoreDirectory};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Persistence contract for image records. Both backends honor identical
/// semantics; callers never observe which one is behind the trait object.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// All records, enriched, most recent first.
    async fn list(&self) -> Result<Vec<ImageRecord>, StorageError>;

    /// None for an unknown id, never an error.
    async fn get(&self, id: &str) -> Result<Option<ImageRecord>, StorageError>;

    async fn create(&self, payload: NewImagePayload) -> Result<ImageRecord, StorageError>;

    /// Merge partial fields into an existing record. Recomputes `week` when
    /// `date` changes, re-normalizes `tags` when supplied, re-runs
    /// enrichment. NotFound for an unknown id.
    async fn update(
        &self,
        id: &str,
        updates: UpdateImagePayload,
    ) -> Result<ImageRecord, StorageError>;

    /// Remove and return the record. NotFound for an unknown id.
    async fn delete(&self, id: &str) -> Result<ImageRecord, StorageError>;

    /// Create N records as a single persisted write.
    async fn bulk_create(
        &self,
        payloads: Vec<NewImagePayload>,
    ) -> Result<Vec<ImageRecord>, StorageError>;
}

/// Persistence contract for the store directory.
#[async_trait]
pub trait StoreDirectory: Send + Sync {
    /// All stores, alphabetical by name.
    async fn list(&self) -> Result<Vec<StoreRecord>, StorageError>;

    /// Get-or-create by normalized name. Re-adding an existing name returns
    /// the existing record unchanged. Validation error for an empty name.
    async fn add(&self, name: &str) -> Result<StoreRecord, StorageError>;
}

/// Trim, drop empties, upper-case, dedupe while preserving first-seen order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_uppercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

pub fn normalize_store_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Build a fully enriched record from an upload payload. Missing dates
/// default to now; missing stores to the UNKNOWN sentinel.
pub fn build_image_record(payload: NewImagePayload) -> ImageRecord {
    let date = payload
        .date
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(dates::now_iso);
    let store = payload
        .store
        .as_deref()
        .map(normalize_store_name)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "UNKNOWN".to_string());

    let base = ImageRecord {
        id: Uuid::new_v4().to_string(),
        url: payload.url,
        blob_path: payload.blob_path,
        width: payload.width,
        height: payload.height,
        bytes: payload.bytes,
        mime_type: payload.mime_type,
        placeholder: payload.placeholder,
        store,
        week: dates::week_number(&date),
        date,
        tags: normalize_tags(&payload.tags.unwrap_or_default()),
        notes: payload
            .notes
            .map(|n| n.trim().to_string())
            .unwrap_or_default(),
        uploaded_at: dates::now_iso(),
        sort_key: None,
        gps: payload.gps,
        camera: payload.camera,
    };
    enrichment::enrich(base)
}

/// Merge an update payload into an existing record and re-derive everything
/// that depends on the changed fields. Shared by both backends so their
/// update semantics cannot drift apart.
pub fn apply_update(current: ImageRecord, updates: UpdateImagePayload) -> ImageRecord {
    let date = updates
        .date
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(current.date);
    let merged = ImageRecord {
        id: current.id,
        url: updates.url.unwrap_or(current.url),
        blob_path: updates.blob_path.or(current.blob_path),
        width: updates.width.or(current.width),
        height: updates.height.or(current.height),
        bytes: updates.bytes.or(current.bytes),
        mime_type: updates.mime_type.or(current.mime_type),
        placeholder: updates.placeholder.or(current.placeholder),
        store: updates
            .store
            .as_deref()
            .map(normalize_store_name)
            .filter(|s| !s.is_empty())
            .unwrap_or(current.store),
        week: dates::week_number(&date),
        date,
        tags: match updates.tags {
            Some(tags) => normalize_tags(&tags),
            None => current.tags,
        },
        notes: updates.notes.unwrap_or(current.notes),
        uploaded_at: current.uploaded_at,
        sort_key: current.sort_key,
        gps: updates.gps.or(current.gps),
        camera: updates.camera.or(current.camera),
    };
    enrichment::enrich(merged)
}

pub fn new_store_record(normalized_name: String) -> StoreRecord {
    StoreRecord {
        id: Uuid::new_v4().to_string(),
        name: normalized_name,
        created_at: dates::now_iso(),
    }
}

pub struct Storage {
    pub images: Arc<dyn ImageStore>,
    pub stores: Arc<dyn StoreDirectory>,
}

/// Construct both adapters once at process start from configuration. The
/// choice is process-lifetime; callers receive trait objects and never
/// consult the environment again.
pub fn build_storage(config: &Config) -> Result<Storage, Box<dyn std::error::Error>> {
    match &config.backend {
        StorageBackend::Database { db_path } => {
            let pool = db_pool::create_db_pool(db_path)?;
            info!("Storage backend: sqlite at {}", db_path);
            Ok(Storage {
                images: Arc::new(DbImageStore::new(pool.clone())),
                stores: Arc::new(DbStoreDirectory::new(pool)),
            })
        }
        StorageBackend::File { data_path } => {
            std::fs::create_dir_all(data_path)?;
            info!("Storage backend: json files under {}", data_path);
            Ok(Storage {
                images: Arc::new(FileImageStore::new(data_path)),
                stores: Arc::new(FileStoreDirectory::new(data_path)),
            })
        }
    }
}

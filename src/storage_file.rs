use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::enrichment;
use crate::filter::sort_by_recency;
use crate::records::{ImageRecord, NewImagePayload, StoreRecord, UpdateImagePayload};
use crate::storage::{
    apply_update, build_image_record, new_store_record, normalize_store_name, ImageStore,
    StorageError, StoreDirectory,
};

/// Flat-file backend: the whole collection lives in one indented JSON
/// document that is read, mutated in memory, and rewritten on every change.
/// Single-writer assumption; a crash mid-write can corrupt the file.
async fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} does not exist yet, starting empty", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

async fn write_collection<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StorageError> {
    let contents = serde_json::to_string_pretty(records)?;
    tokio::fs::write(path, contents).await?;
    Ok(())
}

pub struct FileImageStore {
    path: PathBuf,
}

impl FileImageStore {
    pub fn new(data_path: &str) -> Self {
        FileImageStore {
            path: Path::new(data_path).join("images.json"),
        }
    }

    async fn read(&self) -> Result<Vec<ImageRecord>, StorageError> {
        read_collection(&self.path).await
    }

    async fn write(&self, images: &[ImageRecord]) -> Result<(), StorageError> {
        write_collection(&self.path, images).await
    }
}

#[async_trait]
impl ImageStore for FileImageStore {
    async fn list(&self) -> Result<Vec<ImageRecord>, StorageError> {
        // Enrichment is idempotent, so re-running it on read keeps older
        // documents consistent with the current derivation rules.
        let mut images: Vec<ImageRecord> = self
            .read()
            .await?
            .into_iter()
            .map(enrichment::enrich)
            .collect();
        sort_by_recency(&mut images);
        Ok(images)
    }

    async fn get(&self, id: &str) -> Result<Option<ImageRecord>, StorageError> {
        let images = self.read().await?;
        Ok(images
            .into_iter()
            .find(|img| img.id == id)
            .map(enrichment::enrich))
    }

    async fn create(&self, payload: NewImagePayload) -> Result<ImageRecord, StorageError> {
        let mut images = self.read().await?;
        let image = build_image_record(payload);
        images.insert(0, image.clone());
        self.write(&images).await?;
        Ok(image)
    }

    async fn update(
        &self,
        id: &str,
        updates: UpdateImagePayload,
    ) -> Result<ImageRecord, StorageError> {
        let mut images = self.read().await?;
        let index = images
            .iter()
            .position(|img| img.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        let updated = apply_update(images[index].clone(), updates);
        images[index] = updated.clone();
        self.write(&images).await?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<ImageRecord, StorageError> {
        let mut images = self.read().await?;
        let index = images
            .iter()
            .position(|img| img.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        let removed = images.remove(index);
        self.write(&images).await?;
        Ok(removed)
    }

    async fn bulk_create(
        &self,
        payloads: Vec<NewImagePayload>,
    ) -> Result<Vec<ImageRecord>, StorageError> {
        if payloads.is_empty() {
            return Ok(Vec::new());
        }
        let mut images = self.read().await?;
        let new_records: Vec<ImageRecord> =
            payloads.into_iter().map(build_image_record).collect();
        // One write for the whole batch.
        let mut combined = new_records.clone();
        combined.append(&mut images);
        self.write(&combined).await?;
        Ok(new_records)
    }
}

pub struct FileStoreDirectory {
    path: PathBuf,
}

impl FileStoreDirectory {
    pub fn new(data_path: &str) -> Self {
        FileStoreDirectory {
            path: Path::new(data_path).join("stores.json"),
        }
    }
}

#[async_trait]
impl StoreDirectory for FileStoreDirectory {
    async fn list(&self) -> Result<Vec<StoreRecord>, StorageError> {
        let mut stores: Vec<StoreRecord> = read_collection(&self.path).await?;
        stores.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stores)
    }

    async fn add(&self, name: &str) -> Result<StoreRecord, StorageError> {
        let normalized = normalize_store_name(name);
        if normalized.is_empty() {
            return Err(StorageError::Validation("store name is required".to_string()));
        }

        let mut stores: Vec<StoreRecord> = read_collection(&self.path).await?;
        if let Some(existing) = stores.iter().find(|s| s.name == normalized) {
            return Ok(existing.clone());
        }

        let store = new_store_record(normalized);
        stores.push(store.clone());
        write_collection(&self.path, &stores).await?;
        Ok(store)
    }
}

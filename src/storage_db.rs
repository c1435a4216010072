use async_trait::async_trait;
use log::warn;
use rusqlite::{params, Connection, Result as SqlResult, Row};

use crate::db_pool::DbPool;
use crate::enrichment;
use crate::filter::sort_by_recency;
use crate::records::{
    CameraInfo, GpsCoordinates, ImageRecord, NewImagePayload, StoreRecord, UpdateImagePayload,
};
use crate::storage::{
    apply_update, build_image_record, new_store_record, normalize_store_name, ImageStore,
    StorageError, StoreDirectory,
};

/// SQLite backend: one statement per operation, bulk-create inside a single
/// transaction. Row decoding happens at this boundary only; business logic
/// never sees raw columns.
pub struct DbImageStore {
    pool: DbPool,
}

fn image_from_row(row: &Row) -> SqlResult<ImageRecord> {
    let tags_json: String = row.get("tags")?;
    // Parse-or-default at the persistence boundary; a malformed column must
    // not take the whole collection down.
    let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_else(|e| {
        warn!("ignoring malformed tags column: {}", e);
        Vec::new()
    });

    let gps = match (
        row.get::<_, Option<f64>>("gps_latitude")?,
        row.get::<_, Option<f64>>("gps_longitude")?,
    ) {
        (Some(latitude), Some(longitude)) => Some(GpsCoordinates {
            latitude,
            longitude,
        }),
        _ => None,
    };

    let camera = match (
        row.get::<_, Option<String>>("camera_make")?,
        row.get::<_, Option<String>>("camera_model")?,
    ) {
        (None, None) => None,
        (make, model) => Some(CameraInfo { make, model }),
    };

    Ok(ImageRecord {
        id: row.get("id")?,
        url: row.get("url")?,
        blob_path: row.get("blob_path")?,
        width: row.get("width")?,
        height: row.get("height")?,
        bytes: row.get("bytes")?,
        mime_type: row.get("mime_type")?,
        placeholder: row.get("placeholder")?,
        store: row.get("store")?,
        date: row.get("date")?,
        week: row.get("week")?,
        tags,
        notes: row.get("notes")?,
        uploaded_at: row.get("uploaded_at")?,
        sort_key: row.get("sort_key")?,
        gps,
        camera,
    })
}

fn insert_image(conn: &Connection, image: &ImageRecord) -> Result<(), StorageError> {
    let tags_json = serde_json::to_string(&image.tags)?;
    conn.execute(
        r#"
        INSERT INTO images (
            id, url, blob_path, width, height, bytes, mime_type, placeholder,
            store, date, week, tags, notes, uploaded_at, sort_key,
            gps_latitude, gps_longitude, camera_make, camera_model
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19
        )
        "#,
        params![
            image.id,
            image.url,
            image.blob_path,
            image.width,
            image.height,
            image.bytes,
            image.mime_type,
            image.placeholder,
            image.store,
            image.date,
            image.week,
            tags_json,
            image.notes,
            image.uploaded_at,
            image.sort_key,
            image.gps.map(|g| g.latitude),
            image.gps.map(|g| g.longitude),
            image.camera.as_ref().and_then(|c| c.make.clone()),
            image.camera.as_ref().and_then(|c| c.model.clone()),
        ],
    )?;
    Ok(())
}

impl DbImageStore {
    pub fn new(pool: DbPool) -> Self {
        DbImageStore { pool }
    }

    fn find(&self, id: &str) -> Result<Option<ImageRecord>, StorageError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT * FROM images WHERE id = ?")?;
        match stmt.query_row([id], image_from_row) {
            Ok(image) => Ok(Some(image)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ImageStore for DbImageStore {
    async fn list(&self) -> Result<Vec<ImageRecord>, StorageError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT * FROM images")?;
        let rows = stmt.query_map([], image_from_row)?;

        let mut images = Vec::new();
        for row in rows {
            images.push(enrichment::enrich(row?));
        }
        sort_by_recency(&mut images);
        Ok(images)
    }

    async fn get(&self, id: &str) -> Result<Option<ImageRecord>, StorageError> {
        Ok(self.find(id)?.map(enrichment::enrich))
    }

    async fn create(&self, payload: NewImagePayload) -> Result<ImageRecord, StorageError> {
        let image = build_image_record(payload);
        let conn = self.pool.get()?;
        insert_image(&conn, &image)?;
        Ok(image)
    }

    async fn update(
        &self,
        id: &str,
        updates: UpdateImagePayload,
    ) -> Result<ImageRecord, StorageError> {
        let current = self
            .find(id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        let updated = apply_update(current, updates);

        let tags_json = serde_json::to_string(&updated.tags)?;
        let conn = self.pool.get()?;
        conn.execute(
            r#"
            UPDATE images SET
                url = ?, blob_path = ?, width = ?, height = ?, bytes = ?,
                mime_type = ?, placeholder = ?, store = ?, date = ?, week = ?,
                tags = ?, notes = ?, sort_key = ?,
                gps_latitude = ?, gps_longitude = ?, camera_make = ?, camera_model = ?
            WHERE id = ?
            "#,
            params![
                updated.url,
                updated.blob_path,
                updated.width,
                updated.height,
                updated.bytes,
                updated.mime_type,
                updated.placeholder,
                updated.store,
                updated.date,
                updated.week,
                tags_json,
                updated.notes,
                updated.sort_key,
                updated.gps.map(|g| g.latitude),
                updated.gps.map(|g| g.longitude),
                updated.camera.as_ref().and_then(|c| c.make.clone()),
                updated.camera.as_ref().and_then(|c| c.model.clone()),
                updated.id,
            ],
        )?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<ImageRecord, StorageError> {
        let removed = self
            .find(id)?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM images WHERE id = ?", [id])?;
        Ok(removed)
    }

    async fn bulk_create(
        &self,
        payloads: Vec<NewImagePayload>,
    ) -> Result<Vec<ImageRecord>, StorageError> {
        if payloads.is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<ImageRecord> = payloads.into_iter().map(build_image_record).collect();

        // One transaction for the whole batch: a mid-batch failure rolls
        // back the earlier inserts instead of leaving a partial batch.
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        for record in &records {
            insert_image(&tx, record)?;
        }
        tx.commit()?;
        Ok(records)
    }
}

pub struct DbStoreDirectory {
    pool: DbPool,
}

fn store_from_row(row: &Row) -> SqlResult<StoreRecord> {
    Ok(StoreRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}

impl DbStoreDirectory {
    pub fn new(pool: DbPool) -> Self {
        DbStoreDirectory { pool }
    }
}

#[async_trait]
impl StoreDirectory for DbStoreDirectory {
    async fn list(&self) -> Result<Vec<StoreRecord>, StorageError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT * FROM stores ORDER BY name")?;
        let rows = stmt.query_map([], store_from_row)?;

        let mut stores = Vec::new();
        for row in rows {
            stores.push(row?);
        }
        Ok(stores)
    }

    async fn add(&self, name: &str) -> Result<StoreRecord, StorageError> {
        let normalized = normalize_store_name(name);
        if normalized.is_empty() {
            return Err(StorageError::Validation("store name is required".to_string()));
        }

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT * FROM stores WHERE name = ?")?;
        match stmt.query_row([&normalized], store_from_row) {
            Ok(existing) => return Ok(existing),
            Err(rusqlite::Error::QueryReturnedNoRows) => {}
            Err(e) => return Err(e.into()),
        }

        let store = new_store_record(normalized);
        conn.execute(
            "INSERT INTO stores (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![store.id, store.name, store.created_at],
        )?;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_pool::create_in_memory_pool;

    fn image_store() -> DbImageStore {
        DbImageStore::new(create_in_memory_pool().unwrap())
    }

    fn payload(url: &str, store: &str, date: &str) -> NewImagePayload {
        NewImagePayload {
            url: url.to_string(),
            store: Some(store.to_string()),
            date: Some(date.to_string()),
            tags: Some(vec!["demo".to_string()]),
            notes: Some("Sample upload".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips_all_columns() {
        let store = image_store();
        let created = store
            .create(NewImagePayload {
                url: "https://blob.example/1.jpg".to_string(),
                blob_path: Some("proofs/1.jpg".to_string()),
                width: Some(1920),
                height: Some(1080),
                bytes: Some(4096),
                mime_type: Some("image/jpeg".to_string()),
                store: Some("Demo Store".to_string()),
                date: Some("2025-12-04".to_string()),
                tags: Some(vec!["demo".to_string()]),
                notes: Some("Sample upload".to_string()),
                gps: Some(GpsCoordinates {
                    latitude: 52.52,
                    longitude: 13.405,
                }),
                camera: Some(CameraInfo {
                    make: Some("Canon".to_string()),
                    model: Some("EOS R5".to_string()),
                }),
                ..Default::default()
            })
            .await
            .unwrap();

        let fetched = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.store, "DEMO STORE");
        assert_eq!(fetched.week, created.week);
        assert_eq!(fetched.gps.unwrap().latitude, 52.52);
        assert_eq!(fetched.camera.unwrap().model.as_deref(), Some("EOS R5"));
        assert!(fetched.tags.contains(&"DEMO".to_string()));
    }

    #[tokio::test]
    async fn get_unknown_id_is_none() {
        let store = image_store();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_recomputes_week_and_persists() {
        let store = image_store();
        let created = store
            .create(payload("https://blob.example/1.jpg", "Alpha", "2025-01-01"))
            .await
            .unwrap();

        let updated = store
            .update(
                &created.id,
                UpdateImagePayload {
                    date: Some("2025-02-01".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_ne!(updated.week, created.week);
        assert_eq!(updated.notes, "Sample upload");

        let fetched = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.week, updated.week);
        assert_eq!(fetched.date, "2025-02-01");
    }

    #[tokio::test]
    async fn delete_returns_removed_record() {
        let store = image_store();
        let created = store
            .create(payload("https://blob.example/1.jpg", "Alpha", "2025-01-01"))
            .await
            .unwrap();

        let removed = store.delete(&created.id).await.unwrap();
        assert_eq!(removed.id, created.id);
        assert!(store.list().await.unwrap().is_empty());
        assert!(matches!(
            store.delete(&created.id).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn bulk_create_is_atomic_and_listed_by_recency() {
        let store = image_store();
        let created = store
            .bulk_create(vec![
                payload("https://blob.example/1.jpg", "Alpha", "2025-01-01"),
                payload("https://blob.example/2.jpg", "Beta", "2025-06-01"),
                payload("https://blob.example/3.jpg", "Gamma", "2025-03-01"),
            ])
            .await
            .unwrap();
        assert_eq!(created.len(), 3);

        let dates: Vec<String> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|img| img.date.clone())
            .collect();
        assert_eq!(dates, vec!["2025-06-01", "2025-03-01", "2025-01-01"]);
    }

    #[tokio::test]
    async fn malformed_tags_column_reads_as_empty() {
        let pool = create_in_memory_pool().unwrap();
        let store = DbImageStore::new(pool.clone());
        let created = store
            .create(payload("https://blob.example/1.jpg", "Alpha", "2025-01-01"))
            .await
            .unwrap();

        {
            let conn = pool.get().unwrap();
            conn.execute(
                "UPDATE images SET tags = 'not json' WHERE id = ?",
                [&created.id],
            )
            .unwrap();
        }

        let fetched = store.get(&created.id).await.unwrap().unwrap();
        // Enrichment on read still derives the structural tags.
        assert!(fetched.tags.iter().any(|t| t == "ALPHA"));
        assert!(!fetched.tags.iter().any(|t| t == "DEMO"));
    }

    #[tokio::test]
    async fn store_directory_is_idempotent_and_sorted() {
        let pool = create_in_memory_pool().unwrap();
        let directory = DbStoreDirectory::new(pool);

        let first = directory.add("neon").await.unwrap();
        let second = directory.add("NEON").await.unwrap();
        assert_eq!(first.id, second.id);

        directory.add("arcade").await.unwrap();
        let names: Vec<String> = directory
            .list()
            .await
            .unwrap()
            .iter()
            .map(|s| s.name.clone())
            .collect();
        assert_eq!(names, vec!["ARCADE", "NEON"]);

        assert!(matches!(
            directory.add("").await,
            Err(StorageError::Validation(_))
        ));
    }
}

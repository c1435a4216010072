use serde::{Deserialize, Serialize};

/// GPS coordinates carried through from EXIF extraction at upload time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// One uploaded store-visit photo. Field names serialize as camelCase to
/// match the persisted document layout.
///
/// Invariants maintained by the storage layer and enrichment:
/// `week` is always derived from `date`, `tags` holds deduplicated
/// upper-case labels, `store` is never empty, `id` is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub store: String,
    pub date: String,
    pub week: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    pub uploaded_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsCoordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraInfo>,
}

/// A store known to the gallery. Created on first reference, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// Upload-intake payload: the normalized record the admin dashboard submits
/// after the blob has landed in external storage.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImagePayload {
    pub url: String,
    pub blob_path: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub bytes: Option<i64>,
    pub mime_type: Option<String>,
    pub placeholder: Option<String>,
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
    pub gps: Option<GpsCoordinates>,
    pub camera: Option<CameraInfo>,
}

/// Partial edit of an existing image. `id`, `uploadedAt` and `week` are not
/// client-settable; `week` is recomputed whenever `date` changes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateImagePayload {
    pub url: Option<String>,
    pub blob_path: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub bytes: Option<i64>,
    pub mime_type: Option<String>,
    pub placeholder: Option<String>,
    pub store: Option<String>,
    pub date: Option<String>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
    pub gps: Option<GpsCoordinates>,
    pub camera: Option<CameraInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_record_round_trips_camel_case() {
        let record = ImageRecord {
            id: "abc".to_string(),
            url: "https://blob.example/1.jpg".to_string(),
            blob_path: Some("proofs/1.jpg".to_string()),
            width: Some(1920),
            height: Some(1080),
            bytes: Some(2048),
            mime_type: Some("image/jpeg".to_string()),
            placeholder: None,
            store: "NEON".to_string(),
            date: "2025-12-01".to_string(),
            week: 49,
            tags: vec!["WINDOW".to_string()],
            notes: "Window display".to_string(),
            uploaded_at: "2025-12-01T00:00:00Z".to_string(),
            sort_key: Some(1),
            gps: Some(GpsCoordinates {
                latitude: 52.5,
                longitude: 13.4,
            }),
            camera: Some(CameraInfo {
                make: Some("Canon".to_string()),
                model: None,
            }),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("blobPath").is_some());
        assert!(json.get("mimeType").is_some());
        assert!(json.get("uploadedAt").is_some());
        assert!(json.get("sortKey").is_some());
        assert!(json.get("placeholder").is_none());

        let back: ImageRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, record.id);
        assert_eq!(back.gps.unwrap().latitude, 52.5);
    }

    #[test]
    fn payload_tolerates_missing_optional_fields() {
        let payload: NewImagePayload =
            serde_json::from_str(r#"{"url":"https://blob.example/x.jpg"}"#).unwrap();
        assert!(payload.store.is_none());
        assert!(payload.tags.is_none());
    }
}

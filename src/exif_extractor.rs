use std::io::Cursor;

use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use log::debug;
use serde::Serialize;

use crate::records::{CameraInfo, GpsCoordinates};

/// Metadata pulled from an uploaded image buffer so the admin form can
/// prefill capture date, location and camera fields.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsCoordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Remove null bytes, surrounding quotes and whitespace from EXIF strings.
fn clean_exif_string(value: String) -> String {
    value
        .replace('\0', "")
        .trim()
        .trim_matches('"')
        .trim()
        .to_string()
}

/// EXIF stores timestamps as "YYYY:MM:DD HH:MM:SS".
fn parse_exif_datetime(value: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(value.trim().trim_matches('"'), "%Y:%m:%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc().to_rfc3339())
}

fn extract_date(reader: &exif::Exif, metadata: &mut ExtractedMetadata) {
    metadata.date_taken = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime]
        .iter()
        .filter_map(|tag| reader.get_field(*tag, In::PRIMARY))
        .filter_map(|field| parse_exif_datetime(&field.display_value().to_string()))
        .next();
}

fn extract_dimensions(reader: &exif::Exif, metadata: &mut ExtractedMetadata) {
    if let Some(field) = reader.get_field(Tag::PixelXDimension, In::PRIMARY) {
        if let Value::Long(ref v) = field.value {
            if !v.is_empty() {
                metadata.width = Some(v[0]);
            }
        }
    }

    if let Some(field) = reader.get_field(Tag::PixelYDimension, In::PRIMARY) {
        if let Value::Long(ref v) = field.value {
            if !v.is_empty() {
                metadata.height = Some(v[0]);
            }
        }
    }
}

fn extract_camera(reader: &exif::Exif, metadata: &mut ExtractedMetadata) {
    let mut make = None;
    let mut model = None;

    if let Some(field) = reader.get_field(Tag::Make, In::PRIMARY) {
        let value = clean_exif_string(field.display_value().to_string());
        if !value.is_empty() {
            make = Some(value);
        }
    }

    if let Some(field) = reader.get_field(Tag::Model, In::PRIMARY) {
        let value = clean_exif_string(field.display_value().to_string());
        if !value.is_empty() {
            model = Some(value);
        }
    }

    if make.is_some() || model.is_some() {
        metadata.camera = Some(CameraInfo { make, model });
    }
}

fn dms_to_decimal(values: &[exif::Rational]) -> Option<f64> {
    if values.len() != 3 {
        return None;
    }
    Some(values[0].to_f64() + values[1].to_f64() / 60.0 + values[2].to_f64() / 3600.0)
}

fn extract_gps(reader: &exif::Exif, metadata: &mut ExtractedMetadata) {
    let mut latitude = None;
    let mut longitude = None;

    if let (Some(lat_field), Some(lat_ref)) = (
        reader.get_field(Tag::GPSLatitude, In::PRIMARY),
        reader.get_field(Tag::GPSLatitudeRef, In::PRIMARY),
    ) {
        if let Value::Rational(ref values) = lat_field.value {
            if let Some(lat) = dms_to_decimal(values) {
                let south = lat_ref.display_value().to_string().contains('S');
                latitude = Some(if south { -lat } else { lat });
            }
        }
    }

    if let (Some(lon_field), Some(lon_ref)) = (
        reader.get_field(Tag::GPSLongitude, In::PRIMARY),
        reader.get_field(Tag::GPSLongitudeRef, In::PRIMARY),
    ) {
        if let Value::Rational(ref values) = lon_field.value {
            if let Some(lon) = dms_to_decimal(values) {
                let west = lon_ref.display_value().to_string().contains('W');
                longitude = Some(if west { -lon } else { lon });
            }
        }
    }

    if let (Some(latitude), Some(longitude)) = (latitude, longitude) {
        metadata.gps = Some(GpsCoordinates {
            latitude,
            longitude,
        });
    }
}

/// Extract whatever EXIF metadata the buffer carries. Unreadable or
/// EXIF-less input degrades to an empty result rather than an error; the
/// admin form simply gets nothing to prefill.
pub fn extract(buffer: &[u8]) -> ExtractedMetadata {
    let mut metadata = ExtractedMetadata::default();
    let mut cursor = Cursor::new(buffer);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(reader) => {
            extract_date(&reader, &mut metadata);
            extract_dimensions(&reader, &mut metadata);
            extract_camera(&reader, &mut metadata);
            extract_gps(&reader, &mut metadata);
        }
        Err(e) => {
            debug!("no EXIF data in upload: {}", e);
        }
    }

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_input_yields_empty_metadata() {
        let metadata = extract(b"definitely not a jpeg");
        assert!(metadata.date_taken.is_none());
        assert!(metadata.gps.is_none());
        assert!(metadata.camera.is_none());
    }

    #[test]
    fn parses_exif_datetime_format() {
        let parsed = parse_exif_datetime("2025:11:20 14:30:00").unwrap();
        assert!(parsed.starts_with("2025-11-20T14:30:00"));
        assert!(parse_exif_datetime("not a timestamp").is_none());
    }

    #[test]
    fn dms_conversion() {
        let values = [
            exif::Rational { num: 52, denom: 1 },
            exif::Rational { num: 31, denom: 1 },
            exif::Rational { num: 12, denom: 1 },
        ];
        let decimal = dms_to_decimal(&values).unwrap();
        assert!((decimal - 52.52).abs() < 0.01);
        assert!(dms_to_decimal(&values[..2]).is_none());
    }

    #[test]
    fn empty_serializes_to_empty_object() {
        let json = serde_json::to_value(ExtractedMetadata::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}

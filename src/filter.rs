use serde::{Deserialize, Serialize};

use crate::dates;
use crate::records::ImageRecord;

/// Gallery filter criteria. Predicate categories combine with AND;
/// values inside one category combine with OR. Unset categories impose no
/// constraint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub stores: Option<Vec<String>>,
    pub date_range: Option<DateRange>,
    pub weeks: Option<Vec<u32>>,
    pub tags: Option<Vec<String>>,
    pub search_query: Option<String>,
}

/// Inclusive bounds; an unset bound is unconstrained.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Distinct stores and tags present in a collection, for filter UIs.
#[derive(Debug, Serialize)]
pub struct FilterCollections {
    pub stores: Vec<String>,
    pub tags: Vec<String>,
}

fn recency(image: &ImageRecord) -> i64 {
    image
        .sort_key
        .or_else(|| dates::sort_key(&image.date))
        .unwrap_or(0)
}

/// Most recent first. Applied after every filter pass; callers must not rely
/// on input order surviving.
pub fn sort_by_recency(images: &mut [ImageRecord]) {
    images.sort_by_key(|img| std::cmp::Reverse(recency(img)));
}

fn matches(image: &ImageRecord, filters: &FilterOptions) -> bool {
    let store = image.store.to_lowercase();
    let notes = image.notes.to_lowercase();
    let tags: Vec<String> = image.tags.iter().map(|t| t.to_lowercase()).collect();

    if let Some(query) = filters
        .search_query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
    {
        let query = query.to_lowercase();
        let hit = store.contains(&query)
            || notes.contains(&query)
            || tags.iter().any(|t| t.contains(&query));
        if !hit {
            return false;
        }
    }

    if let Some(stores) = filters.stores.as_deref().filter(|s| !s.is_empty()) {
        if !stores.iter().any(|s| s.to_lowercase() == store) {
            return false;
        }
    }

    if let Some(range) = &filters.date_range {
        let image_time = dates::sort_key(&image.date);
        if let Some(start) = range.start.as_deref().and_then(dates::sort_key) {
            if image_time.is_none_or(|t| t < start) {
                return false;
            }
        }
        if let Some(end) = range.end.as_deref().and_then(dates::sort_key) {
            if image_time.is_none_or(|t| t > end) {
                return false;
            }
        }
    }

    if let Some(weeks) = filters.weeks.as_deref().filter(|w| !w.is_empty()) {
        if !weeks.contains(&image.week) {
            return false;
        }
    }

    if let Some(wanted) = filters.tags.as_deref().filter(|t| !t.is_empty()) {
        let hit = wanted
            .iter()
            .any(|w| tags.iter().any(|t| *t == w.to_lowercase()));
        if !hit {
            return false;
        }
    }

    true
}

/// Keep the images matching every specified predicate, newest first.
pub fn filter_images(images: Vec<ImageRecord>, filters: &FilterOptions) -> Vec<ImageRecord> {
    let mut result: Vec<ImageRecord> = images
        .into_iter()
        .filter(|img| matches(img, filters))
        .collect();
    sort_by_recency(&mut result);
    result
}

pub fn filter_collections(images: &[ImageRecord]) -> FilterCollections {
    let mut stores: Vec<String> = Vec::new();
    let mut tags: Vec<String> = Vec::new();
    for image in images {
        if !stores.contains(&image.store) {
            stores.push(image.store.clone());
        }
        for tag in &image.tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }
    stores.sort();
    tags.sort();
    FilterCollections { stores, tags }
}

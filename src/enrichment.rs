use crate::dates;
use crate::records::ImageRecord;

/// Keyword -> tag dictionary applied to free-text notes. Matching is
/// case-insensitive substring matching, not tokenized: a note containing
/// "lighthouse" matches the "light" keyword.
const KEYWORD_TAGS: &[(&str, &str)] = &[
    ("night", "NIGHT"),
    ("evening", "NIGHT"),
    ("neon", "LIGHTING"),
    ("light", "LIGHTING"),
    ("window", "WINDOW"),
    ("display", "DISPLAY"),
    ("promo", "PROMO"),
    ("sale", "PROMO"),
    ("stock", "STOCK"),
    ("clean", "CLEAN"),
    ("signage", "SIGNAGE"),
    ("server", "SERVER"),
    ("entrance", "ENTRANCE"),
    ("aisle", "AISLE"),
];

/// Upper-case, whitespace collapsed to underscores.
pub fn canonical_tag(value: &str) -> String {
    value
        .trim()
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn season_tag(date: &str) -> Option<&'static str> {
    let season = match dates::month_of(date)? {
        12 | 1 | 2 => "WINTER",
        3..=5 => "SPRING",
        6..=8 => "SUMMER",
        _ => "FALL",
    };
    Some(season)
}

fn keyword_tags(notes: &str) -> Vec<String> {
    let lower = notes.to_lowercase();
    let mut tags = Vec::new();
    for (keyword, tag) in KEYWORD_TAGS {
        if lower.contains(keyword) && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn push_unique(tags: &mut Vec<String>, tag: String) {
    if !tag.is_empty() && !tags.contains(&tag) {
        tags.push(tag);
    }
}

/// Augment a record's tag set with derived labels and attach its sort key.
///
/// Pure and idempotent: re-applying to its own output is a no-op, so it is
/// safe to run on both the write path and every read. Existing tags keep
/// their insertion order; derived tags append after them.
pub fn enrich(mut image: ImageRecord) -> ImageRecord {
    let mut tags: Vec<String> = Vec::with_capacity(image.tags.len() + 6);
    for tag in image.tags.drain(..) {
        push_unique(&mut tags, tag);
    }

    push_unique(&mut tags, canonical_tag(&image.store));
    push_unique(&mut tags, format!("WEEK_{}", image.week));
    if let Some(month) = dates::month_abbrev(&image.date) {
        push_unique(&mut tags, format!("MONTH_{}", month));
    }
    if let Some(season) = season_tag(&image.date) {
        push_unique(&mut tags, season.to_string());
    }
    for tag in keyword_tags(&image.notes) {
        push_unique(&mut tags, tag);
    }

    image.tags = tags;
    image.sort_key = dates::sort_key(&image.date);
    image
}

/// Tag preview for the admin metadata form: what `enrich` would produce for
/// a record that has not been persisted yet.
pub fn preview_tags(
    store: Option<&str>,
    date: Option<&str>,
    notes: Option<&str>,
    tags: &[String],
) -> Vec<String> {
    let date = date
        .filter(|d| !d.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(dates::now_iso);
    let image = ImageRecord {
        id: "preview".to_string(),
        url: String::new(),
        blob_path: None,
        width: None,
        height: None,
        bytes: None,
        mime_type: None,
        placeholder: None,
        store: store.unwrap_or("STORE").to_string(),
        week: dates::week_number(&date),
        date,
        tags: tags.to_vec(),
        notes: notes.unwrap_or("").to_string(),
        uploaded_at: dates::now_iso(),
        sort_key: None,
        gps: None,
        camera: None,
    };
    enrich(image).tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_image(store: &str, date: &str, notes: &str, tags: &[&str]) -> ImageRecord {
        ImageRecord {
            id: "test".to_string(),
            url: "https://blob.example/img.jpg".to_string(),
            blob_path: None,
            width: None,
            height: None,
            bytes: None,
            mime_type: None,
            placeholder: None,
            store: store.to_string(),
            date: date.to_string(),
            week: dates::week_number(date),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            notes: notes.to_string(),
            uploaded_at: "2025-01-15T00:00:00Z".to_string(),
            sort_key: None,
            gps: None,
            camera: None,
        }
    }

    #[test]
    fn derives_store_week_month_season_and_keyword_tags() {
        let image = base_image(
            "Arcade Prime",
            "2025-01-15T00:00:00Z",
            "Night display with neon promo signage.",
            &["INITIAL"],
        );
        let enriched = enrich(image);

        for expected in [
            "INITIAL",
            "ARCADE_PRIME",
            "WEEK_3",
            "MONTH_JAN",
            "WINTER",
            "NIGHT",
            "DISPLAY",
            "LIGHTING",
            "PROMO",
            "SIGNAGE",
        ] {
            assert!(
                enriched.tags.iter().any(|t| t == expected),
                "missing {expected} in {:?}",
                enriched.tags
            );
        }
        assert_eq!(
            enriched.sort_key,
            dates::sort_key("2025-01-15T00:00:00Z")
        );
    }

    #[test]
    fn enrichment_is_idempotent() {
        let image = base_image("NEON", "2025-07-04", "summer sale, clean aisle", &["X"]);
        let once = enrich(image);
        let twice = enrich(once.clone());
        assert_eq!(once.tags, twice.tags);
        assert_eq!(once.sort_key, twice.sort_key);
    }

    #[test]
    fn keyword_matching_is_substring_based() {
        // "lighthouse" contains "light"; documented behavior, not a bug fix.
        let enriched = enrich(base_image("NEON", "2025-06-01", "photo of a lighthouse", &[]));
        assert!(enriched.tags.iter().any(|t| t == "LIGHTING"));
    }

    #[test]
    fn seasons_follow_the_fixed_month_table() {
        let cases = [
            ("2025-12-25", "WINTER"),
            ("2025-02-10", "WINTER"),
            ("2025-04-01", "SPRING"),
            ("2025-08-31", "SUMMER"),
            ("2025-10-15", "FALL"),
        ];
        for (date, season) in cases {
            let enriched = enrich(base_image("NEON", date, "", &[]));
            assert!(
                enriched.tags.iter().any(|t| t == season),
                "{date} should be {season}"
            );
        }
    }

    #[test]
    fn canonical_tag_joins_words_with_underscores() {
        assert_eq!(canonical_tag("  Arcade   Prime "), "ARCADE_PRIME");
        assert_eq!(canonical_tag("neon"), "NEON");
        assert_eq!(canonical_tag(""), "");
    }

    #[test]
    fn preview_matches_enrichment() {
        let tags = preview_tags(
            Some("Cyber"),
            Some("2025-11-20"),
            Some("window stock check"),
            &["MANUAL".to_string()],
        );
        for expected in ["MANUAL", "CYBER", "WEEK_47", "MONTH_NOV", "FALL", "WINDOW", "STOCK"] {
            assert!(tags.iter().any(|t| t == expected), "missing {expected}");
        }
    }
}

//! nCore category buckets.

use crate::selection::{Language, Resolution};
use crate::source::MediaType;

pub const MOVIE_CATEGORIES: &[&str] = &[
    "xvid_hun", "xvid", "dvd_hun", "dvd", "dvd9_hun", "dvd9", "hd_hun", "hd",
];

pub const SERIES_CATEGORIES: &[&str] = &[
    "xvidser_hun",
    "xvidser",
    "dvdser_hun",
    "dvdser",
    "hdser_hun",
    "hdser",
];

pub fn categories_for(media_type: MediaType) -> &'static [&'static str] {
    match media_type {
        MediaType::Movie => MOVIE_CATEGORIES,
        MediaType::Series => SERIES_CATEGORIES,
    }
}

/// Hungarian releases live in the `_hun` categories.
pub fn category_language(category: &str) -> Language {
    if category.ends_with("_hun") {
        Language::Hu
    } else {
        Language::En
    }
}

/// Resolution assumed for a category when file names carry none.
pub fn category_resolution(category: &str) -> Resolution {
    if category.starts_with("xvid") {
        Resolution::R480P
    } else {
        Resolution::R720P
    }
}

/// Short quality label for a category.
pub fn category_label(category: &str) -> &'static str {
    if category.starts_with("xvid") {
        "SD"
    } else if category.starts_with("dvd9") {
        "DVD9"
    } else if category.starts_with("dvd") {
        "DVD"
    } else {
        "HD"
    }
}

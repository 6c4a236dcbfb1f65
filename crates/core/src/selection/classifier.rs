//! Release-name parsing for episode markers and resolution.

use regex_lite::Regex;
use std::sync::LazyLock;

use super::{EpisodeMarkers, Resolution};

/// Extracts structured hints from a file name.
pub trait FileClassifier: Send + Sync {
    /// Season and episode numbers embedded in the name.
    fn episode_markers(&self, file_name: &str) -> EpisodeMarkers;

    /// Resolution embedded in the name, if any.
    fn resolution(&self, file_name: &str) -> Option<Resolution>;
}

// S01E02, S01E02E03, S01E02-E03, S01E02-03, S01.E02
// A dashed range end must not be a resolution (`S01E02-720p`).
static SEASON_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)s(\d{1,2})[ ._]?e(\d{1,3})((?:[-._ ]?e\d{1,3})*)(?:-(\d{1,3})(?:[^\dpi]|$))?")
        .expect("season/episode pattern")
});

// 1x02
static CROSS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^\dx])(\d{1,2})x(\d{2,3})(?:[^\d]|$)").expect("cross pattern")
});

// Season packs: S01, Season 1
static SEASON_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z\d])(?:s|season[ ._]?)(\d{1,2})(?:[^\de]|$)")
        .expect("season pattern")
});

static RESOLUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^\d])(2160|1080|720|576|540|480)[pi](?:[^a-z\d]|$)")
        .expect("resolution pattern")
});

static UHD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[^a-z\d])(?:4k|uhd)(?:[^a-z\d]|$)").expect("uhd pattern"));

/// Classifier for scene-style release names (`Show.S01E02.720p.WEB`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseNameClassifier;

impl ReleaseNameClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl FileClassifier for ReleaseNameClassifier {
    fn episode_markers(&self, file_name: &str) -> EpisodeMarkers {
        let mut markers = EpisodeMarkers::default();

        if let Some(caps) = SEASON_EPISODE.captures(file_name) {
            let season = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let first: Option<u32> = caps.get(2).and_then(|m| m.as_str().parse().ok());

            if let (Some(season), Some(first)) = (season, first) {
                markers.seasons.push(season);
                markers.episodes.push(first);

                if let Some(more) = caps.get(3) {
                    markers.episodes.extend(
                        more.as_str()
                            .split(|c: char| !c.is_ascii_digit())
                            .filter_map(|n| n.parse::<u32>().ok()),
                    );
                }

                if let Some(last) = caps.get(4).and_then(|m| m.as_str().parse::<u32>().ok()) {
                    let from = markers.episodes.last().copied().unwrap_or(first);
                    if last > from {
                        markers.episodes.extend(from + 1..=last);
                    }
                }
                return markers;
            }
        }

        if let Some(caps) = CROSS.captures(file_name) {
            let season = caps.get(1).and_then(|m| m.as_str().parse().ok());
            let episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
            if let (Some(season), Some(episode)) = (season, episode) {
                markers.seasons.push(season);
                markers.episodes.push(episode);
                return markers;
            }
        }

        if let Some(season) = SEASON_ONLY
            .captures(file_name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
        {
            markers.seasons.push(season);
        }

        markers
    }

    fn resolution(&self, file_name: &str) -> Option<Resolution> {
        if let Some(lines) = RESOLUTION
            .captures(file_name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        {
            return Resolution::from_lines(lines);
        }

        if UHD.is_match(file_name) {
            return Some(Resolution::R2160P);
        }

        None
    }
}

//! File selection and preference-based ordering of candidates.

use tracing::debug;

use super::{FileClassifier, Resolution, UserPreference};
use crate::source::TorrentCandidate;

/// A candidate with its playable file resolved and its score computed.
#[derive(Debug, Clone)]
pub struct RankedStream {
    pub candidate: TorrentCandidate,
    pub file_index: usize,
    pub resolution: Resolution,
    pub score: u32,
    /// Only the first stream can be recommended, and never a speculated one.
    pub recommended: bool,
}

/// Pick the file to play from a candidate.
///
/// Without a season and episode the largest file wins (first one on ties).
/// With both, the first file whose name carries the requested season and
/// episode is chosen. `None` means the candidate cannot serve this request.
pub fn select_file_index(
    candidate: &TorrentCandidate,
    season: Option<u32>,
    episode: Option<u32>,
    classifier: &dyn FileClassifier,
) -> Option<usize> {
    match (season, episode) {
        (Some(season), Some(episode)) => candidate
            .files
            .iter()
            .position(|f| classifier.episode_markers(&f.name).contains(season, episode)),
        _ => largest_file_index(candidate),
    }
}

fn largest_file_index(candidate: &TorrentCandidate) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (index, file) in candidate.files.iter().enumerate() {
        if best.is_none_or(|(_, length)| file.length > length) {
            best = Some((index, file.length));
        }
    }
    best.map(|(index, _)| index)
}

/// Resolution of the given file, falling back to the candidate's category default.
pub fn file_resolution(
    candidate: &TorrentCandidate,
    file_index: usize,
    classifier: &dyn FileClassifier,
) -> Resolution {
    candidate
        .files
        .get(file_index)
        .and_then(|f| classifier.resolution(&f.name))
        .unwrap_or(candidate.fallback_resolution)
}

type Scorer = fn(&TorrentCandidate, Resolution, &UserPreference) -> u32;

/// Scoring predicates in decreasing weight. New predicates go at the end
/// with a lower weight.
const SCORERS: &[Scorer] = &[language_score, resolution_score];

fn language_score(candidate: &TorrentCandidate, _: Resolution, preference: &UserPreference) -> u32 {
    if candidate.language == preference.language {
        3
    } else {
        0
    }
}

fn resolution_score(_: &TorrentCandidate, resolution: Resolution, preference: &UserPreference) -> u32 {
    if preference.resolutions.contains(&resolution) {
        2
    } else {
        0
    }
}

/// Order candidates by preference score, highest first.
///
/// The sort is stable: candidates with equal scores keep their input order.
/// Candidates without a playable file for the request are dropped.
pub fn rank(
    candidates: Vec<TorrentCandidate>,
    preference: &UserPreference,
    season: Option<u32>,
    episode: Option<u32>,
    classifier: &dyn FileClassifier,
) -> Vec<RankedStream> {
    let mut ranked: Vec<RankedStream> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let Some(file_index) = select_file_index(&candidate, season, episode, classifier) else {
                debug!(
                    info_hash = %candidate.info_hash,
                    "No playable file in candidate, skipping"
                );
                return None;
            };
            let resolution = file_resolution(&candidate, file_index, classifier);
            let score = SCORERS
                .iter()
                .map(|scorer| scorer(&candidate, resolution, preference))
                .sum();

            Some(RankedStream {
                candidate,
                file_index,
                resolution,
                score,
                recommended: false,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));

    if let Some(first) = ranked.first_mut() {
        first.recommended = !first.candidate.is_speculated;
    }

    ranked
}

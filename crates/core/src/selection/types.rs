use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vertical video resolution as used in release names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "2160P")]
    R2160P,
    #[serde(rename = "1080P")]
    R1080P,
    #[serde(rename = "720P")]
    R720P,
    #[serde(rename = "576P")]
    R576P,
    #[serde(rename = "540P")]
    R540P,
    #[serde(rename = "480P")]
    R480P,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::R2160P => "2160P",
            Resolution::R1080P => "1080P",
            Resolution::R720P => "720P",
            Resolution::R576P => "576P",
            Resolution::R540P => "540P",
            Resolution::R480P => "480P",
        }
    }

    pub fn from_lines(lines: u32) -> Option<Self> {
        match lines {
            2160 => Some(Resolution::R2160P),
            1080 => Some(Resolution::R1080P),
            720 => Some(Resolution::R720P),
            576 => Some(Resolution::R576P),
            540 => Some(Resolution::R540P),
            480 => Some(Resolution::R480P),
            _ => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches(['p', 'P']);
        digits
            .parse::<u32>()
            .ok()
            .and_then(Resolution::from_lines)
            .ok_or_else(|| format!("unknown resolution: {}", s))
    }
}

/// Audio/subtitle language of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Hu,
    En,
}

impl Language {
    /// Flag emoji shown in stream titles.
    pub fn flag(&self) -> &'static str {
        match self {
            Language::Hu => "🇭🇺",
            Language::En => "🇬🇧",
        }
    }
}

/// What a requester prefers when several releases are available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreference {
    pub language: Language,
    #[serde(default)]
    pub resolutions: Vec<Resolution>,
}

/// Season and episode numbers found in a file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeMarkers {
    pub seasons: Vec<u32>,
    pub episodes: Vec<u32>,
}

impl EpisodeMarkers {
    pub fn contains(&self, season: u32, episode: u32) -> bool {
        self.seasons.contains(&season) && self.episodes.contains(&episode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_from_str() {
        assert_eq!("1080p".parse::<Resolution>(), Ok(Resolution::R1080P));
        assert_eq!("720P".parse::<Resolution>(), Ok(Resolution::R720P));
        assert_eq!("2160".parse::<Resolution>(), Ok(Resolution::R2160P));
        assert!("999p".parse::<Resolution>().is_err());
        assert!("hd".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_resolution_serde_uses_release_notation() {
        let json = serde_json::to_string(&Resolution::R1080P).unwrap();
        assert_eq!(json, "\"1080P\"");
        let parsed: Resolution = serde_json::from_str("\"480P\"").unwrap();
        assert_eq!(parsed, Resolution::R480P);
    }

    #[test]
    fn test_user_preference_deserialize() {
        let pref: UserPreference =
            toml::from_str("language = \"hu\"\nresolutions = [\"1080P\", \"720P\"]").unwrap();
        assert_eq!(pref.language, Language::Hu);
        assert_eq!(pref.resolutions, vec![Resolution::R1080P, Resolution::R720P]);
    }

    #[test]
    fn test_episode_markers_contains() {
        let markers = EpisodeMarkers {
            seasons: vec![1],
            episodes: vec![2, 3],
        };
        assert!(markers.contains(1, 3));
        assert!(!markers.contains(2, 3));
        assert!(!markers.contains(1, 4));
    }
}

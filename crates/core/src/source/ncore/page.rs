//! JSON listing format.
//!
//! Numeric fields arrive as numbers or strings depending on the endpoint.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Default, Deserialize)]
pub(super) struct NcorePage {
    #[serde(default)]
    pub results: Vec<NcoreTorrent>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_results: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub perpage: u64,
}

impl NcorePage {
    /// Number of the last page (pages are 1-based).
    pub fn last_page(&self) -> u64 {
        if self.perpage == 0 {
            return 1;
        }
        self.total_results.div_ceil(self.perpage).max(1)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct NcoreTorrent {
    #[serde(deserialize_with = "lenient_string")]
    pub torrent_id: String,
    pub category: String,
    pub release_name: String,
    pub download_url: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub seeders: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) if s.trim().is_empty() => Ok(0),
        NumberOrText::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n.to_string()),
        NumberOrText::Text(s) => Ok(s),
    }
}

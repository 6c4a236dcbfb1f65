//! Scraping for the pages that have no JSON variant.

use regex_lite::Regex;
use std::sync::LazyLock;

static DOWNLOAD_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="download"[^>]*>\s*<a\s[^>]*?href="([^"]+)""#).expect("download link pattern")
});

static HNR_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="hnr_all2?""#).expect("hit-and-run row pattern"));

static HNR_TIME_SPENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"class="hnr_ttimespent"[^>]*>\s*([^<]*?)\s*<"#).expect("time spent pattern")
});

static HNR_TORRENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="hnr_tname"[^>]*>.*?<a\s[^>]*?href="[^"]*?[?&](?:amp;)?id=(\d+)"#)
        .expect("torrent link pattern")
});

/// `href` of the link inside the details page's `.download` element.
pub(super) fn download_href(html: &str) -> Option<String> {
    DOWNLOAD_LINK
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str()))
}

/// Torrent ids from hit-and-run rows with no remaining seeding time.
///
/// Rows are the `hnr_all`/`hnr_all2` elements; a `-` in the `hnr_ttimespent`
/// cell means the obligation is fulfilled.
pub(super) fn removable_torrent_ids(html: &str) -> Vec<String> {
    let starts: Vec<usize> = HNR_ROW.find_iter(html).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(html.len());
            let row = &html[start..end];

            let spent = HNR_TIME_SPENT.captures(row)?.get(1)?.as_str();
            if spent != "-" {
                return None;
            }
            HNR_TORRENT_ID
                .captures(row)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

fn decode_entities(value: &str) -> String {
    value.replace("&amp;", "&")
}

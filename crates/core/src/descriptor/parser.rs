//! Bencoded descriptor parsing via librqbit-core.

use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};

use super::{ParsedDescriptor, ResolveError, TorrentFile};

/// Parse raw `.torrent` bytes into an info hash and a flat file list.
///
/// Multi-file paths are prefixed with the torrent name, matching how the
/// download engine lays files out on disk. Offsets follow file order.
pub fn parse_descriptor(bytes: &[u8]) -> Result<ParsedDescriptor, ResolveError> {
    let torrent: TorrentMetaV1Owned =
        torrent_from_bytes(bytes).map_err(|e| ResolveError::Parse(e.to_string()))?;

    let info = &torrent.info;
    let root_name = info
        .name
        .as_ref()
        .map(|b| bytes_to_string(b.as_ref()))
        .unwrap_or_else(|| "unknown".to_string());

    let mut files = Vec::new();
    let mut offset = 0u64;

    if let Some(ref entries) = info.files {
        for entry in entries {
            let mut parts = vec![root_name.clone()];
            parts.extend(entry.path.iter().map(|p| bytes_to_string(p.as_ref())));

            let name = parts.last().cloned().unwrap_or_default();
            files.push(TorrentFile {
                name,
                path: parts.join("/"),
                length: entry.length,
                offset,
            });
            offset += entry.length;
        }
    } else if let Some(length) = info.length {
        files.push(TorrentFile {
            name: root_name.clone(),
            path: root_name.clone(),
            length,
            offset,
        });
    }

    if files.is_empty() {
        return Err(ResolveError::Parse("torrent has no files".to_string()));
    }

    Ok(ParsedDescriptor {
        info_hash: torrent.info_hash.as_string(),
        name: root_name,
        files,
    })
}

/// Lossy UTF-8; some indexers still publish latin-1 names.
fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

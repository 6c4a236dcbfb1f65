//! Test fixtures and helper functions.

use crate::descriptor::TorrentFile;
use crate::selection::{Language, Resolution};
use crate::source::TorrentCandidate;

const PIECE_LENGTH: u64 = 16384;

/// Bencoded single-file descriptor with zeroed piece hashes.
pub fn single_file_descriptor(name: &str, length: u64) -> Vec<u8> {
    let mut info = Vec::new();
    info.push(b'd');
    bencode_str(&mut info, "length");
    bencode_int(&mut info, length);
    bencode_str(&mut info, "name");
    bencode_str(&mut info, name);
    bencode_pieces(&mut info, length);
    info.push(b'e');

    wrap_info(info)
}

/// Bencoded multi-file descriptor. File paths use `/` between directories.
pub fn multi_file_descriptor(name: &str, files: &[(&str, u64)]) -> Vec<u8> {
    let mut info = Vec::new();
    info.push(b'd');
    bencode_str(&mut info, "files");
    info.push(b'l');
    for (path, length) in files {
        info.push(b'd');
        bencode_str(&mut info, "length");
        bencode_int(&mut info, *length);
        bencode_str(&mut info, "path");
        info.push(b'l');
        for component in path.split('/') {
            bencode_str(&mut info, component);
        }
        info.push(b'e');
        info.push(b'e');
    }
    info.push(b'e');
    bencode_str(&mut info, "name");
    bencode_str(&mut info, name);
    bencode_pieces(&mut info, files.iter().map(|(_, l)| l).sum());
    info.push(b'e');

    wrap_info(info)
}

fn wrap_info(info: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(info.len() + 64);
    out.push(b'd');
    bencode_str(&mut out, "announce");
    bencode_str(&mut out, "http://tracker.invalid/announce");
    bencode_str(&mut out, "info");
    out.extend_from_slice(&info);
    out.push(b'e');
    out
}

fn bencode_pieces(out: &mut Vec<u8>, total_length: u64) {
    let pieces = total_length.div_ceil(PIECE_LENGTH).max(1) as usize;
    bencode_str(out, "piece length");
    bencode_int(out, PIECE_LENGTH);
    bencode_str(out, "pieces");
    bencode_bytes(out, &vec![0u8; pieces * 20]);
}

fn bencode_str(out: &mut Vec<u8>, value: &str) {
    bencode_bytes(out, value.as_bytes());
}

fn bencode_bytes(out: &mut Vec<u8>, value: &[u8]) {
    out.extend_from_slice(value.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(value);
}

fn bencode_int(out: &mut Vec<u8>, value: u64) {
    out.push(b'i');
    out.extend_from_slice(value.to_string().as_bytes());
    out.push(b'e');
}

/// A candidate with one 1000-byte file. The release name is the file name
/// without its extension and the source id equals the info hash.
pub fn candidate(info_hash: &str, language: Language, file_name: &str) -> TorrentCandidate {
    let mut candidate = candidate_with_files(info_hash, &[(file_name, 1000)]);
    candidate.language = language;
    candidate.release_name = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name)
        .to_string();
    candidate
}

/// A Hungarian HD candidate with the given files laid out back to back.
pub fn candidate_with_files(info_hash: &str, files: &[(&str, u64)]) -> TorrentCandidate {
    let mut offset = 0;
    let files = files
        .iter()
        .map(|(name, length)| {
            let file = TorrentFile {
                name: name.rsplit('/').next().unwrap_or(name).to_string(),
                path: name.to_string(),
                length: *length,
                offset,
            };
            offset += length;
            file
        })
        .collect();

    TorrentCandidate {
        source_name: "ncore".to_string(),
        source_id: info_hash.to_string(),
        info_hash: info_hash.to_string(),
        release_name: format!("Release.{}", info_hash),
        language: Language::Hu,
        quality_label: "HD".to_string(),
        fallback_resolution: Resolution::R720P,
        files,
        seeders: 10,
        is_speculated: false,
    }
}

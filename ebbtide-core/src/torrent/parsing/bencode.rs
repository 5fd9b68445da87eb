//! Bencode extraction of torrent metadata summaries

use sha1::{Digest, Sha1};

use super::types::{TorrentFileEntry, TorrentSummary};
use crate::torrent::{InfoHash, TorrentError};

type BencodeDict<'a> = std::collections::HashMap<&'a [u8], bencode_rs::Value<'a>>;

/// Parse .torrent bytes into the summary the registry tracks.
///
/// Extracts the info hash (SHA-1 of the raw info dictionary), name,
/// file listing, and announce URLs. Piece hashes and piece length are
/// deliberately left to the engine.
///
/// # Errors
///
/// - `TorrentError::InvalidTorrentFile` - Malformed bencode or missing fields
pub fn parse_summary(torrent_bytes: &[u8]) -> Result<TorrentSummary, TorrentError> {
    let parsed =
        bencode_rs::Value::parse(torrent_bytes).map_err(|e| TorrentError::InvalidTorrentFile {
            reason: format!("Bencode parsing failed: {e:?}"),
        })?;

    let Some(bencode_rs::Value::Dictionary(root)) = parsed.first() else {
        return Err(TorrentError::InvalidTorrentFile {
            reason: "Root element must be dictionary".to_string(),
        });
    };

    let info_value = root
        .get(b"info".as_slice())
        .ok_or_else(|| TorrentError::InvalidTorrentFile {
            reason: "Missing 'info' field".to_string(),
        })?;

    let info_hash = info_hash_of(torrent_bytes)?;

    let bencode_rs::Value::Dictionary(info) = info_value else {
        return Err(TorrentError::InvalidTorrentFile {
            reason: "Info field must be dictionary".to_string(),
        });
    };

    let name = extract_string(info, b"name")?;
    let (files, total_length) = extract_files(info, &name)?;
    let announce_urls = extract_announce_urls(root);

    Ok(TorrentSummary {
        info_hash,
        name,
        total_length,
        files,
        announce_urls,
    })
}

/// SHA-1 over the raw bencode slice of the info dictionary.
///
/// The hash must cover the exact bytes as they appear in the file, so
/// the dictionary is located and measured in the original data rather
/// than re-encoded from the parsed form.
fn info_hash_of(torrent_bytes: &[u8]) -> Result<InfoHash, TorrentError> {
    let marker = b"4:info";
    let info_key_pos = torrent_bytes
        .windows(marker.len())
        .position(|window| window == marker)
        .ok_or_else(|| TorrentError::InvalidTorrentFile {
            reason: "Could not find info dictionary in data".to_string(),
        })?;

    let info_start = info_key_pos + marker.len();
    let info_len = dictionary_end(&torrent_bytes[info_start..])?;
    let info_bytes = &torrent_bytes[info_start..info_start + info_len];

    let mut hasher = Sha1::new();
    hasher.update(info_bytes);
    let digest = hasher.finalize();

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&digest);
    Ok(InfoHash::new(hash))
}

/// Length of the bencode dictionary starting at `data[0]`.
fn dictionary_end(data: &[u8]) -> Result<usize, TorrentError> {
    if data.first() != Some(&b'd') {
        return Err(TorrentError::InvalidTorrentFile {
            reason: "Expected dictionary start".to_string(),
        });
    }

    let mut pos = 1;
    let mut depth = 1;

    while pos < data.len() && depth > 0 {
        match data[pos] {
            b'd' | b'l' => {
                depth += 1;
                pos += 1;
            }
            b'e' => {
                depth -= 1;
                pos += 1;
            }
            b'i' => {
                pos += 1;
                while pos < data.len() && data[pos] != b'e' {
                    pos += 1;
                }
                pos += 1; // 'e' terminator
            }
            b'0'..=b'9' => {
                let length_start = pos;
                while pos < data.len() && data[pos] != b':' {
                    pos += 1;
                }
                let length: usize = std::str::from_utf8(&data[length_start..pos])
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| TorrentError::InvalidTorrentFile {
                        reason: "Invalid string length".to_string(),
                    })?;
                pos += 1 + length; // ':' plus string content
            }
            _ => {
                return Err(TorrentError::InvalidTorrentFile {
                    reason: "Invalid bencode character".to_string(),
                });
            }
        }
    }

    if depth != 0 || pos > data.len() {
        return Err(TorrentError::InvalidTorrentFile {
            reason: "Incomplete bencode dictionary".to_string(),
        });
    }

    Ok(pos)
}

/// File entries and total byte length from the info dictionary.
///
/// Single-file torrents carry a top-level `length`; multi-file torrents
/// carry a `files` list of `{path, length}` dictionaries.
fn extract_files(
    info: &BencodeDict<'_>,
    name: &str,
) -> Result<(Vec<TorrentFileEntry>, u64), TorrentError> {
    if let Some(bencode_rs::Value::Integer(length)) = info.get(b"length".as_slice()) {
        let entry = TorrentFileEntry {
            path: vec![name.to_string()],
            length: *length as u64,
        };
        return Ok((vec![entry], *length as u64));
    }

    let Some(bencode_rs::Value::List(files_list)) = info.get(b"files".as_slice()) else {
        return Err(TorrentError::InvalidTorrentFile {
            reason: "Missing 'files' or 'length' field".to_string(),
        });
    };

    let mut files = Vec::new();
    let mut total_length = 0u64;

    for file_value in files_list {
        let bencode_rs::Value::Dictionary(file_dict) = file_value else {
            return Err(TorrentError::InvalidTorrentFile {
                reason: "Invalid file entry type".to_string(),
            });
        };

        let Some(bencode_rs::Value::Integer(length)) = file_dict.get(b"length".as_slice()) else {
            return Err(TorrentError::InvalidTorrentFile {
                reason: "Missing file length".to_string(),
            });
        };

        let Some(bencode_rs::Value::List(path_list)) = file_dict.get(b"path".as_slice()) else {
            return Err(TorrentError::InvalidTorrentFile {
                reason: "Missing or invalid path in file".to_string(),
            });
        };

        let mut path = Vec::new();
        for component in path_list {
            let bencode_rs::Value::Bytes(bytes) = component else {
                return Err(TorrentError::InvalidTorrentFile {
                    reason: "Invalid path component type".to_string(),
                });
            };
            let component_str = String::from_utf8(bytes.to_vec()).map_err(|_| {
                TorrentError::InvalidTorrentFile {
                    reason: "Invalid UTF-8 in file path".to_string(),
                }
            })?;
            path.push(component_str);
        }

        total_length += *length as u64;
        files.push(TorrentFileEntry {
            path,
            length: *length as u64,
        });
    }

    Ok((files, total_length))
}

fn extract_string(dict: &BencodeDict<'_>, key: &[u8]) -> Result<String, TorrentError> {
    match dict.get(key) {
        Some(bencode_rs::Value::Bytes(bytes)) => String::from_utf8(bytes.to_vec()).map_err(|_| {
            TorrentError::InvalidTorrentFile {
                reason: format!("Invalid UTF-8 in field: {:?}", String::from_utf8_lossy(key)),
            }
        }),
        _ => Err(TorrentError::InvalidTorrentFile {
            reason: format!(
                "Missing or invalid field: {:?}",
                String::from_utf8_lossy(key)
            ),
        }),
    }
}

/// Announce URLs from `announce` and the optional `announce-list`.
///
/// A torrent without any announce URLs is still accepted; the registry
/// composes the engine magnet with its own tracker list.
fn extract_announce_urls(root: &BencodeDict<'_>) -> Vec<String> {
    let mut announce_urls = Vec::new();

    if let Ok(announce) = extract_string(root, b"announce") {
        announce_urls.push(announce);
    }

    if let Some(bencode_rs::Value::List(announce_list)) = root.get(b"announce-list".as_slice()) {
        for tier in announce_list {
            if let bencode_rs::Value::List(tier_urls) = tier {
                for url_value in tier_urls {
                    if let bencode_rs::Value::Bytes(url_bytes) = url_value
                        && let Ok(url) = String::from_utf8(url_bytes.to_vec())
                        && !announce_urls.contains(&url)
                    {
                        announce_urls.push(url);
                    }
                }
            }
        }
    }

    announce_urls
}

//! Loads a 16-byte AES key from a plain-text hex key file, or locates one
//! inside a key directory by the target key's UUID (`xxxxxxxx-xxxx-...hex`).

use crate::error::{CryptError, Result};
use std::path::{Path, PathBuf};

pub fn load_key_file(path: &Path) -> Result<[u8; 16]> {
    let text = std::fs::read_to_string(path)?;
    parse_hex_key(&text).ok_or_else(|| CryptError::BadKeyFile(path.display().to_string()))
}

/// `key_dir` holds one key file per UUID, named after the UUID's canonical
/// hyphenated form.
pub fn load_key_by_id(key_dir: &Path, key_id: &[u8; 16]) -> Result<[u8; 16]> {
    let name = uuid_filename(key_id);
    load_key_file(&key_dir.join(name))
}

fn uuid_filename(id: &[u8; 16]) -> PathBuf {
    PathBuf::from(format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        id[0], id[1], id[2], id[3], id[4], id[5], id[6], id[7], id[8], id[9], id[10], id[11], id[12], id[13], id[14],
        id[15]
    ))
}

fn parse_hex_key(text: &str) -> Option<[u8; 16]> {
    let hex_chars: String = text.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex_chars.len() < 32 {
        return None;
    }
    let bytes = hex::decode(&hex_chars[..32]).ok()?;
    let mut key = [0u8; 16];
    key.copy_from_slice(&bytes);
    Some(key)
}
